use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::get_str;
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The Task metadata attribute: a free-text annotation (used for ODIMH5
/// `/how.task`, spec §4.3). Single representation, no style byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub value: String,
}

impl Task {
    pub fn new(value: impl Into<String>) -> Task {
        Task { value: value.into() }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_bytes(self.value.as_bytes());
    }

    pub fn decode(dec: &mut Decoder) -> Result<Task> {
        let rest = dec.rest();
        let value = std::str::from_utf8(rest)
            .map_err(|_| Error::invalid("Task", "not valid UTF-8"))?
            .to_string();
        Ok(Task { value })
    }

    pub fn write_text(&self, out: &mut String) {
        out.push_str(&self.value);
    }

    pub fn parse_text(s: &str) -> Result<Task> {
        Ok(Task::new(s))
    }

    pub fn exact_query(&self) -> String {
        format!("task:{}", self.value)
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        json!({ keys.task_value: self.value })
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Task> {
        Ok(Task::new(get_str("Task", v, keys.task_value)?))
    }
}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let t = Task::new("VOL2BIRD");
        let mut enc = Encoder::new();
        t.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Task::decode(&mut dec).unwrap(), t);
    }

    #[test]
    fn round_trip_structured() {
        let t = Task::new("VOL2BIRD");
        let j = t.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Task::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), t);
    }
}
