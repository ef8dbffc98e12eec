use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::get_str;
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// The Quantity metadata attribute: a set of quantity names (used for
/// ODIMH5 `/what.quantity`, spec §4.3). Single representation, no style
/// byte. Stored as a sorted set so encoding is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    values: BTreeSet<String>,
}

impl Quantity {
    pub fn new(values: impl IntoIterator<Item = String>) -> Quantity {
        Quantity {
            values: values.into_iter().collect(),
        }
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        let text = self.values.iter().cloned().collect::<Vec<_>>().join(",");
        enc.put_bytes(text.as_bytes());
    }

    pub fn decode(dec: &mut Decoder) -> Result<Quantity> {
        let rest = dec.rest();
        let text = std::str::from_utf8(rest).map_err(|_| Error::invalid("Quantity", "not valid UTF-8"))?;
        Ok(Quantity::parse_text(text)?)
    }

    pub fn write_text(&self, out: &mut String) {
        out.push_str(&self.values.iter().cloned().collect::<Vec<_>>().join(","));
    }

    pub fn parse_text(s: &str) -> Result<Quantity> {
        Ok(Quantity::new(
            s.split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        ))
    }

    pub fn exact_query(&self) -> String {
        let mut s = String::new();
        self.write_text(&mut s);
        format!("quantity:{}", s)
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        let mut s = String::new();
        self.write_text(&mut s);
        json!({ keys.quantity_value: s })
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Quantity> {
        Quantity::parse_text(get_str("Quantity", v, keys.quantity_value)?)
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.values.iter().cmp(other.values.iter())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let q = Quantity::new(["TH".to_string(), "VRAD".to_string()]);
        let mut enc = Encoder::new();
        q.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Quantity::decode(&mut dec).unwrap(), q);
    }

    #[test]
    fn text_round_trip_sorted() {
        let q = Quantity::new(["VRAD".to_string(), "TH".to_string()]);
        let mut s = String::new();
        q.write_text(&mut s);
        assert_eq!(s, "TH,VRAD");
    }

    #[test]
    fn round_trip_structured() {
        let q = Quantity::new(["TH".to_string(), "VRAD".to_string()]);
        let j = q.serialise(&crate::keys::KEYS_PYTHON);
        assert_eq!(Quantity::decode_structure(&crate::keys::KEYS_PYTHON, &j).unwrap(), q);
    }
}
