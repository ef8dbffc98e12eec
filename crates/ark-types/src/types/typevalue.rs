use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::get_str;
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The Value metadata attribute: a free-form string payload used to store
/// small values that don't fit any other type (spec §4.3, wire code 15).
/// Named `TypeValue` to avoid colliding with [`ark_value::Value`]. Single
/// representation, no style byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeValue {
    pub buffer: String,
}

impl TypeValue {
    pub fn new(buffer: impl Into<String>) -> TypeValue {
        TypeValue { buffer: buffer.into() }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_bytes(self.buffer.as_bytes());
    }

    pub fn decode(dec: &mut Decoder) -> Result<TypeValue> {
        let rest = dec.rest();
        let buffer = std::str::from_utf8(rest)
            .map_err(|_| Error::invalid("Value", "not valid UTF-8"))?
            .to_string();
        Ok(TypeValue { buffer })
    }

    pub fn write_text(&self, out: &mut String) {
        out.push_str(&self.buffer);
    }

    pub fn parse_text(s: &str) -> Result<TypeValue> {
        Ok(TypeValue::new(s))
    }

    pub fn exact_query(&self) -> String {
        format!("value:{}", self.buffer)
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        json!({ keys.value_value: self.buffer })
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<TypeValue> {
        Ok(TypeValue::new(get_str("Value", v, keys.value_value)?))
    }
}

impl PartialOrd for TypeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.buffer.cmp(&other.buffer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let v = TypeValue::new("custom-payload");
        let mut enc = Encoder::new();
        v.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(TypeValue::decode(&mut dec).unwrap(), v);
    }

    #[test]
    fn round_trip_structured() {
        let v = TypeValue::new("custom-payload");
        let j = v.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(TypeValue::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), v);
    }
}
