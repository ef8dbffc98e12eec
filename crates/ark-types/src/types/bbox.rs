use crate::error::Result;
use crate::keys::Keys;
use crate::structured::get_str;
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The BBox metadata attribute. No implementation survives in the example
/// pack (the reference archive never emits it); kept as an opaque binary
/// payload so the wire codec and MSO ordering stay total over all fifteen
/// codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BBox {
    pub bytes: Vec<u8>,
}

impl BBox {
    pub fn new(bytes: Vec<u8>) -> BBox {
        BBox { bytes }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_bytes(&self.bytes);
    }

    pub fn decode(dec: &mut Decoder) -> Result<BBox> {
        Ok(BBox::new(dec.rest().to_vec()))
    }

    pub fn write_text(&self, out: &mut String) {
        for b in &self.bytes {
            out.push_str(&format!("{:02x}", b));
        }
    }

    pub fn parse_text(s: &str) -> Result<BBox> {
        let s = s.trim();
        let mut bytes = Vec::with_capacity(s.len() / 2);
        let mut chars = s.chars();
        while let (Some(hi), Some(lo)) = (chars.next(), chars.next()) {
            let byte = u8::from_str_radix(&format!("{}{}", hi, lo), 16)
                .map_err(|_| crate::error::Error::invalid("BBox", "invalid hex digit"))?;
            bytes.push(byte);
        }
        Ok(BBox::new(bytes))
    }

    pub fn exact_query(&self) -> String {
        let mut s = String::new();
        self.write_text(&mut s);
        format!("bbox:{}", s)
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        let mut s = String::new();
        self.write_text(&mut s);
        json!({ keys.bbox_value: s })
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<BBox> {
        BBox::parse_text(get_str("BBox", v, keys.bbox_value)?)
    }
}

impl PartialOrd for BBox {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BBox {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let b = BBox::new(vec![1, 2, 3]);
        let mut enc = Encoder::new();
        b.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(BBox::decode(&mut dec).unwrap(), b);
    }

    #[test]
    fn text_round_trip() {
        let b = BBox::new(vec![0xde, 0xad]);
        let mut s = String::new();
        b.write_text(&mut s);
        assert_eq!(s, "dead");
        assert_eq!(BBox::parse_text(&s).unwrap(), b);
    }

    #[test]
    fn round_trip_structured() {
        let b = BBox::new(vec![0xde, 0xad]);
        let j = b.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(BBox::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), b);
    }
}
