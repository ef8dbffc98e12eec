use crate::error::{Error, Result};
use ark_binary::{Decoder, Encoder};
use std::cmp::Ordering;
use std::fmt;

const TAG_SMALL_INT: u8 = 0b00;
const TAG_NUMBER: u8 = 0b01;
const TAG_STRING: u8 = 0b10;
const TAG_EXTENDED: u8 = 0b11;

const SUBTAG_SIGNED_INT: u8 = 0b00;

const SMALL_INT_MIN: i64 = -32;
const SMALL_INT_MAX: i64 = 31;

/// A typed scalar value: a signed integer or a UTF-8 string, with a
/// compact self-describing binary encoding (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl Value {
    pub fn int(v: i64) -> Value {
        Value::Int(v)
    }

    pub fn str(v: impl Into<String>) -> Value {
        Value::Str(v.into())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            Value::Int(_) => None,
        }
    }

    pub fn encode(&self, enc: &mut Encoder) {
        match self {
            Value::Int(v) if (SMALL_INT_MIN..=SMALL_INT_MAX).contains(v) => {
                let bits = (*v as i8 as u8) & 0x3f;
                enc.put_u8((TAG_SMALL_INT << 6) | bits);
            }
            Value::Int(v) => {
                let sign = if *v < 0 { 1u8 } else { 0u8 };
                let mag = v.unsigned_abs();
                let len = int_byte_len(mag);
                let lead = (TAG_NUMBER << 6) | (SUBTAG_SIGNED_INT << 4) | (sign << 3) | (len as u8 - 1);
                enc.put_u8(lead);
                for i in (0..len).rev() {
                    enc.put_u8(((mag >> (8 * i)) & 0xff) as u8);
                }
            }
            Value::Str(s) => {
                let bytes = s.as_bytes();
                assert!(bytes.len() <= 0x3f, "short string value too long to encode");
                enc.put_u8((TAG_STRING << 6) | (bytes.len() as u8));
                enc.put_bytes(bytes);
            }
        }
    }

    pub fn decode(dec: &mut Decoder) -> Result<Value> {
        let lead = dec.take_u8("value lead byte")?;
        let tag = lead >> 6;
        match tag {
            t if t == TAG_SMALL_INT => {
                let bits = lead & 0x3f;
                // sign-extend from 6 bits
                let v = if bits & 0x20 != 0 {
                    (bits as i64) - 64
                } else {
                    bits as i64
                };
                Ok(Value::Int(v))
            }
            t if t == TAG_NUMBER => {
                let subtag = (lead >> 4) & 0x3;
                if subtag != SUBTAG_SIGNED_INT {
                    return Err(Error::invalid("value", "reserved number sub-tag"));
                }
                let sign = (lead >> 3) & 0x1;
                let len = ((lead & 0x7) + 1) as usize;
                let bytes = dec.take("value payload", len)?;
                let mut mag: u64 = 0;
                for &b in bytes {
                    mag = (mag << 8) | b as u64;
                }
                let v = if sign == 1 { -(mag as i64) } else { mag as i64 };
                Ok(Value::Int(v))
            }
            t if t == TAG_STRING => {
                let len = (lead & 0x3f) as usize;
                let bytes = dec.take("value string", len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| Error::invalid("value", "string is not valid UTF-8"))?;
                Ok(Value::Str(s.to_string()))
            }
            _ => Err(Error::invalid("value", "reserved extended tag")),
        }
    }

    /// Textual form used inside a ValueBag: a bare token, or a double-quoted
    /// C-escaped string when the value would otherwise be ambiguous with an
    /// integer, has leading/trailing whitespace, or contains NUL.
    pub fn write_text(&self, out: &mut String) {
        match self {
            Value::Int(v) => out.push_str(&v.to_string()),
            Value::Str(s) => {
                if needs_quoting(s) {
                    out.push('"');
                    for c in s.chars() {
                        match c {
                            '"' => out.push_str("\\\""),
                            '\\' => out.push_str("\\\\"),
                            '\n' => out.push_str("\\n"),
                            '\t' => out.push_str("\\t"),
                            '\0' => out.push_str("\\0"),
                            _ => out.push(c),
                        }
                    }
                    out.push('"');
                } else {
                    out.push_str(s);
                }
            }
        }
    }

    pub fn to_text(&self) -> String {
        let mut s = String::new();
        self.write_text(&mut s);
        s
    }
}

fn needs_quoting(s: &str) -> bool {
    s.parse::<i64>().is_ok()
        || s.starts_with(char::is_whitespace)
        || s.ends_with(char::is_whitespace)
        || s.contains('\0')
        || s.is_empty()
}

fn int_byte_len(mag: u64) -> usize {
    let mut len = 1;
    let mut m = mag >> 8;
    while m != 0 {
        len += 1;
        m >>= 8;
    }
    len.min(8)
}

/// Total order: integers before strings, then by value / lexicographic
/// byte order.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Int(_), Value::Str(_)) => Ordering::Less,
            (Value::Str(_), Value::Int(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(v: Value) {
        let mut enc = Encoder::new();
        v.encode(&mut enc);
        let bytes = enc.into_vec();
        let mut dec = Decoder::new(&bytes);
        let back = Value::decode(&mut dec).unwrap();
        assert_eq!(v, back);
        assert!(dec.is_empty());
    }

    #[test]
    fn small_ints_round_trip() {
        for v in [-32, -1, 0, 1, 31] {
            round_trip(Value::Int(v));
        }
    }

    #[test]
    fn large_ints_round_trip() {
        for v in [-33, 32, 1000, -1000, i32::MAX as i64, i64::MIN + 1, i64::MAX] {
            round_trip(Value::Int(v));
        }
    }

    #[test]
    fn strings_round_trip() {
        round_trip(Value::str(""));
        round_trip(Value::str("hello"));
        round_trip(Value::str("a".repeat(63)));
    }

    #[test]
    fn quoting_rules() {
        assert_eq!(Value::str("hello").to_text(), "hello");
        assert_eq!(Value::str("42").to_text(), "\"42\"");
        assert_eq!(Value::str(" x").to_text(), "\" x\"");
    }
}
