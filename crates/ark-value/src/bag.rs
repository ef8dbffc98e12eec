use crate::error::{Error, Result};
use crate::value::Value;
use ark_binary::{Decoder, Encoder};
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt;

/// An ordered (by key), string-keyed bag of typed scalar [`Value`]s. Keys
/// are unique; iteration is always key-sorted so the wire encoding is
/// canonical (spec §3, §9 "ValueBag sorted container").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueBag {
    items: Vec<(String, Value)>,
}

impl ValueBag {
    pub fn new() -> ValueBag {
        ValueBag { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|i| &self.items[i].1)
    }

    /// Inserts or replaces the value for `key`, preserving key-sorted order.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.items.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(i) => self.items[i].1 = value,
            Err(i) => self.items.insert(i, (key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn encode(&self, enc: &mut Encoder) {
        for (key, value) in &self.items {
            let bytes = key.as_bytes();
            assert!(bytes.len() <= 0xff, "ValueBag key too long to encode");
            enc.put_u8(bytes.len() as u8);
            enc.put_bytes(bytes);
            value.encode(enc);
        }
    }

    /// Decodes key/value pairs until the decoder runs out of bytes. Stops
    /// cleanly at the buffer end, as specified.
    pub fn decode(dec: &mut Decoder) -> Result<ValueBag> {
        let mut bag = ValueBag::new();
        while !dec.is_empty() {
            let klen = dec.take_u8("ValueBag key length")? as usize;
            let kbytes = dec.take("ValueBag key", klen)?;
            let key = std::str::from_utf8(kbytes)
                .map_err(|_| Error::invalid("ValueBag", "key is not valid UTF-8"))?
                .to_string();
            let value = Value::decode(dec)?;
            bag.items.push((key, value));
        }
        bag.items.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(bag)
    }

    pub fn write_text(&self, out: &mut String) {
        let mut first = true;
        for (key, value) in &self.items {
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(key);
            out.push('=');
            value.write_text(out);
        }
    }

    pub fn to_text(&self) -> String {
        let mut s = String::new();
        self.write_text(&mut s);
        s
    }

    /// Parses `key=value, key="quoted value", key=42`. Whitespace around
    /// `,` and `=` is tolerated.
    pub fn parse_text(s: &str) -> Result<ValueBag> {
        let mut bag = ValueBag::new();
        for item in split_top_level(s) {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| Error::invalid("ValueBag", format!("'{}' has no '='", item)))?;
            let key = key.trim();
            let value = value.trim();
            let parsed = if let Some(inner) = value.strip_prefix('"') {
                let inner = inner
                    .strip_suffix('"')
                    .ok_or_else(|| Error::invalid("ValueBag", format!("unterminated string in '{}'", item)))?;
                Value::Str(unescape(inner))
            } else if let Ok(i) = value.parse::<i64>() {
                Value::Int(i)
            } else {
                Value::Str(value.to_string())
            };
            bag.insert(key.to_string(), parsed);
        }
        Ok(bag)
    }
}

fn split_top_level(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                cur.push(c);
            }
            '\\' if in_quotes => {
                cur.push(c);
                if let Some(next) = chars.next() {
                    cur.push(next);
                }
            }
            ',' if !in_quotes => {
                out.push(std::mem::take(&mut cur));
            }
            _ => cur.push(c),
        }
    }
    if !cur.trim().is_empty() {
        out.push(cur);
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Lexicographic comparison on key-sorted (key, value) pairs.
impl PartialOrd for ValueBag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValueBag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.items
            .iter()
            .zip_longest(other.items.iter())
            .map(|pair| match pair {
                itertools::EitherOrBoth::Both((ka, va), (kb, vb)) => {
                    ka.cmp(kb).then_with(|| va.cmp(vb))
                }
                itertools::EitherOrBoth::Left(_) => Ordering::Greater,
                itertools::EitherOrBoth::Right(_) => Ordering::Less,
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for ValueBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl FromIterator<(String, Value)> for ValueBag {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut bag = ValueBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_binary() {
        let mut bag = ValueBag::new();
        bag.insert("b", Value::int(2));
        bag.insert("a", Value::str("hello"));
        let mut enc = Encoder::new();
        bag.encode(&mut enc);
        let bytes = enc.into_vec();
        let mut dec = Decoder::new(&bytes);
        let back = ValueBag::decode(&mut dec).unwrap();
        assert_eq!(bag, back);
    }

    #[test]
    fn sorted_by_key() {
        let mut bag = ValueBag::new();
        bag.insert("z", Value::int(1));
        bag.insert("a", Value::int(2));
        let keys: Vec<_> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "z"]);
    }

    #[test]
    fn text_round_trip() {
        let mut bag = ValueBag::new();
        bag.insert("name", Value::str("hello world"));
        bag.insert("count", Value::int(42));
        let text = bag.to_text();
        let parsed = ValueBag::parse_text(&text).unwrap();
        assert_eq!(bag, parsed);
    }

    #[test]
    fn quoted_string_that_looks_like_int() {
        let bag = ValueBag::parse_text("key=\"42\"").unwrap();
        assert_eq!(bag.get("key"), Some(&Value::str("42")));
    }

    #[test]
    fn plain_int() {
        let bag = ValueBag::parse_text("key=42").unwrap();
        assert_eq!(bag.get("key"), Some(&Value::int(42)));
    }
}
