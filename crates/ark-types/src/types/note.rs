use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{get_str, time_from_json, time_to_json};
use ark_binary::{Decoder, Encoder};
use ark_time::Time;
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// A timestamped free-text annotation attached to a Metadata (spec §4.3).
/// Unlike the styled types, Note has a single representation: no style
/// byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub time: Time,
    pub content: String,
}

impl Note {
    pub fn new(time: Time, content: impl Into<String>) -> Note {
        Note {
            time,
            content: content.into(),
        }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_uint(self.time.ye as u64, 2);
        enc.put_u8(self.time.mo as u8);
        enc.put_u8(self.time.da as u8);
        enc.put_u8(self.time.ho as u8);
        enc.put_u8(self.time.mi as u8);
        enc.put_u8(self.time.se as u8);
        enc.put_bytes(self.content.as_bytes());
    }

    pub fn decode(dec: &mut Decoder) -> Result<Note> {
        let ye = dec.take_uint("Note year", 2)? as i32;
        let mo = dec.take_u8("Note month")? as i32;
        let da = dec.take_u8("Note day")? as i32;
        let ho = dec.take_u8("Note hour")? as i32;
        let mi = dec.take_u8("Note minute")? as i32;
        let se = dec.take_u8("Note second")? as i32;
        let rest = dec.rest();
        let content = std::str::from_utf8(rest)
            .map_err(|_| Error::invalid("Note content", "not valid UTF-8"))?
            .to_string();
        Ok(Note {
            time: Time::new(ye, mo, da, ho, mi, se),
            content,
        })
    }

    pub fn write_text(&self, out: &mut String) {
        out.push_str(&format!("[{}]{}", self.time.to_iso8601_sep(' '), self.content));
    }

    pub fn parse_text(s: &str) -> Result<Note> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('[') {
            if let Some((ts, content)) = rest.split_once(']') {
                let time = Time::parse_iso8601(ts.trim()).map_err(|e| Error::invalid("Note", e.to_string()))?;
                return Ok(Note::new(time, content));
            }
        }
        Ok(Note::new(Time::unset(), s))
    }

    pub fn exact_query(&self) -> String {
        let mut s = String::new();
        self.write_text(&mut s);
        format!("note:{}", s)
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        json!({
            keys.note_time: time_to_json(&self.time),
            keys.note_value: self.content,
        })
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Note> {
        let time = time_from_json(
            "Note",
            v.get(keys.note_time).ok_or_else(|| Error::invalid("Note", "missing time"))?,
        )?;
        let content = get_str("Note", v, keys.note_value)?.to_string();
        Ok(Note { time, content })
    }
}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, &self.content).cmp(&(other.time, &other.content))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let n = Note::new(Time::new(2020, 1, 2, 3, 4, 5), "rescanned");
        let mut enc = Encoder::new();
        n.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Note::decode(&mut dec).unwrap(), n);
    }

    #[test]
    fn round_trip_structured() {
        let n = Note::new(Time::new(2020, 1, 2, 3, 4, 5), "rescanned");
        let j = n.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Note::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), n);
    }

    #[test]
    fn text_round_trip() {
        let n = Note::new(Time::new(2020, 1, 2, 3, 4, 5), "rescanned");
        let mut s = String::new();
        n.write_text(&mut s);
        assert_eq!(Note::parse_text(&s).unwrap(), n);
    }
}
