use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{get_str, time_from_json, time_to_json};
use ark_binary::{Decoder, Encoder};
use ark_time::Time;
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// Records which dataset a Metadata was assigned to, and when (spec §4.3).
/// Single representation, no style byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedDataset {
    pub changed: Time,
    pub name: String,
    pub id: String,
}

impl AssignedDataset {
    pub fn new(changed: Time, name: impl Into<String>, id: impl Into<String>) -> AssignedDataset {
        AssignedDataset {
            changed,
            name: name.into(),
            id: id.into(),
        }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_uint(self.changed.ye as u64, 2);
        enc.put_u8(self.changed.mo as u8);
        enc.put_u8(self.changed.da as u8);
        enc.put_u8(self.changed.ho as u8);
        enc.put_u8(self.changed.mi as u8);
        enc.put_u8(self.changed.se as u8);
        enc.put_varint_usize(self.name.len());
        enc.put_bytes(self.name.as_bytes());
        enc.put_bytes(self.id.as_bytes());
    }

    pub fn decode(dec: &mut Decoder) -> Result<AssignedDataset> {
        let ye = dec.take_uint("AssignedDataset year", 2)? as i32;
        let mo = dec.take_u8("AssignedDataset month")? as i32;
        let da = dec.take_u8("AssignedDataset day")? as i32;
        let ho = dec.take_u8("AssignedDataset hour")? as i32;
        let mi = dec.take_u8("AssignedDataset minute")? as i32;
        let se = dec.take_u8("AssignedDataset second")? as i32;
        let name_len = dec.take_varint_usize("AssignedDataset name length")?;
        let name_bytes = dec.take("AssignedDataset name", name_len)?;
        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| Error::invalid("AssignedDataset name", "not valid UTF-8"))?
            .to_string();
        let id_bytes = dec.rest();
        let id = std::str::from_utf8(id_bytes)
            .map_err(|_| Error::invalid("AssignedDataset id", "not valid UTF-8"))?
            .to_string();
        Ok(AssignedDataset {
            changed: Time::new(ye, mo, da, ho, mi, se),
            name,
            id,
        })
    }

    pub fn write_text(&self, out: &mut String) {
        out.push_str(&format!(
            "{}, {}: {}",
            self.changed.to_iso8601_sep(' '),
            self.name,
            self.id
        ));
    }

    pub fn parse_text(s: &str) -> Result<AssignedDataset> {
        let (ts, rest) = s
            .split_once(", ")
            .ok_or_else(|| Error::invalid("AssignedDataset", "missing ', ' separator"))?;
        let (name, id) = rest
            .split_once(": ")
            .ok_or_else(|| Error::invalid("AssignedDataset", "missing ': ' separator"))?;
        let changed = Time::parse_iso8601(ts.trim()).map_err(|e| Error::invalid("AssignedDataset", e.to_string()))?;
        Ok(AssignedDataset::new(changed, name.trim(), id.trim()))
    }

    pub fn exact_query(&self) -> String {
        let mut s = String::new();
        self.write_text(&mut s);
        format!("assigneddataset:{}", s)
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        json!({
            keys.assigneddataset_time: time_to_json(&self.changed),
            keys.assigneddataset_name: self.name,
            keys.assigneddataset_id: self.id,
        })
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<AssignedDataset> {
        let changed = time_from_json(
            "AssignedDataset",
            v.get(keys.assigneddataset_time)
                .ok_or_else(|| Error::invalid("AssignedDataset", "missing time"))?,
        )?;
        Ok(AssignedDataset::new(
            changed,
            get_str("AssignedDataset", v, keys.assigneddataset_name)?,
            get_str("AssignedDataset", v, keys.assigneddataset_id)?,
        ))
    }
}

impl PartialOrd for AssignedDataset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssignedDataset {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.name, &self.id, self.changed).cmp(&(&other.name, &other.id, other.changed))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let ad = AssignedDataset::new(Time::new(2020, 1, 1, 0, 0, 0), "ds1", "42");
        let mut enc = Encoder::new();
        ad.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(AssignedDataset::decode(&mut dec).unwrap(), ad);
    }

    #[test]
    fn round_trip_structured() {
        let ad = AssignedDataset::new(Time::new(2020, 1, 1, 0, 0, 0), "ds1", "42");
        let j = ad.serialise(&crate::keys::KEYS_PYTHON);
        assert_eq!(AssignedDataset::decode_structure(&crate::keys::KEYS_PYTHON, &j).unwrap(), ad);
    }

    #[test]
    fn text_round_trip() {
        let ad = AssignedDataset::new(Time::new(2020, 1, 1, 0, 0, 0), "ds1", "42");
        let mut s = String::new();
        ad.write_text(&mut s);
        assert_eq!(AssignedDataset::parse_text(&s).unwrap(), ad);
    }
}
