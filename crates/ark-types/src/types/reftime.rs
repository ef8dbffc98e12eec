use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{time_from_json, time_to_json};
use ark_binary::{Decoder, Encoder};
use ark_time::Time;
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The Reftime metadata attribute: the point or span in time the data
/// refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reftime {
    Position(Time),
    Period(Time, Time),
}

impl Reftime {
    pub fn style_byte(&self) -> u8 {
        match self {
            Reftime::Position(_) => 1,
            Reftime::Period(..) => 2,
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Reftime::Position(_) => "POSITION",
            Reftime::Period(..) => "PERIOD",
        }
    }

    /// Start of the period this Reftime covers (itself, if a Position).
    pub fn period_begin(&self) -> Time {
        match self {
            Reftime::Position(t) => *t,
            Reftime::Period(b, _) => *b,
        }
    }

    /// End of the period this Reftime covers (itself, if a Position).
    pub fn period_end(&self) -> Time {
        match self {
            Reftime::Position(t) => *t,
            Reftime::Period(_, e) => *e,
        }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_u8(self.style_byte());
        match self {
            Reftime::Position(t) => encode_time(enc, t),
            Reftime::Period(b, e) => {
                encode_time(enc, b);
                encode_time(enc, e);
            }
        }
    }

    pub fn decode(dec: &mut Decoder) -> Result<Reftime> {
        let style = dec.take_u8("Reftime style")?;
        Ok(match style {
            1 => Reftime::Position(decode_time(dec)?),
            2 => {
                let b = decode_time(dec)?;
                let e = decode_time(dec)?;
                Reftime::Period(b, e)
            }
            other => return Err(Error::invalid("Reftime style", format!("unknown style {}", other))),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        match self {
            Reftime::Position(t) => out.push_str(&t.to_iso8601_sep(' ')),
            Reftime::Period(b, e) => {
                out.push_str(&b.to_iso8601_sep(' '));
                out.push_str(" to ");
                out.push_str(&e.to_iso8601_sep(' '));
            }
        }
    }

    pub fn parse_text(s: &str) -> Result<Reftime> {
        if let Some((b, e)) = s.split_once(" to ") {
            Ok(Reftime::Period(
                Time::parse_iso8601(b.trim()).map_err(|e| Error::invalid("Reftime", e.to_string()))?,
                Time::parse_iso8601(e.trim()).map_err(|e| Error::invalid("Reftime", e.to_string()))?,
            ))
        } else {
            Ok(Reftime::Position(
                Time::parse_iso8601(s.trim()).map_err(|e| Error::invalid("Reftime", e.to_string()))?,
            ))
        }
    }

    pub fn exact_query(&self) -> String {
        let mut s = String::new();
        self.write_text(&mut s);
        format!("reftime:={}", s)
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        match self {
            Reftime::Position(t) => json!({
                keys.type_style: self.style_name(),
                keys.reftime_position_time: time_to_json(t),
            }),
            Reftime::Period(b, e) => json!({
                keys.type_style: self.style_name(),
                keys.reftime_period_begin: time_to_json(b),
                keys.reftime_period_end: time_to_json(e),
            }),
        }
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Reftime> {
        let style = v
            .get(keys.type_style)
            .and_then(|s| s.as_str())
            .ok_or_else(|| Error::invalid("Reftime", "missing style"))?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "POSITION" => Reftime::Position(time_from_json(
                "Reftime.POSITION",
                v.get(keys.reftime_position_time)
                    .ok_or_else(|| Error::invalid("Reftime.POSITION", "missing time"))?,
            )?),
            "PERIOD" => Reftime::Period(
                time_from_json(
                    "Reftime.PERIOD",
                    v.get(keys.reftime_period_begin)
                        .ok_or_else(|| Error::invalid("Reftime.PERIOD", "missing begin"))?,
                )?,
                time_from_json(
                    "Reftime.PERIOD",
                    v.get(keys.reftime_period_end)
                        .ok_or_else(|| Error::invalid("Reftime.PERIOD", "missing end"))?,
                )?,
            ),
            other => return Err(Error::invalid("Reftime style", format!("unknown style '{}'", other))),
        })
    }
}

fn encode_time(enc: &mut Encoder, t: &Time) {
    enc.put_uint(t.ye as u64, 2);
    enc.put_u8(t.mo as u8);
    enc.put_u8(t.da as u8);
    enc.put_u8(t.ho as u8);
    enc.put_u8(t.mi as u8);
    enc.put_u8(t.se as u8);
}

fn decode_time(dec: &mut Decoder) -> Result<Time> {
    let ye = dec.take_uint("Reftime year", 2)? as i32;
    let mo = dec.take_u8("Reftime month")? as i32;
    let da = dec.take_u8("Reftime day")? as i32;
    let ho = dec.take_u8("Reftime hour")? as i32;
    let mi = dec.take_u8("Reftime minute")? as i32;
    let se = dec.take_u8("Reftime second")? as i32;
    Ok(Time::new(ye, mo, da, ho, mi, se))
}

impl PartialOrd for Reftime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reftimes compare on their time span, not on style: a Position and a
/// Period that cover the same instant are equal for ordering purposes
/// only when both their begin and end coincide (spec §4.3 natural
/// ordering of time-like attributes).
impl Ord for Reftime {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.period_begin(), self.period_end()).cmp(&(other.period_begin(), other.period_end()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn position_round_trip_binary() {
        let rt = Reftime::Position(Time::new(2015, 1, 2, 3, 4, 5));
        let mut enc = Encoder::new();
        rt.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Reftime::decode(&mut dec).unwrap(), rt);
    }

    #[test]
    fn round_trip_structured() {
        let rt = Reftime::Period(Time::new(2015, 1, 1, 0, 0, 0), Time::new(2015, 1, 2, 0, 0, 0));
        let j = rt.serialise(&crate::keys::KEYS_PYTHON);
        assert_eq!(Reftime::decode_structure(&crate::keys::KEYS_PYTHON, &j).unwrap(), rt);
    }

    #[test]
    fn period_text_round_trip() {
        let rt = Reftime::Period(Time::new(2015, 1, 1, 0, 0, 0), Time::new(2015, 1, 2, 0, 0, 0));
        let mut s = String::new();
        rt.write_text(&mut s);
        assert_eq!(Reftime::parse_text(&s).unwrap(), rt);
    }

    #[test]
    fn period_orders_by_begin_then_end() {
        let a = Reftime::Period(Time::new(2015, 1, 1, 0, 0, 0), Time::new(2015, 1, 3, 0, 0, 0));
        let b = Reftime::Period(Time::new(2015, 1, 1, 0, 0, 0), Time::new(2015, 1, 2, 0, 0, 0));
        assert!(b < a);
    }
}
