use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::get_u64;
use crate::textutil::split_style_args;
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The Run metadata attribute: which daily run a periodic product belongs
/// to, expressed as minutes since midnight (spec §4.3: `Minute(hour*60+minute)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Run {
    Minute(u32),
}

impl Run {
    pub fn style_byte(&self) -> u8 {
        match self {
            Run::Minute(_) => 1,
        }
    }

    pub fn style_name(&self) -> &'static str {
        "MINUTE"
    }

    pub fn hour_minute(hour: u32, minute: u32) -> Run {
        Run::Minute(hour * 60 + minute)
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_u8(self.style_byte());
        let Run::Minute(m) = self;
        enc.put_uint(*m as u64, 2);
    }

    pub fn decode(dec: &mut Decoder) -> Result<Run> {
        let style = dec.take_u8("Run style")?;
        match style {
            1 => Ok(Run::Minute(dec.take_uint("Run.MINUTE value", 2)? as u32)),
            other => Err(Error::invalid("Run style", format!("unknown style {}", other))),
        }
    }

    pub fn write_text(&self, out: &mut String) {
        let Run::Minute(m) = self;
        out.push_str(&format!("MINUTE({:02}:{:02})", m / 60, m % 60));
    }

    pub fn parse_text(s: &str) -> Result<Run> {
        let (style, args) = split_style_args(s)?;
        match style.to_ascii_uppercase().as_str() {
            "MINUTE" => {
                let arg = args.first().ok_or_else(|| Error::invalid("Run.MINUTE", "missing argument"))?;
                if let Some((h, m)) = arg.split_once(':') {
                    let h: u32 = h.trim().parse().map_err(|_| Error::invalid("Run.MINUTE", "invalid hour"))?;
                    let m: u32 = m.trim().parse().map_err(|_| Error::invalid("Run.MINUTE", "invalid minute"))?;
                    Ok(Run::hour_minute(h, m))
                } else {
                    let m: u32 = arg.trim().parse().map_err(|_| Error::invalid("Run.MINUTE", "invalid value"))?;
                    Ok(Run::Minute(m))
                }
            }
            other => Err(Error::invalid("Run style", format!("unknown style '{}'", other))),
        }
    }

    pub fn exact_query(&self) -> String {
        let mut args = String::new();
        self.write_text(&mut args);
        format!("run:{}", args.replacen('(', ",", 1).trim_end_matches(')'))
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        let Run::Minute(m) = self;
        json!({
            keys.type_style: self.style_name(),
            keys.run_value: m,
        })
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Run> {
        Ok(Run::Minute(get_u64("Run", v, keys.run_value)? as u32))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let r = Run::hour_minute(12, 0);
        let mut enc = Encoder::new();
        r.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Run::decode(&mut dec).unwrap(), r);
    }

    #[test]
    fn round_trip_structured() {
        let r = Run::hour_minute(6, 30);
        let j = r.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Run::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), r);
    }

    #[test]
    fn text_round_trip() {
        let r = Run::hour_minute(0, 0);
        let mut s = String::new();
        r.write_text(&mut s);
        assert_eq!(s, "MINUTE(00:00)");
        assert_eq!(Run::parse_text(&s).unwrap(), r);
    }
}
