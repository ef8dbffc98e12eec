use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{valuebag_from_json, valuebag_to_json};
use crate::textutil::split_style_args;
use ark_binary::{Decoder, Encoder};
use ark_value::ValueBag;
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The Proddef metadata attribute: extra product-defining values not
/// already captured by Product (spec §4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proddef {
    Grib(ValueBag),
}

impl Proddef {
    pub fn style_byte(&self) -> u8 {
        match self {
            Proddef::Grib(_) => 1,
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Proddef::Grib(_) => "GRIB",
        }
    }

    pub fn values(&self) -> &ValueBag {
        match self {
            Proddef::Grib(v) => v,
        }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_u8(self.style_byte());
        let mut inner = Encoder::new();
        self.values().encode(&mut inner);
        enc.put_bytes(inner.as_slice());
    }

    pub fn decode(dec: &mut Decoder) -> Result<Proddef> {
        let style = dec.take_u8("Proddef style")?;
        Ok(match style {
            1 => Proddef::Grib(ValueBag::decode(dec)?),
            other => return Err(Error::invalid("Proddef style", format!("unknown style {}", other))),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        out.push_str(self.style_name());
        out.push('(');
        out.push_str(&self.values().to_text());
        out.push(')');
    }

    pub fn parse_text(s: &str) -> Result<Proddef> {
        let (style, args) = split_style_args(s)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB" => Proddef::Grib(ValueBag::parse_text(&args.join(", "))?),
            other => return Err(Error::invalid("Proddef style", format!("unknown style '{}'", other))),
        })
    }

    pub fn exact_query(&self) -> String {
        let mut args = String::new();
        self.write_text(&mut args);
        format!("proddef:{}", args.replacen('(', ",", 1).trim_end_matches(')'))
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        json!({
            keys.type_style: self.style_name(),
            keys.proddef_value: valuebag_to_json(self.values()),
        })
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Proddef> {
        let style = v
            .get(keys.type_style)
            .and_then(|s| s.as_str())
            .ok_or_else(|| Error::invalid("Proddef", "missing style"))?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB" => Proddef::Grib(valuebag_from_json(
                "Proddef.GRIB",
                v.get(keys.proddef_value).unwrap_or(&Json::Object(Default::default())),
            )?),
            other => return Err(Error::invalid("Proddef style", format!("unknown style '{}'", other))),
        })
    }
}

impl PartialOrd for Proddef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Proddef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.style_byte()
            .cmp(&other.style_byte())
            .then_with(|| self.values().cmp(other.values()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grib_round_trip_binary() {
        let mut values = ValueBag::new();
        values.insert("tod", ark_value::Value::int(1));
        let pd = Proddef::Grib(values);
        let mut enc = Encoder::new();
        pd.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Proddef::decode(&mut dec).unwrap(), pd);
    }

    #[test]
    fn round_trip_structured() {
        let mut values = ValueBag::new();
        values.insert("tod", ark_value::Value::int(1));
        let pd = Proddef::Grib(values);
        let j = pd.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Proddef::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), pd);
    }

    #[test]
    fn text_round_trip() {
        let mut values = ValueBag::new();
        values.insert("tod", ark_value::Value::int(1));
        let pd = Proddef::Grib(values);
        let mut s = String::new();
        pd.write_text(&mut s);
        assert_eq!(Proddef::parse_text(&s).unwrap(), pd);
    }
}
