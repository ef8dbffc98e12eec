use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{get_u64, valuebag_from_json, valuebag_to_json};
use crate::textutil::split_style_args;
use ark_binary::{Decoder, Encoder};
use ark_value::ValueBag;
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// Seam for computing a geographical bounding box from an [`Area`]'s
/// GRIB/ODIMH5 values. Geometry computation (geos or equivalent) is out of
/// scope here; a real deployment wires in an implementation backed by a
/// geometry library.
pub trait BboxProvider {
    fn bbox(&self, area: &Area) -> Option<(f64, f64, f64, f64)>;
}

/// A `BboxProvider` that never produces a bounding box.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBbox;

impl BboxProvider for NoBbox {
    fn bbox(&self, _area: &Area) -> Option<(f64, f64, f64, f64)> {
        None
    }
}

/// The Area metadata attribute: the geographical area or layer the data
/// covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Area {
    Grib(ValueBag),
    Odimh5(ValueBag),
    Vm2 {
        station_id: u32,
        derived_values: Option<ValueBag>,
    },
}

impl Area {
    pub fn style_byte(&self) -> u8 {
        match self {
            Area::Grib(_) => 1,
            Area::Odimh5(_) => 2,
            Area::Vm2 { .. } => 3,
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Area::Grib(_) => "GRIB",
            Area::Odimh5(_) => "ODIMH5",
            Area::Vm2 { .. } => "VM2",
        }
    }

    /// Bounding box, computed on demand through the given provider. Not
    /// cached: callers that need caching keep the result themselves.
    pub fn bbox(&self, provider: &dyn BboxProvider) -> Option<(f64, f64, f64, f64)> {
        provider.bbox(self)
    }

    /// `encode_for_indexing` elides VM2 derived values (spec §3 derived-
    /// values lookup): index tables must stay stable across table updates.
    pub fn encode_for_indexing(&self, enc: &mut Encoder) {
        self.encode_payload_impl(enc, false)
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        self.encode_payload_impl(enc, true)
    }

    fn encode_payload_impl(&self, enc: &mut Encoder, include_derived: bool) {
        enc.put_u8(self.style_byte());
        match self {
            Area::Grib(values) | Area::Odimh5(values) => {
                let mut inner = Encoder::new();
                values.encode(&mut inner);
                enc.put_bytes(inner.as_slice());
            }
            Area::Vm2 {
                station_id,
                derived_values,
            } => {
                enc.put_varint(*station_id as u64);
                if include_derived {
                    if let Some(dv) = derived_values {
                        let mut inner = Encoder::new();
                        dv.encode(&mut inner);
                        enc.put_varint_usize(inner.len());
                        enc.put_bytes(inner.as_slice());
                    }
                }
            }
        }
    }

    pub fn decode(dec: &mut Decoder) -> Result<Area> {
        let style = dec.take_u8("Area style")?;
        Ok(match style {
            1 => Area::Grib(ValueBag::decode(dec)?),
            2 => Area::Odimh5(ValueBag::decode(dec)?),
            3 => {
                let station_id = dec.take_varint("Area.VM2 station_id")? as u32;
                let derived_values = if dec.is_empty() {
                    None
                } else {
                    let len = dec.take_varint_usize("Area.VM2 derived values length")?;
                    let bytes = dec.take("Area.VM2 derived values", len)?;
                    let mut vdec = Decoder::new(bytes);
                    Some(ValueBag::decode(&mut vdec)?)
                };
                Area::Vm2 {
                    station_id,
                    derived_values,
                }
            }
            other => return Err(Error::invalid("Area style", format!("unknown style {}", other))),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        match self {
            Area::Grib(values) => {
                out.push_str("GRIB(");
                out.push_str(&values.to_text());
                out.push(')');
            }
            Area::Odimh5(values) => {
                out.push_str("ODIMH5(");
                out.push_str(&values.to_text());
                out.push(')');
            }
            Area::Vm2 { station_id, .. } => {
                out.push_str(&format!("VM2({})", station_id));
            }
        }
    }

    pub fn parse_text(s: &str) -> Result<Area> {
        let (style, args) = split_style_args(s)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB" => Area::Grib(ValueBag::parse_text(&args.join(", "))?),
            "ODIMH5" => Area::Odimh5(ValueBag::parse_text(&args.join(", "))?),
            "VM2" => {
                let station_id: u32 = args
                    .first()
                    .ok_or_else(|| Error::invalid("Area.VM2", "missing station_id"))?
                    .parse()
                    .map_err(|_| Error::invalid("Area.VM2", "invalid station_id"))?;
                Area::Vm2 {
                    station_id,
                    derived_values: None,
                }
            }
            other => return Err(Error::invalid("Area style", format!("unknown style '{}'", other))),
        })
    }

    pub fn exact_query(&self) -> String {
        let mut args = String::new();
        self.write_text(&mut args);
        format!("area:{}", args.replacen('(', ",", 1).trim_end_matches(')'))
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        match self {
            Area::Grib(values) => json!({
                keys.type_style: "GRIB",
                keys.area_value: valuebag_to_json(values),
            }),
            Area::Odimh5(values) => json!({
                keys.type_style: "ODIMH5",
                keys.area_value: valuebag_to_json(values),
            }),
            Area::Vm2 { station_id, derived_values } => {
                let mut m = json!({
                    keys.type_style: "VM2",
                    keys.area_id: station_id,
                });
                if let Some(dv) = derived_values {
                    m[keys.area_value] = valuebag_to_json(dv);
                }
                m
            }
        }
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Area> {
        let style = v
            .get(keys.type_style)
            .and_then(|s| s.as_str())
            .ok_or_else(|| Error::invalid("Area", "missing style"))?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB" => Area::Grib(valuebag_from_json(
                "Area.GRIB",
                v.get(keys.area_value).unwrap_or(&Json::Object(Default::default())),
            )?),
            "ODIMH5" => Area::Odimh5(valuebag_from_json(
                "Area.ODIMH5",
                v.get(keys.area_value).unwrap_or(&Json::Object(Default::default())),
            )?),
            "VM2" => Area::Vm2 {
                station_id: get_u64("Area.VM2", v, keys.area_id)? as u32,
                derived_values: match v.get(keys.area_value) {
                    Some(dv) => Some(valuebag_from_json("Area.VM2", dv)?),
                    None => None,
                },
            },
            other => return Err(Error::invalid("Area style", format!("unknown style '{}'", other))),
        })
    }
}

impl PartialOrd for Area {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Area {
    fn cmp(&self, other: &Self) -> Ordering {
        self.style_byte().cmp(&other.style_byte()).then_with(|| {
            // Derived VM2 values never participate in ordering, matching
            // their exclusion from the index's uniqueness key.
            let mut la = Encoder::new();
            self.encode_for_indexing(&mut la);
            let mut lb = Encoder::new();
            other.encode_for_indexing(&mut lb);
            la.as_slice().cmp(lb.as_slice())
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grib_round_trip_binary() {
        let mut values = ValueBag::new();
        values.insert("lon", ark_value::Value::int(10));
        let area = Area::Grib(values);
        let mut enc = Encoder::new();
        area.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Area::decode(&mut dec).unwrap(), area);
    }

    #[test]
    fn vm2_text_round_trip() {
        let area = Area::Vm2 {
            station_id: 12345,
            derived_values: None,
        };
        let mut s = String::new();
        area.write_text(&mut s);
        assert_eq!(Area::parse_text(&s).unwrap(), area);
    }

    #[test]
    fn round_trip_structured() {
        let mut values = ValueBag::new();
        values.insert("lon", ark_value::Value::int(10));
        let area = Area::Grib(values);
        let j = area.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Area::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), area);
    }

    #[test]
    fn no_bbox_provider_returns_none() {
        let area = Area::Vm2 {
            station_id: 1,
            derived_values: None,
        };
        assert_eq!(area.bbox(&NoBbox), None);
    }
}
