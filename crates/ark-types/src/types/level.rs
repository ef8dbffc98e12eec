use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{get_i64, get_str};
use crate::textutil::{format_int_or_missing, parse_int_or_missing, split_style_args};
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

pub const MISSING_TYPE: i64 = 255;
pub const MISSING_VALUE: i64 = 0xFFFF_FFFF;

/// Significance class of a GRIB1 level type: which of l1/l2 actually carry
/// meaning (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Ignore,
    UseL1,
    UseBoth,
}

/// Fixed lookup table mapping a GRIB1 level type to its significance class.
/// Unknown types conservatively use both fields (never silently drops data;
/// see DESIGN.md).
pub fn grib1_significance(level_type: u8) -> Significance {
    match level_type {
        1 | 103 | 105 | 109 | 111 | 113 | 115 | 117 | 119 | 125 | 160 | 200 | 201 => {
            Significance::Ignore
        }
        100 | 102 | 128 => Significance::UseL1,
        101 | 104 | 106 | 108 | 110 | 112 | 114 | 116 | 118 | 120 | 121 | 141 => {
            Significance::UseBoth
        }
        _ => Significance::UseBoth,
    }
}

/// The Level metadata attribute: vertical level or layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    Grib1 { ltype: u8, l1: u32, l2: u32 },
    Grib2S { ltype: u8, scale: u8, value: u32 },
    Grib2D {
        ltype1: u8,
        scale1: u8,
        value1: u32,
        ltype2: u8,
        scale2: u8,
        value2: u32,
    },
    Odimh5 { min: f64, max: f64 },
}

impl Level {
    pub fn style_byte(&self) -> u8 {
        match self {
            Level::Grib1 { .. } => 1,
            Level::Grib2S { .. } => 2,
            Level::Grib2D { .. } => 3,
            Level::Odimh5 { .. } => 4,
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Level::Grib1 { .. } => "GRIB1",
            Level::Grib2S { .. } => "GRIB2S",
            Level::Grib2D { .. } => "GRIB2D",
            Level::Odimh5 { .. } => "ODIMH5",
        }
    }

    /// Masks off fields the significance table says are unused, so
    /// equality/canonical form ignore them as documented.
    pub fn canonical_grib1(ltype: u8, l1: u32, l2: u32) -> (u8, u32, u32) {
        match grib1_significance(ltype) {
            Significance::Ignore => (ltype, 0, 0),
            Significance::UseL1 => (ltype, l1, 0),
            Significance::UseBoth => (ltype, l1, l2),
        }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_u8(self.style_byte());
        match self {
            Level::Grib1 { ltype, l1, l2 } => {
                let (t, a, b) = Level::canonical_grib1(*ltype, *l1, *l2);
                enc.put_u8(t);
                enc.put_uint(a as u64, 4);
                enc.put_uint(b as u64, 4);
            }
            Level::Grib2S { ltype, scale, value } => {
                enc.put_u8(*ltype);
                enc.put_u8(*scale);
                enc.put_uint(*value as u64, 4);
            }
            Level::Grib2D {
                ltype1,
                scale1,
                value1,
                ltype2,
                scale2,
                value2,
            } => {
                enc.put_u8(*ltype1);
                enc.put_u8(*scale1);
                enc.put_uint(*value1 as u64, 4);
                enc.put_u8(*ltype2);
                enc.put_u8(*scale2);
                enc.put_uint(*value2 as u64, 4);
            }
            Level::Odimh5 { min, max } => {
                enc.put_uint(min.to_bits(), 8);
                enc.put_uint(max.to_bits(), 8);
            }
        }
    }

    pub fn decode(dec: &mut Decoder) -> Result<Level> {
        let style = dec.take_u8("Level style")?;
        Ok(match style {
            1 => Level::Grib1 {
                ltype: dec.take_u8("Level.GRIB1 type")?,
                l1: dec.take_uint("Level.GRIB1 l1", 4)? as u32,
                l2: dec.take_uint("Level.GRIB1 l2", 4)? as u32,
            },
            2 => Level::Grib2S {
                ltype: dec.take_u8("Level.GRIB2S type")?,
                scale: dec.take_u8("Level.GRIB2S scale")?,
                value: dec.take_uint("Level.GRIB2S value", 4)? as u32,
            },
            3 => Level::Grib2D {
                ltype1: dec.take_u8("Level.GRIB2D type1")?,
                scale1: dec.take_u8("Level.GRIB2D scale1")?,
                value1: dec.take_uint("Level.GRIB2D value1", 4)? as u32,
                ltype2: dec.take_u8("Level.GRIB2D type2")?,
                scale2: dec.take_u8("Level.GRIB2D scale2")?,
                value2: dec.take_uint("Level.GRIB2D value2", 4)? as u32,
            },
            4 => Level::Odimh5 {
                min: f64::from_bits(dec.take_uint("Level.ODIMH5 min", 8)?),
                max: f64::from_bits(dec.take_uint("Level.ODIMH5 max", 8)?),
            },
            other => return Err(Error::invalid("Level style", format!("unknown style {}", other))),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        match self {
            Level::Grib1 { ltype, l1, l2 } => {
                out.push_str(&format!("GRIB1({}, {}, {})", ltype, l1, l2))
            }
            Level::Grib2S { ltype, scale, value } => out.push_str(&format!(
                "GRIB2S({}, {}, {})",
                format_int_or_missing(*ltype as i64, MISSING_TYPE),
                format_int_or_missing(*scale as i64, MISSING_TYPE),
                format_int_or_missing(*value as i64, MISSING_VALUE),
            )),
            Level::Grib2D {
                ltype1,
                scale1,
                value1,
                ltype2,
                scale2,
                value2,
            } => out.push_str(&format!(
                "GRIB2D({}, {}, {}, {}, {}, {})",
                format_int_or_missing(*ltype1 as i64, MISSING_TYPE),
                format_int_or_missing(*scale1 as i64, MISSING_TYPE),
                format_int_or_missing(*value1 as i64, MISSING_VALUE),
                format_int_or_missing(*ltype2 as i64, MISSING_TYPE),
                format_int_or_missing(*scale2 as i64, MISSING_TYPE),
                format_int_or_missing(*value2 as i64, MISSING_VALUE),
            )),
            Level::Odimh5 { min, max } => out.push_str(&format!("ODIMH5({}, {})", min, max)),
        }
    }

    pub fn parse_text(s: &str) -> Result<Level> {
        let (style, args) = split_style_args(s)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB1" => {
                require(&args, 3, "Level.GRIB1")?;
                Level::Grib1 {
                    ltype: args[0].trim().parse().map_err(|_| bad("Level.GRIB1"))?,
                    l1: args[1].trim().parse().map_err(|_| bad("Level.GRIB1"))?,
                    l2: args[2].trim().parse().map_err(|_| bad("Level.GRIB1"))?,
                }
            }
            "GRIB2S" => {
                require(&args, 3, "Level.GRIB2S")?;
                Level::Grib2S {
                    ltype: parse_int_or_missing(args[0], MISSING_TYPE)? as u8,
                    scale: parse_int_or_missing(args[1], MISSING_TYPE)? as u8,
                    value: parse_int_or_missing(args[2], MISSING_VALUE)? as u32,
                }
            }
            "GRIB2D" => {
                require(&args, 6, "Level.GRIB2D")?;
                Level::Grib2D {
                    ltype1: parse_int_or_missing(args[0], MISSING_TYPE)? as u8,
                    scale1: parse_int_or_missing(args[1], MISSING_TYPE)? as u8,
                    value1: parse_int_or_missing(args[2], MISSING_VALUE)? as u32,
                    ltype2: parse_int_or_missing(args[3], MISSING_TYPE)? as u8,
                    scale2: parse_int_or_missing(args[4], MISSING_TYPE)? as u8,
                    value2: parse_int_or_missing(args[5], MISSING_VALUE)? as u32,
                }
            }
            "ODIMH5" => {
                require(&args, 2, "Level.ODIMH5")?;
                Level::Odimh5 {
                    min: args[0].trim().parse().map_err(|_| bad("Level.ODIMH5"))?,
                    max: args[1].trim().parse().map_err(|_| bad("Level.ODIMH5"))?,
                }
            }
            other => return Err(Error::invalid("Level style", format!("unknown style '{}'", other))),
        })
    }

    pub fn exact_query(&self) -> String {
        let mut args = String::new();
        self.write_text(&mut args);
        format!("level:{}", args.replacen('(', ",", 1).trim_end_matches(')'))
    }

    pub fn serialise(&self, keys: &Keys) -> Json {
        match self {
            Level::Grib1 { ltype, l1, l2 } => json!({
                keys.type_style: self.style_name(),
                keys.level_type: ltype,
                keys.level_l1: l1,
                keys.level_l2: l2,
            }),
            Level::Grib2S { ltype, scale, value } => json!({
                keys.type_style: self.style_name(),
                keys.level_type: ltype,
                keys.level_scale: scale,
                keys.level_value: value,
            }),
            Level::Grib2D {
                ltype1,
                scale1,
                value1,
                ltype2,
                scale2,
                value2,
            } => json!({
                keys.type_style: self.style_name(),
                keys.level_type1: ltype1,
                keys.level_scale1: scale1,
                keys.level_value1: value1,
                keys.level_type2: ltype2,
                keys.level_scale2: scale2,
                keys.level_value2: value2,
            }),
            Level::Odimh5 { min, max } => json!({
                keys.type_style: self.style_name(),
                keys.level_min: min,
                keys.level_max: max,
            }),
        }
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Level> {
        let style = get_str("Level", v, keys.type_style)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB1" => Level::Grib1 {
                ltype: get_i64("Level.GRIB1", v, keys.level_type)? as u8,
                l1: get_i64("Level.GRIB1", v, keys.level_l1)? as u32,
                l2: get_i64("Level.GRIB1", v, keys.level_l2)? as u32,
            },
            "GRIB2S" => Level::Grib2S {
                ltype: get_i64("Level.GRIB2S", v, keys.level_type)? as u8,
                scale: get_i64("Level.GRIB2S", v, keys.level_scale)? as u8,
                value: get_i64("Level.GRIB2S", v, keys.level_value)? as u32,
            },
            "GRIB2D" => Level::Grib2D {
                ltype1: get_i64("Level.GRIB2D", v, keys.level_type1)? as u8,
                scale1: get_i64("Level.GRIB2D", v, keys.level_scale1)? as u8,
                value1: get_i64("Level.GRIB2D", v, keys.level_value1)? as u32,
                ltype2: get_i64("Level.GRIB2D", v, keys.level_type2)? as u8,
                scale2: get_i64("Level.GRIB2D", v, keys.level_scale2)? as u8,
                value2: get_i64("Level.GRIB2D", v, keys.level_value2)? as u32,
            },
            "ODIMH5" => {
                let min = v
                    .get(keys.level_min)
                    .and_then(|x| x.as_f64())
                    .ok_or_else(|| Error::invalid("Level.ODIMH5", "missing min"))?;
                let max = v
                    .get(keys.level_max)
                    .and_then(|x| x.as_f64())
                    .ok_or_else(|| Error::invalid("Level.ODIMH5", "missing max"))?;
                Level::Odimh5 { min, max }
            }
            other => return Err(Error::invalid("Level style", format!("unknown style '{}'", other))),
        })
    }
}

fn require(args: &[&str], n: usize, what: &str) -> Result<()> {
    if args.len() != n {
        return Err(Error::invalid(what, format!("expected {} arguments", n)));
    }
    Ok(())
}

fn bad(what: &str) -> Error {
    Error::invalid(what, "invalid argument")
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// GRIB2 missing-value sentinels sort higher than any present value
/// (documented legacy behavior, spec §4.3 / §9 Open Questions #3).
fn grib2_key(ltype: u8, scale: u8, value: u32) -> (bool, u8, bool, u8, bool, u32) {
    (
        ltype == MISSING_TYPE as u8,
        ltype,
        scale == MISSING_TYPE as u8,
        scale,
        value == MISSING_VALUE as u32,
        value,
    )
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.style_byte().cmp(&other.style_byte()).then_with(|| match (self, other) {
            (Level::Grib1 { ltype: t1, l1: a1, l2: b1 }, Level::Grib1 { ltype: t2, l1: a2, l2: b2 }) => {
                let (ct1, ca1, cb1) = Level::canonical_grib1(*t1, *a1, *b1);
                let (ct2, ca2, cb2) = Level::canonical_grib1(*t2, *a2, *b2);
                (ct1, ca1, cb1).cmp(&(ct2, ca2, cb2))
            }
            (
                Level::Grib2S { ltype: t1, scale: s1, value: v1 },
                Level::Grib2S { ltype: t2, scale: s2, value: v2 },
            ) => grib2_key(*t1, *s1, *v1).cmp(&grib2_key(*t2, *s2, *v2)),
            (
                Level::Grib2D { ltype1: t1, scale1: s1, value1: v1, ltype2: t1b, scale2: s1b, value2: v1b },
                Level::Grib2D { ltype1: t2, scale1: s2, value1: v2, ltype2: t2b, scale2: s2b, value2: v2b },
            ) => grib2_key(*t1, *s1, *v1)
                .cmp(&grib2_key(*t2, *s2, *v2))
                .then_with(|| grib2_key(*t1b, *s1b, *v1b).cmp(&grib2_key(*t2b, *s2b, *v2b))),
            (Level::Odimh5 { min: a1, max: b1 }, Level::Odimh5 { min: a2, max: b2 }) => a1
                .partial_cmp(a2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b1.partial_cmp(b2).unwrap_or(Ordering::Equal)),
            _ => Ordering::Equal,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grib1_surface_ignores_l1_l2() {
        let a = Level::Grib1 { ltype: 1, l1: 5, l2: 9 };
        let b = Level::Grib1 { ltype: 1, l1: 0, l2: 0 };
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn grib2s_missing_sorts_last() {
        let present = Level::Grib2S { ltype: 100, scale: 0, value: 500 };
        let missing = Level::Grib2S {
            ltype: MISSING_TYPE as u8,
            scale: MISSING_TYPE as u8,
            value: MISSING_VALUE as u32,
        };
        assert_eq!(present.cmp(&missing), Ordering::Less);
    }

    #[test]
    fn round_trip_structured() {
        let l = Level::Grib2D {
            ltype1: 100,
            scale1: 0,
            value1: 500,
            ltype2: 100,
            scale2: 0,
            value2: 1000,
        };
        let j = l.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Level::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), l);
    }

    #[test]
    fn grib2d_text_missing_dash() {
        let l = Level::Grib2D {
            ltype1: 100,
            scale1: 100,
            value1: 500,
            ltype2: 100,
            scale2: 100,
            value2: 1000,
        };
        let mut s = String::new();
        l.write_text(&mut s);
        assert_eq!(s, "GRIB2D(100, 100, 500, 100, 100, 1000)");
        assert_eq!(Level::parse_text(&s).unwrap(), l);
    }
}
