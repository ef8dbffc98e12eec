use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{get_str, get_u64};
use crate::textutil::{format_args, split_style_args};
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The Origin metadata attribute: which centre produced the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Grib1 {
        centre: u8,
        subcentre: u8,
        process: u8,
    },
    Grib2 {
        centre: u16,
        subcentre: u16,
        proc_type: u8,
        bg_proc: u8,
        proc_id: u8,
    },
    Bufr {
        centre: u8,
        subcentre: u8,
    },
    Odimh5 {
        wmo: String,
        rad: String,
        plc: String,
    },
}

impl Origin {
    pub fn style_byte(&self) -> u8 {
        match self {
            Origin::Grib1 { .. } => 1,
            Origin::Grib2 { .. } => 2,
            Origin::Bufr { .. } => 3,
            Origin::Odimh5 { .. } => 4,
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Origin::Grib1 { .. } => "GRIB1",
            Origin::Grib2 { .. } => "GRIB2",
            Origin::Bufr { .. } => "BUFR",
            Origin::Odimh5 { .. } => "ODIMH5",
        }
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_u8(self.style_byte());
        match self {
            Origin::Grib1 {
                centre,
                subcentre,
                process,
            } => {
                enc.put_u8(*centre);
                enc.put_u8(*subcentre);
                enc.put_u8(*process);
            }
            Origin::Grib2 {
                centre,
                subcentre,
                proc_type,
                bg_proc,
                proc_id,
            } => {
                enc.put_uint(*centre as u64, 2);
                enc.put_uint(*subcentre as u64, 2);
                enc.put_u8(*proc_type);
                enc.put_u8(*bg_proc);
                enc.put_u8(*proc_id);
            }
            Origin::Bufr { centre, subcentre } => {
                enc.put_u8(*centre);
                enc.put_u8(*subcentre);
            }
            Origin::Odimh5 { wmo, rad, plc } => {
                for s in [wmo, rad, plc] {
                    enc.put_varint_usize(s.len());
                    enc.put_bytes(s.as_bytes());
                }
            }
        }
    }

    pub fn decode(dec: &mut Decoder) -> Result<Origin> {
        let style = dec.take_u8("Origin style")?;
        Ok(match style {
            1 => Origin::Grib1 {
                centre: dec.take_u8("Origin.GRIB1 centre")?,
                subcentre: dec.take_u8("Origin.GRIB1 subcentre")?,
                process: dec.take_u8("Origin.GRIB1 process")?,
            },
            2 => Origin::Grib2 {
                centre: dec.take_uint("Origin.GRIB2 centre", 2)? as u16,
                subcentre: dec.take_uint("Origin.GRIB2 subcentre", 2)? as u16,
                proc_type: dec.take_u8("Origin.GRIB2 proc_type")?,
                bg_proc: dec.take_u8("Origin.GRIB2 bg_proc")?,
                proc_id: dec.take_u8("Origin.GRIB2 proc_id")?,
            },
            3 => Origin::Bufr {
                centre: dec.take_u8("Origin.BUFR centre")?,
                subcentre: dec.take_u8("Origin.BUFR subcentre")?,
            },
            4 => {
                let wmo = decode_str(dec, "Origin.ODIMH5 wmo")?;
                let rad = decode_str(dec, "Origin.ODIMH5 rad")?;
                let plc = decode_str(dec, "Origin.ODIMH5 plc")?;
                Origin::Odimh5 { wmo, rad, plc }
            }
            other => return Err(Error::invalid("Origin style", format!("unknown style {}", other))),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        let args: Vec<String> = match self {
            Origin::Grib1 {
                centre,
                subcentre,
                process,
            } => vec![centre.to_string(), subcentre.to_string(), process.to_string()],
            Origin::Grib2 {
                centre,
                subcentre,
                proc_type,
                bg_proc,
                proc_id,
            } => vec![
                centre.to_string(),
                subcentre.to_string(),
                proc_type.to_string(),
                bg_proc.to_string(),
                proc_id.to_string(),
            ],
            Origin::Bufr { centre, subcentre } => vec![centre.to_string(), subcentre.to_string()],
            Origin::Odimh5 { wmo, rad, plc } => vec![wmo.clone(), rad.clone(), plc.clone()],
        };
        out.push_str(&format_args(self.style_name(), &args));
    }

    pub fn parse_text(s: &str) -> Result<Origin> {
        let (style, args) = split_style_args(s)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB1" => {
                require_args(&args, 3, "Origin.GRIB1")?;
                Origin::Grib1 {
                    centre: args[0].parse().map_err(|_| invalid_arg("Origin.GRIB1"))?,
                    subcentre: args[1].parse().map_err(|_| invalid_arg("Origin.GRIB1"))?,
                    process: args[2].parse().map_err(|_| invalid_arg("Origin.GRIB1"))?,
                }
            }
            "GRIB2" => {
                require_args(&args, 5, "Origin.GRIB2")?;
                Origin::Grib2 {
                    centre: args[0].parse().map_err(|_| invalid_arg("Origin.GRIB2"))?,
                    subcentre: args[1].parse().map_err(|_| invalid_arg("Origin.GRIB2"))?,
                    proc_type: args[2].parse().map_err(|_| invalid_arg("Origin.GRIB2"))?,
                    bg_proc: args[3].parse().map_err(|_| invalid_arg("Origin.GRIB2"))?,
                    proc_id: args[4].parse().map_err(|_| invalid_arg("Origin.GRIB2"))?,
                }
            }
            "BUFR" => {
                require_args(&args, 2, "Origin.BUFR")?;
                Origin::Bufr {
                    centre: args[0].parse().map_err(|_| invalid_arg("Origin.BUFR"))?,
                    subcentre: args[1].parse().map_err(|_| invalid_arg("Origin.BUFR"))?,
                }
            }
            "ODIMH5" => {
                require_args(&args, 3, "Origin.ODIMH5")?;
                Origin::Odimh5 {
                    wmo: args[0].to_string(),
                    rad: args[1].to_string(),
                    plc: args[2].to_string(),
                }
            }
            other => return Err(Error::invalid("Origin style", format!("unknown style '{}'", other))),
        })
    }

    pub fn exact_query(&self) -> String {
        let mut args = String::new();
        self.write_text(&mut args);
        format!("origin:{}", args.replacen('(', ",", 1).replace(')', ""))
    }

    /// Structured form (spec §4.3 `serialise`): a JSON object keyed by
    /// `keys.type_style` plus the style's own fields, named from `keys`.
    pub fn serialise(&self, keys: &Keys) -> Json {
        match self {
            Origin::Grib1 { centre, subcentre, process } => json!({
                keys.type_style: self.style_name(),
                keys.origin_centre: centre,
                keys.origin_subcentre: subcentre,
                keys.origin_process: process,
            }),
            Origin::Grib2 { centre, subcentre, proc_type, bg_proc, proc_id } => json!({
                keys.type_style: self.style_name(),
                keys.origin_centre: centre,
                keys.origin_subcentre: subcentre,
                keys.origin_process_type: proc_type,
                keys.origin_background_process_id: bg_proc,
                keys.origin_process_id: proc_id,
            }),
            Origin::Bufr { centre, subcentre } => json!({
                keys.type_style: self.style_name(),
                keys.origin_centre: centre,
                keys.origin_subcentre: subcentre,
            }),
            Origin::Odimh5 { wmo, rad, plc } => json!({
                keys.type_style: self.style_name(),
                keys.origin_wmo: wmo,
                keys.origin_rad: rad,
                keys.origin_plc: plc,
            }),
        }
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Origin> {
        let style = get_str("Origin", v, keys.type_style)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB1" => Origin::Grib1 {
                centre: get_u64("Origin.GRIB1", v, keys.origin_centre)? as u8,
                subcentre: get_u64("Origin.GRIB1", v, keys.origin_subcentre)? as u8,
                process: get_u64("Origin.GRIB1", v, keys.origin_process)? as u8,
            },
            "GRIB2" => Origin::Grib2 {
                centre: get_u64("Origin.GRIB2", v, keys.origin_centre)? as u16,
                subcentre: get_u64("Origin.GRIB2", v, keys.origin_subcentre)? as u16,
                proc_type: get_u64("Origin.GRIB2", v, keys.origin_process_type)? as u8,
                bg_proc: get_u64("Origin.GRIB2", v, keys.origin_background_process_id)? as u8,
                proc_id: get_u64("Origin.GRIB2", v, keys.origin_process_id)? as u8,
            },
            "BUFR" => Origin::Bufr {
                centre: get_u64("Origin.BUFR", v, keys.origin_centre)? as u8,
                subcentre: get_u64("Origin.BUFR", v, keys.origin_subcentre)? as u8,
            },
            "ODIMH5" => Origin::Odimh5 {
                wmo: get_str("Origin.ODIMH5", v, keys.origin_wmo)?.to_string(),
                rad: get_str("Origin.ODIMH5", v, keys.origin_rad)?.to_string(),
                plc: get_str("Origin.ODIMH5", v, keys.origin_plc)?.to_string(),
            },
            other => return Err(Error::invalid("Origin style", format!("unknown style '{}'", other))),
        })
    }
}

fn decode_str(dec: &mut Decoder, what: &str) -> Result<String> {
    let len = dec.take_varint_usize(what)?;
    let bytes = dec.take(what, len)?;
    Ok(std::str::from_utf8(bytes)
        .map_err(|_| Error::invalid(what, "not valid UTF-8"))?
        .to_string())
}

fn require_args(args: &[&str], n: usize, what: &str) -> Result<()> {
    if args.len() != n {
        return Err(Error::invalid(what, format!("expected {} arguments, got {}", n, args.len())));
    }
    Ok(())
}

fn invalid_arg(what: &str) -> Error {
    Error::invalid(what, "invalid numeric argument")
}

impl PartialOrd for Origin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Origin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.style_byte().cmp(&other.style_byte()).then_with(|| match (self, other) {
            (
                Origin::Grib1 {
                    centre: c1,
                    subcentre: s1,
                    process: p1,
                },
                Origin::Grib1 {
                    centre: c2,
                    subcentre: s2,
                    process: p2,
                },
            ) => (c1, s1, p1).cmp(&(c2, s2, p2)),
            (
                Origin::Grib2 {
                    centre: c1,
                    subcentre: s1,
                    proc_type: pt1,
                    bg_proc: bp1,
                    proc_id: pi1,
                },
                Origin::Grib2 {
                    centre: c2,
                    subcentre: s2,
                    proc_type: pt2,
                    bg_proc: bp2,
                    proc_id: pi2,
                },
            ) => (c1, s1, pt1, bp1, pi1).cmp(&(c2, s2, pt2, bp2, pi2)),
            (
                Origin::Bufr {
                    centre: c1,
                    subcentre: s1,
                },
                Origin::Bufr {
                    centre: c2,
                    subcentre: s2,
                },
            ) => (c1, s1).cmp(&(c2, s2)),
            (
                Origin::Odimh5 {
                    wmo: w1,
                    rad: r1,
                    plc: p1,
                },
                Origin::Odimh5 {
                    wmo: w2,
                    rad: r2,
                    plc: p2,
                },
            ) => (w1, r1, p1).cmp(&(w2, r2, p2)),
            _ => Ordering::Equal,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_binary() {
        let o = Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        };
        let mut enc = Encoder::new();
        o.encode_payload(&mut enc);
        let bytes = enc.into_vec();
        assert_eq!(bytes, vec![1, 1, 2, 3]);
        let mut dec = Decoder::new(&bytes);
        assert_eq!(Origin::decode(&mut dec).unwrap(), o);
    }

    #[test]
    fn round_trip_structured() {
        let o = Origin::Odimh5 {
            wmo: "01".to_string(),
            rad: "it".to_string(),
            plc: "spc".to_string(),
        };
        let j = o.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Origin::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), o);
        let j = o.serialise(&crate::keys::KEYS_PYTHON);
        assert_eq!(Origin::decode_structure(&crate::keys::KEYS_PYTHON, &j).unwrap(), o);
    }

    #[test]
    fn round_trip_text() {
        let o = Origin::Grib2 {
            centre: 200,
            subcentre: 0,
            proc_type: 0,
            bg_proc: 0,
            proc_id: 1,
        };
        let mut s = String::new();
        o.write_text(&mut s);
        assert_eq!(s, "GRIB2(200, 0, 0, 0, 1)");
        assert_eq!(Origin::parse_text(&s).unwrap(), o);
    }
}
