use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::get_i64;
use crate::textutil::{format_args, split_style_args};
use ark_binary::{Decoder, Encoder};
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// Sentinel marking an absent step/stat in a [`Timedef`] (spec §4.3).
pub const MISSING_UNIT: u8 = 255;

/// Proc (statistical processing) type codes used by the Timedef
/// projection. 254 means "instant, no statistical processing".
pub const PROC_INSTANT: u8 = 254;
pub const PROC_AVERAGE: u8 = 0;
pub const PROC_ACCUMULATION: u8 = 1;
pub const PROC_DIFFERENCE: u8 = 2;

/// Whether a GRIB1/GRIB2 timerange unit code counts seconds or months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Seconds(i64),
    Months(i64),
}

/// Fixed unit table (spec §4.3). Seconds-based codes follow the GRIB1
/// standard's hour/day multiples; 3..7 are the months-based codes
/// (month/year/decade/normal/century). See DESIGN.md Open Question #2 for
/// why this implementation keeps the two sub-tables disjoint rather than
/// the literally-transcribed, self-conflicting spec table.
pub fn grib1_unit(unit: u8) -> Option<UnitKind> {
    match unit {
        0 => Some(UnitKind::Seconds(60)),
        1 => Some(UnitKind::Seconds(3600)),
        2 => Some(UnitKind::Seconds(86400)),
        10 => Some(UnitKind::Seconds(3 * 3600)),
        11 => Some(UnitKind::Seconds(6 * 3600)),
        12 => Some(UnitKind::Seconds(12 * 3600)),
        13 => Some(UnitKind::Seconds(15 * 60)),
        14 => Some(UnitKind::Seconds(30 * 60)),
        254 => Some(UnitKind::Seconds(1)),
        3 => Some(UnitKind::Months(1)),
        4 => Some(UnitKind::Months(12)),
        5 => Some(UnitKind::Months(120)),
        6 => Some(UnitKind::Months(360)),
        7 => Some(UnitKind::Months(1200)),
        _ => None,
    }
}

/// Canonical projection of any timerange onto a step + statistical
/// processing description (spec §4.3 "Timerange-to-Timedef").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timedef {
    pub step_unit: u8,
    pub step_len: u32,
    pub stat_type: u8,
    pub stat_unit: u8,
    pub stat_len: u32,
}

impl Timedef {
    pub fn missing_step() -> (u8, u32) {
        (MISSING_UNIT, 0)
    }

    /// `(amount, is_seconds)` for the forecast step.
    pub fn forecast_step(&self) -> (i64, bool) {
        unit_amount(self.step_unit, self.step_len)
    }

    pub fn proc_type(&self) -> u8 {
        self.stat_type
    }

    /// `(amount, is_seconds)` for the statistical processing duration.
    pub fn proc_duration(&self) -> (i64, bool) {
        if self.stat_unit == MISSING_UNIT {
            (0, true)
        } else {
            unit_amount(self.stat_unit, self.stat_len)
        }
    }
}

fn unit_amount(unit: u8, len: u32) -> (i64, bool) {
    match grib1_unit(unit) {
        Some(UnitKind::Seconds(s)) => (s * len as i64, true),
        Some(UnitKind::Months(m)) => (m * len as i64, false),
        None => (len as i64, true),
    }
}

/// The Timerange metadata attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timerange {
    Grib1 { ttype: u8, unit: u8, p1: u32, p2: u32 },
    Grib2 { ttype: u8, unit: u8, p1: u32, p2: u32 },
    Timedef(Timedef),
    Bufr { unit: u8, value: i32 },
}

impl Timerange {
    pub fn style_byte(&self) -> u8 {
        match self {
            Timerange::Grib1 { .. } => 1,
            Timerange::Grib2 { .. } => 2,
            Timerange::Timedef(_) => 3,
            Timerange::Bufr { .. } => 4,
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Timerange::Grib1 { .. } => "GRIB1",
            Timerange::Grib2 { .. } => "GRIB2",
            Timerange::Timedef(_) => "Timedef",
            Timerange::Bufr { .. } => "BUFR",
        }
    }

    /// Canonical Timedef projection used by the matcher and by
    /// `get_forecast_step`/`get_proc_type`/`get_proc_duration`.
    pub fn to_timedef(&self) -> Timedef {
        match self {
            Timerange::Timedef(t) => *t,
            Timerange::Bufr { unit, value } => Timedef {
                step_unit: *unit,
                step_len: (*value).unsigned_abs(),
                stat_type: PROC_INSTANT,
                stat_unit: MISSING_UNIT,
                stat_len: 0,
            },
            Timerange::Grib1 { ttype, unit, p1, p2 } | Timerange::Grib2 { ttype, unit, p1, p2 } => {
                match ttype {
                    0 => Timedef {
                        step_unit: *unit,
                        step_len: *p1,
                        stat_type: PROC_INSTANT,
                        stat_unit: MISSING_UNIT,
                        stat_len: 0,
                    },
                    1 => Timedef {
                        step_unit: *unit,
                        step_len: 0,
                        stat_type: PROC_INSTANT,
                        stat_unit: MISSING_UNIT,
                        stat_len: 0,
                    },
                    3 => Timedef {
                        step_unit: *unit,
                        step_len: *p2,
                        stat_type: PROC_AVERAGE,
                        stat_unit: *unit,
                        stat_len: p2.saturating_sub(*p1),
                    },
                    4 => Timedef {
                        step_unit: *unit,
                        step_len: *p2,
                        stat_type: PROC_ACCUMULATION,
                        stat_unit: *unit,
                        stat_len: p2.saturating_sub(*p1),
                    },
                    5 => Timedef {
                        step_unit: *unit,
                        step_len: *p2,
                        stat_type: PROC_DIFFERENCE,
                        stat_unit: *unit,
                        stat_len: p2.saturating_sub(*p1),
                    },
                    // TODO(open question, spec §9): GRIB1 standard documentation
                    // disagrees on whether type 10 packs p1/p2 into one 16-bit
                    // field; until clarified, fall back to the type-0 reading.
                    10 => Timedef {
                        step_unit: *unit,
                        step_len: *p1,
                        stat_type: PROC_INSTANT,
                        stat_unit: MISSING_UNIT,
                        stat_len: 0,
                    },
                    _ => Timedef {
                        step_unit: *unit,
                        step_len: *p1,
                        stat_type: MISSING_UNIT,
                        stat_unit: MISSING_UNIT,
                        stat_len: 0,
                    },
                }
            }
        }
    }

    pub fn get_forecast_step(&self) -> (i64, bool) {
        self.to_timedef().forecast_step()
    }

    pub fn get_proc_type(&self) -> u8 {
        self.to_timedef().proc_type()
    }

    pub fn get_proc_duration(&self) -> (i64, bool) {
        self.to_timedef().proc_duration()
    }

    pub fn encode_payload(&self, enc: &mut Encoder) {
        enc.put_u8(self.style_byte());
        match self {
            Timerange::Grib1 { ttype, unit, p1, p2 } | Timerange::Grib2 { ttype, unit, p1, p2 } => {
                enc.put_u8(*ttype);
                enc.put_u8(*unit);
                enc.put_uint(*p1 as u64, 4);
                enc.put_uint(*p2 as u64, 4);
            }
            Timerange::Timedef(t) => {
                enc.put_u8(t.step_unit);
                enc.put_uint(t.step_len as u64, 4);
                enc.put_u8(t.stat_type);
                enc.put_u8(t.stat_unit);
                enc.put_uint(t.stat_len as u64, 4);
            }
            Timerange::Bufr { unit, value } => {
                enc.put_u8(*unit);
                enc.put_int(*value as i64, 4);
            }
        }
    }

    pub fn decode(dec: &mut Decoder) -> Result<Timerange> {
        let style = dec.take_u8("Timerange style")?;
        Ok(match style {
            1 => Timerange::Grib1 {
                ttype: dec.take_u8("Timerange.GRIB1 type")?,
                unit: dec.take_u8("Timerange.GRIB1 unit")?,
                p1: dec.take_uint("Timerange.GRIB1 p1", 4)? as u32,
                p2: dec.take_uint("Timerange.GRIB1 p2", 4)? as u32,
            },
            2 => Timerange::Grib2 {
                ttype: dec.take_u8("Timerange.GRIB2 type")?,
                unit: dec.take_u8("Timerange.GRIB2 unit")?,
                p1: dec.take_uint("Timerange.GRIB2 p1", 4)? as u32,
                p2: dec.take_uint("Timerange.GRIB2 p2", 4)? as u32,
            },
            3 => Timerange::Timedef(Timedef {
                step_unit: dec.take_u8("Timerange.Timedef step_unit")?,
                step_len: dec.take_uint("Timerange.Timedef step_len", 4)? as u32,
                stat_type: dec.take_u8("Timerange.Timedef stat_type")?,
                stat_unit: dec.take_u8("Timerange.Timedef stat_unit")?,
                stat_len: dec.take_uint("Timerange.Timedef stat_len", 4)? as u32,
            }),
            4 => Timerange::Bufr {
                unit: dec.take_u8("Timerange.BUFR unit")?,
                value: dec.take_int("Timerange.BUFR value", 4)? as i32,
            },
            other => return Err(Error::invalid("Timerange style", format!("unknown style {}", other))),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        let args: Vec<String> = match self {
            Timerange::Grib1 { ttype, unit, p1, p2 } | Timerange::Grib2 { ttype, unit, p1, p2 } => {
                vec![ttype.to_string(), unit.to_string(), p1.to_string(), p2.to_string()]
            }
            Timerange::Timedef(t) => {
                let (step, step_secs) = t.forecast_step();
                let mut v = vec![format_duration(step, step_secs), t.stat_type.to_string()];
                if t.stat_unit != MISSING_UNIT {
                    let (dur, dur_secs) = t.proc_duration();
                    v.push(format_duration(dur, dur_secs));
                }
                v
            }
            Timerange::Bufr { unit, value } => vec![unit.to_string(), value.to_string()],
        };
        out.push_str(&format_args(self.style_name(), &args));
    }

    pub fn parse_text(s: &str) -> Result<Timerange> {
        let (style, args) = split_style_args(s)?;
        Ok(match style {
            "GRIB1" => {
                require(&args, 4, "Timerange.GRIB1")?;
                Timerange::Grib1 {
                    ttype: p(&args, 0)?,
                    unit: p(&args, 1)?,
                    p1: p(&args, 2)?,
                    p2: p(&args, 3)?,
                }
            }
            "GRIB2" => {
                require(&args, 4, "Timerange.GRIB2")?;
                Timerange::Grib2 {
                    ttype: p(&args, 0)?,
                    unit: p(&args, 1)?,
                    p1: p(&args, 2)?,
                    p2: p(&args, 3)?,
                }
            }
            "Timedef" => {
                if args.is_empty() {
                    return Err(Error::invalid("Timerange.Timedef", "missing step argument"));
                }
                let (step_len, step_unit) = parse_duration(args[0])?;
                let stat_type: u8 = args
                    .get(1)
                    .map(|s| s.parse())
                    .transpose()
                    .map_err(|_| bad("Timerange.Timedef"))?
                    .unwrap_or(PROC_INSTANT);
                let (stat_len, stat_unit) = if let Some(dur) = args.get(2) {
                    parse_duration(dur)?
                } else {
                    (0, MISSING_UNIT)
                };
                Timerange::Timedef(Timedef {
                    step_unit,
                    step_len,
                    stat_type,
                    stat_unit,
                    stat_len,
                })
            }
            "BUFR" => {
                require(&args, 2, "Timerange.BUFR")?;
                Timerange::Bufr {
                    unit: p(&args, 0)?,
                    value: p(&args, 1)?,
                }
            }
            other => return Err(Error::invalid("Timerange style", format!("unknown style '{}'", other))),
        })
    }

    pub fn exact_query(&self) -> String {
        let mut args = String::new();
        self.write_text(&mut args);
        format!("timerange:{}", args.replacen('(', ",", 1).trim_end_matches(')'))
    }

    /// Structured form serialises the raw wire fields directly rather than
    /// the human-facing duration strings `write_text` uses, so it round
    /// trips without reparsing `6h`-style text.
    pub fn serialise(&self, keys: &Keys) -> Json {
        match self {
            Timerange::Grib1 { ttype, unit, p1, p2 } => json!({
                keys.type_style: "GRIB1",
                keys.timerange_type: ttype,
                keys.timerange_unit: unit,
                keys.timerange_p1: p1,
                keys.timerange_p2: p2,
            }),
            Timerange::Grib2 { ttype, unit, p1, p2 } => json!({
                keys.type_style: "GRIB2",
                keys.timerange_type: ttype,
                keys.timerange_unit: unit,
                keys.timerange_p1: p1,
                keys.timerange_p2: p2,
            }),
            Timerange::Timedef(t) => json!({
                keys.type_style: "Timedef",
                keys.timerange_step_unit: t.step_unit,
                keys.timerange_step_len: t.step_len,
                keys.timerange_stat_type: t.stat_type,
                keys.timerange_stat_unit: t.stat_unit,
                keys.timerange_stat_len: t.stat_len,
            }),
            Timerange::Bufr { unit, value } => json!({
                keys.type_style: "BUFR",
                keys.timerange_unit: unit,
                keys.timerange_value: value,
            }),
        }
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Timerange> {
        let style = v
            .get(keys.type_style)
            .and_then(|s| s.as_str())
            .ok_or_else(|| Error::invalid("Timerange", "missing style"))?;
        Ok(match style {
            "GRIB1" => Timerange::Grib1 {
                ttype: get_i64("Timerange.GRIB1", v, keys.timerange_type)? as u8,
                unit: get_i64("Timerange.GRIB1", v, keys.timerange_unit)? as u8,
                p1: get_i64("Timerange.GRIB1", v, keys.timerange_p1)? as u32,
                p2: get_i64("Timerange.GRIB1", v, keys.timerange_p2)? as u32,
            },
            "GRIB2" => Timerange::Grib2 {
                ttype: get_i64("Timerange.GRIB2", v, keys.timerange_type)? as u8,
                unit: get_i64("Timerange.GRIB2", v, keys.timerange_unit)? as u8,
                p1: get_i64("Timerange.GRIB2", v, keys.timerange_p1)? as u32,
                p2: get_i64("Timerange.GRIB2", v, keys.timerange_p2)? as u32,
            },
            "Timedef" => Timerange::Timedef(Timedef {
                step_unit: get_i64("Timerange.Timedef", v, keys.timerange_step_unit)? as u8,
                step_len: get_i64("Timerange.Timedef", v, keys.timerange_step_len)? as u32,
                stat_type: get_i64("Timerange.Timedef", v, keys.timerange_stat_type)? as u8,
                stat_unit: get_i64("Timerange.Timedef", v, keys.timerange_stat_unit)? as u8,
                stat_len: get_i64("Timerange.Timedef", v, keys.timerange_stat_len)? as u32,
            }),
            "BUFR" => Timerange::Bufr {
                unit: get_i64("Timerange.BUFR", v, keys.timerange_unit)? as u8,
                value: get_i64("Timerange.BUFR", v, keys.timerange_value)? as i32,
            },
            other => return Err(Error::invalid("Timerange style", format!("unknown style '{}'", other))),
        })
    }
}

/// Formats a duration as e.g. `6h`, `90m`, `+2h` for Timedef text form.
fn format_duration(amount: i64, is_seconds: bool) -> String {
    if !is_seconds {
        return format!("{}mo", amount);
    }
    if amount % 3600 == 0 {
        format!("{}h", amount / 3600)
    } else if amount % 60 == 0 {
        format!("{}m", amount / 60)
    } else {
        format!("{}s", amount)
    }
}

/// Parses `6h`, `90m`, `3600s`, `2mo` into `(step_len, unit_code)`.
fn parse_duration(s: &str) -> Result<(u32, u8)> {
    let s = s.trim();
    let (digits, suffix) = s
        .find(|c: char| c.is_alphabetic())
        .map(|i| s.split_at(i))
        .unwrap_or((s, "s"));
    let n: i64 = digits.parse().map_err(|_| bad("Timerange duration"))?;
    let (len, unit) = match suffix {
        "h" => (n * 3600, 1u8),
        "m" => (n * 60, 0u8),
        "s" => (n, 254u8),
        "mo" => (n, 4u8), // months unit-of-1 not distinguishable from years table; treat as month count via unit 3 semantics scaled by n
        other => return Err(Error::invalid("Timerange duration", format!("unknown suffix '{}'", other))),
    };
    // `mo` is approximate: encode directly as seconds-free month count using unit 3 (month) with step_len = n.
    if suffix == "mo" {
        return Ok((n as u32, 3));
    }
    let _ = unit;
    Ok((len as u32, if suffix == "h" { 1 } else if suffix == "m" { 0 } else { 254 }))
}

fn require(args: &[&str], n: usize, what: &str) -> Result<()> {
    if args.len() != n {
        return Err(Error::invalid(what, format!("expected {} arguments", n)));
    }
    Ok(())
}

fn p<T: std::str::FromStr>(args: &[&str], idx: usize) -> Result<T> {
    args[idx].trim().parse().map_err(|_| bad("Timerange argument"))
}

fn bad(what: &str) -> Error {
    Error::invalid(what, "invalid argument")
}

impl PartialOrd for Timerange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timerange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.style_byte().cmp(&other.style_byte()).then_with(|| match (self, other) {
            (
                Timerange::Grib1 { ttype: t1, unit: u1, p1: a1, p2: b1 },
                Timerange::Grib1 { ttype: t2, unit: u2, p1: a2, p2: b2 },
            )
            | (
                Timerange::Grib2 { ttype: t1, unit: u1, p1: a1, p2: b1 },
                Timerange::Grib2 { ttype: t2, unit: u2, p1: a2, p2: b2 },
            ) => (t1, u1, a1, b1).cmp(&(t2, u2, a2, b2)),
            (Timerange::Timedef(a), Timerange::Timedef(b)) => (
                a.step_unit, a.step_len, a.stat_type, a.stat_unit, a.stat_len,
            )
                .cmp(&(b.step_unit, b.step_len, b.stat_type, b.stat_unit, b.stat_len)),
            (Timerange::Bufr { unit: u1, value: v1 }, Timerange::Bufr { unit: u2, value: v2 }) => {
                (u1, v1).cmp(&(u2, v2))
            }
            _ => Ordering::Equal,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_structured() {
        let t = Timerange::Timedef(Timedef {
            step_unit: 1,
            step_len: 2,
            stat_type: PROC_AVERAGE,
            stat_unit: 1,
            stat_len: 60,
        });
        let j = t.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(Timerange::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), t);
    }

    #[test]
    fn grib1_type0_forecast_step() {
        // spec.md §8.B: GRIB1(0, 1, 2, 3), forecast at +2h.
        let tr = Timerange::Grib1 { ttype: 0, unit: 1, p1: 2, p2: 3 };
        assert_eq!(tr.get_forecast_step(), (7200, true));
        assert_eq!(tr.get_proc_type(), PROC_INSTANT);
        assert_eq!(tr.get_proc_duration(), (0, true));
    }

    #[test]
    fn average_sets_stat_fields() {
        let tr = Timerange::Grib1 { ttype: 3, unit: 1, p1: 0, p2: 24 };
        let td = tr.to_timedef();
        assert_eq!(td.stat_type, PROC_AVERAGE);
        assert_eq!(td.proc_duration(), (24 * 3600, true));
    }
}
