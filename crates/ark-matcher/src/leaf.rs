use crate::error::{Error, Result};
use crate::reftime::DTMatch;
use ark_types::textutil::split_style_args;
use ark_types::types::{Area, AssignedDataset, Level, Origin, Proddef, Product, Run, Task, Timedef, Timerange, TypeValue};
use ark_types::Item;
use ark_value::ValueBag;

/// One style-specific leaf matcher (spec §4.5 "Style-specific leaves").
/// Every field is optional; absence means wildcard. A leaf matches a
/// candidate [`Item`] of the same code when every present field equals the
/// candidate's corresponding field.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    Origin(OriginLeaf),
    Product(ProductLeaf),
    Level(LevelLeaf),
    Timerange(TimerangeLeaf),
    Reftime(DTMatch),
    Area(AreaLeaf),
    Proddef(ValueBagLeaf),
    Run(Option<u32>),
    Quantity(Vec<String>),
    Task(Option<String>),
    AssignedDataset { name: Option<String>, id: Option<String> },
    BBox(Option<String>),
    Value(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OriginLeaf {
    Grib1 {
        centre: Option<u8>,
        subcentre: Option<u8>,
        process: Option<u8>,
    },
    Grib2 {
        centre: Option<u16>,
        subcentre: Option<u16>,
        proc_type: Option<u8>,
        bg_proc: Option<u8>,
        proc_id: Option<u8>,
    },
    Bufr {
        centre: Option<u8>,
        subcentre: Option<u8>,
    },
    Odimh5 {
        wmo: Option<String>,
        rad: Option<String>,
        plc: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductLeaf {
    Grib1 {
        origin: Option<u8>,
        table: Option<u8>,
        product: Option<u8>,
    },
    Grib2 {
        centre: Option<u16>,
        discipline: Option<u8>,
        category: Option<u8>,
        number: Option<u8>,
        table_version: Option<u8>,
        local_table_version: Option<u8>,
    },
    Bufr {
        kind: Option<u8>,
        subtype: Option<u8>,
        localsubtype: Option<u8>,
        values: ValueBag,
    },
    Odimh5 {
        obj: Option<String>,
        prod: Option<String>,
    },
    Vm2 {
        variable_id: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LevelLeaf {
    Grib1 {
        ltype: Option<u8>,
        l1: Option<u32>,
        l2: Option<u32>,
    },
    Grib2S {
        ltype: Option<u8>,
        scale: Option<u8>,
        value: Option<u32>,
    },
    Grib2D {
        ltype1: Option<u8>,
        scale1: Option<u8>,
        value1: Option<u32>,
        ltype2: Option<u8>,
        scale2: Option<u8>,
        value2: Option<u32>,
    },
    Odimh5 {
        min: Option<f64>,
        max: Option<f64>,
    },
}

/// Timerange matching canonicalizes through [`Timedef`] (spec §4.5): every
/// leaf, whatever its written style, is compared against the candidate's
/// `to_timedef()` projection.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerangeLeaf {
    pub step_unit: Option<u8>,
    pub step_len: Option<u32>,
    pub stat_type: Option<u8>,
    pub stat_unit: Option<u8>,
    pub stat_len: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AreaLeaf {
    Grib(ValueBagLeaf),
    Odimh5(ValueBagLeaf),
    Vm2 { station_id: Option<u32> },
}

/// A partial [`ValueBag`] match: every key present in the leaf must equal
/// the candidate's value for that key; keys absent from the leaf are
/// wildcards (extra keys in the candidate are fine).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueBagLeaf {
    pub required: ValueBag,
}

impl ValueBagLeaf {
    pub fn matches(&self, candidate: &ValueBag) -> bool {
        self.required.iter().all(|(k, v)| candidate.get(k) == Some(v))
    }
}

fn opt<T: std::str::FromStr>(args: &[&str], idx: usize) -> Result<Option<T>> {
    match args.get(idx).map(|s| s.trim()) {
        None | Some("") | Some("-") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid("matcher argument", format!("'{}' is not valid", s))),
    }
}

fn opt_str(args: &[&str], idx: usize) -> Option<String> {
    match args.get(idx).map(|s| s.trim()) {
        None | Some("") | Some("-") => None,
        Some(s) => Some(s.to_string()),
    }
}

impl Leaf {
    pub fn parse(code: ark_types::TypeCode, text: &str, now: ark_time::Time) -> Result<Leaf> {
        use ark_types::TypeCode as C;
        Ok(match code {
            C::Origin => Leaf::Origin(parse_origin(text)?),
            C::Product => Leaf::Product(parse_product(text)?),
            C::Level => Leaf::Level(parse_level(text)?),
            C::Timerange => Leaf::Timerange(parse_timerange(text)?),
            C::Reftime => Leaf::Reftime(crate::reftime::parse_one(text, now)?),
            C::Area => Leaf::Area(parse_area(text)?),
            C::Proddef => {
                let (style, args) = split_style_args(text)?;
                match style.to_ascii_uppercase().as_str() {
                    "GRIB" => Leaf::Proddef(ValueBagLeaf {
                        required: ValueBag::parse_text(&args.join(", "))?,
                    }),
                    other => return Err(Error::invalid("Proddef matcher style", other.to_string())),
                }
            }
            C::Run => {
                let (_, args) = split_style_args(text)?;
                let minute = if let Some(first) = args.first() {
                    if let Some((h, m)) = first.split_once(':') {
                        Some(
                            h.trim().parse::<u32>().map_err(|_| Error::invalid("run matcher", "bad hour"))? * 60
                                + m.trim().parse::<u32>().map_err(|_| Error::invalid("run matcher", "bad minute"))?,
                        )
                    } else {
                        Some(first.trim().parse().map_err(|_| Error::invalid("run matcher", "bad value"))?)
                    }
                } else {
                    None
                };
                Leaf::Run(minute)
            }
            C::Quantity => Leaf::Quantity(
                text.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            C::Task => Leaf::Task(Some(text.trim().to_string())),
            C::AssignedDataset => {
                if let Some((name, id)) = text.split_once(':') {
                    Leaf::AssignedDataset {
                        name: Some(name.trim().to_string()),
                        id: Some(id.trim().to_string()),
                    }
                } else {
                    Leaf::AssignedDataset {
                        name: Some(text.trim().to_string()),
                        id: None,
                    }
                }
            }
            C::BBox => Leaf::BBox(Some(text.trim().to_string())),
            C::Value => Leaf::Value(Some(text.trim().to_string())),
            C::Note | C::Source => {
                return Err(Error::invalid("matcher code", format!("'{}' is not matchable", code.name())));
            }
        })
    }

    pub fn matches(&self, item: &Item) -> bool {
        match (self, item) {
            (Leaf::Origin(l), Item::Origin(o)) => l.matches(o),
            (Leaf::Product(l), Item::Product(p)) => l.matches(p),
            (Leaf::Level(l), Item::Level(v)) => l.matches(v),
            (Leaf::Timerange(l), Item::Timerange(v)) => l.matches(v.to_timedef()),
            (Leaf::Reftime(l), Item::Reftime(v)) => l.matches_reftime(v),
            (Leaf::Area(l), Item::Area(v)) => l.matches(v),
            (Leaf::Proddef(l), Item::Proddef(Proddef::Grib(bag))) => l.matches(bag),
            (Leaf::Run(Some(m)), Item::Run(Run::Minute(v))) => m == v,
            (Leaf::Run(None), Item::Run(_)) => true,
            (Leaf::Quantity(want), Item::Quantity(v)) => want.iter().all(|q| v.values().contains(q)),
            (Leaf::Task(Some(t)), Item::Task(Task { value })) => t == value,
            (Leaf::Task(None), Item::Task(_)) => true,
            (Leaf::AssignedDataset { name, id }, Item::AssignedDataset(AssignedDataset { name: n, id: i, .. })) => {
                name.as_deref().map(|v| v == n).unwrap_or(true) && id.as_deref().map(|v| v == i).unwrap_or(true)
            }
            (Leaf::BBox(Some(hex)), Item::BBox(b)) => {
                let mut s = String::new();
                b.write_text(&mut s);
                &s == hex
            }
            (Leaf::BBox(None), Item::BBox(_)) => true,
            (Leaf::Value(Some(s)), Item::Value(TypeValue { buffer })) => s == buffer,
            (Leaf::Value(None), Item::Value(_)) => true,
            _ => false,
        }
    }
}

impl OriginLeaf {
    fn matches(&self, o: &Origin) -> bool {
        match (self, o) {
            (
                OriginLeaf::Grib1 { centre, subcentre, process },
                Origin::Grib1 { centre: c, subcentre: s, process: p },
            ) => eqopt(centre, c) && eqopt(subcentre, s) && eqopt(process, p),
            (
                OriginLeaf::Grib2 { centre, subcentre, proc_type, bg_proc, proc_id },
                Origin::Grib2 { centre: c, subcentre: s, proc_type: pt, bg_proc: bg, proc_id: pid },
            ) => eqopt(centre, c) && eqopt(subcentre, s) && eqopt(proc_type, pt) && eqopt(bg_proc, bg) && eqopt(proc_id, pid),
            (OriginLeaf::Bufr { centre, subcentre }, Origin::Bufr { centre: c, subcentre: s }) => {
                eqopt(centre, c) && eqopt(subcentre, s)
            }
            (OriginLeaf::Odimh5 { wmo, rad, plc }, Origin::Odimh5 { wmo: w, rad: r, plc: p }) => {
                eqopt_str(wmo, w) && eqopt_str(rad, r) && eqopt_str(plc, p)
            }
            _ => false,
        }
    }
}

impl ProductLeaf {
    fn matches(&self, p: &Product) -> bool {
        match (self, p) {
            (
                ProductLeaf::Grib1 { origin, table, product },
                Product::Grib1 { origin: o, table: t, product: pr },
            ) => eqopt(origin, o) && eqopt(table, t) && eqopt(product, pr),
            (
                ProductLeaf::Grib2 { centre, discipline, category, number, table_version, local_table_version },
                Product::Grib2 { centre: c, discipline: d, category: cat, number: n, table_version: tv, local_table_version: ltv },
            ) => {
                eqopt(centre, c)
                    && eqopt(discipline, d)
                    && eqopt(category, cat)
                    && eqopt(number, n)
                    && eqopt(table_version, tv)
                    && eqopt(local_table_version, ltv)
            }
            (
                ProductLeaf::Bufr { kind, subtype, localsubtype, values },
                Product::Bufr { kind: k, subtype: s, localsubtype: l, values: v },
            ) => eqopt(kind, k) && eqopt(subtype, s) && eqopt(localsubtype, l) && ValueBagLeaf { required: values.clone() }.matches(v),
            (ProductLeaf::Odimh5 { obj, prod }, Product::Odimh5 { obj: o, prod: pr }) => {
                eqopt_str(obj, o) && eqopt_str(prod, pr)
            }
            (ProductLeaf::Vm2 { variable_id }, Product::Vm2 { variable_id: v, .. }) => eqopt(variable_id, v),
            _ => false,
        }
    }
}

impl LevelLeaf {
    fn matches(&self, l: &Level) -> bool {
        match (self, l) {
            (LevelLeaf::Grib1 { ltype, l1, l2 }, Level::Grib1 { ltype: t, l1: a, l2: b }) => {
                eqopt(ltype, t) && eqopt(l1, a) && eqopt(l2, b)
            }
            (LevelLeaf::Grib2S { ltype, scale, value }, Level::Grib2S { ltype: t, scale: s, value: v }) => {
                eqopt(ltype, t) && eqopt(scale, s) && eqopt(value, v)
            }
            (
                LevelLeaf::Grib2D { ltype1, scale1, value1, ltype2, scale2, value2 },
                Level::Grib2D { ltype1: t1, scale1: s1, value1: v1, ltype2: t2, scale2: s2, value2: v2 },
            ) => {
                eqopt(ltype1, t1)
                    && eqopt(scale1, s1)
                    && eqopt(value1, v1)
                    && eqopt(ltype2, t2)
                    && eqopt(scale2, s2)
                    && eqopt(value2, v2)
            }
            (LevelLeaf::Odimh5 { min, max }, Level::Odimh5 { min: a, max: b }) => eqopt_f64(min, a) && eqopt_f64(max, b),
            _ => false,
        }
    }
}

impl TimerangeLeaf {
    fn matches(&self, td: Timedef) -> bool {
        eqopt(&self.step_unit, &td.step_unit)
            && eqopt(&self.step_len, &td.step_len)
            && eqopt(&self.stat_type, &td.stat_type)
            && eqopt(&self.stat_unit, &td.stat_unit)
            && eqopt(&self.stat_len, &td.stat_len)
    }
}

impl AreaLeaf {
    fn matches(&self, a: &Area) -> bool {
        match (self, a) {
            (AreaLeaf::Grib(l), Area::Grib(bag)) => l.matches(bag),
            (AreaLeaf::Odimh5(l), Area::Odimh5(bag)) => l.matches(bag),
            (AreaLeaf::Vm2 { station_id }, Area::Vm2 { station_id: s, .. }) => eqopt(station_id, s),
            _ => false,
        }
    }
}

fn eqopt<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
    want.as_ref().map(|w| w == have).unwrap_or(true)
}

fn eqopt_str(want: &Option<String>, have: &str) -> bool {
    want.as_deref().map(|w| w == have).unwrap_or(true)
}

fn eqopt_f64(want: &Option<f64>, have: &f64) -> bool {
    want.map(|w| (w - have).abs() < f64::EPSILON).unwrap_or(true)
}

fn parse_origin(text: &str) -> Result<OriginLeaf> {
    let (style, args) = split_style_args(text)?;
    Ok(match style.to_ascii_uppercase().as_str() {
        "GRIB1" => OriginLeaf::Grib1 {
            centre: opt(&args, 0)?,
            subcentre: opt(&args, 1)?,
            process: opt(&args, 2)?,
        },
        "GRIB2" => OriginLeaf::Grib2 {
            centre: opt(&args, 0)?,
            subcentre: opt(&args, 1)?,
            proc_type: opt(&args, 2)?,
            bg_proc: opt(&args, 3)?,
            proc_id: opt(&args, 4)?,
        },
        "BUFR" => OriginLeaf::Bufr {
            centre: opt(&args, 0)?,
            subcentre: opt(&args, 1)?,
        },
        "ODIMH5" => OriginLeaf::Odimh5 {
            wmo: opt_str(&args, 0),
            rad: opt_str(&args, 1),
            plc: opt_str(&args, 2),
        },
        other => return Err(Error::invalid("Origin matcher style", other.to_string())),
    })
}

fn parse_product(text: &str) -> Result<ProductLeaf> {
    let (style, args) = split_style_args(text)?;
    Ok(match style.to_ascii_uppercase().as_str() {
        "GRIB1" => ProductLeaf::Grib1 {
            origin: opt(&args, 0)?,
            table: opt(&args, 1)?,
            product: opt(&args, 2)?,
        },
        "GRIB2" => ProductLeaf::Grib2 {
            centre: opt(&args, 0)?,
            discipline: opt(&args, 1)?,
            category: opt(&args, 2)?,
            number: opt(&args, 3)?,
            table_version: opt(&args, 4)?,
            local_table_version: opt(&args, 5)?,
        },
        "BUFR" => ProductLeaf::Bufr {
            kind: opt(&args, 0)?,
            subtype: opt(&args, 1)?,
            localsubtype: opt(&args, 2)?,
            values: args.get(3).map(|s| ValueBag::parse_text(s)).transpose()?.unwrap_or_default(),
        },
        "ODIMH5" => ProductLeaf::Odimh5 {
            obj: opt_str(&args, 0),
            prod: opt_str(&args, 1),
        },
        "VM2" => ProductLeaf::Vm2 {
            variable_id: opt(&args, 0)?,
        },
        other => return Err(Error::invalid("Product matcher style", other.to_string())),
    })
}

fn parse_level(text: &str) -> Result<LevelLeaf> {
    let (style, args) = split_style_args(text)?;
    Ok(match style.to_ascii_uppercase().as_str() {
        "GRIB1" => LevelLeaf::Grib1 {
            ltype: opt(&args, 0)?,
            l1: opt(&args, 1)?,
            l2: opt(&args, 2)?,
        },
        "GRIB2S" => LevelLeaf::Grib2S {
            ltype: opt(&args, 0)?,
            scale: opt(&args, 1)?,
            value: opt(&args, 2)?,
        },
        "GRIB2D" => LevelLeaf::Grib2D {
            ltype1: opt(&args, 0)?,
            scale1: opt(&args, 1)?,
            value1: opt(&args, 2)?,
            ltype2: opt(&args, 3)?,
            scale2: opt(&args, 4)?,
            value2: opt(&args, 5)?,
        },
        "ODIMH5" => LevelLeaf::Odimh5 {
            min: opt(&args, 0)?,
            max: opt(&args, 1)?,
        },
        other => return Err(Error::invalid("Level matcher style", other.to_string())),
    })
}

/// Parses a Timerange matcher leaf. `Timedef,<step>[,<stattype>[,<dur>]]`
/// is the canonical form (spec §8.B); `GRIB1,...`/`GRIB2,...` leaves are
/// converted to their Timedef projection eagerly so matching always
/// compares canonicalized fields (spec §4.5).
fn parse_timerange(text: &str) -> Result<TimerangeLeaf> {
    let (style, args) = split_style_args(text)?;
    Ok(match style.to_ascii_uppercase().as_str() {
        "TIMEDEF" => {
            let (step_unit, step_len) = match args.first() {
                Some(s) if *s != "-" && !s.is_empty() => parse_step(s)?,
                _ => (None, None),
            };
            let stat_type = opt(&args, 1)?;
            let (stat_unit, stat_len) = match args.get(2) {
                Some(s) if *s != "-" && !s.is_empty() => parse_step(s)?,
                _ => (None, None),
            };
            TimerangeLeaf { step_unit, step_len, stat_type, stat_unit, stat_len }
        }
        "GRIB1" | "GRIB2" => {
            require(&args, 4, "Timerange matcher")?;
            let ttype: u8 = args[0].trim().parse().map_err(|_| Error::invalid("Timerange matcher", "bad type"))?;
            let unit: u8 = args[1].trim().parse().map_err(|_| Error::invalid("Timerange matcher", "bad unit"))?;
            let p1: u32 = args[2].trim().parse().map_err(|_| Error::invalid("Timerange matcher", "bad p1"))?;
            let p2: u32 = args[3].trim().parse().map_err(|_| Error::invalid("Timerange matcher", "bad p2"))?;
            let td = Timerange::Grib1 { ttype, unit, p1, p2 }.to_timedef();
            TimerangeLeaf {
                step_unit: Some(td.step_unit),
                step_len: Some(td.step_len),
                stat_type: Some(td.stat_type),
                stat_unit: Some(td.stat_unit),
                stat_len: Some(td.stat_len),
            }
        }
        other => return Err(Error::invalid("Timerange matcher style", other.to_string())),
    })
}

/// Parses a `+2h`/`6h`/`90m`/`2mo` step amount into `(unit, len)`.
fn parse_step(s: &str) -> Result<(Option<u8>, Option<u32>)> {
    let s = s.trim().trim_start_matches('+');
    let (digits, suffix) = s
        .find(|c: char| c.is_alphabetic())
        .map(|i| s.split_at(i))
        .unwrap_or((s, "s"));
    let n: i64 = digits.parse().map_err(|_| Error::invalid("Timerange step", "not numeric"))?;
    let unit = match suffix {
        "h" => 1u8,
        "m" => 0u8,
        "s" | "" => 254u8,
        "mo" => 3u8,
        other => return Err(Error::invalid("Timerange step", format!("unknown suffix '{}'", other))),
    };
    Ok((Some(unit), Some(n as u32)))
}

fn parse_area(text: &str) -> Result<AreaLeaf> {
    let (style, args) = split_style_args(text)?;
    Ok(match style.to_ascii_uppercase().as_str() {
        "GRIB" => AreaLeaf::Grib(ValueBagLeaf {
            required: ValueBag::parse_text(&args.join(", "))?,
        }),
        "ODIMH5" => AreaLeaf::Odimh5(ValueBagLeaf {
            required: ValueBag::parse_text(&args.join(", "))?,
        }),
        "VM2" => AreaLeaf::Vm2 {
            station_id: opt(&args, 0)?,
        },
        other => return Err(Error::invalid("Area matcher style", other.to_string())),
    })
}

fn require(args: &[&str], n: usize, what: &str) -> Result<()> {
    if args.len() != n {
        return Err(Error::invalid(what, format!("expected {} arguments", n)));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_types::TypeCode;

    #[test]
    fn origin_grib1_partial_match() {
        let leaf = Leaf::parse(TypeCode::Origin, "GRIB1,200", ark_time::Time::now()).unwrap();
        let item = Item::Origin(Origin::Grib1 { centre: 200, subcentre: 5, process: 9 });
        assert!(leaf.matches(&item));
        let other = Item::Origin(Origin::Grib1 { centre: 1, subcentre: 5, process: 9 });
        assert!(!leaf.matches(&other));
    }

    #[test]
    fn timerange_timedef_matches_grib1_projection() {
        let leaf = Leaf::parse(TypeCode::Timerange, "Timedef,+2h", ark_time::Time::now()).unwrap();
        let item = Item::Timerange(Timerange::Grib1 { ttype: 0, unit: 1, p1: 2, p2: 3 });
        assert!(leaf.matches(&item));
    }

    #[test]
    fn timerange_timedef_with_stat_type_rejects_instant() {
        let leaf = Leaf::parse(TypeCode::Timerange, "Timedef,+2h,1", ark_time::Time::now()).unwrap();
        let item = Item::Timerange(Timerange::Grib1 { ttype: 0, unit: 1, p1: 2, p2: 3 });
        assert!(!leaf.matches(&item));
    }
}
