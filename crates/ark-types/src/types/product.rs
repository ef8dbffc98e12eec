use crate::error::{Error, Result};
use crate::keys::Keys;
use crate::structured::{get_str, get_u64, valuebag_from_json, valuebag_to_json};
use crate::textutil::{format_args, split_style_args};
use ark_binary::{Decoder, Encoder};
use ark_value::ValueBag;
use serde_json::{json, Value as Json};
use std::cmp::Ordering;

/// The Product metadata attribute: what variable/message type this record
/// carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Product {
    Grib1 {
        origin: u8,
        table: u8,
        product: u8,
    },
    Grib2 {
        centre: u16,
        discipline: u8,
        category: u8,
        number: u8,
        table_version: u8,
        local_table_version: u8,
    },
    Bufr {
        kind: u8,
        subtype: u8,
        localsubtype: u8,
        values: ValueBag,
    },
    Odimh5 {
        obj: String,
        prod: String,
    },
    Vm2 {
        variable_id: u64,
        derived_values: Option<ValueBag>,
    },
}

impl Product {
    pub fn style_byte(&self) -> u8 {
        match self {
            Product::Grib1 { .. } => 1,
            Product::Grib2 { .. } => 2,
            Product::Bufr { .. } => 3,
            Product::Odimh5 { .. } => 4,
            Product::Vm2 { .. } => 5,
        }
    }

    pub fn style_name(&self) -> &'static str {
        match self {
            Product::Grib1 { .. } => "GRIB1",
            Product::Grib2 { .. } => "GRIB2",
            Product::Bufr { .. } => "BUFR",
            Product::Odimh5 { .. } => "ODIMH5",
            Product::Vm2 { .. } => "VM2",
        }
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
            Product::Grib1 {
                origin,
                table,
                product,
            } => {
                enc.put_u8(*origin);
                enc.put_u8(*table);
                enc.put_u8(*product);
            }
            Product::Grib2 {
                centre,
                discipline,
                category,
                number,
                table_version,
                local_table_version,
            } => {
                enc.put_uint(*centre as u64, 2);
                enc.put_u8(*discipline);
                enc.put_u8(*category);
                enc.put_u8(*number);
                enc.put_u8(*table_version);
                enc.put_u8(*local_table_version);
            }
            Product::Bufr {
                kind,
                subtype,
                localsubtype,
                values,
            } => {
                enc.put_u8(*kind);
                enc.put_u8(*subtype);
                enc.put_u8(*localsubtype);
                let mut inner = Encoder::new();
                values.encode(&mut inner);
                enc.put_varint_usize(inner.len());
                enc.put_bytes(inner.as_slice());
            }
            Product::Odimh5 { obj, prod } => {
                for s in [obj, prod] {
                    enc.put_varint_usize(s.len());
                    enc.put_bytes(s.as_bytes());
                }
            }
            Product::Vm2 {
                variable_id,
                derived_values,
            } => {
                enc.put_varint(*variable_id);
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

    pub fn decode(dec: &mut Decoder) -> Result<Product> {
        let style = dec.take_u8("Product style")?;
        Ok(match style {
            1 => Product::Grib1 {
                origin: dec.take_u8("Product.GRIB1 origin")?,
                table: dec.take_u8("Product.GRIB1 table")?,
                product: dec.take_u8("Product.GRIB1 product")?,
            },
            2 => Product::Grib2 {
                centre: dec.take_uint("Product.GRIB2 centre", 2)? as u16,
                discipline: dec.take_u8("Product.GRIB2 discipline")?,
                category: dec.take_u8("Product.GRIB2 category")?,
                number: dec.take_u8("Product.GRIB2 number")?,
                table_version: dec.take_u8("Product.GRIB2 table_version")?,
                local_table_version: dec.take_u8("Product.GRIB2 local_table_version")?,
            },
            3 => {
                let kind = dec.take_u8("Product.BUFR type")?;
                let subtype = dec.take_u8("Product.BUFR subtype")?;
                let localsubtype = dec.take_u8("Product.BUFR localsubtype")?;
                let len = dec.take_varint_usize("Product.BUFR values length")?;
                let bytes = dec.take("Product.BUFR values", len)?;
                let mut vdec = Decoder::new(bytes);
                let values = ValueBag::decode(&mut vdec)?;
                Product::Bufr {
                    kind,
                    subtype,
                    localsubtype,
                    values,
                }
            }
            4 => {
                let obj = decode_str(dec, "Product.ODIMH5 obj")?;
                let prod = decode_str(dec, "Product.ODIMH5 prod")?;
                Product::Odimh5 { obj, prod }
            }
            5 => {
                let variable_id = dec.take_varint("Product.VM2 variable_id")?;
                // A decoder that reaches end-of-envelope before the derived
                // portion must not fail: derived values are simply absent.
                let derived_values = if dec.is_empty() {
                    None
                } else {
                    let len = dec.take_varint_usize("Product.VM2 derived values length")?;
                    let bytes = dec.take("Product.VM2 derived values", len)?;
                    let mut vdec = Decoder::new(bytes);
                    Some(ValueBag::decode(&mut vdec)?)
                };
                Product::Vm2 {
                    variable_id,
                    derived_values,
                }
            }
            other => return Err(Error::invalid("Product style", format!("unknown style {}", other))),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        let args: Vec<String> = match self {
            Product::Grib1 {
                origin,
                table,
                product,
            } => vec![origin.to_string(), table.to_string(), product.to_string()],
            Product::Grib2 {
                centre,
                discipline,
                category,
                number,
                table_version,
                local_table_version,
            } => vec![
                centre.to_string(),
                discipline.to_string(),
                category.to_string(),
                number.to_string(),
                table_version.to_string(),
                local_table_version.to_string(),
            ],
            Product::Bufr {
                kind,
                subtype,
                localsubtype,
                values,
            } => vec![
                kind.to_string(),
                subtype.to_string(),
                localsubtype.to_string(),
                values.to_text(),
            ],
            Product::Odimh5 { obj, prod } => vec![obj.clone(), prod.clone()],
            Product::Vm2 { variable_id, .. } => vec![variable_id.to_string()],
        };
        out.push_str(&format_args(self.style_name(), &args));
    }

    pub fn parse_text(s: &str) -> Result<Product> {
        let (style, args) = split_style_args(s)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB1" => Product::Grib1 {
                origin: parse(&args, 0, "Product.GRIB1")?,
                table: parse(&args, 1, "Product.GRIB1")?,
                product: parse(&args, 2, "Product.GRIB1")?,
            },
            "GRIB2" => Product::Grib2 {
                centre: parse(&args, 0, "Product.GRIB2")?,
                discipline: parse(&args, 1, "Product.GRIB2")?,
                category: parse(&args, 2, "Product.GRIB2")?,
                number: parse(&args, 3, "Product.GRIB2")?,
                table_version: parse(&args, 4, "Product.GRIB2")?,
                local_table_version: parse(&args, 5, "Product.GRIB2")?,
            },
            "BUFR" => Product::Bufr {
                kind: parse(&args, 0, "Product.BUFR")?,
                subtype: parse(&args, 1, "Product.BUFR")?,
                localsubtype: parse(&args, 2, "Product.BUFR")?,
                values: if args.len() > 3 {
                    ValueBag::parse_text(&args[3..].join(", "))?
                } else {
                    ValueBag::new()
                },
            },
            "ODIMH5" => {
                if args.len() != 2 {
                    return Err(Error::invalid("Product.ODIMH5", "expected 2 arguments"));
                }
                Product::Odimh5 {
                    obj: args[0].to_string(),
                    prod: args[1].to_string(),
                }
            }
            "VM2" => Product::Vm2 {
                variable_id: parse(&args, 0, "Product.VM2")?,
                derived_values: None,
            },
            other => return Err(Error::invalid("Product style", format!("unknown style '{}'", other))),
        })
    }

    pub fn exact_query(&self) -> String {
        let mut args = String::new();
        self.write_text(&mut args);
        format!("product:{}", args.replacen('(', ",", 1).trim_end_matches(')'))
    }

    /// Structured form (spec §4.3 `serialise`). VM2 derived values are
    /// included when present, matching full `encode` rather than
    /// `encode_for_indexing`.
    pub fn serialise(&self, keys: &Keys) -> Json {
        match self {
            Product::Grib1 { origin, table, product } => json!({
                keys.type_style: self.style_name(),
                keys.product_origin: origin,
                keys.product_table: table,
                keys.product_product: product,
            }),
            Product::Grib2 {
                centre,
                discipline,
                category,
                number,
                table_version,
                local_table_version,
            } => json!({
                keys.type_style: self.style_name(),
                keys.product_centre: centre,
                keys.product_discipline: discipline,
                keys.product_category: category,
                keys.product_number: number,
                keys.product_table_version: table_version,
                keys.product_local_table_version: local_table_version,
            }),
            Product::Bufr {
                kind,
                subtype,
                localsubtype,
                values,
            } => json!({
                keys.type_style: self.style_name(),
                keys.product_type: kind,
                keys.product_subtype: subtype,
                keys.product_local_subtype: localsubtype,
                keys.product_value: valuebag_to_json(values),
            }),
            Product::Odimh5 { obj, prod } => json!({
                keys.type_style: self.style_name(),
                keys.product_object: obj,
                keys.product_id: prod,
            }),
            Product::Vm2 { variable_id, derived_values } => {
                let mut m = json!({
                    keys.type_style: self.style_name(),
                    keys.product_id: variable_id,
                });
                if let Some(dv) = derived_values {
                    m[keys.product_value] = valuebag_to_json(dv);
                }
                m
            }
        }
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Product> {
        let style = get_str("Product", v, keys.type_style)?;
        Ok(match style.to_ascii_uppercase().as_str() {
            "GRIB1" => Product::Grib1 {
                origin: get_u64("Product.GRIB1", v, keys.product_origin)? as u8,
                table: get_u64("Product.GRIB1", v, keys.product_table)? as u8,
                product: get_u64("Product.GRIB1", v, keys.product_product)? as u8,
            },
            "GRIB2" => Product::Grib2 {
                centre: get_u64("Product.GRIB2", v, keys.product_centre)? as u16,
                discipline: get_u64("Product.GRIB2", v, keys.product_discipline)? as u8,
                category: get_u64("Product.GRIB2", v, keys.product_category)? as u8,
                number: get_u64("Product.GRIB2", v, keys.product_number)? as u8,
                table_version: get_u64("Product.GRIB2", v, keys.product_table_version)? as u8,
                local_table_version: get_u64("Product.GRIB2", v, keys.product_local_table_version)? as u8,
            },
            "BUFR" => Product::Bufr {
                kind: get_u64("Product.BUFR", v, keys.product_type)? as u8,
                subtype: get_u64("Product.BUFR", v, keys.product_subtype)? as u8,
                localsubtype: get_u64("Product.BUFR", v, keys.product_local_subtype)? as u8,
                values: valuebag_from_json(
                    "Product.BUFR",
                    v.get(keys.product_value).unwrap_or(&Json::Object(Default::default())),
                )?,
            },
            "ODIMH5" => Product::Odimh5 {
                obj: get_str("Product.ODIMH5", v, keys.product_object)?.to_string(),
                prod: get_str("Product.ODIMH5", v, keys.product_id)?.to_string(),
            },
            "VM2" => Product::Vm2 {
                variable_id: get_u64("Product.VM2", v, keys.product_id)?,
                derived_values: match v.get(keys.product_value) {
                    Some(dv) => Some(valuebag_from_json("Product.VM2", dv)?),
                    None => None,
                },
            },
            other => return Err(Error::invalid("Product style", format!("unknown style '{}'", other))),
        })
    }
}

fn parse<T: std::str::FromStr>(args: &[&str], idx: usize, what: &str) -> Result<T> {
    args.get(idx)
        .ok_or_else(|| Error::invalid(what, format!("missing argument {}", idx)))?
        .parse()
        .map_err(|_| Error::invalid(what, format!("invalid argument {}", idx)))
}

fn decode_str(dec: &mut Decoder, what: &str) -> Result<String> {
    let len = dec.take_varint_usize(what)?;
    let bytes = dec.take(what, len)?;
    Ok(std::str::from_utf8(bytes)
        .map_err(|_| Error::invalid(what, "not valid UTF-8"))?
        .to_string())
}

impl PartialOrd for Product {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Product {
    fn cmp(&self, other: &Self) -> Ordering {
        self.style_byte().cmp(&other.style_byte()).then_with(|| {
            let mut la = Encoder::new();
            // Compare using the indexing encoding: derived VM2 values never
            // participate in ordering, matching their exclusion from the
            // index's uniqueness key.
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
    fn round_trip_binary() {
        let p = Product::Grib2 {
            centre: 98,
            discipline: 0,
            category: 1,
            number: 2,
            table_version: 1,
            local_table_version: 0,
        };
        let mut enc = Encoder::new();
        p.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Product::decode(&mut dec).unwrap(), p);
    }

    #[test]
    fn round_trip_structured() {
        let p = Product::Bufr {
            kind: 1,
            subtype: 2,
            localsubtype: 3,
            values: ValueBag::parse_text("a=1, b=\"x\"").unwrap(),
        };
        let j = p.serialise(&crate::keys::KEYS_PYTHON);
        assert_eq!(Product::decode_structure(&crate::keys::KEYS_PYTHON, &j).unwrap(), p);
    }

    #[test]
    fn vm2_missing_derived_values_is_not_an_error() {
        let p = Product::Vm2 {
            variable_id: 42,
            derived_values: None,
        };
        let mut enc = Encoder::new();
        p.encode_payload(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        let back = Product::decode(&mut dec).unwrap();
        assert_eq!(back, p);
    }
}
