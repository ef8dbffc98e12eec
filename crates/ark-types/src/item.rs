use crate::error::Result;
use crate::keys::Keys;
use crate::structured::get_str;
use crate::typecode::TypeCode;
use crate::types::{
    AssignedDataset, Area, BBox, Level, Note, Origin, Proddef, Product, Quantity, Reftime, Run, Source, Task,
    Timerange, TypeValue,
};
use ark_binary::{decode_envelope, encode_envelope, Decoder, Encoder};
use serde_json::Value as Json;
use std::cmp::Ordering;

/// A single decoded metadata attribute, tagged by its [`TypeCode`]. This is
/// the common currency ItemSet, Metadata and the summary trie move around:
/// every styled type is reachable through one `Item` variant, all sharing
/// the same encode/decode/text/exact-query shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Origin(Origin),
    Product(Product),
    Level(Level),
    Timerange(Timerange),
    Reftime(Reftime),
    Area(Area),
    Proddef(Proddef),
    Source(Source),
    Note(Note),
    AssignedDataset(AssignedDataset),
    Run(Run),
    BBox(BBox),
    Quantity(Quantity),
    Task(Task),
    Value(TypeValue),
}

impl Item {
    pub fn code(&self) -> TypeCode {
        match self {
            Item::Origin(_) => TypeCode::Origin,
            Item::Product(_) => TypeCode::Product,
            Item::Level(_) => TypeCode::Level,
            Item::Timerange(_) => TypeCode::Timerange,
            Item::Reftime(_) => TypeCode::Reftime,
            Item::Area(_) => TypeCode::Area,
            Item::Proddef(_) => TypeCode::Proddef,
            Item::Source(_) => TypeCode::Source,
            Item::Note(_) => TypeCode::Note,
            Item::AssignedDataset(_) => TypeCode::AssignedDataset,
            Item::Run(_) => TypeCode::Run,
            Item::BBox(_) => TypeCode::BBox,
            Item::Quantity(_) => TypeCode::Quantity,
            Item::Task(_) => TypeCode::Task,
            Item::Value(_) => TypeCode::Value,
        }
    }

    fn encode_payload(&self, enc: &mut Encoder) {
        match self {
            Item::Origin(v) => v.encode_payload(enc),
            Item::Product(v) => v.encode_payload(enc),
            Item::Level(v) => v.encode_payload(enc),
            Item::Timerange(v) => v.encode_payload(enc),
            Item::Reftime(v) => v.encode_payload(enc),
            Item::Area(v) => v.encode_payload(enc),
            Item::Proddef(v) => v.encode_payload(enc),
            Item::Source(v) => v.encode_payload(enc),
            Item::Note(v) => v.encode_payload(enc),
            Item::AssignedDataset(v) => v.encode_payload(enc),
            Item::Run(v) => v.encode_payload(enc),
            Item::BBox(v) => v.encode_payload(enc),
            Item::Quantity(v) => v.encode_payload(enc),
            Item::Task(v) => v.encode_payload(enc),
            Item::Value(v) => v.encode_payload(enc),
        }
    }

    /// Encodes the payload with lazily-resolved derived fields elided (spec
    /// §4.6): the only styles that carry such fields are `Product::Vm2` and
    /// `Area::Vm2`; every other code falls back to `encode_payload`. This is
    /// what the index's attribute tables hash and store, so a later
    /// derived-value resolution never changes a row's identity.
    pub fn encode_for_indexing(&self, enc: &mut Encoder) {
        match self {
            Item::Product(v) => v.encode_for_indexing(enc),
            Item::Area(v) => v.encode_for_indexing(enc),
            other => other.encode_payload(enc),
        }
    }

    /// Encodes this item wrapped in its type envelope (`varint(code) ·
    /// varint(size) · payload`, spec §4.3).
    pub fn encode(&self, enc: &mut Encoder) {
        let mut payload = Encoder::new();
        self.encode_payload(&mut payload);
        encode_envelope(enc, self.code().wire_code(), payload.as_slice());
    }

    /// Decodes one item from a type envelope.
    pub fn decode(dec: &mut Decoder) -> Result<Item> {
        let (code, body) = decode_envelope(dec)?;
        let code = TypeCode::from_wire_code(code)?;
        let mut inner = Decoder::new(body);
        Self::decode_payload(code, &mut inner)
    }

    /// Decodes just the payload for a known code (used when the envelope
    /// has already been stripped, e.g. by ItemSet).
    pub fn decode_payload(code: TypeCode, dec: &mut Decoder) -> Result<Item> {
        Ok(match code {
            TypeCode::Origin => Item::Origin(Origin::decode(dec)?),
            TypeCode::Product => Item::Product(Product::decode(dec)?),
            TypeCode::Level => Item::Level(Level::decode(dec)?),
            TypeCode::Timerange => Item::Timerange(Timerange::decode(dec)?),
            TypeCode::Reftime => Item::Reftime(Reftime::decode(dec)?),
            TypeCode::Area => Item::Area(Area::decode(dec)?),
            TypeCode::Proddef => Item::Proddef(Proddef::decode(dec)?),
            TypeCode::Source => Item::Source(Source::decode(dec)?),
            TypeCode::Note => Item::Note(Note::decode(dec)?),
            TypeCode::AssignedDataset => Item::AssignedDataset(AssignedDataset::decode(dec)?),
            TypeCode::Run => Item::Run(Run::decode(dec)?),
            TypeCode::BBox => Item::BBox(BBox::decode(dec)?),
            TypeCode::Quantity => Item::Quantity(Quantity::decode(dec)?),
            TypeCode::Task => Item::Task(Task::decode(dec)?),
            TypeCode::Value => Item::Value(TypeValue::decode(dec)?),
        })
    }

    pub fn write_text(&self, out: &mut String) {
        match self {
            Item::Origin(v) => v.write_text(out),
            Item::Product(v) => v.write_text(out),
            Item::Level(v) => v.write_text(out),
            Item::Timerange(v) => v.write_text(out),
            Item::Reftime(v) => v.write_text(out),
            Item::Area(v) => v.write_text(out),
            Item::Proddef(v) => v.write_text(out),
            Item::Source(v) => v.write_text(out),
            Item::Note(v) => v.write_text(out),
            Item::AssignedDataset(v) => v.write_text(out),
            Item::Run(v) => v.write_text(out),
            Item::BBox(v) => v.write_text(out),
            Item::Quantity(v) => v.write_text(out),
            Item::Task(v) => v.write_text(out),
            Item::Value(v) => v.write_text(out),
        }
    }

    pub fn to_text(&self) -> String {
        let mut s = String::new();
        self.write_text(&mut s);
        s
    }

    pub fn parse_text(code: TypeCode, s: &str) -> Result<Item> {
        Ok(match code {
            TypeCode::Origin => Item::Origin(Origin::parse_text(s)?),
            TypeCode::Product => Item::Product(Product::parse_text(s)?),
            TypeCode::Level => Item::Level(Level::parse_text(s)?),
            TypeCode::Timerange => Item::Timerange(Timerange::parse_text(s)?),
            TypeCode::Reftime => Item::Reftime(Reftime::parse_text(s)?),
            TypeCode::Area => Item::Area(Area::parse_text(s)?),
            TypeCode::Proddef => Item::Proddef(Proddef::parse_text(s)?),
            TypeCode::Source => Item::Source(Source::parse_text(s)?),
            TypeCode::Note => Item::Note(Note::parse_text(s)?),
            TypeCode::AssignedDataset => Item::AssignedDataset(AssignedDataset::parse_text(s)?),
            TypeCode::Run => Item::Run(Run::parse_text(s)?),
            TypeCode::BBox => Item::BBox(BBox::parse_text(s)?),
            TypeCode::Quantity => Item::Quantity(Quantity::parse_text(s)?),
            TypeCode::Task => Item::Task(Task::parse_text(s)?),
            TypeCode::Value => Item::Value(TypeValue::parse_text(s)?),
        })
    }

    /// A matcher expression string that matches only this item (spec §4.3).
    pub fn exact_query(&self) -> String {
        match self {
            Item::Origin(v) => v.exact_query(),
            Item::Product(v) => v.exact_query(),
            Item::Level(v) => v.exact_query(),
            Item::Timerange(v) => v.exact_query(),
            Item::Reftime(v) => v.exact_query(),
            Item::Area(v) => v.exact_query(),
            Item::Proddef(v) => v.exact_query(),
            Item::Source(v) => v.exact_query(),
            Item::Note(v) => v.exact_query(),
            Item::AssignedDataset(v) => v.exact_query(),
            Item::Run(v) => v.exact_query(),
            Item::BBox(v) => v.exact_query(),
            Item::Quantity(v) => v.exact_query(),
            Item::Task(v) => v.exact_query(),
            Item::Value(v) => v.exact_query(),
        }
    }

    /// Serialises this item to the structured (JSON-like) form (spec §6):
    /// the concrete type's own mapping, with the type-code discriminant
    /// merged in under `keys.type_name`.
    pub fn serialise(&self, keys: &Keys) -> Json {
        let mut v = match self {
            Item::Origin(x) => x.serialise(keys),
            Item::Product(x) => x.serialise(keys),
            Item::Level(x) => x.serialise(keys),
            Item::Timerange(x) => x.serialise(keys),
            Item::Reftime(x) => x.serialise(keys),
            Item::Area(x) => x.serialise(keys),
            Item::Proddef(x) => x.serialise(keys),
            Item::Source(x) => x.serialise(keys),
            Item::Note(x) => x.serialise(keys),
            Item::AssignedDataset(x) => x.serialise(keys),
            Item::Run(x) => x.serialise(keys),
            Item::BBox(x) => x.serialise(keys),
            Item::Quantity(x) => x.serialise(keys),
            Item::Task(x) => x.serialise(keys),
            Item::Value(x) => x.serialise(keys),
        };
        if let Some(map) = v.as_object_mut() {
            map.insert(keys.type_name.to_string(), Json::String(self.code().name().to_string()));
        }
        v
    }

    /// Decodes a structured mapping back into an `Item`. The type code is
    /// read from `keys.type_name` rather than taken as a parameter, mirroring
    /// `decode_payload` for the binary form.
    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<Item> {
        let name = get_str("Item", v, keys.type_name)?;
        let code = TypeCode::from_name(name)?;
        Ok(match code {
            TypeCode::Origin => Item::Origin(Origin::decode_structure(keys, v)?),
            TypeCode::Product => Item::Product(Product::decode_structure(keys, v)?),
            TypeCode::Level => Item::Level(Level::decode_structure(keys, v)?),
            TypeCode::Timerange => Item::Timerange(Timerange::decode_structure(keys, v)?),
            TypeCode::Reftime => Item::Reftime(Reftime::decode_structure(keys, v)?),
            TypeCode::Area => Item::Area(Area::decode_structure(keys, v)?),
            TypeCode::Proddef => Item::Proddef(Proddef::decode_structure(keys, v)?),
            TypeCode::Source => Item::Source(Source::decode_structure(keys, v)?),
            TypeCode::Note => Item::Note(Note::decode_structure(keys, v)?),
            TypeCode::AssignedDataset => Item::AssignedDataset(AssignedDataset::decode_structure(keys, v)?),
            TypeCode::Run => Item::Run(Run::decode_structure(keys, v)?),
            TypeCode::BBox => Item::BBox(BBox::decode_structure(keys, v)?),
            TypeCode::Quantity => Item::Quantity(Quantity::decode_structure(keys, v)?),
            TypeCode::Task => Item::Task(Task::decode_structure(keys, v)?),
            TypeCode::Value => Item::Value(TypeValue::decode_structure(keys, v)?),
        })
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Items compare by code first, then by their own natural ordering; the
/// index and summary trie both key on this.
impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(&other.code()).then_with(|| match (self, other) {
            (Item::Origin(a), Item::Origin(b)) => a.cmp(b),
            (Item::Product(a), Item::Product(b)) => a.cmp(b),
            (Item::Level(a), Item::Level(b)) => a.cmp(b),
            (Item::Timerange(a), Item::Timerange(b)) => a.cmp(b),
            (Item::Reftime(a), Item::Reftime(b)) => a.cmp(b),
            (Item::Area(a), Item::Area(b)) => a.cmp(b),
            (Item::Proddef(a), Item::Proddef(b)) => a.cmp(b),
            (Item::Source(a), Item::Source(b)) => a.cmp(b),
            (Item::Note(a), Item::Note(b)) => a.cmp(b),
            (Item::AssignedDataset(a), Item::AssignedDataset(b)) => a.cmp(b),
            (Item::Run(a), Item::Run(b)) => a.cmp(b),
            (Item::BBox(a), Item::BBox(b)) => a.cmp(b),
            (Item::Quantity(a), Item::Quantity(b)) => a.cmp(b),
            (Item::Task(a), Item::Task(b)) => a.cmp(b),
            (Item::Value(a), Item::Value(b)) => a.cmp(b),
            _ => Ordering::Equal,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_envelope() {
        let item = Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        });
        let mut enc = Encoder::new();
        item.encode(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        assert_eq!(Item::decode(&mut dec).unwrap(), item);
    }

    #[test]
    fn exact_query_round_trips_through_parse() {
        let item = Item::Run(Run::hour_minute(12, 0));
        let q = item.exact_query();
        assert!(q.starts_with("run:"));
    }

    #[test]
    fn round_trip_structured() {
        let item = Item::Run(Run::hour_minute(12, 0));
        let j = item.serialise(&crate::keys::KEYS_JSON);
        assert_eq!(j.get("t").and_then(|v| v.as_str()), Some("run"));
        assert_eq!(Item::decode_structure(&crate::keys::KEYS_JSON, &j).unwrap(), item);
    }

    #[test]
    fn round_trip_structured_python_keys() {
        let item = Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        });
        let j = item.serialise(&crate::keys::KEYS_PYTHON);
        assert_eq!(j.get("type").and_then(|v| v.as_str()), Some("origin"));
        assert_eq!(Item::decode_structure(&crate::keys::KEYS_PYTHON, &j).unwrap(), item);
    }

    #[test]
    fn orders_by_code_first() {
        let a = Item::Origin(Origin::Grib1 {
            centre: 255,
            subcentre: 255,
            process: 255,
        });
        let b = Item::Product(Product::Grib1 {
            origin: 0,
            table: 0,
            product: 0,
        });
        assert!(a < b);
    }
}
