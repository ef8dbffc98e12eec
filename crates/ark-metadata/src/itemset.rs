use crate::error::{Error, Result};
use ark_binary::{Decoder, Encoder};
use ark_types::{Item, Keys, TypeCode};
use serde_json::Value as Json;

/// A (TypeCode → Item) mapping with at most one entry per code, stored in
/// code-sorted order (spec §4.3 ItemSet). `Metadata` composes one of these
/// with a Source and a list of Notes, neither of which live in the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    pub fn new() -> ItemSet {
        ItemSet::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has(&self, code: TypeCode) -> bool {
        self.index_of(code).is_ok()
    }

    pub fn get(&self, code: TypeCode) -> Option<&Item> {
        self.index_of(code).ok().map(|i| &self.items[i])
    }

    /// Sets an item, replacing any existing entry for its code.
    pub fn set(&mut self, item: Item) {
        match self.index_of(item.code()) {
            Ok(i) => self.items[i] = item,
            Err(i) => self.items.insert(i, item),
        }
    }

    pub fn unset(&mut self, code: TypeCode) {
        if let Ok(i) = self.index_of(code) {
            self.items.remove(i);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    fn index_of(&self, code: TypeCode) -> std::result::Result<usize, usize> {
        self.items.binary_search_by_key(&code, |item| item.code())
    }

    pub fn encode(&self, enc: &mut Encoder) {
        for item in &self.items {
            item.encode(enc);
        }
    }

    pub fn decode(dec: &mut Decoder) -> Result<ItemSet> {
        let mut items = Vec::new();
        while !dec.is_empty() {
            items.push(Item::decode(dec)?);
        }
        items.sort_by_key(|item| item.code());
        Ok(ItemSet { items })
    }

    /// Structured (JSON-like) form: a list of item mappings, each carrying
    /// its own type discriminant (spec §6, "Lists of types are lists of such
    /// mappings").
    pub fn serialise(&self, keys: &Keys) -> Json {
        Json::Array(self.items.iter().map(|item| item.serialise(keys)).collect())
    }

    pub fn decode_structure(keys: &Keys, v: &Json) -> Result<ItemSet> {
        let arr = v
            .as_array()
            .ok_or_else(|| Error::invalid("ItemSet", "expected a list"))?;
        let mut items = arr
            .iter()
            .map(|j| Ok(Item::decode_structure(keys, j)?))
            .collect::<Result<Vec<_>>>()?;
        items.sort_by_key(|item: &Item| item.code());
        Ok(ItemSet { items })
    }
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut set = ItemSet::new();
        for item in iter {
            set.set(item);
        }
        set
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_types::types::{Origin, Run};

    #[test]
    fn set_replaces_same_code() {
        let mut items = ItemSet::new();
        items.set(Item::Run(Run::hour_minute(0, 0)));
        items.set(Item::Run(Run::hour_minute(12, 0)));
        assert_eq!(items.len(), 1);
        assert_eq!(items.get(TypeCode::Run), Some(&Item::Run(Run::hour_minute(12, 0))));
    }

    #[test]
    fn round_trips_binary() {
        let mut items = ItemSet::new();
        items.set(Item::Run(Run::hour_minute(6, 0)));
        items.set(Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        }));
        let mut enc = Encoder::new();
        items.encode(&mut enc);
        let mut dec = Decoder::new(enc.as_slice());
        let back = ItemSet::decode(&mut dec).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn round_trips_structured() {
        let mut items = ItemSet::new();
        items.set(Item::Run(Run::hour_minute(6, 0)));
        items.set(Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        }));
        let j = items.serialise(&ark_types::KEYS_JSON);
        assert!(j.is_array());
        let back = ItemSet::decode_structure(&ark_types::KEYS_JSON, &j).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn unset_removes_entry() {
        let mut items = ItemSet::new();
        items.set(Item::Run(Run::hour_minute(0, 0)));
        items.unset(TypeCode::Run);
        assert!(!items.has(TypeCode::Run));
    }
}
