use ark_binary::Encoder;
use ark_types::Item;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A per-summary cache of canonical `Item` values, keyed by their encoded
/// bytes (spec §4.7): the same origin, product, level, … recurs across
/// many records, and every recurrence shares one `Rc` rather than
/// allocating again.
#[derive(Default)]
pub struct TypeIntern {
    cache: RefCell<HashMap<Vec<u8>, Rc<Item>>>,
}

impl TypeIntern {
    pub fn new() -> TypeIntern {
        TypeIntern::default()
    }

    /// Returns the canonical `Rc` for an equal item, interning `item` as
    /// that canonical instance if this is the first time it's been seen.
    pub fn intern(&self, item: Item) -> Rc<Item> {
        let mut enc = Encoder::new();
        item.encode(&mut enc);
        let key = enc.into_vec();
        if let Some(existing) = self.cache.borrow().get(&key) {
            return existing.clone();
        }
        let rc = Rc::new(item);
        self.cache.borrow_mut().insert(key, rc.clone());
        rc
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_types::types::Origin;

    #[test]
    fn equal_items_share_one_allocation() {
        let intern = TypeIntern::new();
        let a = intern.intern(Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        }));
        let b = intern.intern(Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 2,
            process: 3,
        }));
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(intern.len(), 1);
    }

    #[test]
    fn distinct_items_do_not_share() {
        let intern = TypeIntern::new();
        let a = intern.intern(Item::Origin(Origin::Grib1 {
            centre: 1,
            subcentre: 0,
            process: 0,
        }));
        let b = intern.intern(Item::Origin(Origin::Grib1 {
            centre: 2,
            subcentre: 0,
            process: 0,
        }));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(intern.len(), 2);
    }
}
