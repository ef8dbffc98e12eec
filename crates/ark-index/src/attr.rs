use crate::error::{Error, Result};
use ark_binary::{Decoder, Encoder};
use ark_matcher::Or;
use ark_metadata::ItemSet;
use ark_types::{Item, TypeCode};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;

/// `sub_<code>`: an attribute interning table, one row per distinct
/// `encode_for_indexing` byte string seen for this code (spec §4.6).
///
/// Holds no connection of its own — callers pass `&Connection` into every
/// method — so an `Index` can own a fixed table of these alongside the
/// connection without fighting the borrow checker. The value-blob → id
/// cache is keyed per instance; ids never change once assigned, so nothing
/// ever needs to invalidate it.
pub struct Attr {
    code: TypeCode,
    table: String,
    cache: RefCell<fxhash::FxHashMap<Vec<u8>, i64>>,
}

pub fn table_name(code: TypeCode) -> String {
    format!("sub_{}", code.name())
}

impl Attr {
    pub fn new(code: TypeCode) -> Attr {
        Attr {
            code,
            table: table_name(code),
            cache: RefCell::new(fxhash::FxHashMap::default()),
        }
    }

    pub fn code(&self) -> TypeCode {
        self.code
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn encode(&self, item: &Item) -> Vec<u8> {
        let mut enc = Encoder::new();
        item.encode_for_indexing(&mut enc);
        enc.into_vec()
    }

    /// Looks up this code's value from `md` in the table. `-1` if `md`
    /// carries no item for this code; `NotFound` if it does but the table
    /// has never seen that value.
    pub fn id(&self, conn: &Connection, md: &ItemSet) -> Result<i64> {
        let item = match md.get(self.code) {
            Some(item) => item,
            None => return Ok(-1),
        };
        let blob = self.encode(item);
        if let Some(&id) = self.cache.borrow().get(&blob) {
            return Ok(id);
        }
        let op = format!("Attr({}).id", self.code);
        let found: Option<i64> = conn
            .prepare_cached(&format!("SELECT id FROM {} WHERE data = ?", self.table))
            .map_err(|e| Error::sql(&op, e))?
            .query_row(params![blob], |row| row.get(0))
            .optional()
            .map_err(|e| Error::sql(&op, e))?;
        match found {
            Some(id) => {
                self.cache.borrow_mut().insert(blob, id);
                Ok(id)
            }
            None => Err(Error::not_found(format!(
                "{} value {}",
                self.code,
                item.to_text()
            ))),
        }
    }

    /// Ensures the value from `md` is present, inserting it if necessary,
    /// and returns its id. `-1` if `md` carries no item for this code.
    /// Idempotent via the table's UNIQUE constraint.
    pub fn insert(&self, conn: &Connection, md: &ItemSet) -> Result<i64> {
        let item = match md.get(self.code) {
            Some(item) => item,
            None => return Ok(-1),
        };
        let blob = self.encode(item);
        if let Some(&id) = self.cache.borrow().get(&blob) {
            return Ok(id);
        }
        let op = format!("Attr({}).insert", self.code);
        conn.prepare_cached(&format!("INSERT OR IGNORE INTO {} (data) VALUES (?)", self.table))
            .map_err(|e| Error::sql(&op, e))?
            .execute(params![blob])
            .map_err(|e| Error::sql(&op, e))?;
        let id: i64 = conn
            .prepare_cached(&format!("SELECT id FROM {} WHERE data = ?", self.table))
            .map_err(|e| Error::sql(&op, e))?
            .query_row(params![blob], |row| row.get(0))
            .map_err(|e| Error::sql(&op, e))?;
        tracing::debug!(code = %self.code, id, "interned new attribute value");
        self.cache.borrow_mut().insert(blob, id);
        Ok(id)
    }

    /// Materializes the value stored under `id` back into `md`. A no-op for
    /// the `-1` "absent" sentinel.
    pub fn read(&self, conn: &Connection, id: i64, md: &mut ItemSet) -> Result<()> {
        if id < 0 {
            return Ok(());
        }
        let op = format!("Attr({}).read", self.code);
        let blob: Vec<u8> = conn
            .prepare_cached(&format!("SELECT data FROM {} WHERE id = ?", self.table))
            .map_err(|e| Error::sql(&op, e))?
            .query_row(params![id], |row| row.get(0))
            .map_err(|e| Error::sql(&op, e))?;
        let mut dec = Decoder::new(&blob);
        let item = Item::decode_payload(self.code, &mut dec)?;
        md.set(item);
        Ok(())
    }

    /// Every `(id, value)` pair currently interned, used to resolve a
    /// matcher clause to a set of matching ids.
    pub fn scan(&self, conn: &Connection) -> Result<Vec<(i64, Item)>> {
        let op = format!("Attr({}).scan", self.code);
        let mut stmt = conn
            .prepare_cached(&format!("SELECT id, data FROM {}", self.table))
            .map_err(|e| Error::sql(&op, e))?;
        let rows = stmt
            .query_map(params![], |row| {
                let id: i64 = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, blob))
            })
            .map_err(|e| Error::sql(&op, e))?;
        let mut out = Vec::new();
        for row in rows {
            let (id, blob) = row.map_err(|e| Error::sql(&op, e))?;
            let mut dec = Decoder::new(&blob);
            out.push((id, Item::decode_payload(self.code, &mut dec)?));
        }
        Ok(out)
    }

    /// Ids of every interned value matching `or`, used to build the `IN
    /// (...)` constraint in [`crate::Aggregate::add_constraints`].
    pub fn ids_matching(&self, conn: &Connection, or: &Or) -> Result<Vec<i64>> {
        Ok(self
            .scan(conn)?
            .into_iter()
            .filter(|(_, item)| or.matches_item(item))
            .map(|(id, _)| id)
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_types::types::Origin;

    fn memdb() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE sub_origin (id INTEGER PRIMARY KEY, data BLOB NOT NULL UNIQUE);")
            .unwrap();
        conn
    }

    fn origin_md(centre: u8) -> ItemSet {
        vec![Item::Origin(Origin::Grib1 {
            centre,
            subcentre: 0,
            process: 0,
        })]
        .into_iter()
        .collect()
    }

    #[test]
    fn insert_is_idempotent() {
        let conn = memdb();
        let attr = Attr::new(TypeCode::Origin);
        let md = origin_md(1);
        let a = attr.insert(&conn, &md).unwrap();
        let b = attr.insert(&conn, &md).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn id_without_insert_is_not_found() {
        let conn = memdb();
        let attr = Attr::new(TypeCode::Origin);
        let md = origin_md(1);
        assert!(attr.id(&conn, &md).unwrap_err().is_not_found());
    }

    #[test]
    fn missing_code_is_minus_one() {
        let conn = memdb();
        let attr = Attr::new(TypeCode::Origin);
        let md = ItemSet::new();
        assert_eq!(attr.id(&conn, &md).unwrap(), -1);
        assert_eq!(attr.insert(&conn, &md).unwrap(), -1);
    }

    #[test]
    fn read_materializes_value() {
        let conn = memdb();
        let attr = Attr::new(TypeCode::Origin);
        let md = origin_md(7);
        let id = attr.insert(&conn, &md).unwrap();
        let mut out = ItemSet::new();
        attr.read(&conn, id, &mut out).unwrap();
        assert_eq!(out.get(TypeCode::Origin), md.get(TypeCode::Origin));
    }
}
