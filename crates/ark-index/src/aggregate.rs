use crate::attr::Attr;
use crate::error::{Error, Result};
use ark_matcher::Matcher;
use ark_metadata::ItemSet;
use ark_types::TypeCode;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;

pub const TABLE: &str = "aggregate";

/// The members of the aggregate combination table, in MSO order — the same
/// ten codes the summary trie keys on (spec §4.6, §4.7).
pub fn members() -> &'static [TypeCode] {
    &ark_types::MSO
}

/// The `aggregate` combination table: one row per distinct tuple of
/// per-code attribute ids seen across every record (spec §4.6).
pub struct Aggregate {
    attrs: HashMap<TypeCode, Attr>,
    cache: RefCell<fxhash::FxHashMap<Vec<i64>, i64>>,
}

impl Aggregate {
    pub fn new() -> Aggregate {
        let attrs = members().iter().map(|&code| (code, Attr::new(code))).collect();
        Aggregate {
            attrs,
            cache: RefCell::new(fxhash::FxHashMap::default()),
        }
    }

    pub fn attr(&self, code: TypeCode) -> Option<&Attr> {
        self.attrs.get(&code)
    }

    /// Resolves each member's id for `md` without inserting anything.
    /// `Ok(None)` means at least one present attribute has never been
    /// interned, so no combination involving it can exist either (spec §7:
    /// `Attr.id`'s `NotFound` is absorbed here, not propagated).
    fn lookup_ids(&self, conn: &Connection, md: &ItemSet) -> Result<Option<Vec<i64>>> {
        let mut ids = Vec::with_capacity(members().len());
        for &code in members() {
            match self.attrs[&code].id(conn, md) {
                Ok(id) => ids.push(id),
                Err(e) if e.is_not_found() => return Ok(None),
                Err(e) => return Err(e),
            }
        }
        Ok(Some(ids))
    }

    fn obtain_ids(&self, conn: &Connection, md: &ItemSet) -> Result<Vec<i64>> {
        members().iter().map(|&code| self.attrs[&code].insert(conn, md)).collect()
    }

    fn select_row_id(&self, conn: &Connection, ids: &[i64]) -> Result<Option<i64>> {
        let cols = members().iter().map(|c| format!("{} = ?", c.name())).collect::<Vec<_>>().join(" AND ");
        let sql = format!("SELECT id FROM {} WHERE {}", TABLE, cols);
        conn.prepare_cached(&sql)
            .map_err(|e| Error::sql("Aggregate lookup", e))?
            .query_row(params_from_iter(ids.iter()), |row| row.get(0))
            .optional()
            .map_err(|e| Error::sql("Aggregate lookup", e))
    }

    /// Finds the existing combination for `md`. `-1` if absent.
    pub fn get(&self, conn: &Connection, md: &ItemSet) -> Result<i64> {
        let ids = match self.lookup_ids(conn, md)? {
            Some(ids) => ids,
            None => return Ok(-1),
        };
        if let Some(&id) = self.cache.borrow().get(&ids) {
            return Ok(id);
        }
        match self.select_row_id(conn, &ids)? {
            Some(id) => {
                self.cache.borrow_mut().insert(ids, id);
                Ok(id)
            }
            None => Ok(-1),
        }
    }

    /// Inserts the combination for `md` if absent, and returns its id.
    pub fn obtain(&self, conn: &Connection, md: &ItemSet) -> Result<i64> {
        let ids = self.obtain_ids(conn, md)?;
        if let Some(&id) = self.cache.borrow().get(&ids) {
            return Ok(id);
        }
        if let Some(id) = self.select_row_id(conn, &ids)? {
            self.cache.borrow_mut().insert(ids, id);
            return Ok(id);
        }
        let cols = members().iter().map(|c| c.name()).collect::<Vec<_>>().join(", ");
        let placeholders = members().iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("INSERT OR IGNORE INTO {} ({}) VALUES ({})", TABLE, cols, placeholders);
        conn.prepare_cached(&sql)
            .map_err(|e| Error::sql("Aggregate.obtain insert", e))?
            .execute(params_from_iter(ids.iter()))
            .map_err(|e| Error::sql("Aggregate.obtain insert", e))?;
        let id = self
            .select_row_id(conn, &ids)?
            .ok_or_else(|| Error::consistency("Aggregate.obtain", "row vanished immediately after insert"))?;
        tracing::debug!(aggregate_id = id, ?ids, "interned new aggregate combination");
        self.cache.borrow_mut().insert(ids, id);
        Ok(id)
    }

    /// Materializes every member attribute of combination `id` into `md`.
    pub fn read(&self, conn: &Connection, id: i64, md: &mut ItemSet) -> Result<()> {
        let cols = members().iter().map(|c| c.name()).collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT {} FROM {} WHERE id = ?", cols, TABLE);
        let ids: Vec<i64> = conn
            .prepare_cached(&sql)
            .map_err(|e| Error::sql("Aggregate.read", e))?
            .query_row(rusqlite::params![id], |row| {
                let mut ids = Vec::with_capacity(members().len());
                for i in 0..members().len() {
                    ids.push(row.get(i)?);
                }
                Ok(ids)
            })
            .map_err(|e| Error::sql("Aggregate.read", e))?;
        for (&code, &attr_id) in members().iter().zip(ids.iter()) {
            self.attrs[&code].read(conn, attr_id, md)?;
        }
        Ok(())
    }

    /// For each matcher clause whose code is a member, emits `<prefix>.<col>
    /// IN (...)` into `out` and returns how many clauses were emitted.
    /// A clause matching no interned value still emits an always-false `IN
    /// ()`, since that is the correct translation of "nothing matches".
    pub fn add_constraints(&self, conn: &Connection, matcher: &Matcher, out: &mut Vec<String>, prefix: &str) -> Result<usize> {
        let mut emitted = 0;
        for &code in members() {
            let or = match matcher.clause(code) {
                Some(or) => or,
                None => continue,
            };
            let ids = self.attrs[&code].ids_matching(conn, or)?;
            let list = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ");
            out.push(format!("{}.{} IN ({})", prefix, code.name(), list));
            emitted += 1;
        }
        Ok(emitted)
    }
}

impl Default for Aggregate {
    fn default() -> Aggregate {
        Aggregate::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema;
    use ark_matcher::AliasDatabase;
    use ark_time::Time;
    use ark_types::types::{Level, Origin};
    use ark_types::Item;

    fn memdb() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();
        conn
    }

    fn md(centre: u8, level: i32) -> ItemSet {
        vec![
            Item::Origin(Origin::Grib1 {
                centre,
                subcentre: 0,
                process: 0,
            }),
            Item::Level(Level::Grib1 { ltype: 1, l1: level, l2: 0 }),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn obtain_is_idempotent() {
        let conn = memdb();
        let agg = Aggregate::new();
        let m = md(1, 2);
        let a = agg.obtain(&conn, &m).unwrap();
        let b = agg.obtain(&conn, &m).unwrap();
        assert_eq!(a, b);
        assert_ne!(agg.get(&conn, &m).unwrap(), -1);
    }

    #[test]
    fn get_before_obtain_is_absent() {
        let conn = memdb();
        let agg = Aggregate::new();
        let m = md(9, 9);
        assert_eq!(agg.get(&conn, &m).unwrap(), -1);
    }

    #[test]
    fn read_round_trips_members() {
        let conn = memdb();
        let agg = Aggregate::new();
        let m = md(3, 4);
        let id = agg.obtain(&conn, &m).unwrap();
        let mut out = ItemSet::new();
        agg.read(&conn, id, &mut out).unwrap();
        assert_eq!(out.get(TypeCode::Origin), m.get(TypeCode::Origin));
        assert_eq!(out.get(TypeCode::Level), m.get(TypeCode::Level));
    }

    #[test]
    fn add_constraints_resolves_to_combination() {
        let conn = memdb();
        let agg = Aggregate::new();
        agg.obtain(&conn, &md(1, 2)).unwrap();
        agg.obtain(&conn, &md(5, 6)).unwrap();

        let db = AliasDatabase::new();
        let matcher = Matcher::parse("origin:GRIB1,1", &db, Time::now()).unwrap();
        let mut out = Vec::new();
        let emitted = agg.add_constraints(&conn, &matcher, &mut out, "agg").unwrap();
        assert_eq!(emitted, 1);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("agg.origin IN ("));
    }
}
