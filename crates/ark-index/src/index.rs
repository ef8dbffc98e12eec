use crate::aggregate::Aggregate;
use crate::error::{Error, Result};
use crate::schema;
use ark_matcher::Matcher;
use ark_metadata::ItemSet;
use ark_time::Time;
use ark_types::{Item, Reftime, TypeCode};
use rusqlite::{params, Connection, OptionalExtension};

/// Replace policy for [`Index::acquire`] (spec §6 "Acquire semantics").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMode {
    /// A conflicting record is always a duplicate.
    Never,
    /// A conflicting record is always replaced.
    Always,
    /// A conflicting record is replaced only if the new Update-Sequence-
    /// Number is greater than or equal to the existing one.
    HigherUsn,
}

/// The outcome of an [`Index::acquire`] call. `Duplicate` and `Generic`
/// carry a detail message but are not [`Error`]s: a batch import keeps
/// going after either (spec §7 "acquire translates duplicate/consistency
/// [conditions] into ... results so batch imports can continue").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    Ok,
    Duplicate { detail: String },
    Generic { detail: String },
}

/// One `md` row, with its aggregate combination already materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub reftime: Reftime,
    pub segment: String,
    pub offset: u64,
    pub size: u64,
    pub usn: Option<i64>,
    pub items: ItemSet,
}

/// The SQLite-backed attribute/aggregate/record store for one dataset
/// (spec §4.6, §6 "on-disk layout": `index.sqlite`).
pub struct Index {
    conn: Connection,
    aggregate: Aggregate,
}

impl Index {
    /// Creates a new, empty index database at `path` (or an in-memory one
    /// for `":memory:"`), truncating anything already there.
    pub fn create(path: &str) -> Result<Index> {
        if path != ":memory:" {
            std::fs::write(path, &[]).map_err(|e| Error::invalid("Index::create", e))?;
        }
        let conn = Connection::open(path).map_err(|e| Error::sql("Index::create", e))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| Error::sql("Index::create", e))?;
        schema::init(&conn)?;
        Ok(Index {
            conn,
            aggregate: Aggregate::new(),
        })
    }

    /// Opens an existing index database, creating its schema if missing.
    pub fn open(path: &str) -> Result<Index> {
        let conn = Connection::open(path).map_err(|e| Error::sql("Index::open", e))?;
        schema::init(&conn)?;
        Ok(Index {
            conn,
            aggregate: Aggregate::new(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    /// Runs `body` inside an exclusive transaction (spec §4.6 "exclusive
    /// transaction per write batch").
    pub fn write_batch<T>(&self, body: impl FnOnce(&Index) -> Result<T>) -> Result<T> {
        self.conn
            .execute_batch("BEGIN EXCLUSIVE;")
            .map_err(|e| Error::sql("write_batch begin", e))?;
        let result = body(self);
        if result.is_ok() {
            self.conn.execute_batch("COMMIT;").map_err(|e| Error::sql("write_batch commit", e))?;
        } else {
            let _ = self.conn.execute_batch("ROLLBACK;");
        }
        result
    }

    /// Indexes one record (spec §6 "Acquire semantics"). `reftime` and the
    /// segment location are recorded directly in `md`; `md`'s remaining
    /// attributes go through the aggregate store.
    pub fn acquire(
        &self,
        md: &ItemSet,
        reftime: &Reftime,
        segment: &str,
        offset: u64,
        size: u64,
        usn: Option<i64>,
        replace: ReplaceMode,
    ) -> Result<AcquireOutcome> {
        let aggregate_id = self.aggregate.obtain(&self.conn, md)?;
        let reftime_begin = reftime.period_begin().to_sql();
        let reftime_end = reftime.period_end().to_sql();

        let existing: Option<(i64, Option<i64>)> = self
            .conn
            .prepare_cached(
                "SELECT id, usn FROM md WHERE aggregate_id = ? AND reftime_begin = ? AND reftime_end = ?",
            )
            .map_err(|e| Error::sql("acquire lookup", e))?
            .query_row(params![aggregate_id, reftime_begin, reftime_end], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .map_err(|e| Error::sql("acquire lookup", e))?;

        let Some((row_id, existing_usn)) = existing else {
            self.insert_md_row(aggregate_id, &reftime_begin, &reftime_end, segment, offset, size, usn)?;
            tracing::debug!(aggregate_id, segment, offset, size, "acquired new record");
            return Ok(AcquireOutcome::Ok);
        };

        match replace {
            ReplaceMode::Never => {
                tracing::debug!(md_id = row_id, segment, "acquire rejected duplicate");
                Ok(AcquireOutcome::Duplicate {
                    detail: format!("record already indexed (md id {})", row_id),
                })
            }
            ReplaceMode::Always => {
                self.replace_md_row(row_id, segment, offset, size, usn)?;
                tracing::debug!(md_id = row_id, segment, "acquire replaced existing record");
                Ok(AcquireOutcome::Ok)
            }
            ReplaceMode::HigherUsn => match (usn, existing_usn) {
                (Some(new_usn), Some(old_usn)) if new_usn >= old_usn => {
                    self.replace_md_row(row_id, segment, offset, size, usn)?;
                    tracing::debug!(md_id = row_id, segment, new_usn, old_usn, "acquire replaced on higher usn");
                    Ok(AcquireOutcome::Ok)
                }
                (Some(_), Some(_)) => Ok(AcquireOutcome::Duplicate {
                    detail: format!("existing record has a higher update-sequence-number (md id {})", row_id),
                }),
                _ => Ok(AcquireOutcome::Generic {
                    detail: "HIGHER_USN replace mode requires an update-sequence-number on both records".to_string(),
                }),
            },
        }
    }

    fn insert_md_row(
        &self,
        aggregate_id: i64,
        reftime_begin: &str,
        reftime_end: &str,
        segment: &str,
        offset: u64,
        size: u64,
        usn: Option<i64>,
    ) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO md (reftime_begin, reftime_end, aggregate_id, segment, offset, size, usn) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .map_err(|e| Error::sql("acquire insert", e))?
            .execute(params![
                reftime_begin,
                reftime_end,
                aggregate_id,
                segment,
                offset as i64,
                size as i64,
                usn
            ])
            .map_err(|e| Error::sql("acquire insert", e))?;
        Ok(())
    }

    fn replace_md_row(&self, row_id: i64, segment: &str, offset: u64, size: u64, usn: Option<i64>) -> Result<()> {
        self.conn
            .prepare_cached("UPDATE md SET segment = ?, offset = ?, size = ?, usn = ? WHERE id = ?")
            .map_err(|e| Error::sql("acquire replace", e))?
            .execute(params![segment, offset as i64, size as i64, usn, row_id])
            .map_err(|e| Error::sql("acquire replace", e))?;
        Ok(())
    }

    /// Resolves `matcher` to its matching records: pushes every aggregate-
    /// member clause down into SQL via `Aggregate::add_constraints`, then
    /// applies the Reftime clause (not an aggregate member) as a residual
    /// check against each row's own reftime (spec §8 property 7).
    pub fn query(&self, matcher: &Matcher) -> Result<Vec<Record>> {
        let mut constraints = Vec::new();
        self.aggregate.add_constraints(&self.conn, matcher, &mut constraints, "aggregate")?;

        let mut sql = "SELECT md.id, md.reftime_begin, md.reftime_end, md.segment, md.offset, md.size, md.usn, \
                        md.aggregate_id FROM md JOIN aggregate ON md.aggregate_id = aggregate.id"
            .to_string();
        if !constraints.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&constraints.join(" AND "));
        }

        let mut stmt = self.conn.prepare(&sql).map_err(|e| Error::sql("Index::query", e))?;
        let rows = stmt
            .query_map(params![], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, Option<i64>>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })
            .map_err(|e| Error::sql("Index::query", e))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, reftime_begin, reftime_end, segment, offset, size, usn, aggregate_id) =
                row.map_err(|e| Error::sql("Index::query", e))?;
            let begin = Time::parse_sql(&reftime_begin).map_err(|e| Error::invalid("md.reftime_begin", e))?;
            let end = Time::parse_sql(&reftime_end).map_err(|e| Error::invalid("md.reftime_end", e))?;
            let reftime = if begin == end {
                Reftime::Position(begin)
            } else {
                Reftime::Period(begin, end)
            };
            if let Some(or) = matcher.clause(TypeCode::Reftime) {
                if !or.matches_item(&Item::Reftime(reftime.clone())) {
                    continue;
                }
            }

            let mut items = ItemSet::new();
            self.aggregate.read(&self.conn, aggregate_id, &mut items)?;
            out.push(Record {
                id,
                reftime,
                segment,
                offset: offset as u64,
                size: size as u64,
                usn,
                items,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_matcher::AliasDatabase;
    use ark_types::types::Origin;

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
    fn acquire_then_query_round_trips() {
        let index = Index::create(":memory:").unwrap();
        let reftime = Reftime::Position(Time::new(2020, 1, 1, 0, 0, 0));
        let outcome = index
            .acquire(&origin_md(1), &reftime, "seg", 0, 4, None, ReplaceMode::Never)
            .unwrap();
        assert_eq!(outcome, AcquireOutcome::Ok);

        let db = AliasDatabase::new();
        let matcher = Matcher::parse("origin:GRIB1,1", &db, Time::now()).unwrap();
        let records = index.query(&matcher).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].segment, "seg");
        assert_eq!(records[0].reftime, reftime);
    }

    #[test]
    fn acquire_never_rejects_duplicate() {
        let index = Index::create(":memory:").unwrap();
        let reftime = Reftime::Position(Time::new(2020, 1, 1, 0, 0, 0));
        index
            .acquire(&origin_md(1), &reftime, "seg", 0, 4, None, ReplaceMode::Never)
            .unwrap();
        let outcome = index
            .acquire(&origin_md(1), &reftime, "seg2", 4, 8, None, ReplaceMode::Never)
            .unwrap();
        assert!(matches!(outcome, AcquireOutcome::Duplicate { .. }));
    }

    #[test]
    fn acquire_always_replaces() {
        let index = Index::create(":memory:").unwrap();
        let reftime = Reftime::Position(Time::new(2020, 1, 1, 0, 0, 0));
        index
            .acquire(&origin_md(1), &reftime, "seg", 0, 4, None, ReplaceMode::Never)
            .unwrap();
        let outcome = index
            .acquire(&origin_md(1), &reftime, "seg2", 4, 8, None, ReplaceMode::Always)
            .unwrap();
        assert_eq!(outcome, AcquireOutcome::Ok);

        let db = AliasDatabase::new();
        let matcher = Matcher::parse("origin:GRIB1,1", &db, Time::now()).unwrap();
        let records = index.query(&matcher).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].segment, "seg2");
    }

    #[test]
    fn acquire_higher_usn_rejects_lower() {
        let index = Index::create(":memory:").unwrap();
        let reftime = Reftime::Position(Time::new(2020, 1, 1, 0, 0, 0));
        index
            .acquire(&origin_md(1), &reftime, "seg", 0, 4, Some(5), ReplaceMode::HigherUsn)
            .unwrap();
        let outcome = index
            .acquire(&origin_md(1), &reftime, "seg2", 4, 8, Some(3), ReplaceMode::HigherUsn)
            .unwrap();
        assert!(matches!(outcome, AcquireOutcome::Duplicate { .. }));

        let outcome = index
            .acquire(&origin_md(1), &reftime, "seg3", 8, 16, Some(5), ReplaceMode::HigherUsn)
            .unwrap();
        assert_eq!(outcome, AcquireOutcome::Ok);
    }
}
