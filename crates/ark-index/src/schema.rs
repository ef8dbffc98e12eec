use crate::aggregate;
use crate::attr::table_name;
use crate::error::{Error, Result};
use rusqlite::Connection;

/// Creates every `sub_<code>` attribute table, the `aggregate` combination
/// table, and the `md` record table (spec §4.6, §6 "on-disk layout"), if
/// they don't already exist.
pub fn init(conn: &Connection) -> Result<()> {
    for &code in aggregate::members() {
        let table = table_name(code);
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (id INTEGER PRIMARY KEY, data BLOB NOT NULL UNIQUE);",
            table = table,
        ))
        .map_err(|e| Error::sql("schema init (attribute table)", e))?;
    }

    let cols = aggregate::members()
        .iter()
        .map(|c| format!("{} INTEGER NOT NULL", c.name()))
        .collect::<Vec<_>>()
        .join(", ");
    let unique = aggregate::members().iter().map(|c| c.name()).collect::<Vec<_>>().join(", ");
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (id INTEGER PRIMARY KEY, {cols}, UNIQUE({unique}));",
        table = aggregate::TABLE,
        cols = cols,
        unique = unique,
    ))
    .map_err(|e| Error::sql("schema init (aggregate table)", e))?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS md (
            id INTEGER PRIMARY KEY,
            reftime_begin TEXT NOT NULL,
            reftime_end TEXT NOT NULL,
            aggregate_id INTEGER NOT NULL REFERENCES aggregate(id),
            segment TEXT NOT NULL,
            offset INTEGER NOT NULL,
            size INTEGER NOT NULL,
            usn INTEGER
        );
        CREATE INDEX IF NOT EXISTS md_reftime ON md (reftime_begin, reftime_end);
        CREATE INDEX IF NOT EXISTS md_aggregate ON md (aggregate_id);
        ",
    )
    .map_err(|e| Error::sql("schema init (md table)", e))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();
    }
}
