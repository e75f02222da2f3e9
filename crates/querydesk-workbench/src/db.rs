use rusqlite::Connection;

use crate::error::Result;

/// Initialise the workbench schema in `conn`.
///
/// Safe to call on every startup — uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS saved_queries (
            id          TEXT NOT NULL PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            query       TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_saved_queries_created
            ON saved_queries (created_at DESC);
        ",
    )?;
    Ok(())
}

/// Create and fill the demo `customer` table so a fresh install has
/// something to query against. Re-seeding replaces the rows.
pub fn seed_demo_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS customer (
            id     INTEGER NOT NULL PRIMARY KEY,
            name   TEXT    NOT NULL,
            email  TEXT    NOT NULL
        ) STRICT;

        DELETE FROM customer;
        INSERT INTO customer (id, name, email) VALUES
            (1, 'Ada Fern',    'ada.fern@example.com'),
            (2, 'Bo Linden',   'bo.linden@example.com'),
            (3, 'Cleo Marsh',  'cleo.marsh@example.com');
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
    }

    #[test]
    fn seed_replaces_rows() {
        let conn = Connection::open_in_memory().unwrap();
        seed_demo_data(&conn).unwrap();
        seed_demo_data(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM customer", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }
}
