use rusqlite::Connection;

use crate::error::{Error, Result};

/// Stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match version {
        0 => {
            create_tables(conn)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        SCHEMA_VERSION => {}
        other => return Err(Error::UnsupportedSchema(other)),
    }
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<()> {
    // No UNIQUE on lft/rgt: a renumbering UPDATE collides row by row.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS albums (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id   INTEGER REFERENCES albums(id),
            lft         INTEGER NOT NULL,
            rgt         INTEGER NOT NULL,
            title       TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_albums_lft ON albums(lft);
        CREATE INDEX IF NOT EXISTS idx_albums_rgt ON albums(rgt);
        CREATE INDEX IF NOT EXISTS idx_albums_parent ON albums(parent_id);

        CREATE TABLE IF NOT EXISTS photos (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            album_id    INTEGER NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
            title       TEXT NOT NULL,
            taken_at    INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_photos_album ON photos(album_id);
        CREATE INDEX IF NOT EXISTS idx_photos_album_taken ON photos(album_id, taken_at);
        ",
    )?;
    Ok(())
}
