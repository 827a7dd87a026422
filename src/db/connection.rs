use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".chordpro-viewer";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "viewer.sqlite";

/// Resolve the data directory: `override_dir` when given, otherwise a dot
/// folder in the user's home.
pub fn data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

/// Ensure the database file exists inside `data_dir`, create the settings
/// table on first run, and return a live connection.
pub fn ensure_schema(data_dir: &Path) -> Result<Connection> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;

    let db_path = data_dir.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open SQLite database {}", db_path.display()))?;
    create_tables(&conn)?;
    Ok(conn)
}

/// A throwaway store with the same schema, used by tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create settings table")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_created_in_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("viewer");
        let conn = ensure_schema(&nested).unwrap();
        assert!(nested.join(DB_FILE_NAME).exists());

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'settings'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);

        // Opening twice must not fail on the existing table.
        drop(conn);
        ensure_schema(&nested).unwrap();
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = Path::new("/tmp/somewhere");
        assert_eq!(data_dir(Some(dir)).unwrap(), dir);
    }
}
