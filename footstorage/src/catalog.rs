use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection};

use crate::errors::{Result, StorageError};
use crate::models::RunRecord;

pub const STATUS_RUNNING: &str = "RUNNING";
pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILED: &str = "FAILED";

/// SQLite ledger of pipeline runs.
pub struct Catalog {
    conn: Arc<Mutex<Connection>>,
}

impl Catalog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Internal("catalog connection lock poisoned".to_string()))
    }

    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS pipeline_runs (
                run_id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_name TEXT NOT NULL,
                start_time INTEGER NOT NULL,
                end_time INTEGER,
                status TEXT NOT NULL,
                details TEXT
            );
            COMMIT;",
        )?;
        Ok(())
    }

    pub fn create_run(&self, run_name: &str) -> Result<i64> {
        let conn = self.conn()?;
        let start_time = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO pipeline_runs (run_name, start_time, status) VALUES (?1, ?2, ?3)",
            params![run_name, start_time, STATUS_RUNNING],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn finish_run(&self, run_id: i64, status: &str, details: &str) -> Result<()> {
        let conn = self.conn()?;
        let end_time = chrono::Utc::now().timestamp();
        let updated = conn.execute(
            "UPDATE pipeline_runs SET status = ?1, details = ?2, end_time = ?3 WHERE run_id = ?4",
            params![status, details, end_time, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound(format!("pipeline run {run_id}")));
        }
        Ok(())
    }

    pub fn get_run(&self, run_id: i64) -> Result<Option<RunRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, run_name, start_time, end_time, status, details FROM pipeline_runs WHERE run_id = ?1",
        )?;
        let mut rows = stmt.query(params![run_id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(RunRecord {
                run_id: row.get(0)?,
                run_name: row.get(1)?,
                start_time: row.get(2)?,
                end_time: row.get(3)?,
                status: row.get(4)?,
                details: row.get(5)?,
            }))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (Catalog, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let catalog = Catalog::open(dir.path().join("runs.sqlite")).unwrap();
        catalog.initialize_schema().unwrap();
        (catalog, dir)
    }

    #[test]
    fn test_run_lifecycle() {
        let (catalog, _dir) = setup();

        let run_id = catalog.create_run("migrate").unwrap();
        assert_eq!(run_id, 1);

        let running = catalog.get_run(run_id).unwrap().unwrap();
        assert_eq!(running.status, STATUS_RUNNING);
        assert!(running.end_time.is_none());

        catalog
            .finish_run(run_id, STATUS_SUCCESS, r#"{"elapsed_secs":1.5}"#)
            .unwrap();
        let finished = catalog.get_run(run_id).unwrap().unwrap();
        assert_eq!(finished.run_name, "migrate");
        assert_eq!(finished.status, STATUS_SUCCESS);
        assert!(finished.end_time.is_some());
        assert_eq!(finished.details.as_deref(), Some(r#"{"elapsed_secs":1.5}"#));
    }

    #[test]
    fn test_finish_unknown_run() {
        let (catalog, _dir) = setup();
        assert!(matches!(
            catalog.finish_run(42, STATUS_FAILED, "boom"),
            Err(StorageError::NotFound(_))
        ));
        assert!(catalog.get_run(42).unwrap().is_none());
    }
}
