//! SQLite database for extracted agenda project records
//!
//! One table holds every persisted record. A unique index over
//! (file_reference, project_name, date) makes re-processing the same
//! document a no-op instead of a duplicate row.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::ProjectRecord;

/// SQLite-backed store for agenda insights
pub struct InsightsDb {
    conn: Arc<Mutex<Connection>>,
}

impl InsightsDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::persistence(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::persistence(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#,
        )
        .map_err(|e| Error::persistence(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS agenda_insights (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                file_reference TEXT NOT NULL,
                project_name TEXT NOT NULL,
                consultant TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                region TEXT NOT NULL,
                discipline TEXT NOT NULL,
                inserted_at TEXT NOT NULL
            );

            -- Same document re-processed must not duplicate rows
            CREATE UNIQUE INDEX IF NOT EXISTS idx_agenda_insights_identity
                ON agenda_insights(file_reference, project_name, date);
        "#,
        )
        .map_err(|e| Error::persistence(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// Insert extracted records one by one, returning how many rows were
    /// actually committed.
    ///
    /// Writes are not wrapped in a transaction. `INSERT OR IGNORE` skips
    /// rows that collide with the identity index; callers compare the
    /// returned count against the submitted count to detect that
    /// shortfall. A driver error ends the batch as `Persistence`, with
    /// rows committed before the failure left in place.
    pub fn insert_records(
        &self,
        city: &str,
        file_reference: &str,
        records: &[ProjectRecord],
    ) -> Result<usize> {
        let conn = self.conn.lock();
        let now = Utc::now().to_rfc3339();

        let mut committed = 0;
        for record in records {
            let result = conn.execute(
                r#"
                INSERT OR IGNORE INTO agenda_insights (
                    city, file_reference, project_name, consultant, amount,
                    date, category, region, discipline, inserted_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    city,
                    file_reference,
                    record.project_name,
                    record.consultant,
                    record.amount,
                    record.date.to_string(),
                    record.categories_joined(),
                    record.region,
                    record.discipline,
                    &now,
                ],
            );

            match result {
                Ok(rows) => committed += rows,
                Err(e) => {
                    tracing::error!(project = %record.project_name, committed, "Insert failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        Ok(committed)
    }

    /// Fetch the most recently inserted rows
    pub fn recent_insights(&self, limit: usize) -> Result<Vec<InsightRow>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, city, file_reference, project_name, consultant, amount,
                       date, category, region, discipline, inserted_at
                FROM agenda_insights
                ORDER BY id DESC
                LIMIT ?1
                "#,
            )
            .map_err(|e| Error::persistence(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![limit as i64], row_to_insight)
            .map_err(|e| Error::persistence(format!("Failed to list insights: {}", e)))?
            .collect::<rusqlite::Result<Vec<InsightRow>>>()?;

        Ok(rows)
    }
}

/// One persisted insight row
#[derive(Debug, Clone, serde::Serialize)]
pub struct InsightRow {
    pub id: i64,
    pub city: String,
    pub file_reference: String,
    pub project_name: String,
    pub consultant: String,
    pub amount: f64,
    pub date: String,
    pub category: String,
    pub region: String,
    pub discipline: String,
    pub inserted_at: String,
}

fn row_to_insight(row: &rusqlite::Row) -> rusqlite::Result<InsightRow> {
    Ok(InsightRow {
        id: row.get(0)?,
        city: row.get(1)?,
        file_reference: row.get(2)?,
        project_name: row.get(3)?,
        consultant: row.get(4)?,
        amount: row.get(5)?,
        date: row.get(6)?,
        category: row.get(7)?,
        region: row.get(8)?,
        discipline: row.get(9)?,
        inserted_at: row.get(10)?,
    })
}
