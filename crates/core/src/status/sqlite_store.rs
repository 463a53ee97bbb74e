//! SQLite-backed status store implementation.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

use super::{CreateQueryRequest, StatusStore, StoreError};
use crate::detection::{Query, Response, ResponseRecord, ResponseStatus};

/// SQLite-backed status store.
pub struct SqliteStatusStore {
    conn: Mutex<Connection>,
}

impl SqliteStatusStore {
    /// Create a new SQLite status store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite status store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS queries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                source TEXT NOT NULL,
                model TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS responses (
                query_id INTEGER PRIMARY KEY REFERENCES queries(id),
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_responses_status ON responses(status);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_query(row: &rusqlite::Row) -> rusqlite::Result<Query> {
        Ok(Query {
            id: row.get(0)?,
            query_type: parse_column(row, 1)?,
            source: row.get(2)?,
            model: parse_column(row, 3)?,
            created_at: parse_timestamp(row, 4)?,
        })
    }

    fn row_to_response(row: &rusqlite::Row) -> rusqlite::Result<Response> {
        Ok(Response {
            query_id: row.get(0)?,
            status: parse_column(row, 1)?,
            created_at: parse_timestamp(row, 2)?,
            updated_at: parse_timestamp(row, 3)?,
        })
    }
}

fn parse_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl StatusStore for SqliteStatusStore {
    fn create_query(&self, request: CreateQueryRequest) -> Result<Query, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO queries (type, source, model, created_at) VALUES (?, ?, ?, ?)",
            params![
                request.query_type.as_str(),
                request.source,
                request.model.as_str(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Query {
            id: conn.last_insert_rowid(),
            query_type: request.query_type,
            source: request.source,
            model: request.model,
            created_at: now,
        })
    }

    fn get_query(&self, id: i64) -> Result<Option<Query>, StoreError> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT id, type, source, model, created_at FROM queries WHERE id = ?",
            params![id],
            Self::row_to_query,
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn update_query_source(&self, id: i64, source: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;

        let changed = conn
            .execute(
                "UPDATE queries SET source = ? WHERE id = ?",
                params![source, id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn create_response(&self, query_id: i64) -> Result<Response, StoreError> {
        let conn = self.conn()?;
        let now = Utc::now();
        let status = ResponseStatus::Processing;

        conn.execute(
            "INSERT INTO responses (query_id, status, created_at, updated_at) VALUES (?, ?, ?, ?)",
            params![query_id, status.as_str(), now.to_rfc3339(), now.to_rfc3339()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Response {
            query_id,
            status,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_response_status(
        &self,
        query_id: i64,
        status: ResponseStatus,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;

        let changed = conn
            .execute(
                "UPDATE responses SET status = ?, updated_at = ? WHERE query_id = ?",
                params![status.as_str(), Utc::now().to_rfc3339(), query_id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(StoreError::NotFound(query_id));
        }
        Ok(())
    }

    fn get_response(&self, query_id: i64) -> Result<Option<Response>, StoreError> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT query_id, status, created_at, updated_at FROM responses WHERE query_id = ?",
            params![query_id],
            Self::row_to_response,
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn find_response_by_query_id(&self, query_id: i64) -> Result<ResponseRecord, StoreError> {
        let conn = self.conn()?;

        let result = conn.query_row(
            "SELECT q.type, r.status FROM responses r JOIN queries q ON q.id = r.query_id WHERE r.query_id = ?",
            params![query_id],
            |row| {
                Ok(ResponseRecord {
                    query_type: parse_column(row, 0)?,
                    status: parse_column(row, 1)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(record),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound(query_id)),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }
}
