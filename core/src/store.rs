//! SQLite request log.
//!
//! RULE: Only store.rs talks to the database.
//! The store records submitted requests and their replies. Simulations and
//! accounts live in memory and are never written here.

use crate::{
    error::SimResult,
    recorder::ApiResponse,
    request::RequestBody,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// One logged request with the reply it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogEntry {
    pub id:         String,
    pub api_key:    String,
    pub endpoint:   String,
    pub method:     String,
    pub body:       RequestBody,
    pub response:   ApiResponse,
    pub status:     u16,
    pub latency_ms: u64,
    pub timestamp:  DateTime<Utc>,
}

pub struct RequestStore {
    conn: Connection,
}

impl RequestStore {
    /// Open (or create) the request log database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (the default for a session).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_request_log.sql"))?;
        Ok(())
    }

    pub fn append(&self, entry: &RequestLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO request_log
                 (request_id, api_key, endpoint, method, body, response, status, latency_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id,
                entry.api_key,
                entry.endpoint,
                entry.method,
                serde_json::to_string(&entry.body)?,
                serde_json::to_string(&entry.response)?,
                entry.status as i64,
                entry.latency_ms as i64,
                entry.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent entries first, at most `limit`.
    pub fn recent(&self, limit: usize) -> SimResult<Vec<RequestLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT request_id, api_key, endpoint, method, body, response, status, latency_ms, created_at
             FROM request_log ORDER BY seq DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, String>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, api_key, endpoint, method, body, response, status, latency, created)| -> SimResult<RequestLogEntry> {
                let timestamp = DateTime::parse_from_rfc3339(&created)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| anyhow::anyhow!("bad timestamp '{created}' in request_log: {e}"))?;
                Ok(RequestLogEntry {
                    id,
                    api_key,
                    endpoint,
                    method,
                    body:       serde_json::from_str(&body)?,
                    response:   serde_json::from_str(&response)?,
                    status:     status as u16,
                    latency_ms: latency as u64,
                    timestamp,
                })
            })
            .collect()
    }

    pub fn count(&self) -> SimResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM request_log", [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn count_for_key(&self, api_key: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM request_log WHERE api_key = ?1",
            params![api_key],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn clear(&self) -> SimResult<()> {
        self.conn.execute("DELETE FROM request_log", [])?;
        Ok(())
    }
}
