//! SQLite-backed volunteer register.
//!
//! A single `rusqlite::Connection` sits behind a mutex and every call runs on
//! Tokio's blocking pool, the same way the CSV verification job keeps file
//! and database work off the async workers. Each `insert_many` is one
//! transaction, so a batch is stored completely or not at all.

use super::{RecordStore, StoreError};
use async_trait::async_trait;
use chrono::NaiveDate;
use common::model::record::{CandidateRecord, FieldValue};
use common::model::schema::{FieldSchema, FieldType};
use common::model::stats::VolunteerStats;
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS volunteers_volunteers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    serial_number TEXT,
    full_name TEXT NOT NULL,
    age INTEGER,
    aadhar_number TEXT,
    sai_connect_id TEXT NOT NULL UNIQUE,
    sevadal_training_certificate TEXT NOT NULL DEFAULT 'no' CHECK (sevadal_training_certificate IN ('yes', 'no')),
    mobile_number TEXT,
    sss_district TEXT,
    gender TEXT,
    samiti_or_bhajan_mandli TEXT,
    education TEXT,
    special_qualifications TEXT,
    past_prashanti_service TEXT NOT NULL DEFAULT 'no' CHECK (past_prashanti_service IN ('yes', 'no')),
    last_service_location TEXT,
    other_service_location TEXT,
    prashanti_arrival TEXT,
    prashanti_departure TEXT,
    duty_point TEXT,
    is_cancelled TEXT NOT NULL DEFAULT 'no' CHECK (is_cancelled IN ('yes', 'no')),
    created_by_id TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS registered_volunteers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sai_connect_id TEXT NOT NULL UNIQUE REFERENCES volunteers_volunteers (sai_connect_id),
    batch TEXT,
    service_location TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

const TABLE: &str = "volunteers_volunteers";

#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
    schema: Arc<FieldSchema>,
    created_by_id: Option<String>,
}

impl SqliteRecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened volunteer register at {}", path.as_ref().display());
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema: Arc::new(FieldSchema::volunteer()),
            created_by_id: None,
        })
    }

    /// A handle on the same connection that stamps `created_by_id` on
    /// every row it inserts.
    pub fn with_created_by(&self, created_by_id: Option<String>) -> Self {
        Self {
            created_by_id,
            ..self.clone()
        }
    }

    pub async fn volunteer_stats(&self) -> Result<VolunteerStats, StoreError> {
        self.with_conn(|conn| {
            let (total, coming, not_coming): (i64, i64, i64) = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN is_cancelled = 'no' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN is_cancelled = 'yes' THEN 1 ELSE 0 END), 0)
                 FROM volunteers_volunteers",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            let registered: i64 =
                conn.query_row("SELECT COUNT(*) FROM registered_volunteers", [], |row| row.get(0))?;

            Ok(VolunteerStats {
                total_volunteers: total as u64,
                coming: coming as u64,
                not_coming: not_coming as u64,
                registered: registered as u64,
            })
        })
        .await
    }

    pub async fn find_volunteer(&self, sai_connect_id: &str) -> Result<Option<CandidateRecord>, StoreError> {
        let schema = self.schema.clone();
        let id = sai_connect_id.to_string();
        self.with_conn(move |conn| {
            let columns: Vec<&str> = schema.fields().iter().map(|f| f.key.as_str()).collect();
            let sql = format!(
                "SELECT {} FROM {} WHERE sai_connect_id = ?1",
                columns.join(", "),
                TABLE
            );
            let record = conn
                .query_row(&sql, params![id], |row| {
                    let mut record = CandidateRecord::new();
                    for (idx, field) in schema.fields().iter().enumerate() {
                        if let Some(value) = read_column(row, idx, field.field_type)? {
                            record.set(field.key, value);
                        }
                    }
                    Ok(record)
                })
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("join error: {}", e)))?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_many(&self, records: &[CandidateRecord]) -> Result<u64, StoreError> {
        let records = records.to_vec();
        let schema = self.schema.clone();
        let created_by_id = self.created_by_id.clone();

        self.with_conn(move |conn| {
            let mut columns: Vec<&str> = schema.fields().iter().map(|f| f.key.as_str()).collect();
            columns.push("created_by_id");
            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                TABLE,
                columns.join(", "),
                placeholders.join(", ")
            );

            let tx = conn.transaction()?;
            let mut inserted = 0u64;
            {
                let mut stmt = tx.prepare(&sql)?;
                for record in &records {
                    let mut values: Vec<Value> = schema
                        .fields()
                        .iter()
                        .map(|f| to_sql_value(record.get(f.key), f.field_type))
                        .collect();
                    values.push(created_by_id.clone().map_or(Value::Null, Value::Text));

                    let key = record.text(schema.unique_key()).unwrap_or_default();
                    inserted += stmt
                        .execute(params_from_iter(values))
                        .map_err(|e| StoreError::from(e).for_key(key))? as u64;
                }
            }
            tx.commit()?;
            debug!("Committed {} volunteer rows", inserted);
            Ok(inserted)
        })
        .await
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn to_sql_value(value: Option<&FieldValue>, field_type: FieldType) -> Value {
    match (value, field_type) {
        (None, FieldType::Boolean) => Value::Text(yes_no(false).to_string()),
        (None, _) => Value::Null,
        (Some(FieldValue::Text(s)), _) => Value::Text(s.clone()),
        (Some(FieldValue::Integer(n)), _) => Value::Integer(*n),
        (Some(FieldValue::Boolean(b)), _) => Value::Text(yes_no(*b).to_string()),
        (Some(FieldValue::Date(d)), _) => Value::Text(d.format("%Y-%m-%d").to_string()),
    }
}

fn read_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
    field_type: FieldType,
) -> rusqlite::Result<Option<FieldValue>> {
    Ok(match field_type {
        FieldType::Integer => row.get::<_, Option<i64>>(idx)?.map(FieldValue::Integer),
        FieldType::Boolean => row
            .get::<_, Option<String>>(idx)?
            .map(|s| FieldValue::Boolean(s == "yes")),
        FieldType::Date => row
            .get::<_, Option<String>>(idx)?
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .map(FieldValue::Date),
        FieldType::String => row.get::<_, Option<String>>(idx)?.map(FieldValue::Text),
    })
}
