use crate::errors::Result;
use crate::model::Record;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::info;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS records (
    ts INTEGER NOT NULL,
    humidity REAL NOT NULL,
    temperature REAL NOT NULL,
    humidifier_on INTEGER NOT NULL
)";

/// Append-only sink for aggregated records, backed by a SQLite file that is
/// created lazily the first time it is touched.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

/// Timestamps are persisted as whole seconds since the epoch.
#[derive(sqlx::FromRow)]
struct RecordRow {
    ts: i64,
    humidity: f64,
    temperature: f64,
    humidifier_on: i64,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record {
            timestamp: DateTime::from_timestamp(row.ts, 0).unwrap_or_default(),
            humidity_percent: row.humidity,
            temperature_celsius: row.temperature,
            device_active: row.humidifier_on != 0,
        }
    }
}

impl Store {
    pub async fn open(path: &str) -> Result<Store> {
        info!("Opening database at {}", path);

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        Ok(Store { pool })
    }

    /// In-memory database on a single connection, for tests.
    pub async fn in_memory() -> Result<Store> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Ok(Store { pool })
    }

    pub async fn insert(&self, record: &Record) -> Result<()> {
        self.ensure_schema().await?;

        sqlx::query(
            "INSERT INTO records (ts, humidity, temperature, humidifier_on)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(record.timestamp.timestamp())
        .bind(record.humidity_percent)
        .bind(record.temperature_celsius)
        .bind(i64::from(record.device_active))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The most recent `n` records, newest first.
    pub async fn recent(&self, n: u32) -> Result<Vec<Record>> {
        self.ensure_schema().await?;

        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT ts, humidity, temperature, humidifier_on
             FROM records
             ORDER BY ts DESC
             LIMIT ?1",
        )
        .bind(i64::from(n))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Record::from).collect())
    }

    /// Records with `start <= ts <= stop`, oldest first.
    pub async fn range(&self, start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<Vec<Record>> {
        self.ensure_schema().await?;

        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT ts, humidity, temperature, humidifier_on
             FROM records
             WHERE ts >= ?1 AND ts <= ?2
             ORDER BY ts ASC",
        )
        .bind(start.timestamp())
        .bind(stop.timestamp())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Record::from).collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}
