//! SQLite-backed store for sales rows and prediction outputs.

use crate::error::{Error, Result};
use crate::model::{AnomalyReport, AnomalyResult};
use crate::records::{RecordKey, SalesRecord};
use crate::risk::WasteRiskResult;
use chrono::{Days, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sales_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    store_id INTEGER NOT NULL,
    product TEXT NOT NULL DEFAULT '',
    category TEXT,
    quantity_sold REAL NOT NULL,
    quantity_wasted REAL,
    stock REAL,
    price REAL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (date, store_id, product)
);
CREATE INDEX IF NOT EXISTS idx_sales_series ON sales_records(store_id, product, date);
CREATE TABLE IF NOT EXISTS anomaly_predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    store_id INTEGER NOT NULL,
    product TEXT NOT NULL DEFAULT '',
    is_anomaly INTEGER NOT NULL,
    anomaly_score REAL NOT NULL,
    model_id TEXT NOT NULL,
    explanation TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS waste_risk_predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    store_id INTEGER NOT NULL,
    product TEXT NOT NULL DEFAULT '',
    risk_score INTEGER NOT NULL,
    recommendation TEXT NOT NULL,
    actions TEXT NOT NULL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Optional filters for reading sales rows; `None` means unbounded.
#[derive(Debug, Clone, Default)]
pub struct SalesFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub store_id: Option<u32>,
}

pub struct SalesStore {
    conn: Mutex<Connection>,
}

// SQLite treats NULLs as distinct in UNIQUE, so a missing product is stored as ''.
fn product_column(product: &Option<String>) -> &str {
    product.as_deref().unwrap_or("")
}

fn product_from_column(product: String) -> Option<String> {
    (!product.is_empty()).then_some(product)
}

impl SalesStore {
    /// Open or create DB at path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert all records in one transaction. A key that already exists rejects the whole batch.
    pub fn insert_sales(&self, records: &[SalesRecord]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO sales_records
                 (date, store_id, product, category, quantity_sold, quantity_wasted, stock, price)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in records {
                r.validate()?;
                stmt.execute(params![
                    r.date,
                    r.store_id,
                    product_column(&r.product),
                    r.category,
                    r.quantity_sold,
                    r.quantity_wasted,
                    r.stock,
                    r.price,
                ])
                .map_err(|e| match e {
                    rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation => {
                        Error::invalid_record(&r.key(), "already stored")
                    }
                    other => Error::Storage(other),
                })?;
            }
        }
        tx.commit()?;
        info!(count = records.len(), "stored sales records");
        Ok(records.len())
    }

    /// Rows matching `filter`, ordered by store, product, date (series order).
    pub fn sales(&self, filter: &SalesFilter) -> Result<Vec<SalesRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT date, store_id, product, category, quantity_sold, quantity_wasted, stock, price
             FROM sales_records
             WHERE (?1 IS NULL OR date >= ?1)
               AND (?2 IS NULL OR date <= ?2)
               AND (?3 IS NULL OR store_id = ?3)
             ORDER BY store_id, product, date",
        )?;
        let rows = stmt.query_map(params![filter.start, filter.end, filter.store_id], |row| {
            Ok(SalesRecord {
                date: row.get(0)?,
                store_id: row.get(1)?,
                product: product_from_column(row.get(2)?),
                category: row.get(3)?,
                quantity_sold: row.get(4)?,
                quantity_wasted: row.get(5)?,
                stock: row.get(6)?,
                price: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Up to `days` days of rows dated strictly before `before`, for warming rolling
    /// windows ahead of a detection run that starts at `before`.
    pub fn history_before(&self, before: NaiveDate, days: usize, store_id: Option<u32>) -> Result<Vec<SalesRecord>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let Some(last) = before.pred_opt() else {
            return Ok(Vec::new());
        };
        let first = before
            .checked_sub_days(Days::new(days as u64))
            .unwrap_or(NaiveDate::MIN);
        self.sales(&SalesFilter {
            start: Some(first),
            end: Some(last),
            store_id,
        })
    }

    pub fn sales_count(&self) -> Result<usize> {
        count(&self.conn(), "SELECT COUNT(*) FROM sales_records")
    }

    pub fn insert_anomalies(&self, reports: &[AnomalyReport]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO anomaly_predictions
                 (date, store_id, product, is_anomaly, anomaly_score, model_id, explanation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for rep in reports {
                let key = &rep.result.record_key;
                stmt.execute(params![
                    key.date,
                    key.store_id,
                    product_column(&key.product),
                    rep.result.is_anomaly,
                    rep.result.anomaly_score,
                    rep.result.model_id.to_string(),
                    rep.explanation,
                ])?;
            }
        }
        tx.commit()?;
        Ok(reports.len())
    }

    pub fn anomaly_count(&self) -> Result<usize> {
        count(&self.conn(), "SELECT COUNT(*) FROM anomaly_predictions WHERE is_anomaly = 1")
    }

    /// Most anomalous stored predictions first.
    pub fn top_anomalies(&self, limit: usize) -> Result<Vec<AnomalyReport>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT date, store_id, product, is_anomaly, anomaly_score, model_id, explanation
             FROM anomaly_predictions
             WHERE is_anomaly = 1
             ORDER BY anomaly_score ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], anomaly_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn insert_waste_risk(&self, results: &[WasteRiskResult]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO waste_risk_predictions
                 (date, store_id, product, risk_score, recommendation, actions)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in results {
                let key = &r.record_key;
                stmt.execute(params![
                    key.date,
                    key.store_id,
                    product_column(&key.product),
                    r.risk_score,
                    r.recommendation.as_str(),
                    serde_json::to_string(&r.actions)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(results.len())
    }

    pub fn waste_risk_count(&self) -> Result<usize> {
        count(&self.conn(), "SELECT COUNT(*) FROM waste_risk_predictions")
    }

    /// Retention: delete sales and predictions dated before `date`.
    pub fn prune_before(&self, date: NaiveDate) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut n = 0;
        for table in ["sales_records", "anomaly_predictions", "waste_risk_predictions"] {
            n += tx.execute(&format!("DELETE FROM {table} WHERE date < ?1"), params![date])?;
        }
        tx.commit()?;
        info!(removed = n, before = %date, "pruned store");
        Ok(n)
    }
}

fn count(conn: &Connection, sql: &str) -> Result<usize> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as usize)
}

fn anomaly_from_row(row: &Row<'_>) -> rusqlite::Result<AnomalyReport> {
    let model_id: String = row.get(5)?;
    let model_id = Uuid::parse_str(&model_id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(AnomalyReport {
        result: AnomalyResult {
            record_key: RecordKey {
                date: row.get(0)?,
                store_id: row.get(1)?,
                product: product_from_column(row.get(2)?),
            },
            is_anomaly: row.get(3)?,
            anomaly_score: row.get(4)?,
            model_id,
        },
        explanation: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}
