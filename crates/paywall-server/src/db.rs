use paywall::{AssetLookup, AssetRecord, PaywallError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::ServerError;

/// SQLite database wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AssetRecord> {
    Ok(AssetRecord {
        identifier: row.get(0)?,
        original_name: row.get(1)?,
        payment_address: row.get(2)?,
        price: row.get::<_, i64>(3)?.max(0) as u64,
        currency: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    pub fn new(path: &str) -> Result<Self, ServerError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ServerError> {
        self.conn
            .lock()
            .map_err(|_| ServerError::Internal("database lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<(), ServerError> {
        let conn = self.lock()?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS assets (
                identifier TEXT PRIMARY KEY NOT NULL,
                original_name TEXT NOT NULL,
                payment_address TEXT NOT NULL,
                price INTEGER NOT NULL CHECK (price > 0),
                currency TEXT NOT NULL DEFAULT 'BTC',
                created_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assets_created ON assets(created_at)",
            [],
        )?;

        Ok(())
    }

    /// Insert a new asset record. Records are never updated afterwards.
    pub fn create_asset(&self, record: &AssetRecord) -> Result<(), ServerError> {
        let price = i64::try_from(record.price)
            .map_err(|_| ServerError::BadRequest(format!("price {} too large", record.price)))?;
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO assets (identifier, original_name, payment_address, price, currency, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.identifier,
                record.original_name,
                record.payment_address,
                price,
                record.currency,
                record.created_at
            ],
        )?;
        Ok(())
    }

    pub fn get_asset(&self, identifier: &str) -> Result<Option<AssetRecord>, ServerError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                r#"
                SELECT identifier, original_name, payment_address, price, currency, created_at
                FROM assets
                WHERE identifier = ?1
                "#,
                params![identifier],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// All assets, newest first.
    pub fn list_assets(&self) -> Result<Vec<AssetRecord>, ServerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT identifier, original_name, payment_address, price, currency, created_at
            FROM assets
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl AssetLookup for Database {
    fn find_asset(&self, identifier: &str) -> Result<Option<AssetRecord>, PaywallError> {
        self.get_asset(identifier)
            .map_err(|e| PaywallError::Lookup(e.to_string()))
    }
}
