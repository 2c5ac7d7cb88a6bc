use std::fs;
use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{Result, VendorError};
use crate::models::{JoinedRow, StoreCounts, VendorDetailsRecord, VendorRecord, VendorTypeCode};
use crate::normalize::normalize_company;
use crate::schema::{vendor_details, vendors, NORMALIZE_FN};
use crate::search::SearchRequest;

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Default pool size when none is configured
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
/// Default wait for a pooled connection
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const VENDOR_COLUMN_COUNT: usize = 10;

/// Database manager for handling connections and operations
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (creating if needed) the database behind a `sqlite:` URL
    pub fn new(database_url: &str) -> Result<Self> {
        Self::with_pool(database_url, DEFAULT_MAX_CONNECTIONS, DEFAULT_CONNECTION_TIMEOUT)
    }

    /// Open the database with explicit pool settings
    pub fn with_pool(database_url: &str, max_connections: u32, connection_timeout: Duration) -> Result<Self> {
        let path = database_path(database_url);

        let (manager, max_size) = if path == ":memory:" {
            // Every in-memory connection is its own database, so the pool holds one
            (SqliteConnectionManager::memory(), 1)
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            (SqliteConnectionManager::file(path), max_connections.max(1))
        };

        let manager = manager.with_init(|conn| init_connection(conn));
        let mut builder = Pool::builder()
            .max_size(max_size)
            .connection_timeout(connection_timeout);
        if path == ":memory:" {
            // Recycling the only connection would drop the database with it
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder.build(manager)?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;
        drop(conn);

        info!(path, max_size, "Opened vendor database");
        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:")
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/2025-03-15-000000_create_vendors/up.sql"))?;
        conn.execute_batch(include_str!("../migrations/2025-03-20-000000_create_vendor_details/up.sql"))?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Replace the entire vendor set.
    ///
    /// Runs in one immediate transaction: either every record is written or
    /// the previous set is left untouched.
    pub fn replace_vendors(&self, records: &[VendorRecord]) -> Result<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(&format!("DELETE FROM {}", vendors::TABLE), [])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                vendors::TABLE,
                vendors::VENDOR_NAME,
                vendors::CERTIFICATE,
                vendors::EXPIRES,
                vendors::VENDOR_TYPE,
                vendors::CONTACT,
                vendors::PHONE,
                vendors::CERTS_EXPIRED,
                vendors::APPROVED,
                vendors::SOON_TO_EXPIRE,
                vendors::EXPIRATIONS_ALL
            ))?;

            for record in records {
                stmt.execute(params![
                    record.vendor_name,
                    serde_json::to_string(&record.valid_certificates)?,
                    record.soonest_expiration,
                    record.vendor_type.code(),
                    record.contact,
                    record.phone,
                    serde_json::to_string(&record.expired_certificates)?,
                    record.approved,
                    record.soon_to_expire_days,
                    serde_json::to_string(&record.expiration_dates)?,
                ])?;
            }
        }
        tx.commit()?;

        debug!(removed, written = records.len(), "Replaced vendor set");
        Ok(records.len())
    }

    /// Insert or update vendor details keyed by normalized company name.
    ///
    /// A later upload overwrites every column of an existing key, blanks
    /// included.
    pub fn upsert_vendor_details(&self, records: &[VendorDetailsRecord]) -> Result<usize> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let mut written = 0;
        {
            let columns = [
                vendor_details::COMPANY_DBA,
                vendor_details::DIVISION,
                vendor_details::TRADE,
                vendor_details::CONTACT_NAME,
                vendor_details::CELL_NUMBER,
                vendor_details::OFFICE_NUMBER,
                vendor_details::EMAIL,
                vendor_details::ADDRESS,
                vendor_details::CA_LICENSE,
                vendor_details::DIR_NUMBER,
                vendor_details::DVBE,
            ];
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} ({key}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                 ON CONFLICT({key}) DO UPDATE SET {}",
                columns.join(", "),
                columns.map(|column| format!("{column} = excluded.{column}")).join(", "),
                table = vendor_details::TABLE,
                key = vendor_details::COMPANY_KEY,
            ))?;

            for record in records {
                let key = record.key();
                if key.is_empty() {
                    continue;
                }
                written += stmt.execute(params![
                    key,
                    record.company_name,
                    record.division,
                    record.trade,
                    record.contact_name,
                    record.cell_number,
                    record.office_number,
                    record.email,
                    record.address,
                    record.ca_license,
                    record.dir_number,
                    record.dvbe,
                ])?;
            }
        }
        tx.commit()?;

        debug!(written, "Upserted vendor details");
        Ok(written)
    }

    /// Every stored vendor record, in insertion order
    pub fn all_vendors(&self) -> Result<Vec<VendorRecord>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} v ORDER BY v.rowid",
            vendor_columns("v"),
            vendors::TABLE
        ))?;

        let rows = stmt.query_map([], |row| map_vendor(row, 0))?;
        let mut results = Vec::new();
        for row in rows {
            if let Some(record) = row? {
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Every stored details record, ordered by key
    pub fn all_vendor_details(&self) -> Result<Vec<VendorDetailsRecord>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} d ORDER BY d.{}",
            details_columns("d"),
            vendor_details::TABLE,
            vendor_details::COMPANY_KEY
        ))?;

        let rows = stmt.query_map([], |row| map_details(row, 0))?;
        let mut results = Vec::new();
        for row in rows {
            if let Some(record) = row? {
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Outer-join vendors with details on normalized name and apply filters
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<JoinedRow>> {
        let conn = self.get_connection()?;

        let mut query = format!(
            "SELECT {}, {} FROM {} v FULL OUTER JOIN {} d ON {NORMALIZE_FN}(v.{}) = d.{} WHERE 1 = 1",
            vendor_columns("v"),
            details_columns("d"),
            vendors::TABLE,
            vendor_details::TABLE,
            vendors::VENDOR_NAME,
            vendor_details::COMPANY_KEY,
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(term) = request.name_filter() {
            query.push_str(&format!(
                " AND ({NORMALIZE_FN}(v.{}) LIKE ? ESCAPE '\\' OR d.{} LIKE ? ESCAPE '\\')",
                vendors::VENDOR_NAME,
                vendor_details::COMPANY_KEY
            ));
            let pattern = like_pattern(&term);
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }

        if let Some(division) = request.division.as_deref().filter(|d| !d.trim().is_empty()) {
            query.push_str(&format!(" AND d.{} LIKE ? ESCAPE '\\'", vendor_details::DIVISION));
            params.push(Box::new(like_pattern(division.trim())));
        }

        if let Some(trade) = request.trade.as_deref().filter(|t| !t.trim().is_empty()) {
            query.push_str(&format!(" AND d.{} LIKE ? ESCAPE '\\'", vendor_details::TRADE));
            params.push(Box::new(like_pattern(trade.trim())));
        }

        if request.has_dir {
            query.push_str(&format!(
                " AND (d.{0} IS NOT NULL AND TRIM(d.{0}) <> '')",
                vendor_details::DIR_NUMBER
            ));
        }

        if request.has_ca_license {
            query.push_str(&format!(
                " AND (d.{0} IS NOT NULL AND TRIM(d.{0}) <> '')",
                vendor_details::CA_LICENSE
            ));
        }

        query.push_str(&format!(" ORDER BY v.rowid, d.{}", vendor_details::COMPANY_KEY));

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(JoinedRow {
                vendor: map_vendor(row, 0)?,
                details: map_details(row, VENDOR_COLUMN_COUNT)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        debug!(rows = results.len(), "Search query returned");
        Ok(results)
    }

    /// Row counts of both tables
    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.get_connection()?;

        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            usize::try_from(n).map_err(|_| VendorError::Parse(format!("negative row count for {table}")))
        };

        Ok(StoreCounts {
            vendors: count(vendors::TABLE)?,
            vendor_details: count(vendor_details::TABLE)?,
        })
    }
}

/// Strip the `sqlite:` scheme from a database URL
#[must_use]
pub fn database_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

/// Per-connection setup: busy timeout and the normalizer SQL function
fn init_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.create_scalar_function(
        NORMALIZE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let name: Option<String> = ctx.get(0)?;
            Ok(normalize_company(name.as_deref().unwrap_or_default()))
        },
    )
}

/// `%term%` with LIKE wildcards in `term` escaped
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn vendor_columns(alias: &str) -> String {
    [
        vendors::VENDOR_NAME,
        vendors::CERTIFICATE,
        vendors::EXPIRES,
        vendors::VENDOR_TYPE,
        vendors::CONTACT,
        vendors::PHONE,
        vendors::CERTS_EXPIRED,
        vendors::APPROVED,
        vendors::SOON_TO_EXPIRE,
        vendors::EXPIRATIONS_ALL,
    ]
    .map(|column| format!("{alias}.{column}"))
    .join(", ")
}

fn details_columns(alias: &str) -> String {
    [
        vendor_details::COMPANY_DBA,
        vendor_details::DIVISION,
        vendor_details::TRADE,
        vendor_details::CONTACT_NAME,
        vendor_details::CELL_NUMBER,
        vendor_details::OFFICE_NUMBER,
        vendor_details::EMAIL,
        vendor_details::ADDRESS,
        vendor_details::CA_LICENSE,
        vendor_details::DIR_NUMBER,
        vendor_details::DVBE,
    ]
    .map(|column| format!("{alias}.{column}"))
    .join(", ")
}

/// Decode a JSON array column
fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map vendor columns starting at `offset`; `None` when the outer join had no vendor
fn map_vendor(row: &Row, offset: usize) -> rusqlite::Result<Option<VendorRecord>> {
    let Some(vendor_name) = row.get::<_, Option<String>>(offset)? else {
        return Ok(None);
    };

    Ok(Some(VendorRecord {
        vendor_name,
        valid_certificates: json_column(row, offset + 1)?,
        soonest_expiration: row.get(offset + 2)?,
        vendor_type: VendorTypeCode::from_code(row.get(offset + 3)?),
        contact: row.get(offset + 4)?,
        phone: row.get(offset + 5)?,
        expired_certificates: json_column(row, offset + 6)?,
        approved: row.get(offset + 7)?,
        soon_to_expire_days: row.get(offset + 8)?,
        expiration_dates: json_column(row, offset + 9)?,
    }))
}

/// Map details columns starting at `offset`; `None` when the outer join had no details
fn map_details(row: &Row, offset: usize) -> rusqlite::Result<Option<VendorDetailsRecord>> {
    let Some(company_name) = row.get::<_, Option<String>>(offset)? else {
        return Ok(None);
    };

    Ok(Some(VendorDetailsRecord {
        company_name,
        division: row.get(offset + 1)?,
        trade: row.get(offset + 2)?,
        contact_name: row.get(offset + 3)?,
        cell_number: row.get(offset + 4)?,
        office_number: row.get(offset + 5)?,
        email: row.get(offset + 6)?,
        address: row.get(offset + 7)?,
        ca_license: row.get(offset + 8)?,
        dir_number: row.get(offset + 9)?,
        dvbe: row.get(offset + 10)?,
    }))
}
