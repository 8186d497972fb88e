//! PostgreSQL catalog access.
//!
//! [`CatalogSource`] is the seam the workflow talks to; [`DbClient`] is the
//! sqlx-backed implementation used by the binary.

use super::model::ColumnRecord;
use crate::config::DbSettings;
use crate::error::{CatalogError, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, Pool, Postgres};
use std::future::Future;
use std::time::Duration;

/// Columns of one table, in declaration order, with any stored comment.
///
/// Schema and table are bound as parameters, never spliced into the text.
const COLUMN_METADATA_QUERY: &str = r"
SELECT
    a.attname::text AS column_name,
    format_type(a.atttypid, a.atttypmod) AS data_type,
    a.attnum::int4 AS ordinal_position,
    col_description(a.attrelid, a.attnum) AS description
FROM pg_attribute a
JOIN pg_class c ON a.attrelid = c.oid
JOIN pg_namespace n ON c.relnamespace = n.oid
WHERE n.nspname = $1::name
  AND c.relname = $2::name
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY a.attnum
";

/// Database operations the workflow needs.
pub trait CatalogSource {
    /// Check that the database answers (`SELECT 1`).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Connection`] if the database does not answer.
    fn ping(&self) -> impl Future<Output = Result<()>>;

    /// Read the live columns of `schema.table`, ordered by ordinal position.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Query`] if the query fails or the table has no
    /// live columns.
    fn fetch_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> impl Future<Output = Result<Vec<ColumnRecord>>>;

    /// Run all statements in one transaction: all succeed or none do.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Execution`] naming the failing statement; the
    /// batch is rolled back.
    fn apply_statements(&self, statements: &[String]) -> impl Future<Output = Result<()>>;
}

#[derive(Debug, FromRow)]
struct CatalogColumnRow {
    column_name: String,
    data_type: String,
    ordinal_position: i32,
    description: Option<String>,
}

impl From<CatalogColumnRow> for ColumnRecord {
    fn from(row: CatalogColumnRow) -> Self {
        Self::new(
            row.column_name,
            row.data_type,
            row.ordinal_position,
            row.description,
        )
    }
}

pub struct DbClient {
    pool: Pool<Postgres>,
}

impl DbClient {
    /// Open a small pool for the session.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Connection`] if no connection can be opened.
    pub async fn connect(settings: &DbSettings) -> Result<Self> {
        let options = settings.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                CatalogError::Connection(format!(
                    "failed to connect to {}:{}/{}: {e}",
                    settings.host, settings.port, settings.database
                ))
            })?;
        tracing::info!(
            "Connected to PostgreSQL at {}:{}/{}",
            settings.host,
            settings.port,
            settings.database
        );
        Ok(Self { pool })
    }
}

impl CatalogSource for DbClient {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn fetch_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnRecord>> {
        tracing::debug!("Reading column metadata for {schema}.{table}");
        let rows: Vec<CatalogColumnRow> = sqlx::query_as(COLUMN_METADATA_QUERY)
            .bind(schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                CatalogError::Query(format!("failed to read columns of {schema}.{table}: {e}"))
            })?;

        if rows.is_empty() {
            return Err(CatalogError::Query(format!(
                "table {schema}.{table} does not exist or has no columns"
            )));
        }

        Ok(rows.into_iter().map(ColumnRecord::from).collect())
    }

    async fn apply_statements(&self, statements: &[String]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        for statement in statements {
            // Dropping `tx` on the error path rolls the batch back.
            sqlx::raw_sql(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| CatalogError::Execution(format!("{statement}: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| CatalogError::Execution(format!("commit failed: {e}")))?;
        tracing::info!("Applied {} comment statements", statements.len());
        Ok(())
    }
}
