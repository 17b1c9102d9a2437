use async_trait::async_trait;
use soundcheck_core::models::{AudioMetadataUpdate, CatalogItem, ProductType};
use soundcheck_core::AppError;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

// product_type is a Postgres enum on the platform schema; decode it as text
const CATALOG_COLUMNS: &str = "id, product_type::text AS product_type, \
     COALESCE(file_url, '') AS file_url, duration_seconds, bitrate, metadata";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No product found for file path: {0}")]
    NoMatch(String),

    #[error("Multiple products ({count}) match file path: {path}")]
    Ambiguous { path: String, count: usize },

    #[error("Product {0} no longer exists")]
    RowMissing(Uuid),
}

impl CatalogError {
    /// Connection-level failures that may succeed on another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Database(err) => is_transient_sqlx(err),
            _ => false,
        }
    }
}

fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Protocol(_) => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| {
            // 08xxx connection exception, 40001 serialization, 40P01 deadlock, 57P01 admin shutdown
            code.starts_with("08") || code == "40001" || code == "40P01" || code == "57P01"
        }),
        _ => false,
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Database(e) => AppError::Database(e),
            other => AppError::CatalogLookup(other.to_string()),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Read/write access to catalog items needed by the extraction pipeline
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// The single item whose `file_url` ends with `path`
    async fn find_by_file_url_suffix(&self, path: &str) -> CatalogResult<CatalogItem>;

    async fn find_by_id(&self, id: Uuid) -> CatalogResult<CatalogItem>;

    /// Write duration and bitrate columns and merge audio keys into `metadata`
    async fn update_audio_metadata(
        &self,
        id: Uuid,
        update: &AudioMetadataUpdate,
    ) -> CatalogResult<()>;

    async fn ping(&self) -> CatalogResult<()>;
}

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: PgRow) -> CatalogResult<CatalogItem> {
        let product_type: String = row.try_get("product_type")?;
        Ok(CatalogItem {
            id: row.try_get("id")?,
            product_type: ProductType::from(product_type),
            file_url: row.try_get("file_url")?,
            duration_seconds: row.try_get("duration_seconds")?,
            bitrate: row.try_get("bitrate")?,
            metadata: row.try_get("metadata")?,
        })
    }
}

/// Escape LIKE wildcards so the path is matched literally (escape char `\`)
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Resolve the lookup result set (fetched with `LIMIT 2`) to exactly one item
fn single_match(path: &str, mut items: Vec<CatalogItem>) -> CatalogResult<CatalogItem> {
    match items.len() {
        0 => Err(CatalogError::NoMatch(path.to_string())),
        1 => Ok(items.remove(0)),
        count => Err(CatalogError::Ambiguous {
            path: path.to_string(),
            count,
        }),
    }
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    #[tracing::instrument(skip(self), fields(db.table = "digital_products", db.operation = "select"))]
    async fn find_by_file_url_suffix(&self, path: &str) -> CatalogResult<CatalogItem> {
        let pattern = format!("%{}", escape_like(path));
        let query = format!(
            "SELECT {} FROM digital_products WHERE file_url LIKE $1 ESCAPE '\\' LIMIT 2",
            CATALOG_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Self::row_to_item)
            .collect::<CatalogResult<Vec<_>>>()?;

        single_match(path, items)
    }

    #[tracing::instrument(skip(self), fields(db.table = "digital_products", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> CatalogResult<CatalogItem> {
        let query = format!(
            "SELECT {} FROM digital_products WHERE id = $1",
            CATALOG_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_item(row),
            None => Err(CatalogError::NoMatch(format!("product id {}", id))),
        }
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "digital_products", db.operation = "update"))]
    async fn update_audio_metadata(
        &self,
        id: Uuid,
        update: &AudioMetadataUpdate,
    ) -> CatalogResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE digital_products
            SET duration_seconds = $2,
                bitrate = $3,
                metadata = COALESCE(metadata, '{}'::jsonb) || $4::jsonb
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.duration_seconds)
        .bind(update.bitrate)
        .bind(Json(&update.metadata))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::RowMissing(id));
        }

        tracing::debug!(product_id = %id, "Audio metadata written");
        Ok(())
    }

    async fn ping(&self) -> CatalogResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
