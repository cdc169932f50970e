//! Postgres-backed product store.
//!
//! Every operation opens its own `PgConnection` and closes it when done; there
//! is no pool and no transaction spanning two operations, so the six
//! sub-entity upserts of one product are committed independently.
//!
//! ## Expected schema
//!
//! Table names come from configuration; columns and uniqueness keys are fixed:
//!
//! | table | columns | conflict key |
//! |-------|---------|--------------|
//! | products | `id`, `code_gaska` | - |
//! | applications | `id`, `parent_id`, `name` | `(id, parent_id)` |
//! | cross numbers | `product_id`, `cross_number_value`, `cross_manufacturer` | `(product_id, cross_number_value)` |
//! | packages | `product_id`, `pack_unit`, `pack_qty`, `pack_nett_weight`, `pack_gross_weight`, `pack_ean`, `pack_required` | `(product_id)` |
//! | parameters | `product_id`, `attribute_id`, `attribute_name`, `attribute_value` | `(product_id, attribute_id)` |
//! | images, files | `product_id`, `title`, `url` | `(product_id, title)` |
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Io, Tls, Configuration, PoolTimedOut, PoolClosed | `Connection` |
//! | Database (any SQLSTATE) | `Query` |
//! | anything else | `Query` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row};
use tracing::{debug, instrument};

use partsync_core::{DatabaseConfig, ProductId, TableNames};

use super::r#trait::{ProductStore, StoreError, StoreSession, SubEntityRow};

/// SQL text for every statement, rendered once from the configured table names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    pub find_product_id: String,
    pub upsert_application: String,
    pub upsert_cross_number: String,
    pub upsert_package: String,
    pub upsert_parameter: String,
    pub upsert_image: String,
    pub upsert_file: String,
}

impl Statements {
    pub fn new(tables: &TableNames) -> Self {
        Self {
            find_product_id: format!(
                "SELECT CAST(id AS BIGINT) AS id FROM {} WHERE code_gaska = $1 LIMIT 1",
                tables.products
            ),
            upsert_application: format!(
                "INSERT INTO {} (id, parent_id, name) VALUES ($1, $2, $3) \
                 ON CONFLICT (id, parent_id) DO UPDATE SET name = EXCLUDED.name",
                tables.applications
            ),
            upsert_cross_number: format!(
                "INSERT INTO {} (product_id, cross_number_value, cross_manufacturer) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (product_id, cross_number_value) \
                 DO UPDATE SET cross_manufacturer = EXCLUDED.cross_manufacturer",
                tables.cross_numbers
            ),
            // pack_ean is written on insert only.
            upsert_package: format!(
                "INSERT INTO {} (product_id, pack_unit, pack_qty, pack_nett_weight, \
                 pack_gross_weight, pack_ean, pack_required) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 ON CONFLICT (product_id) DO UPDATE SET \
                 pack_unit = EXCLUDED.pack_unit, \
                 pack_qty = EXCLUDED.pack_qty, \
                 pack_nett_weight = EXCLUDED.pack_nett_weight, \
                 pack_gross_weight = EXCLUDED.pack_gross_weight, \
                 pack_required = EXCLUDED.pack_required",
                tables.packages
            ),
            upsert_parameter: format!(
                "INSERT INTO {} (product_id, attribute_id, attribute_name, attribute_value) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (product_id, attribute_id) DO UPDATE SET \
                 attribute_name = EXCLUDED.attribute_name, \
                 attribute_value = EXCLUDED.attribute_value",
                tables.parameters
            ),
            upsert_image: link_upsert(&tables.images),
            upsert_file: link_upsert(&tables.files),
        }
    }
}

fn link_upsert(table: &str) -> String {
    format!(
        "INSERT INTO {table} (product_id, title, url) VALUES ($1, $2, $3) \
         ON CONFLICT (product_id, title) DO UPDATE SET url = EXCLUDED.url"
    )
}

/// Postgres product store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    options: PgConnectOptions,
    statements: Arc<Statements>,
}

impl PostgresProductStore {
    pub fn new(database: &DatabaseConfig, tables: &TableNames) -> Self {
        let options = PgConnectOptions::new()
            .host(&database.host)
            .port(database.port)
            .database(&database.database)
            .username(&database.user)
            .password(&database.password);

        Self {
            options,
            statements: Arc::new(Statements::new(tables)),
        }
    }

    async fn connect(&self) -> Result<PgConnection, StoreError> {
        PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), err)]
    async fn find_product_id(&self, code: &str) -> Result<Option<ProductId>, StoreError> {
        let mut conn = self.connect().await?;

        let row = sqlx::query(&self.statements.find_product_id)
            .bind(code)
            .fetch_optional(&mut conn)
            .await
            .map_err(|e| map_sqlx_error("find_product_id", e))?;

        let id = match row {
            Some(row) => row
                .try_get::<Option<i64>, _>("id")
                .map_err(|e| map_sqlx_error("find_product_id", e))?
                .and_then(ProductId::from_store),
            None => None,
        };

        close(conn).await?;
        Ok(id)
    }

    async fn open_session(
        &self,
        product_id: ProductId,
    ) -> Result<Box<dyn StoreSession>, StoreError> {
        let conn = self.connect().await?;
        Ok(Box::new(PostgresSession {
            conn,
            product_id,
            statements: self.statements.clone(),
        }))
    }
}

struct PostgresSession {
    conn: PgConnection,
    product_id: ProductId,
    statements: Arc<Statements>,
}

#[async_trait]
impl StoreSession for PostgresSession {
    async fn upsert(&mut self, row: SubEntityRow<'_>) -> Result<u64, StoreError> {
        let product_id = self.product_id.get();
        let statements = &self.statements;

        let query = match row {
            SubEntityRow::Application(app) => sqlx::query(&statements.upsert_application)
                .bind(app.id)
                .bind(product_id)
                .bind(&app.name),
            SubEntityRow::CrossNumber { value, manufacturer } => {
                sqlx::query(&statements.upsert_cross_number)
                    .bind(product_id)
                    .bind(value)
                    .bind(manufacturer)
            }
            SubEntityRow::Package(pkg) => sqlx::query(&statements.upsert_package)
                .bind(product_id)
                .bind(&pkg.pack_unit)
                .bind(pkg.pack_qty)
                .bind(pkg.pack_nett_weight)
                .bind(pkg.pack_gross_weight)
                .bind(&pkg.pack_ean)
                .bind(pkg.pack_required),
            SubEntityRow::Parameter(param) => sqlx::query(&statements.upsert_parameter)
                .bind(product_id)
                .bind(param.attribute_id)
                .bind(&param.attribute_name)
                .bind(&param.attribute_value),
            SubEntityRow::Image(image) => sqlx::query(&statements.upsert_image)
                .bind(product_id)
                .bind(&image.title)
                .bind(&image.url),
            SubEntityRow::File(file) => sqlx::query(&statements.upsert_file)
                .bind(product_id)
                .bind(&file.title)
                .bind(&file.url),
        };

        let result = query
            .execute(&mut self.conn)
            .await
            .map_err(|e| map_sqlx_error(row.kind().as_str(), e))?;

        debug!(
            product_id = %self.product_id,
            entity = %row.kind(),
            rows_affected = result.rows_affected(),
            "upserted row"
        );
        Ok(result.rows_affected())
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        close(self.conn).await
    }
}

async fn close(conn: PgConnection) -> Result<(), StoreError> {
    conn.close()
        .await
        .map_err(|e| map_sqlx_error("close", e))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            StoreError::Query(format!(
                "database error in {} [{}]: {}",
                operation,
                code,
                db_err.message()
            ))
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => {
            StoreError::Connection(format!("{} failed: {}", operation, err))
        }
        _ => StoreError::Query(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_use_configured_tables_and_conflict_keys() {
        let tables = TableNames {
            products: "shop.items".to_string(),
            ..TableNames::default()
        };
        let statements = Statements::new(&tables);

        assert!(statements.find_product_id.contains("FROM shop.items WHERE code_gaska = $1"));
        assert!(statements
            .upsert_application
            .starts_with("INSERT INTO product_applications "));
        assert!(statements.upsert_application.contains("ON CONFLICT (id, parent_id)"));
        assert!(statements
            .upsert_cross_number
            .contains("ON CONFLICT (product_id, cross_number_value)"));
        assert!(statements.upsert_package.contains("ON CONFLICT (product_id) DO UPDATE"));
        assert!(!statements.upsert_package.contains("pack_ean = EXCLUDED"));
        assert!(statements
            .upsert_parameter
            .contains("ON CONFLICT (product_id, attribute_id)"));
        assert!(statements.upsert_image.starts_with("INSERT INTO product_images "));
        assert!(statements.upsert_file.starts_with("INSERT INTO product_files "));
    }

    #[test]
    fn connection_errors_are_classified() {
        assert!(matches!(
            map_sqlx_error("connect", sqlx::Error::PoolTimedOut),
            StoreError::Connection(_)
        ));
        assert!(matches!(
            map_sqlx_error("images", sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
    }
}
