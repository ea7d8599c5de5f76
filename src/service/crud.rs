//! Generic CRUD execution against PostgreSQL.
//!
//! Each write runs in its own transaction. On failure the transaction is rolled back
//! explicitly before the error propagates, so a failed call leaves the store untouched.

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::service::{ensure_required, preprocess};
use crate::sql::{self, bind_all, row_to_json, QueryBuf, SqlValue};
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// Defaults for list pagination.
pub const DEFAULT_LIMIT: i64 = 100;
pub const DEFAULT_SKIP: i64 = 0;

pub struct CrudService;

impl CrudService {
    /// Insert one row. Returns the persisted row including its generated id.
    pub async fn create(
        pool: &PgPool,
        entity: &ResolvedEntity,
        data: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let values = preprocess(entity, data)?;
        ensure_required(entity, &values)?;

        let mut tx = pool.begin().await?;
        match Self::insert_values(&mut tx, entity, &values).await {
            Ok(row) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::BadInput(format!("error creating item: {}", e)))?;
                tracing::info!(table = %entity.table_name, id = %row[&entity.pk_column], "item created");
                Ok(row)
            }
            Err(e) => {
                tracing::error!(table = %entity.table_name, error = %e, "create failed");
                rollback(tx, &entity.table_name).await;
                Err(AppError::BadInput(format!("error creating item: {}", e)))
            }
        }
    }

    /// Fetch one row by primary key.
    pub async fn read(pool: &PgPool, entity: &ResolvedEntity, id: i64) -> Result<Value, AppError> {
        let q = sql::select_by_id(entity, id);
        let row = fetch_optional(pool, &q, entity).await?;
        found(row, entity, id)
    }

    /// One page of rows in primary key order.
    pub async fn list(
        pool: &PgPool,
        entity: &ResolvedEntity,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Value>, AppError> {
        let q = sql::select_page(entity, skip, limit);
        tracing::debug!(sql = %q.sql, "query");
        let rows = bind_all(sqlx::query(&q.sql), &q.params).fetch_all(pool).await?;
        let items = rows
            .iter()
            .map(|r| row_to_json(r, entity))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(table = %entity.table_name, count = items.len(), skip, limit, "items listed");
        Ok(items)
    }

    /// Overwrite only the supplied columns of one row. Returns the updated row.
    pub async fn update(
        pool: &PgPool,
        entity: &ResolvedEntity,
        id: i64,
        data: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let mut tx = pool.begin().await?;
        let existing = fetch_optional(&mut *tx, &sql::select_by_id_for_update(entity, id), entity).await?;
        let existing = match found(existing, entity, id) {
            Ok(row) => row,
            Err(e) => {
                rollback(tx, &entity.table_name).await;
                return Err(e);
            }
        };
        let values = match preprocess(entity, data) {
            Ok(v) => v,
            Err(e) => {
                rollback(tx, &entity.table_name).await;
                return Err(e);
            }
        };
        if values.is_empty() {
            tx.commit().await?;
            return Ok(existing);
        }

        let q = sql::update(entity, id, &values);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let updated = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_one(&mut *tx)
            .await
            .and_then(|r| row_to_json(&r, entity));
        match updated {
            Ok(row) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::BadInput(format!("error updating item: {}", e)))?;
                tracing::info!(table = %entity.table_name, id, "item updated");
                Ok(row)
            }
            Err(e) => {
                tracing::error!(table = %entity.table_name, id, error = %e, "update failed");
                rollback(tx, &entity.table_name).await;
                Err(AppError::BadInput(format!("error updating item: {}", e)))
            }
        }
    }

    /// Delete one row (children go with it through ON DELETE CASCADE).
    pub async fn delete(pool: &PgPool, entity: &ResolvedEntity, id: i64) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let existing = fetch_optional(&mut *tx, &sql::select_by_id_for_update(entity, id), entity).await?;
        if let Err(e) = found(existing, entity, id) {
            rollback(tx, &entity.table_name).await;
            return Err(e);
        }

        let q = sql::delete(entity, id);
        tracing::debug!(sql = %q.sql, "query (tx)");
        match bind_all(sqlx::query(&q.sql), &q.params).execute(&mut *tx).await {
            Ok(_) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::ServerError(format!("error deleting item: {}", e)))?;
                tracing::info!(table = %entity.table_name, id, "item deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!(table = %entity.table_name, id, error = %e, "delete failed");
                rollback(tx, &entity.table_name).await;
                Err(AppError::ServerError(format!("error deleting item: {}", e)))
            }
        }
    }

    /// Run an INSERT for already-coerced values on an open connection or transaction.
    /// Shared with the batch importer.
    pub async fn insert_values(
        conn: &mut PgConnection,
        entity: &ResolvedEntity,
        values: &[(String, SqlValue)],
    ) -> Result<Value, sqlx::Error> {
        let q = sql::insert(entity, values);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let row = bind_all(sqlx::query(&q.sql), &q.params).fetch_one(&mut *conn).await?;
        row_to_json(&row, entity)
    }
}

async fn fetch_optional<'e, E>(
    executor: E,
    q: &QueryBuf,
    entity: &ResolvedEntity,
) -> Result<Option<Value>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let row = bind_all(sqlx::query(&q.sql), &q.params)
        .fetch_optional(executor)
        .await?;
    row.map(|r| row_to_json(&r, entity)).transpose()
}

fn not_found(entity: &ResolvedEntity, id: i64) -> AppError {
    AppError::NotFound(format!("item {} not found in '{}'", id, entity.table_name))
}

fn found(row: Option<Value>, entity: &ResolvedEntity, id: i64) -> Result<Value, AppError> {
    match row {
        Some(row) => {
            tracing::info!(table = %entity.table_name, id, "item found");
            Ok(row)
        }
        None => {
            tracing::warn!(table = %entity.table_name, id, "item not found");
            Err(not_found(entity, id))
        }
    }
}

async fn rollback(tx: Transaction<'static, Postgres>, table: &str) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(table = %table, error = %e, "rollback failed");
    }
}
