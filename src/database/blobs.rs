// Namespaced full-collection blobs. Each namespace holds one JSON object
// keyed by record id and is replaced wholesale on every write.
use crate::error::AppResult;
use crate::utils::logging::log_store_operation;
use chrono::Utc;
use log::warn;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::marker::PhantomData;

pub async fn get(pool: &SqlitePool, namespace: &str) -> AppResult<Option<String>> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM blobs WHERE namespace = ?")
        .bind(namespace)
        .fetch_optional(pool)
        .await?;

    Ok(value)
}

pub async fn put(pool: &SqlitePool, namespace: &str, value: &str) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO blobs (namespace, value, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(namespace) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(namespace)
    .bind(value)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, namespace: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM blobs WHERE namespace = ?")
        .bind(namespace)
        .execute(pool)
        .await?;

    Ok(())
}

/// Typed view over one namespace.
pub struct BlobCollection<T> {
    pool: SqlitePool,
    namespace: &'static str,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for BlobCollection<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            namespace: self.namespace,
            _records: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> BlobCollection<T> {
    pub fn new(pool: SqlitePool, namespace: &'static str) -> Self {
        Self {
            pool,
            namespace,
            _records: PhantomData,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Reads the whole collection. A blob that no longer decodes is treated
    /// as empty rather than reported.
    pub async fn load(&self) -> AppResult<BTreeMap<String, T>> {
        let Some(raw) = get(&self.pool, self.namespace).await? else {
            return Ok(BTreeMap::new());
        };

        match serde_json::from_str::<BTreeMap<String, T>>(&raw) {
            Ok(records) => {
                log_store_operation("load", self.namespace, records.len());
                Ok(records)
            }
            Err(e) => {
                warn!("Discarding unreadable '{}' collection: {}", self.namespace, e);
                Ok(BTreeMap::new())
            }
        }
    }

    pub async fn store(&self, records: &BTreeMap<String, T>) -> AppResult<()> {
        let raw = serde_json::to_string(records)?;
        put(&self.pool, self.namespace, &raw).await?;
        log_store_operation("store", self.namespace, records.len());
        Ok(())
    }

    pub async fn clear(&self) -> AppResult<()> {
        delete(&self.pool, self.namespace).await?;
        log_store_operation("clear", self.namespace, 0);
        Ok(())
    }
}
