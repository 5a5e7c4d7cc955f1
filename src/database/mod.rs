use anyhow::{Context, Result};
use log::info;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqlitePool, SqlitePoolOptions},
    Row, Sqlite,
};
use std::path::Path;

use crate::cards::{CardHistory, TemplateStore};
use crate::error::AppResult;
use crate::recurrence::LeapDayPolicy;

pub mod blobs;
pub mod events;
pub mod settings;
pub mod users;

pub use blobs::BlobCollection;
pub use events::EventStore;
pub use users::SqliteUserStore;

/// Columns added after the first schema release: (table, column, DDL).
const COLUMN_MIGRATIONS: &[(&str, &str, &str)] = &[(
    "contact_entries",
    "matched_account_id",
    "ALTER TABLE contact_entries ADD COLUMN matched_account_id TEXT",
)];

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database at `db_url` and brings the
    /// schema up to date.
    pub async fn connect(db_url: &str) -> Result<Self> {
        let db_exists = Sqlite::database_exists(db_url)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database");
            Sqlite::create_database(db_url)
                .await
                .context("Failed to create database")?;
        }

        let pool = SqlitePool::connect(db_url)
            .await
            .context("Failed to connect to database")?;

        Self::prepare(pool).await
    }

    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Self::connect(&format!("sqlite:{}?mode=rwc", path.display())).await
    }

    /// Private database living as long as the returned handle. Single
    /// connection, since every SQLite in-memory connection is its own
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        Self::prepare(pool).await
    }

    async fn prepare(pool: SqlitePool) -> Result<Self> {
        run_schema(&pool).await.context("Failed to run database schema")?;
        ensure_migrations(&pool).await.context("Failed to ensure migrations")?;

        info!("Database initialized successfully");
        Ok(Database { pool })
    }

    pub fn event_store(&self) -> EventStore {
        EventStore::new(self.pool.clone())
    }

    pub fn event_store_with(&self, leap_policy: LeapDayPolicy) -> EventStore {
        self.event_store().with_leap_policy(leap_policy)
    }

    pub fn user_store(&self) -> SqliteUserStore {
        SqliteUserStore::new(self.pool.clone())
    }

    pub fn card_history(&self) -> CardHistory {
        CardHistory::new(self.pool.clone())
    }

    pub fn templates(&self) -> TemplateStore {
        TemplateStore::new(self.pool.clone())
    }

    // --- Settings Delegates ---

    pub async fn get_settings(&self) -> AppResult<crate::models::Settings> {
        settings::get(&self.pool).await
    }

    pub async fn update_settings(&self, settings: &crate::models::Settings) -> AppResult<()> {
        settings::update(&self.pool, settings).await
    }
}

async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();
    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            sqlx::query(&current_statement).execute(pool).await?;
            current_statement.clear();
        }
    }
    Ok(())
}

async fn ensure_migrations(pool: &SqlitePool) -> Result<()> {
    for (table, column, ddl) in COLUMN_MIGRATIONS {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", table))
            .fetch_all(pool)
            .await
            .with_context(|| format!("Failed to fetch table info for {}", table))?;

        let present = rows
            .iter()
            .any(|row| row.get::<String, _>("name") == *column);

        if !present {
            info!("Migrating: Adding {} column to {} table", column, table);
            sqlx::query(ddl)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to add {} column", column))?;
        }
    }

    Ok(())
}
