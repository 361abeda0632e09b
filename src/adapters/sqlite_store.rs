//! SQLite contact cache.
//!
//! ```sql
//! CREATE TABLE contacts (
//!   id INTEGER PRIMARY KEY AUTOINCREMENT,
//!   last_name TEXT,
//!   first_name TEXT,
//!   email TEXT            -- de-dup key, indexed but not UNIQUE
//! )
//! ```
//!
//! Rows are only ever inserted. The pool holds a single connection, which is
//! enough for a sequential run and keeps `sqlite::memory:` databases alive.

use crate::domain::model::{Contact, StoredContact};
use crate::domain::ports::ContactStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

#[derive(Debug)]
pub struct SqliteContactStore {
    pool: SqlitePool,
}

impl SqliteContactStore {
    /// Open (or create) the database at `url` and make sure the schema exists.
    pub async fn open(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        tracing::debug!("Contact store opened at {}", url);
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self> {
        Self::open("sqlite::memory:").await
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                last_name TEXT,
                first_name TEXT,
                email TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts (email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All rows in insertion order.
    pub async fn all(&self) -> Result<Vec<StoredContact>> {
        let rows = sqlx::query("SELECT id, last_name, first_name, email FROM contacts ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut contacts = Vec::with_capacity(rows.len());
        for row in rows {
            contacts.push(StoredContact {
                id: row.try_get("id")?,
                contact: Contact {
                    last_name: row.try_get::<Option<String>, _>("last_name")?.unwrap_or_default(),
                    first_name: row.try_get::<Option<String>, _>("first_name")?.unwrap_or_default(),
                    email: row.try_get::<Option<String>, _>("email")?.unwrap_or_default(),
                },
            });
        }
        Ok(contacts)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn exists(&self, email: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM contacts WHERE email = ? LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, contact: &Contact) -> Result<i64> {
        let result = sqlx::query("INSERT INTO contacts (last_name, first_name, email) VALUES (?, ?, ?)")
            .bind(&contact.last_name)
            .bind(&contact.first_name)
            .bind(&contact.email)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
