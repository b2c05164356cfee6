use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::domain::{DuplicateEmail, NewUser, Repository, User};

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    full_name TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    hashed_password: String,
    full_name: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            email: r.email,
            hashed_password: r.hashed_password,
            full_name: r.full_name,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

/// Opens the connection pool, retrying while the database comes up.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool> {
    // ---
    let attempts = config.retry_count.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        // ---
        let result = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await;

        match result {
            Ok(pool) => {
                tracing::info!("Connected to database after {} attempt(s)", attempt);
                return Ok(pool);
            }
            Err(err) => {
                tracing::warn!("Database connect attempt {}/{} failed: {}", attempt, attempts, err);
                last_err = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    match last_err {
        Some(err) => Err(err).context("Could not connect to database"),
        None => anyhow::bail!("Could not connect to database"),
    }
}

pub struct PostgresRepository {
    // ---
    pool: PgPool,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }

    /// Creates the users table if it does not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        // ---
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create users table")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl Repository for PostgresRepository {
    // ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, hashed_password, full_name, is_active, created_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, hashed_password, full_name, is_active, created_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, hashed_password, full_name, is_active)
             VALUES ($1, $2, $3, TRUE)
             ON CONFLICT (email) DO NOTHING
             RETURNING id, email, hashed_password, full_name, is_active, created_at",
        )
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.full_name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            None => Err(DuplicateEmail(user.email).into()),
        }
    }

    async fn ping(&self) -> Result<()> {
        // ---
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
