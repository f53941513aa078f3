use anyhow::{Context, Result};
use sqlx::{Executor, SqlitePool};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL,
    email         TEXT    NOT NULL UNIQUE,
    department    TEXT    NOT NULL,
    joining_date  DATE    NOT NULL,
    leave_balance INTEGER NOT NULL DEFAULT 20 CHECK (leave_balance >= 0)
);

CREATE TABLE IF NOT EXISTS leaves (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id INTEGER NOT NULL REFERENCES employees(id),
    start_date  DATE    NOT NULL,
    end_date    DATE    NOT NULL,
    status      TEXT    NOT NULL DEFAULT 'Pending'
                CHECK (status IN ('Pending', 'Approved', 'Rejected')),
    applied_on  DATE    NOT NULL,
    CHECK (end_date >= start_date)
);

CREATE INDEX IF NOT EXISTS idx_leaves_employee_id ON leaves(employee_id);
"#;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
    if database_url.contains(":memory:") {
        // every connection to :memory: opens its own database, so keep exactly one alive
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Creates the `employees` and `leaves` tables if they are missing.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(SCHEMA)
        .await
        .context("Failed to create schema")?;
    Ok(())
}
