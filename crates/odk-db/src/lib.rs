//! PostgreSQL storage for orderdesk.
//!
//! Owns the connection pool, the embedded migrations, and the store-trait
//! implementations ([`PgCatalog`], [`PgOrders`]). The pool is an explicit
//! value acquired once and passed into store handles — there is no
//! module-level mutable connection state, and every exit path releases its
//! connection through the pool's own accounting.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

mod catalog;
mod orders;
mod rbac;

pub use catalog::PgCatalog;
pub use orders::PgOrders;
pub use rbac::{
    fetch_user_by_username, grant_permission, insert_permission, insert_role, insert_user,
    resolve_permission_names,
};

pub const ENV_DB_URL: &str = "ODK_DATABASE_URL";

/// Connect to Postgres using ODK_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_orders_table: bool,
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='orders'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_orders_table: exists,
    })
}

/// Detect a Postgres unique constraint violation by name.
pub(crate) fn is_unique_constraint_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}
