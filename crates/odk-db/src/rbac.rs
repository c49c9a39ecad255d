//! RBAC rows and resolution.
//!
//! `resolve_permission_names` is what the authentication service calls ONCE
//! per login to seal a user's permission set into their bearer claims. The
//! request path never touches these tables — role edits surface on the next
//! authentication, not before (documented staleness window).

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use odk_schemas::{Permission, Role, User};

pub async fn insert_role(pool: &PgPool, role: &Role) -> Result<()> {
    sqlx::query("insert into roles (role_id, name) values ($1, $2)")
        .bind(role.role_id)
        .bind(&role.name)
        .execute(pool)
        .await
        .context("insert_role failed")?;
    Ok(())
}

pub async fn insert_permission(pool: &PgPool, permission: &Permission) -> Result<()> {
    sqlx::query(
        "insert into permissions (permission_id, name, category) values ($1, $2, $3)",
    )
    .bind(permission.permission_id)
    .bind(&permission.name)
    .bind(&permission.category)
    .execute(pool)
    .await
    .context("insert_permission failed")?;
    Ok(())
}

pub async fn grant_permission(pool: &PgPool, role_id: Uuid, permission_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        insert into role_permissions (role_id, permission_id)
        values ($1, $2)
        on conflict do nothing
        "#,
    )
    .bind(role_id)
    .bind(permission_id)
    .execute(pool)
    .await
    .context("grant_permission failed")?;
    Ok(())
}

pub async fn insert_user(pool: &PgPool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        insert into users (user_id, username, password_hash, role_id)
        values ($1, $2, $3, $4)
        "#,
    )
    .bind(user.user_id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .execute(pool)
    .await
    .context("insert_user failed")?;
    Ok(())
}

pub async fn fetch_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        select user_id, username, password_hash, role_id
        from users
        where username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("fetch_user_by_username failed")?;

    Ok(match row {
        Some(row) => Some(User {
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role_id: row.try_get("role_id")?,
        }),
        None => None,
    })
}

/// All permission names granted to a role, sorted for determinism.
pub async fn resolve_permission_names(pool: &PgPool, role_id: Uuid) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        select p.name
        from role_permissions rp
        join permissions p on p.permission_id = rp.permission_id
        where rp.role_id = $1
        order by p.name
        "#,
    )
    .bind(role_id)
    .fetch_all(pool)
    .await
    .context("resolve_permission_names failed")?;

    rows.iter()
        .map(|r| r.try_get::<String, _>("name").map_err(Into::into))
        .collect()
}
