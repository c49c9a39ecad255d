//! Catalog store against Postgres.
//!
//! `decrement_stock` is the safety mechanism for the whole inventory path:
//! a single conditional UPDATE that both checks the stock precondition and
//! applies the subtraction as one indivisible statement. When two callers
//! race for the last units, exactly one statement affects a row.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use odk_intake::store::CatalogStore;
use odk_schemas::{Product, ProductState};

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seed a product row. Catalog CRUD proper is outside this core; this
    /// exists for provisioning and the DB-backed scenario tests.
    pub async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            insert into products (
              product_id, name, unit_price, stock, state, category, subcategory
            ) values (
              $1, $2, $3, $4, $5, $6, $7
            )
            "#,
        )
        .bind(product.product_id)
        .bind(&product.name)
        .bind(product.unit_price)
        .bind(product.stock)
        .bind(product.state.as_str())
        .bind(&product.category)
        .bind(&product.subcategory)
        .execute(&self.pool)
        .await
        .context("insert_product failed")?;
        Ok(())
    }

    /// Catalog-side price edit. Exists so the price-immutability property
    /// can be exercised against the real store.
    pub async fn set_price(&self, product_id: Uuid, unit_price: i64) -> Result<()> {
        sqlx::query("update products set unit_price = $2 where product_id = $1")
            .bind(product_id)
            .bind(unit_price)
            .execute(&self.pool)
            .await
            .context("set_price failed")?;
        Ok(())
    }
}

fn row_to_product(row: &sqlx::postgres::PgRow) -> Result<Product> {
    Ok(Product {
        product_id: row.try_get("product_id")?,
        name: row.try_get("name")?,
        unit_price: row.try_get("unit_price")?,
        stock: row.try_get("stock")?,
        state: ProductState::parse(&row.try_get::<String, _>("state")?)?,
        category: row.try_get("category")?,
        subcategory: row.try_get("subcategory")?,
    })
}

impl CatalogStore for PgCatalog {
    async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            select product_id, name, unit_price, stock, state, category, subcategory
            from products
            where product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .context("find_product failed")?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn decrement_stock(&self, product_id: Uuid, quantity: i64) -> Result<bool> {
        // One indivisible statement: precondition and subtraction together.
        // Zero rows affected = the precondition no longer holds (lost race,
        // product inactive, or product missing).
        let res = sqlx::query(
            r#"
            update products
            set stock = stock - $2
            where product_id = $1
              and state = 'ACTIVE'
              and stock >= $2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .context("decrement_stock failed")?;

        Ok(res.rows_affected() == 1)
    }
}
