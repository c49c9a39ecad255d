//! Order persistence against Postgres.
//!
//! `insert_order` writes the header and every line item inside one sqlx
//! transaction: all rows become visible together or none do. Deletion is a
//! single DELETE on the header; the FK cascade removes the lines. Stock is
//! never touched from here.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use odk_intake::store::{NewOrder, OrderStore};
use odk_schemas::{Order, OrderDetail, OrderLineItem, PaymentMethod, StatusFlags, StatusPatch};

use crate::is_unique_constraint_violation;

#[derive(Clone)]
pub struct PgOrders {
    pool: PgPool,
}

impl PgOrders {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<Order> {
    let method: String = row.try_get("payment_method")?;
    Ok(Order {
        order_id: row.try_get("order_id")?,
        order_number: row.try_get("order_number")?,
        buyer_name: row.try_get("buyer_name")?,
        buyer_phone: row.try_get("buyer_phone")?,
        table_number: row.try_get("table_number")?,
        payment_method: PaymentMethod::parse(&method)?,
        payment_proof: row.try_get("payment_proof")?,
        total: row.try_get("total")?,
        notes: row.try_get("notes")?,
        status: StatusFlags {
            paid: row.try_get("paid")?,
            ready: row.try_get("ready")?,
            delivered: row.try_get("delivered")?,
        },
        created_at_utc: row.try_get("created_at_utc")?,
    })
}

fn row_to_line(row: &sqlx::postgres::PgRow) -> Result<OrderLineItem> {
    Ok(OrderLineItem {
        line_id: row.try_get("line_id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        product_name: row.try_get("product_name")?,
        unit_price: row.try_get("unit_price")?,
        quantity: row.try_get("quantity")?,
        subtotal: row.try_get("subtotal")?,
    })
}

const ORDER_COLUMNS: &str = "order_id, order_number, buyer_name, buyer_phone, table_number, \
     payment_method, payment_proof, total, notes, paid, ready, delivered, created_at_utc";

const LINE_COLUMNS: &str =
    "line_id, order_id, product_id, product_name, unit_price, quantity, subtotal";

impl OrderStore for PgOrders {
    async fn insert_order(&self, order: &NewOrder) -> Result<OrderDetail> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("insert_order begin failed")?;

        let res = sqlx::query(
            r#"
            insert into orders (
              order_id, order_number, buyer_name, buyer_phone, table_number,
              payment_method, payment_proof, total, notes,
              paid, ready, delivered, created_at_utc
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
            )
            "#,
        )
        .bind(order.order_id)
        .bind(&order.order_number)
        .bind(&order.buyer_name)
        .bind(&order.buyer_phone)
        .bind(order.table_number)
        .bind(order.payment_method.as_str())
        .bind(&order.payment_proof)
        .bind(order.total)
        .bind(&order.notes)
        .bind(order.status.paid)
        .bind(order.status.ready)
        .bind(order.status.delivered)
        .bind(order.created_at_utc)
        .execute(&mut *tx)
        .await;

        if let Err(e) = res {
            // Order numbers are time-derived; a duplicate under load is the
            // accepted-risk collision. Name it so operators see the cause.
            if is_unique_constraint_violation(&e, "orders_order_number_key") {
                return Err(anyhow!(
                    "order number collision: {}",
                    order.order_number
                ));
            }
            return Err(anyhow::Error::new(e).context("insert_order header failed"));
        }

        for (line_no, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                insert into order_line_items (
                  line_id, order_id, product_id, line_no,
                  product_name, unit_price, quantity, subtotal
                ) values (
                  $1, $2, $3, $4, $5, $6, $7, $8
                )
                "#,
            )
            .bind(line.line_id)
            .bind(order.order_id)
            .bind(line.product_id)
            .bind(line_no as i32)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(line.subtotal)
            .execute(&mut *tx)
            .await
            .context("insert_order line failed")?;
        }

        tx.commit().await.context("insert_order commit failed")?;

        Ok(OrderDetail {
            order: Order {
                order_id: order.order_id,
                order_number: order.order_number.clone(),
                buyer_name: order.buyer_name.clone(),
                buyer_phone: order.buyer_phone.clone(),
                table_number: order.table_number,
                payment_method: order.payment_method,
                payment_proof: order.payment_proof.clone(),
                total: order.total,
                notes: order.notes.clone(),
                status: order.status,
                created_at_utc: order.created_at_utc,
            },
            lines: order
                .lines
                .iter()
                .map(|l| OrderLineItem {
                    line_id: l.line_id,
                    order_id: order.order_id,
                    product_id: l.product_id,
                    product_name: l.product_name.clone(),
                    unit_price: l.unit_price,
                    quantity: l.quantity,
                    subtotal: l.subtotal,
                })
                .collect(),
        })
    }

    async fn fetch_order(&self, order_id: Uuid) -> Result<Option<OrderDetail>> {
        let header = sqlx::query(&format!(
            "select {ORDER_COLUMNS} from orders where order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .context("fetch_order header failed")?;

        let Some(header) = header else {
            return Ok(None);
        };
        let order = row_to_order(&header)?;

        let line_rows = sqlx::query(&format!(
            "select {LINE_COLUMNS} from order_line_items where order_id = $1 order by line_no"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .context("fetch_order lines failed")?;

        let lines = line_rows
            .iter()
            .map(row_to_line)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(OrderDetail { order, lines }))
    }

    async fn list_orders(&self) -> Result<Vec<OrderDetail>> {
        let headers = sqlx::query(&format!(
            "select {ORDER_COLUMNS} from orders order by created_at_utc desc, order_number desc"
        ))
        .fetch_all(&self.pool)
        .await
        .context("list_orders headers failed")?;

        let line_rows = sqlx::query(&format!(
            "select {LINE_COLUMNS} from order_line_items order by order_id, line_no"
        ))
        .fetch_all(&self.pool)
        .await
        .context("list_orders lines failed")?;

        let mut by_order: HashMap<Uuid, Vec<OrderLineItem>> = HashMap::new();
        for row in &line_rows {
            let line = row_to_line(row)?;
            by_order.entry(line.order_id).or_default().push(line);
        }

        headers
            .iter()
            .map(|row| {
                let order = row_to_order(row)?;
                let lines = by_order.remove(&order.order_id).unwrap_or_default();
                Ok(OrderDetail { order, lines })
            })
            .collect()
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        patch: StatusPatch,
    ) -> Result<Option<StatusFlags>> {
        let row = sqlx::query(
            r#"
            update orders
            set paid      = coalesce($2, paid),
                ready     = coalesce($3, ready),
                delivered = coalesce($4, delivered)
            where order_id = $1
            returning paid, ready, delivered
            "#,
        )
        .bind(order_id)
        .bind(patch.paid)
        .bind(patch.ready)
        .bind(patch.delivered)
        .fetch_optional(&self.pool)
        .await
        .context("update_status failed")?;

        Ok(match row {
            Some(row) => Some(StatusFlags {
                paid: row.try_get("paid")?,
                ready: row.try_get("ready")?,
                delivered: row.try_get("delivered")?,
            }),
            None => None,
        })
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<bool> {
        // Hard delete; the FK cascade removes the lines. Stock stays as-is —
        // deletion is not a compensating transaction.
        let res = sqlx::query("delete from orders where order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await
            .context("delete_order failed")?;
        Ok(res.rows_affected() > 0)
    }
}
