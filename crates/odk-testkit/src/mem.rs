//! In-memory store doubles.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use odk_intake::store::{CatalogStore, NewOrder, OrderStore};
use odk_intake::status;
use odk_schemas::{Order, OrderDetail, OrderLineItem, Product, StatusFlags, StatusPatch};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// MemCatalog
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CatalogInner {
    products: HashMap<Uuid, Product>,
    /// Products whose conditional decrement is forced to report a lost race.
    fail_decrement: HashSet<Uuid>,
}

/// In-memory catalog. The decrement happens under the mutex, making it a
/// single indivisible step for concurrent tasks.
#[derive(Clone, Default)]
pub struct MemCatalog {
    inner: Arc<Mutex<CatalogInner>>,
}

impl MemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        let mut inner = self.inner.lock().unwrap();
        inner.products.insert(product.product_id, product);
    }

    pub fn set_price(&self, product_id: Uuid, unit_price: i64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.products.get_mut(&product_id) {
            p.unit_price = unit_price;
        }
    }

    pub fn stock_of(&self, product_id: Uuid) -> Option<i64> {
        let inner = self.inner.lock().unwrap();
        inner.products.get(&product_id).map(|p| p.stock)
    }

    /// Failure injection: make every decrement for `product_id` report a
    /// lost race while leaving stock untouched.
    pub fn fail_decrements_for(&self, product_id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_decrement.insert(product_id);
    }
}

impl CatalogStore for MemCatalog {
    async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.products.get(&product_id).cloned())
    }

    async fn decrement_stock(&self, product_id: Uuid, quantity: i64) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_decrement.contains(&product_id) {
            return Ok(false);
        }
        let Some(p) = inner.products.get_mut(&product_id) else {
            return Ok(false);
        };
        if !p.state.is_active() || p.stock < quantity {
            return Ok(false);
        }
        p.stock -= quantity;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// MemOrders
// ---------------------------------------------------------------------------

/// In-memory order store. Insertion order is retained; `list_orders`
/// returns newest first like the SQL implementation.
#[derive(Clone, Default)]
pub struct MemOrders {
    inner: Arc<Mutex<Vec<OrderDetail>>>,
}

impl MemOrders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted orders. Used by atomic-rejection assertions.
    pub fn count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

impl OrderStore for MemOrders {
    async fn insert_order(&self, order: &NewOrder) -> Result<OrderDetail> {
        let header = Order {
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
        };
        let lines = order
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
            .collect();
        let detail = OrderDetail {
            order: header,
            lines,
        };
        self.inner.lock().unwrap().push(detail.clone());
        Ok(detail)
    }

    async fn fetch_order(&self, order_id: Uuid) -> Result<Option<OrderDetail>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.iter().find(|d| d.order.order_id == order_id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<OrderDetail>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.iter().rev().cloned().collect())
    }

    async fn update_status(
        &self,
        order_id: Uuid,
        patch: StatusPatch,
    ) -> Result<Option<StatusFlags>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(d) = inner.iter_mut().find(|d| d.order.order_id == order_id) else {
            return Ok(None);
        };
        d.order.status = status::apply(d.order.status, patch);
        Ok(Some(d.order.status))
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.len();
        inner.retain(|d| d.order.order_id != order_id);
        Ok(inner.len() < before)
    }
}
