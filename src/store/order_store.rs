use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::StoreError;
use crate::domain::order::{Order, Stage};

// ============================================================================
// Order Store - Document repository for orders
// ============================================================================
//
// Responsibilities every implementation must honor:
// 1. `createdAt` / `updatedAt` / `version` are owned by the store
// 2. Optimistic concurrency: `save` only succeeds against the version it read
// 3. Buyer uniqueness: a write that would give a buyer a second active order
//    (non-deleted, not Delivered) is rejected with `UniqueViolation`
//
// ============================================================================

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order. Returns the stored document.
    async fn insert(&self, order: Order) -> Result<Order, StoreError>;

    /// Persist changes to an existing order read at `order.version`.
    async fn save(&self, order: Order) -> Result<Order, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn find_active_by_buyer(&self, buyer_id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Non-deleted orders assigned to the seller, newest updated first.
    async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Delivered orders for the buyer, newest created first.
    async fn list_delivered_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Every order including deleted ones, newest created first.
    async fn list_all(&self) -> Result<Vec<Order>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_buyer_uniqueness(orders: &HashMap<Uuid, Order>, candidate: &Order) -> Result<(), StoreError> {
        let Some(buyer_id) = candidate.buyer_id else {
            return Ok(());
        };
        if !candidate.is_active() {
            return Ok(());
        }

        let conflict = orders
            .values()
            .any(|other| other.id != candidate.id && other.buyer_id == Some(buyer_id) && other.is_active());

        if conflict {
            return Err(StoreError::UniqueViolation(buyer_id));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, mut order: Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;

        if orders.contains_key(&order.id) {
            return Err(StoreError::AlreadyExists(order.id));
        }
        Self::check_buyer_uniqueness(&orders, &order)?;

        let now = Utc::now();
        order.version = 1;
        order.created_at = now;
        order.updated_at = now;

        orders.insert(order.id, order.clone());

        tracing::debug!(order_id = %order.id, "Inserted order document");
        Ok(order)
    }

    async fn save(&self, mut order: Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;

        let current = orders.get(&order.id).ok_or(StoreError::NotFound(order.id))?;
        if current.version != order.version {
            return Err(StoreError::ConcurrencyConflict {
                expected: order.version,
                actual: current.version,
            });
        }
        Self::check_buyer_uniqueness(&orders, &order)?;

        order.version += 1;
        order.created_at = current.created_at;
        order.updated_at = Utc::now();

        orders.insert(order.id, order.clone());

        tracing::debug!(order_id = %order.id, version = order.version, "Saved order document");
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_active_by_buyer(&self, buyer_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|order| order.buyer_id == Some(buyer_id) && order.is_active())
            .cloned())
    }

    async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.is_owned_by_seller(seller_id) && !order.is_deleted)
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(orders)
    }

    async fn list_delivered_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.buyer_id == Some(buyer_id) && order.stage == Stage::Delivered)
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
