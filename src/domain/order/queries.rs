use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use uuid::Uuid;

use super::aggregate::Order;
use super::command_handler::require_role;
use super::errors::WorkflowError;
use super::value_objects::Stage;
use crate::models::{Principal, Role, UserSummary};
use crate::store::{OrderStore, UserDirectory};

// ============================================================================
// Order Queries - Read side, scoped by role
// ============================================================================

/// An order with its parties resolved to user summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub buyer: Option<UserSummary>,
    pub seller: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    /// Every stage is listed, including those with zero orders.
    pub orders_per_stage: BTreeMap<Stage, usize>,
    /// `None` when nothing has been delivered yet.
    pub avg_delivery_time_ms: Option<i64>,
}

/// Mean of `updated_at - created_at` over delivered orders.
pub fn average_delivery_time(orders: &[Order]) -> Option<Duration> {
    let durations: Vec<Duration> = orders
        .iter()
        .filter(|order| order.stage == Stage::Delivered)
        .map(|order| order.updated_at - order.created_at)
        .collect();

    if durations.is_empty() {
        return None;
    }

    let total_ms: i64 = durations.iter().map(Duration::num_milliseconds).sum();
    Some(Duration::milliseconds(total_ms / durations.len() as i64))
}

pub struct OrderQueries {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
}

impl OrderQueries {
    pub fn new(orders: Arc<dyn OrderStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { orders, users }
    }

    pub async fn active_order(&self, actor: &Principal) -> Result<Option<Order>, WorkflowError> {
        require_role(actor, Role::Buyer)?;
        Ok(self.orders.find_active_by_buyer(actor.user_id).await?)
    }

    pub async fn order_history(&self, actor: &Principal) -> Result<Vec<Order>, WorkflowError> {
        require_role(actor, Role::Buyer)?;
        Ok(self.orders.list_delivered_by_buyer(actor.user_id).await?)
    }

    pub async fn assigned_orders(&self, actor: &Principal) -> Result<Vec<OrderView>, WorkflowError> {
        require_role(actor, Role::Seller)?;
        let orders = self.orders.list_by_seller(actor.user_id).await?;
        self.populate(orders).await
    }

    pub async fn all_orders(&self, actor: &Principal) -> Result<Vec<OrderView>, WorkflowError> {
        require_role(actor, Role::Admin)?;
        let orders = self.orders.list_all().await?;
        self.populate(orders).await
    }

    /// Admin audit view. Deleted orders are still returned.
    pub async fn order_details(&self, actor: &Principal, order_id: Uuid) -> Result<OrderView, WorkflowError> {
        require_role(actor, Role::Admin)?;
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(WorkflowError::OrderNotFound(order_id))?;
        self.view(order).await
    }

    pub async fn stats(&self, actor: &Principal) -> Result<OrderStats, WorkflowError> {
        require_role(actor, Role::Admin)?;
        let orders = self.orders.list_all().await?;

        let mut orders_per_stage: BTreeMap<Stage, usize> = Stage::ALL.iter().map(|stage| (*stage, 0)).collect();
        for order in &orders {
            *orders_per_stage.entry(order.stage).or_insert(0) += 1;
        }

        let avg_delivery_time_ms = average_delivery_time(&orders).map(|d| d.num_milliseconds());

        tracing::debug!(
            total_orders = orders.len(),
            avg_delivery_time_ms = ?avg_delivery_time_ms,
            "Computed order stats"
        );

        Ok(OrderStats {
            total_orders: orders.len(),
            orders_per_stage,
            avg_delivery_time_ms,
        })
    }

    pub async fn buyers(&self, actor: &Principal) -> Result<Vec<UserSummary>, WorkflowError> {
        self.users_with_role(actor, Role::Buyer).await
    }

    pub async fn sellers(&self, actor: &Principal) -> Result<Vec<UserSummary>, WorkflowError> {
        self.users_with_role(actor, Role::Seller).await
    }

    async fn users_with_role(&self, actor: &Principal, role: Role) -> Result<Vec<UserSummary>, WorkflowError> {
        require_role(actor, Role::Admin)?;
        let users = self.users.list_by_role(role).await?;
        Ok(users.iter().map(|user| user.summary()).collect())
    }

    async fn populate(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, WorkflowError> {
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.view(order).await?);
        }
        Ok(views)
    }

    async fn view(&self, order: Order) -> Result<OrderView, WorkflowError> {
        let buyer = self.summary(order.buyer_id).await?;
        let seller = self.summary(order.seller_id).await?;
        Ok(OrderView { order, buyer, seller })
    }

    async fn summary(&self, user_id: Option<Uuid>) -> Result<Option<UserSummary>, WorkflowError> {
        match user_id {
            Some(id) => Ok(self.users.get(id).await?.map(|user| user.summary())),
            None => Ok(None),
        }
    }
}
