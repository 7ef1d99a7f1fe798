use actix::Addr;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::aggregate::Order;
use super::commands::OrderCommand;
use super::errors::{ErrorKind, OrderError, WorkflowError};
use super::events::OrderEvent;
use super::routing::route;
use crate::actors::NotificationRouter;
use crate::domain::aggregate::AggregateRoot;
use crate::metrics::Metrics;
use crate::models::{authorize, Principal, Role};
use crate::store::{KeyedLocks, OrderStore, UserDirectory};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Role check → Aggregate → Store → Notification Router
//
// Every mutation of an existing order runs under that order's lock, and
// notifications are only published once the store accepted the write.
//
// ============================================================================

pub struct OrderCommandHandler {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
    router: Addr<NotificationRouter>,
    locks: KeyedLocks,
    metrics: Option<Arc<Metrics>>,
}

impl OrderCommandHandler {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserDirectory>,
        router: Addr<NotificationRouter>,
    ) -> Self {
        Self {
            orders,
            users,
            router,
            locks: KeyedLocks::new(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Buyer places a new order. At most one active order per buyer.
    pub async fn create_order(&self, actor: &Principal, items: Vec<String>) -> Result<Order, WorkflowError> {
        self.observe("create_order", async {
            require_role(actor, Role::Buyer)?;

            if self.orders.find_active_by_buyer(actor.user_id).await?.is_some() {
                return Err(WorkflowError::DuplicateActiveOrder);
            }

            let (order, event) = Order::place(actor, items)?;

            // The store re-checks uniqueness atomically, closing the race
            // between concurrent creates for the same buyer.
            let stored = self.orders.insert(order).await?;

            tracing::info!(
                order_id = %stored.id,
                buyer_id = %actor.user_id,
                item_count = stored.items.len(),
                "✅ Order created, awaiting admin assignment"
            );

            self.publish(&stored, &[event]);
            Ok(stored)
        })
        .await
    }

    /// Admin (re)associates a buyer and moves the order to Buyer Associated.
    pub async fn associate_buyer(
        &self,
        actor: &Principal,
        order_id: Uuid,
        buyer_id: Uuid,
    ) -> Result<Order, WorkflowError> {
        self.observe("associate_buyer", async {
            require_role(actor, Role::Admin)?;
            self.require_user_with_role(buyer_id, Role::Buyer).await?;

            self.handle(
                order_id,
                OrderCommand::AssociateBuyer {
                    buyer_id,
                    actor: actor.clone(),
                },
            )
            .await
        })
        .await
    }

    /// Admin assigns the seller. A seller is assigned at most once.
    pub async fn assign_seller(
        &self,
        actor: &Principal,
        order_id: Uuid,
        seller_id: Uuid,
    ) -> Result<Order, WorkflowError> {
        self.observe("assign_seller", async {
            require_role(actor, Role::Admin)?;
            self.require_user_with_role(seller_id, Role::Seller).await?;

            self.handle(
                order_id,
                OrderCommand::AssignSeller {
                    seller_id,
                    actor: actor.clone(),
                },
            )
            .await
        })
        .await
    }

    /// Assigned seller moves the order exactly one stage forward.
    pub async fn advance_stage(&self, actor: &Principal, order_id: Uuid) -> Result<Order, WorkflowError> {
        self.observe("advance_stage", async {
            require_role(actor, Role::Seller)?;

            self.handle(order_id, OrderCommand::AdvanceStage { actor: actor.clone() })
                .await
        })
        .await
    }

    /// Assigned seller soft-deletes the order. Returns the deleted order's id.
    pub async fn delete_order(&self, actor: &Principal, order_id: Uuid) -> Result<Uuid, WorkflowError> {
        self.observe("delete_order", async {
            require_role(actor, Role::Seller)?;

            self.handle(order_id, OrderCommand::Delete { actor: actor.clone() })
                .await
                .map(|order| order.id)
        })
        .await
    }

    /// Load → check ownership → execute → save → publish, under the order lock.
    async fn handle(&self, order_id: Uuid, command: OrderCommand) -> Result<Order, WorkflowError> {
        let _guard = self.locks.acquire(order_id).await;
        tracing::trace!(order_id = %order_id, tracked_locks = self.locks.tracked_keys(), "Order lock acquired");

        let mut order = match self.orders.get(order_id).await? {
            Some(order) if !order.is_deleted => order,
            _ => return Err(WorkflowError::OrderNotFound(order_id)),
        };

        if let OrderCommand::AdvanceStage { actor } | OrderCommand::Delete { actor } = &command {
            if !order.is_owned_by_seller(actor.user_id) {
                return Err(WorkflowError::NotOrderOwner(order_id));
            }
        }

        let events = order.execute(&command).map_err(|e| match e {
            OrderError::Deleted => WorkflowError::OrderNotFound(order_id),
            other => WorkflowError::Rule(other),
        })?;

        let saved = self.orders.save(order).await?;

        tracing::info!(
            order_id = %saved.aggregate_id(),
            command = command.name(),
            stage = %saved.stage,
            version = saved.version(),
            "✅ Order updated"
        );

        self.publish(&saved, &events);
        Ok(saved)
    }

    async fn require_user_with_role(&self, user_id: Uuid, role: Role) -> Result<(), WorkflowError> {
        match self.users.get(user_id).await? {
            Some(user) if user.role == role => Ok(()),
            _ => Err(WorkflowError::InvalidAssignee {
                user_id,
                expected: role,
            }),
        }
    }

    /// Hand every routed notification to the router mailbox. Never waits on delivery.
    fn publish(&self, order: &Order, events: &[OrderEvent]) {
        for event in events {
            tracing::debug!(order_id = %order.id, event_type = event.event_type(), "Routing order event");
            for publish in route(order, event) {
                tracing::debug!(
                    order_id = %order.id,
                    group = %publish.group,
                    event = publish.notification.event.as_str(),
                    "Publishing notification"
                );
                self.router.do_send(publish);
            }
        }
    }

    async fn observe<T, F>(&self, operation: &'static str, fut: F) -> Result<T, WorkflowError>
    where
        F: Future<Output = Result<T, WorkflowError>>,
    {
        let started = Instant::now();
        let result = fut.await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => {
                match e.kind() {
                    ErrorKind::Infrastructure => {
                        tracing::error!(operation = operation, error = %e, "Workflow operation failed")
                    }
                    kind => {
                        tracing::warn!(operation = operation, kind = kind.as_str(), error = %e, "Workflow operation rejected")
                    }
                }
                e.kind().as_str()
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_operation(operation, outcome, started.elapsed().as_secs_f64());
        }

        result
    }
}

pub(crate) fn require_role(actor: &Principal, required: Role) -> Result<(), WorkflowError> {
    if authorize(actor.role, required) {
        Ok(())
    } else {
        Err(WorkflowError::NotAuthorized { required })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
