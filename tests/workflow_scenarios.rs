use actix::prelude::*;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Barrier;
use uuid::Uuid;

use order_fulfillment::actors::{
    Connect, GroupSize, InboxSession, Notification, NotificationEvent, NotificationPayload, NotificationRouter,
    SubscriberGroup, TakeReceived,
};
use order_fulfillment::domain::identity::IdentityService;
use order_fulfillment::domain::order::{
    HistoryAction, Order, OrderCommandHandler, OrderError, OrderQueries, Stage, WorkflowError,
};
use order_fulfillment::models::{Principal, Role};
use order_fulfillment::store::{InMemoryOrderStore, InMemoryUserDirectory, OrderStore, StoreError, UserDirectory};

// ============================================================================
// Test harness: in-memory stores, a live router, one identity per role
// ============================================================================

struct World {
    handler: Arc<OrderCommandHandler>,
    queries: OrderQueries,
    router: Addr<NotificationRouter>,
    admin: Principal,
    buyer: Principal,
    seller: Principal,
    identity: IdentityService,
}

async fn world() -> World {
    let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
    let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());
    let router = NotificationRouter::new().start();
    let identity = IdentityService::new(users.clone());

    identity
        .sync_user("auth|admin", "Ada", "ada@example.com", Some(Role::Admin))
        .await
        .unwrap();
    identity
        .sync_user("auth|buyer", "Bea", "bea@example.com", None)
        .await
        .unwrap();
    identity
        .sync_user("auth|seller", "Sam", "sam@example.com", Some(Role::Seller))
        .await
        .unwrap();

    World {
        handler: Arc::new(OrderCommandHandler::new(orders.clone(), users.clone(), router.clone())),
        queries: OrderQueries::new(orders, users),
        router,
        admin: identity.resolve("auth|admin").await.unwrap(),
        buyer: identity.resolve("auth|buyer").await.unwrap(),
        seller: identity.resolve("auth|seller").await.unwrap(),
        identity,
    }
}

async fn connect(router: &Addr<NotificationRouter>, principal: &Principal) -> Addr<InboxSession> {
    let inbox = InboxSession::new(principal.clone()).start();
    router
        .send(Connect {
            principal: principal.clone(),
            recipient: inbox.clone().recipient(),
        })
        .await
        .unwrap();
    inbox
}

/// Everything published so far has been forwarded once this returns.
async fn drain(router: &Addr<NotificationRouter>, inbox: &Addr<InboxSession>) -> Vec<Notification> {
    router.send(GroupSize { group: SubscriberGroup::Admin }).await.unwrap();
    inbox.send(TakeReceived).await.unwrap()
}

fn events(notifications: &[Notification]) -> Vec<NotificationEvent> {
    notifications.iter().map(|n| n.event).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[actix::test]
async fn test_create_then_fetch_active_order() {
    let w = world().await;

    let created = w
        .handler
        .create_order(&w.buyer, vec!["Laptop".to_string(), "Mouse".to_string()])
        .await
        .unwrap();

    let active = w.queries.active_order(&w.buyer).await.unwrap().unwrap();
    assert_eq!(active, created);
    assert_eq!(active.items, vec!["Laptop", "Mouse"]);
    assert_eq!(active.stage, Stage::OrderPlaced);
    assert_eq!(active.buyer_id, Some(w.buyer.user_id));
    assert_eq!(active.stage_timestamps.len(), 1);
    assert_eq!(active.history.len(), 1);
    assert_eq!(active.history[0].action, HistoryAction::Created);
    assert_eq!(active.history[0].actor_id, w.buyer.user_id);

    let json = serde_json::to_value(&active).unwrap();
    assert_eq!(json["stage"], "Order Placed");
    assert_eq!(json["isDeleted"], false);
    assert!(json["stageTimestamps"]["Order Placed"].is_string());
}

#[actix::test]
async fn test_full_lifecycle_reaches_delivered_once() {
    let w = world().await;
    let order = w
        .handler
        .create_order(&w.buyer, vec!["Laptop".to_string()])
        .await
        .unwrap();
    let placed_at = order.stage_timestamps.get(Stage::OrderPlaced).unwrap();

    let associated = w
        .handler
        .associate_buyer(&w.admin, order.id, w.buyer.user_id)
        .await
        .unwrap();
    assert_eq!(associated.stage, Stage::BuyerAssociated);

    w.handler
        .assign_seller(&w.admin, order.id, w.seller.user_id)
        .await
        .unwrap();

    let mut last = associated;
    for _ in 0..5 {
        last = w.handler.advance_stage(&w.seller, order.id).await.unwrap();
    }
    assert_eq!(last.stage, Stage::Delivered);

    let err = w.handler.advance_stage(&w.seller, order.id).await.unwrap_err();
    assert_eq!(err, WorkflowError::Rule(OrderError::AlreadyTerminal));

    let details = w.queries.order_details(&w.admin, order.id).await.unwrap();
    assert_eq!(details.order.stage, Stage::Delivered);
    assert_eq!(details.order.stage_timestamps.len(), 7);
    assert_eq!(details.order.stage_timestamps.get(Stage::OrderPlaced), Some(placed_at));

    let actions: Vec<HistoryAction> = details.order.history.iter().map(|h| h.action).collect();
    assert_eq!(
        actions,
        vec![
            HistoryAction::Created,
            HistoryAction::Associated,
            HistoryAction::SellerAssigned,
            HistoryAction::MovedNext,
            HistoryAction::MovedNext,
            HistoryAction::MovedNext,
            HistoryAction::MovedNext,
            HistoryAction::MovedNext,
        ]
    );

    // Delivered frees the buyer for a new order
    assert!(w.queries.active_order(&w.buyer).await.unwrap().is_none());
    assert_eq!(w.queries.order_history(&w.buyer).await.unwrap().len(), 1);
    w.handler
        .create_order(&w.buyer, vec!["Headphones".to_string()])
        .await
        .unwrap();

    let stats = w.queries.stats(&w.admin).await.unwrap();
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.orders_per_stage[&Stage::Delivered], 1);
    assert!(stats.avg_delivery_time_ms.is_some());
}

/// Holds each active-order lookup until every concurrent create has made one,
/// so all of them pass the handler's pre-check before any insert runs.
struct LookupBarrierStore {
    inner: InMemoryOrderStore,
    barrier: Barrier,
}

#[async_trait]
impl OrderStore for LookupBarrierStore {
    async fn insert(&self, order: Order) -> Result<Order, StoreError> {
        self.inner.insert(order).await
    }
    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        self.inner.save(order).await
    }
    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        self.inner.get(id).await
    }
    async fn find_active_by_buyer(&self, buyer_id: Uuid) -> Result<Option<Order>, StoreError> {
        let found = self.inner.find_active_by_buyer(buyer_id).await?;
        self.barrier.wait().await;
        Ok(found)
    }
    async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<Order>, StoreError> {
        self.inner.list_by_seller(seller_id).await
    }
    async fn list_delivered_by_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        self.inner.list_delivered_by_buyer(buyer_id).await
    }
    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        self.inner.list_all().await
    }
}

#[actix::test]
async fn test_concurrent_creates_yield_exactly_one_order() {
    const ATTEMPTS: usize = 8;

    let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());
    let buyer = users
        .sync_user("auth|buyer", "Bea", "bea@example.com", None)
        .await
        .unwrap()
        .principal();
    let orders = Arc::new(LookupBarrierStore {
        inner: InMemoryOrderStore::new(),
        barrier: Barrier::new(ATTEMPTS),
    });
    let handler = Arc::new(OrderCommandHandler::new(
        orders.clone(),
        users,
        NotificationRouter::new().start(),
    ));

    let attempts = (0..ATTEMPTS).map(|i| {
        let handler = handler.clone();
        let buyer = buyer.clone();
        async move { handler.create_order(&buyer, vec![format!("Item {i}")]).await }
    });
    let results = futures_util::future::join_all(attempts).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_eq!(result.as_ref().unwrap_err(), &WorkflowError::DuplicateActiveOrder);
    }

    assert_eq!(orders.inner.list_all().await.unwrap().len(), 1);
}

#[actix::test]
async fn test_deleted_order_is_excluded_but_auditable() {
    let w = world().await;
    let order = w
        .handler
        .create_order(&w.buyer, vec!["Laptop".to_string()])
        .await
        .unwrap();
    w.handler
        .assign_seller(&w.admin, order.id, w.seller.user_id)
        .await
        .unwrap();

    let other_seller = w
        .identity
        .sync_user("auth|seller2", "Sid", "sid@example.com", Some(Role::Seller))
        .await
        .unwrap()
        .principal();
    assert_eq!(
        w.handler.delete_order(&other_seller, order.id).await.unwrap_err(),
        WorkflowError::NotOrderOwner(order.id)
    );

    let deleted_id = w.handler.delete_order(&w.seller, order.id).await.unwrap();
    assert_eq!(deleted_id, order.id);

    assert!(w.queries.active_order(&w.buyer).await.unwrap().is_none());
    assert!(w.queries.assigned_orders(&w.seller).await.unwrap().is_empty());
    assert_eq!(
        w.handler.advance_stage(&w.seller, order.id).await.unwrap_err(),
        WorkflowError::OrderNotFound(order.id)
    );

    let audit = w.queries.order_details(&w.admin, order.id).await.unwrap();
    assert!(audit.order.is_deleted);
    assert_eq!(audit.order.history.last().map(|h| h.action), Some(HistoryAction::Deleted));

    // A deleted order no longer blocks the buyer
    w.handler
        .create_order(&w.buyer, vec!["Tablet".to_string()])
        .await
        .unwrap();
}

#[actix::test]
async fn test_stats_without_deliveries_report_unavailable_average() {
    let w = world().await;
    w.handler
        .create_order(&w.buyer, vec!["Laptop".to_string()])
        .await
        .unwrap();

    let stats = w.queries.stats(&w.admin).await.unwrap();
    assert_eq!(stats.avg_delivery_time_ms, None);

    let json = serde_json::to_value(&stats).unwrap();
    assert!(json["avgDeliveryTimeMs"].is_null());
    assert_eq!(json["totalOrders"], 1);
    assert_eq!(json["ordersPerStage"].as_object().unwrap().len(), 7);
}

#[actix::test]
async fn test_notifications_reach_only_the_addressed_groups() {
    let w = world().await;
    let admin_inbox = connect(&w.router, &w.admin).await;
    let buyer_inbox = connect(&w.router, &w.buyer).await;
    let seller_inbox = connect(&w.router, &w.seller).await;

    let stranger = w
        .identity
        .sync_user("auth|buyer2", "Bo", "bo@example.com", None)
        .await
        .unwrap()
        .principal();
    let stranger_inbox = connect(&w.router, &stranger).await;

    let order = w
        .handler
        .create_order(&w.buyer, vec!["Laptop".to_string()])
        .await
        .unwrap();
    w.handler
        .associate_buyer(&w.admin, order.id, w.buyer.user_id)
        .await
        .unwrap();
    w.handler
        .assign_seller(&w.admin, order.id, w.seller.user_id)
        .await
        .unwrap();
    w.handler.advance_stage(&w.seller, order.id).await.unwrap();
    w.handler.delete_order(&w.seller, order.id).await.unwrap();

    let admin = drain(&w.router, &admin_inbox).await;
    assert_eq!(
        events(&admin),
        vec![
            NotificationEvent::OrderCreated,
            NotificationEvent::OrderUpdated,
            NotificationEvent::OrderUpdated,
            NotificationEvent::OrderUpdated,
            NotificationEvent::OrderDeleted,
        ]
    );

    let buyer = drain(&w.router, &buyer_inbox).await;
    assert_eq!(
        events(&buyer),
        vec![
            NotificationEvent::OrderAssigned,
            NotificationEvent::StageUpdated,
            NotificationEvent::OrderDeleted,
        ]
    );
    assert_eq!(
        buyer.last().map(|n| n.payload.clone()),
        Some(NotificationPayload::OrderId(order.id.to_string()))
    );

    let seller = drain(&w.router, &seller_inbox).await;
    assert_eq!(events(&seller), vec![NotificationEvent::OrderAssigned]);

    assert!(drain(&w.router, &stranger_inbox).await.is_empty());

    let json = serde_json::to_value(&buyer[1]).unwrap();
    assert_eq!(json["event"], "stage_updated");
    assert_eq!(json["payload"]["stage"], "Processing");
}

#[actix::test]
async fn test_failed_operation_publishes_nothing() {
    let w = world().await;
    let admin_inbox = connect(&w.router, &w.admin).await;

    let err = w
        .handler
        .assign_seller(&w.admin, Uuid::new_v4(), w.seller.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::OrderNotFound(_)));

    let err = w.handler.create_order(&w.buyer, vec!["  ".to_string()]).await.unwrap_err();
    assert_eq!(err, WorkflowError::Rule(OrderError::EmptyItemList));

    assert!(drain(&w.router, &admin_inbox).await.is_empty());
}
