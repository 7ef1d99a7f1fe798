use actix::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::order::Order;
use crate::metrics::Metrics;
use crate::models::{Principal, Role};

// ============================================================================
// Notification Router Actor
// ============================================================================
//
// Owns subscriber-group membership and fans events out to connected
// sessions. Delivery is best-effort:
// - no persistence, replay or acknowledgement
// - publishing never waits on a subscriber (full mailboxes drop the event)
// - sessions whose recipient is gone are pruned on the next publish
//
// Membership changes and publishes are serialized through the mailbox, so a
// publish sees every connect/disconnect sent before it.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriberGroup {
    Admin,
    Buyer(Uuid),
    Seller(Uuid),
}

impl SubscriberGroup {
    /// The only group a verified identity may join.
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.role {
            Role::Admin => SubscriberGroup::Admin,
            Role::Buyer => SubscriberGroup::Buyer(principal.user_id),
            Role::Seller => SubscriberGroup::Seller(principal.user_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SubscriberGroup::Admin => "admin",
            SubscriberGroup::Buyer(_) => "buyer",
            SubscriberGroup::Seller(_) => "seller",
        }
    }
}

impl fmt::Display for SubscriberGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberGroup::Admin => f.write_str("admin"),
            SubscriberGroup::Buyer(id) => write!(f, "buyer:{}", id),
            SubscriberGroup::Seller(id) => write!(f, "seller:{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    OrderCreated,
    OrderAssigned,
    OrderUpdated,
    StageUpdated,
    OrderDeleted,
}

impl NotificationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEvent::OrderCreated => "order_created",
            NotificationEvent::OrderAssigned => "order_assigned",
            NotificationEvent::OrderUpdated => "order_updated",
            NotificationEvent::StageUpdated => "stage_updated",
            NotificationEvent::OrderDeleted => "order_deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    Order(Box<Order>),
    OrderId(String),
}

/// What a connected session receives.
#[derive(Message, Debug, Clone, PartialEq, Serialize)]
#[rtype(result = "()")]
pub struct Notification {
    pub event: NotificationEvent,
    pub payload: NotificationPayload,
}

impl Notification {
    pub fn order(event: NotificationEvent, order: &Order) -> Self {
        Self {
            event,
            payload: NotificationPayload::Order(Box::new(order.clone())),
        }
    }

    pub fn order_id(event: NotificationEvent, order_id: Uuid) -> Self {
        Self {
            event,
            payload: NotificationPayload::OrderId(order_id.to_string()),
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Register a session for the group implied by `principal`. Replies with the session id.
#[derive(Message)]
#[rtype(result = "Uuid")]
pub struct Connect {
    pub principal: Principal,
    pub recipient: Recipient<Notification>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub session_id: Uuid,
}

/// Fire-and-forget fan-out to every live session in `group`.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct Publish {
    pub group: SubscriberGroup,
    pub notification: Notification,
}

#[derive(Message)]
#[rtype(result = "usize")]
pub struct GroupSize {
    pub group: SubscriberGroup,
}

// ============================================================================
// Router
// ============================================================================

struct Session {
    group: SubscriberGroup,
    recipient: Recipient<Notification>,
}

#[derive(Default)]
pub struct NotificationRouter {
    sessions: HashMap<Uuid, Session>,
    groups: HashMap<SubscriberGroup, HashSet<Uuid>>,
    metrics: Option<Arc<Metrics>>,
}

impl NotificationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::default()
        }
    }

    fn remove_session(&mut self, session_id: Uuid) -> Option<SubscriberGroup> {
        let session = self.sessions.remove(&session_id)?;

        if let Some(members) = self.groups.get_mut(&session.group) {
            members.remove(&session_id);
            if members.is_empty() {
                self.groups.remove(&session.group);
            }
        }

        self.report_session_count();
        Some(session.group)
    }

    fn report_session_count(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_subscriber_sessions(self.sessions.len());
        }
    }
}

impl Actor for NotificationRouter {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("NotificationRouter started");
    }
}

// ============================================================================
// Handlers
// ============================================================================

impl Handler<Connect> for NotificationRouter {
    type Result = MessageResult<Connect>;

    fn handle(&mut self, msg: Connect, _: &mut Self::Context) -> Self::Result {
        let session_id = Uuid::new_v4();
        let group = SubscriberGroup::for_principal(&msg.principal);

        self.sessions.insert(
            session_id,
            Session {
                group,
                recipient: msg.recipient,
            },
        );
        self.groups.entry(group).or_default().insert(session_id);
        self.report_session_count();

        tracing::info!(
            session_id = %session_id,
            group = %group,
            user_id = %msg.principal.user_id,
            "Session joined subscriber group"
        );

        MessageResult(session_id)
    }
}

impl Handler<Disconnect> for NotificationRouter {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Self::Context) {
        if let Some(group) = self.remove_session(msg.session_id) {
            tracing::info!(session_id = %msg.session_id, group = %group, "Session left subscriber group");
        }
    }
}

impl Handler<Publish> for NotificationRouter {
    type Result = ();

    fn handle(&mut self, msg: Publish, _: &mut Self::Context) {
        let Publish { group, notification } = msg;

        if let Some(metrics) = &self.metrics {
            metrics.record_notification_published(notification.event.as_str(), group.kind());
        }

        let members: Vec<Uuid> = match self.groups.get(&group) {
            Some(members) => members.iter().copied().collect(),
            None => {
                tracing::debug!(group = %group, event = notification.event.as_str(), "No subscribers connected");
                return;
            }
        };

        let mut delivered = 0usize;
        let mut stale = Vec::new();

        for session_id in members {
            let Some(session) = self.sessions.get(&session_id) else {
                continue;
            };

            match session.recipient.try_send(notification.clone()) {
                Ok(()) => delivered += 1,
                Err(SendError::Full(_)) => {
                    tracing::debug!(session_id = %session_id, "Subscriber mailbox full, event dropped");
                }
                Err(SendError::Closed(_)) => stale.push(session_id),
            }
        }

        for session_id in stale {
            self.remove_session(session_id);
            tracing::debug!(session_id = %session_id, "Pruned disconnected session");
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_notifications_delivered(delivered);
        }

        tracing::debug!(
            group = %group,
            event = notification.event.as_str(),
            delivered = delivered,
            "Published notification"
        );
    }
}

impl Handler<GroupSize> for NotificationRouter {
    type Result = MessageResult<GroupSize>;

    fn handle(&mut self, msg: GroupSize, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.groups.get(&msg.group).map(HashSet::len).unwrap_or(0))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::{InboxSession, TakeReceived};

    fn principal(role: Role) -> Principal {
        Principal::new(Uuid::new_v4(), role, "someone")
    }

    async fn connect(router: &Addr<NotificationRouter>, principal: &Principal) -> (Uuid, Addr<InboxSession>) {
        let inbox = InboxSession::new(principal.clone()).start();
        let session_id = router
            .send(Connect {
                principal: principal.clone(),
                recipient: inbox.clone().recipient(),
            })
            .await
            .unwrap();
        (session_id, inbox)
    }

    fn ping(event: NotificationEvent) -> Notification {
        Notification::order_id(event, Uuid::new_v4())
    }

    #[test]
    fn test_group_names() {
        let id = Uuid::new_v4();
        assert_eq!(SubscriberGroup::Admin.to_string(), "admin");
        assert_eq!(SubscriberGroup::Buyer(id).to_string(), format!("buyer:{}", id));
        assert_eq!(SubscriberGroup::Seller(id).kind(), "seller");
    }

    #[test]
    fn test_notification_json_shape() {
        let order_id = Uuid::new_v4();
        let json = serde_json::to_value(Notification::order_id(NotificationEvent::OrderDeleted, order_id)).unwrap();

        assert_eq!(json["event"], "order_deleted");
        assert_eq!(json["payload"], order_id.to_string());
    }

    #[test]
    fn test_principal_maps_to_own_group() {
        let buyer = principal(Role::Buyer);
        assert_eq!(SubscriberGroup::for_principal(&buyer), SubscriberGroup::Buyer(buyer.user_id));
        assert_eq!(SubscriberGroup::for_principal(&principal(Role::Admin)), SubscriberGroup::Admin);
    }

    #[actix::test]
    async fn test_publish_reaches_only_addressed_group() {
        let router = NotificationRouter::new().start();
        let buyer = principal(Role::Buyer);
        let other_buyer = principal(Role::Buyer);

        let (_, admin_inbox) = connect(&router, &principal(Role::Admin)).await;
        let (_, buyer_inbox) = connect(&router, &buyer).await;
        let (_, other_inbox) = connect(&router, &other_buyer).await;

        router.do_send(Publish {
            group: SubscriberGroup::Buyer(buyer.user_id),
            notification: ping(NotificationEvent::StageUpdated),
        });
        router.send(GroupSize { group: SubscriberGroup::Admin }).await.unwrap();

        let received = buyer_inbox.send(TakeReceived).await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].event, NotificationEvent::StageUpdated);

        assert!(admin_inbox.send(TakeReceived).await.unwrap().is_empty());
        assert!(other_inbox.send(TakeReceived).await.unwrap().is_empty());
    }

    #[actix::test]
    async fn test_every_admin_session_receives() {
        let router = NotificationRouter::new().start();
        let (_, first) = connect(&router, &principal(Role::Admin)).await;
        let (_, second) = connect(&router, &principal(Role::Admin)).await;

        assert_eq!(router.send(GroupSize { group: SubscriberGroup::Admin }).await.unwrap(), 2);

        router.do_send(Publish {
            group: SubscriberGroup::Admin,
            notification: ping(NotificationEvent::OrderCreated),
        });
        router.send(GroupSize { group: SubscriberGroup::Admin }).await.unwrap();

        assert_eq!(first.send(TakeReceived).await.unwrap().len(), 1);
        assert_eq!(second.send(TakeReceived).await.unwrap().len(), 1);
    }

    #[actix::test]
    async fn test_disconnected_session_misses_events() {
        let router = NotificationRouter::new().start();
        let admin = principal(Role::Admin);
        let (session_id, inbox) = connect(&router, &admin).await;

        router.do_send(Disconnect { session_id });
        router.do_send(Publish {
            group: SubscriberGroup::Admin,
            notification: ping(NotificationEvent::OrderUpdated),
        });

        assert_eq!(router.send(GroupSize { group: SubscriberGroup::Admin }).await.unwrap(), 0);
        assert!(inbox.send(TakeReceived).await.unwrap().is_empty());
    }

    #[actix::test]
    async fn test_publish_without_subscribers_is_silent() {
        let router = NotificationRouter::new().start();

        router.do_send(Publish {
            group: SubscriberGroup::Seller(Uuid::new_v4()),
            notification: ping(NotificationEvent::OrderAssigned),
        });

        assert_eq!(router.send(GroupSize { group: SubscriberGroup::Admin }).await.unwrap(), 0);
    }

    #[actix::test]
    async fn test_stopped_session_is_pruned() {
        let router = NotificationRouter::new().start();
        let admin = principal(Role::Admin);
        let (_, inbox) = connect(&router, &admin).await;

        inbox.send(crate::actors::CloseSession).await.unwrap();
        drop(inbox);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        router.do_send(Publish {
            group: SubscriberGroup::Admin,
            notification: ping(NotificationEvent::OrderCreated),
        });

        assert_eq!(router.send(GroupSize { group: SubscriberGroup::Admin }).await.unwrap(), 0);
    }
}
