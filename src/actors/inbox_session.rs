use actix::prelude::*;

use super::notification_router::Notification;
use crate::models::Principal;

// ============================================================================
// Inbox Session Actor
// ============================================================================
//
// A connected session that keeps what it receives in memory and logs it.
// Transport adapters (websocket, SSE) take the same place in the router by
// forwarding instead of buffering.
//
// ============================================================================

pub struct InboxSession {
    principal: Principal,
    received: Vec<Notification>,
}

impl InboxSession {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            received: Vec::new(),
        }
    }
}

impl Actor for InboxSession {
    type Context = Context<Self>;
}

/// Drain everything received so far.
#[derive(Message)]
#[rtype(result = "Vec<Notification>")]
pub struct TakeReceived;

#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseSession;

impl Handler<Notification> for InboxSession {
    type Result = ();

    fn handle(&mut self, msg: Notification, _: &mut Self::Context) {
        tracing::info!(
            user = %self.principal.name,
            role = %self.principal.role,
            event = msg.event.as_str(),
            "📨 Notification received"
        );
        self.received.push(msg);
    }
}

impl Handler<TakeReceived> for InboxSession {
    type Result = MessageResult<TakeReceived>;

    fn handle(&mut self, _: TakeReceived, _: &mut Self::Context) -> Self::Result {
        MessageResult(std::mem::take(&mut self.received))
    }
}

impl Handler<CloseSession> for InboxSession {
    type Result = ();

    fn handle(&mut self, _: CloseSession, ctx: &mut Self::Context) {
        ctx.stop();
    }
}
