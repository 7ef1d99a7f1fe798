// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for real-time delivery.
//
// Note: Order logic runs in the command handler, NOT in actors.
//       Actors are reserved for infrastructure concerns only.
//
// ============================================================================

mod inbox_session;
mod notification_router;

pub use inbox_session::{CloseSession, InboxSession, TakeReceived};
pub use notification_router::{
    Connect, Disconnect, GroupSize, Notification, NotificationEvent, NotificationPayload,
    NotificationRouter, Publish, SubscriberGroup,
};
