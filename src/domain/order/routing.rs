use super::aggregate::Order;
use super::events::OrderEvent;
use crate::actors::{Notification, NotificationEvent, Publish, SubscriberGroup};

// ============================================================================
// Event Routing - Order events to targeted notifications
// ============================================================================
//
//   Placed          → admin: order_created
//   BuyerAssociated → buyer: order_assigned, admin: order_updated
//   SellerAssigned  → admin: order_updated, seller: order_assigned
//   StageAdvanced   → buyer: stage_updated, admin: order_updated
//   Deleted         → admin + buyer: order_deleted (order id only)
//
// `order` is the persisted state after the event was applied.
//
// ============================================================================

pub fn route(order: &Order, event: &OrderEvent) -> Vec<Publish> {
    let to = |group: SubscriberGroup, notification: Notification| Publish { group, notification };

    match event {
        OrderEvent::Placed(_) => vec![to(
            SubscriberGroup::Admin,
            Notification::order(NotificationEvent::OrderCreated, order),
        )],

        OrderEvent::BuyerAssociated(e) => vec![
            to(
                SubscriberGroup::Buyer(e.buyer_id),
                Notification::order(NotificationEvent::OrderAssigned, order),
            ),
            to(
                SubscriberGroup::Admin,
                Notification::order(NotificationEvent::OrderUpdated, order),
            ),
        ],

        OrderEvent::SellerAssigned(e) => vec![
            to(
                SubscriberGroup::Admin,
                Notification::order(NotificationEvent::OrderUpdated, order),
            ),
            to(
                SubscriberGroup::Seller(e.seller_id),
                Notification::order(NotificationEvent::OrderAssigned, order),
            ),
        ],

        OrderEvent::StageAdvanced(_) => {
            let mut targets = Vec::with_capacity(2);
            if let Some(buyer_id) = order.buyer_id {
                targets.push(to(
                    SubscriberGroup::Buyer(buyer_id),
                    Notification::order(NotificationEvent::StageUpdated, order),
                ));
            }
            targets.push(to(
                SubscriberGroup::Admin,
                Notification::order(NotificationEvent::OrderUpdated, order),
            ));
            targets
        }

        OrderEvent::Deleted(_) => {
            let mut targets = vec![to(
                SubscriberGroup::Admin,
                Notification::order_id(NotificationEvent::OrderDeleted, order.id),
            )];
            if let Some(buyer_id) = order.buyer_id {
                targets.push(to(
                    SubscriberGroup::Buyer(buyer_id),
                    Notification::order_id(NotificationEvent::OrderDeleted, order.id),
                ));
            }
            targets
        }
    }
}
