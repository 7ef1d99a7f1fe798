use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::Stage;
use crate::models::Principal;

// ============================================================================
// Order Events - Facts emitted by the Order aggregate
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    BuyerAssociated(BuyerAssociated),
    SellerAssigned(SellerAssigned),
    StageAdvanced(StageAdvanced),
    Deleted(OrderDeleted),
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::BuyerAssociated(_) => "BuyerAssociated",
            OrderEvent::SellerAssigned(_) => "SellerAssigned",
            OrderEvent::StageAdvanced(_) => "StageAdvanced",
            OrderEvent::Deleted(_) => "OrderDeleted",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Placed - Initial event in order lifecycle
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub items: Vec<String>,
    pub placed_by: Principal,
    pub placed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BuyerAssociated {
    pub buyer_id: Uuid,
    pub associated_by: Principal,
    pub associated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SellerAssigned {
    pub seller_id: Uuid,
    pub assigned_by: Principal,
    pub assigned_at: DateTime<Utc>,
}

/// Stage Advanced - exactly one position forward
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StageAdvanced {
    pub from: Stage,
    pub to: Stage,
    pub advanced_by: Principal,
    pub advanced_at: DateTime<Utc>,
}

/// Order Deleted - soft delete, the record and its history are kept
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderDeleted {
    pub stage: Stage,
    pub deleted_by: Principal,
    pub deleted_at: DateTime<Utc>,
}
