use uuid::Uuid;

use crate::models::Principal;

// ============================================================================
// Order Commands - Represent user intent against an existing order
// ============================================================================
//
// Placement is not a command: a new order is built from its first event
// (see `Order::place`).
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    AssociateBuyer {
        buyer_id: Uuid,
        actor: Principal,
    },
    AssignSeller {
        seller_id: Uuid,
        actor: Principal,
    },
    AdvanceStage {
        actor: Principal,
    },
    Delete {
        actor: Principal,
    },
}

impl OrderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::AssociateBuyer { .. } => "associate_buyer",
            OrderCommand::AssignSeller { .. } => "assign_seller",
            OrderCommand::AdvanceStage { .. } => "advance_stage",
            OrderCommand::Delete { .. } => "delete_order",
        }
    }
}
