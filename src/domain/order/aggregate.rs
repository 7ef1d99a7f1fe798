use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{advance, HistoryAction, HistoryEntry, Stage, StageTimestamps};
use crate::domain::aggregate::AggregateRoot;
use crate::models::Principal;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Current State
    pub items: Vec<String>,
    pub stage: Stage,
    pub buyer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,

    // Audit Trail
    pub stage_timestamps: StageTimestamps,
    pub history: Vec<HistoryEntry>,
    pub is_deleted: bool,

    // Maintained by the store
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order for `buyer`. The caller persists it.
    pub fn place(buyer: &Principal, items: Vec<String>) -> Result<(Self, OrderEvent), OrderError> {
        let items = Self::validate_items(items)?;

        let event = OrderEvent::Placed(OrderPlaced {
            order_id: Uuid::new_v4(),
            items,
            placed_by: buyer.clone(),
            placed_at: Utc::now(),
        });

        let order = Self::apply_first_event(&event)?;
        Ok((order, event))
    }

    /// Active means counted against the buyer's single-order allowance.
    pub fn is_active(&self) -> bool {
        !self.is_deleted && !self.stage.is_terminal()
    }

    pub fn is_owned_by_seller(&self, seller_id: Uuid) -> bool {
        self.seller_id == Some(seller_id)
    }

    fn validate_items(items: Vec<String>) -> Result<Vec<String>, OrderError> {
        let items: Vec<String> = items
            .into_iter()
            .map(|item| item.trim().to_string())
            .collect();

        if items.is_empty() || items.iter().any(|item| item.is_empty()) {
            return Err(OrderError::EmptyItemList);
        }

        Ok(items)
    }

    fn ensure_not_deleted(&self) -> Result<(), OrderError> {
        if self.is_deleted {
            return Err(OrderError::Deleted);
        }
        Ok(())
    }

    fn enter_stage(&mut self, stage: Stage, at: DateTime<Utc>) {
        self.stage = stage;
        self.stage_timestamps.stamp(stage, at);
    }

    fn record(&mut self, action: HistoryAction, actor: &Principal, at: DateTime<Utc>) {
        self.history.push(HistoryEntry::new(self.stage, action, actor, at));
        self.updated_at = at;
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl AggregateRoot for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Placed(e) => {
                let mut order = Self {
                    id: e.order_id,
                    version: 0,
                    items: e.items.clone(),
                    stage: Stage::OrderPlaced,
                    buyer_id: Some(e.placed_by.user_id),
                    seller_id: None,
                    stage_timestamps: StageTimestamps::default(),
                    history: Vec::new(),
                    is_deleted: false,
                    created_at: e.placed_at,
                    updated_at: e.placed_at,
                };
                order.enter_stage(Stage::OrderPlaced, e.placed_at);
                order.record(HistoryAction::Created, &e.placed_by, e.placed_at);
                Ok(order)
            }
            _ => Err(OrderError::InvalidStage("order has not been placed".to_string())),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Placed(_) => {
                // First event already applied
                Ok(())
            }
            OrderEvent::BuyerAssociated(e) => {
                self.buyer_id = Some(e.buyer_id);
                // Side-channel jump, not a linear advance
                self.enter_stage(Stage::BuyerAssociated, e.associated_at);
                self.record(HistoryAction::Associated, &e.associated_by, e.associated_at);
                Ok(())
            }
            OrderEvent::SellerAssigned(e) => {
                self.seller_id = Some(e.seller_id);
                self.record(HistoryAction::SellerAssigned, &e.assigned_by, e.assigned_at);
                Ok(())
            }
            OrderEvent::StageAdvanced(e) => {
                self.enter_stage(e.to, e.advanced_at);
                self.record(HistoryAction::MovedNext, &e.advanced_by, e.advanced_at);
                Ok(())
            }
            OrderEvent::Deleted(e) => {
                self.is_deleted = true;
                // Records the stage at deletion, there is no "Deleted" stage
                self.record(HistoryAction::Deleted, &e.deleted_by, e.deleted_at);
                Ok(())
            }
        }
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_not_deleted()?;

        match command {
            OrderCommand::AssociateBuyer { buyer_id, actor } => {
                match self.stage {
                    Stage::OrderPlaced | Stage::BuyerAssociated => {}
                    stage => return Err(OrderError::AssociationClosed(stage)),
                }

                Ok(vec![OrderEvent::BuyerAssociated(BuyerAssociated {
                    buyer_id: *buyer_id,
                    associated_by: actor.clone(),
                    associated_at: Utc::now(),
                })])
            }

            OrderCommand::AssignSeller { seller_id, actor } => {
                if self.seller_id.is_some() {
                    return Err(OrderError::SellerAlreadyAssigned);
                }
                if self.stage.is_terminal() {
                    return Err(OrderError::AlreadyTerminal);
                }

                Ok(vec![OrderEvent::SellerAssigned(SellerAssigned {
                    seller_id: *seller_id,
                    assigned_by: actor.clone(),
                    assigned_at: Utc::now(),
                })])
            }

            OrderCommand::AdvanceStage { actor } => {
                let next = advance(self.stage.as_str())?;

                Ok(vec![OrderEvent::StageAdvanced(StageAdvanced {
                    from: self.stage,
                    to: next,
                    advanced_by: actor.clone(),
                    advanced_at: Utc::now(),
                })])
            }

            OrderCommand::Delete { actor } => Ok(vec![OrderEvent::Deleted(OrderDeleted {
                stage: self.stage,
                deleted_by: actor.clone(),
                deleted_at: Utc::now(),
            })]),
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
