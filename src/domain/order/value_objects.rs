use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::OrderError;
use crate::models::{Principal, Role};

// ============================================================================
// Order Value Objects
// ============================================================================

/// Delivery stage. Declaration order is progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    #[serde(rename = "Buyer Associated")]
    BuyerAssociated,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "Packed")]
    Packed,
    #[serde(rename = "Shipped")]
    Shipped,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::OrderPlaced,
        Stage::BuyerAssociated,
        Stage::Processing,
        Stage::Packed,
        Stage::Shipped,
        Stage::OutForDelivery,
        Stage::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::OrderPlaced => "Order Placed",
            Stage::BuyerAssociated => "Buyer Associated",
            Stage::Processing => "Processing",
            Stage::Packed => "Packed",
            Stage::Shipped => "Shipped",
            Stage::OutForDelivery => "Out for Delivery",
            Stage::Delivered => "Delivered",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Delivered)
    }

    /// The stage exactly one position ahead.
    pub fn next(&self) -> Result<Stage, OrderError> {
        Stage::ALL
            .get(self.index() + 1)
            .copied()
            .ok_or(OrderError::AlreadyTerminal)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| OrderError::InvalidStage(s.to_string()))
    }
}

/// Stage machine transition on a stored stage name. Pure; callers apply the result.
pub fn advance(current: &str) -> Result<Stage, OrderError> {
    current.parse::<Stage>()?.next()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Created,
    Associated,
    SellerAssigned,
    MovedNext,
    Deleted,
}

/// One audit record. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub stage: Stage,
    pub action: HistoryAction,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_role: Role,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(stage: Stage, action: HistoryAction, actor: &Principal, timestamp: DateTime<Utc>) -> Self {
        Self {
            stage,
            action,
            actor_id: actor.user_id,
            actor_name: actor.name.clone(),
            actor_role: actor.role,
            timestamp,
        }
    }
}

/// First-entry instant per stage. Write-once per key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageTimestamps(BTreeMap<Stage, DateTime<Utc>>);

impl StageTimestamps {
    /// Records `at` for `stage` unless the stage was already entered.
    /// Returns whether a new entry was written.
    pub fn stamp(&mut self, stage: Stage, at: DateTime<Utc>) -> bool {
        if self.0.contains_key(&stage) {
            return false;
        }
        self.0.insert(stage, at);
        true
    }

    pub fn get(&self, stage: Stage) -> Option<DateTime<Utc>> {
        self.0.get(&stage).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
