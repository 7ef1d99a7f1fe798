use uuid::Uuid;

use super::value_objects::Stage;
use crate::models::Role;
use crate::store::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Order is already Delivered")]
    AlreadyTerminal,

    #[error("Invalid current stage: {0}")]
    InvalidStage(String),

    #[error("Order items cannot be empty")]
    EmptyItemList,

    #[error("Order already has a seller assigned")]
    SellerAlreadyAssigned,

    #[error("Buyer cannot be associated once the order is in stage: {0}")]
    AssociationClosed(Stage),

    #[error("Order has been deleted")]
    Deleted,
}

// ============================================================================
// Workflow Operation Errors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape; resubmit with corrected input
    Validation,
    /// Business precondition failed
    Precondition,
    /// Wrong role or unknown identity
    Authorization,
    /// Storage failure; the operation had no effect
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied. Requires role: {required}")]
    NotAuthorized { required: Role },

    #[error("You can only have one active order at a time")]
    DuplicateActiveOrder,

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Order {0} is not assigned to you")]
    NotOrderOwner(Uuid),

    #[error("User {user_id} is not a registered {expected}")]
    InvalidAssignee { user_id: Uuid, expected: Role },

    #[error(transparent)]
    Rule(#[from] OrderError),

    #[error("Storage error: {0}")]
    Infrastructure(StoreError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Unauthenticated | WorkflowError::NotAuthorized { .. } => ErrorKind::Authorization,
            WorkflowError::Rule(OrderError::EmptyItemList) | WorkflowError::Rule(OrderError::InvalidStage(_)) => {
                ErrorKind::Validation
            }
            WorkflowError::InvalidAssignee { .. } => ErrorKind::Validation,
            WorkflowError::DuplicateActiveOrder
            | WorkflowError::OrderNotFound(_)
            | WorkflowError::NotOrderOwner(_)
            | WorkflowError::Rule(_) => ErrorKind::Precondition,
            WorkflowError::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => WorkflowError::DuplicateActiveOrder,
            other => WorkflowError::Infrastructure(other),
        }
    }
}
