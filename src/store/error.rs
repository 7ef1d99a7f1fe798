use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Order already exists: {0}")]
    AlreadyExists(Uuid),

    #[error("Concurrency conflict: expected version {expected}, but current is {actual}")]
    ConcurrencyConflict { expected: i64, actual: i64 },

    #[error("Buyer {0} already has an active order")]
    UniqueViolation(Uuid),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
