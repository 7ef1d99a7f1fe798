// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// `aggregate` holds the generic aggregate trait, `order` the fulfillment
// workflow built on it, and `identity` maps verified identities to principals.
//
// ============================================================================

pub mod aggregate;
pub mod identity;
pub mod order;
