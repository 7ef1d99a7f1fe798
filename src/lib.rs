// ============================================================================
// Order Fulfillment - Workflow state machine with role-addressed notifications
// ============================================================================
//
// Layers:
// - domain:  order aggregate, stage machine, command handler, queries
// - store:   persistence ports and in-memory adapters
// - actors:  notification router and subscriber sessions
// - metrics: Prometheus registry and the /metrics HTTP endpoint
//
// ============================================================================

pub mod actors;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod models;
pub mod store;
