// ============================================================================
// Order Domain - Fulfillment workflow for a single order
// ============================================================================
//
// - Value objects (Stage, HistoryEntry, StageTimestamps)
// - Events and commands
// - Errors (OrderError for aggregate rules, WorkflowError for operations)
// - Aggregate (Order with the stage machine)
// - Command handler (role checks, locking, persistence, publishing)
// - Routing (which subscriber group hears about which event)
// - Queries (role-scoped read side)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;
pub mod queries;
pub mod routing;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::OrderCommandHandler;
pub use queries::{average_delivery_time, OrderQueries, OrderStats, OrderView};
pub use routing::route;
