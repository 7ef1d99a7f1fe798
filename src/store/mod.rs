// ============================================================================
// Storage Layer
// ============================================================================
//
// Document-store seams for orders and users, plus the per-order lock table
// used to serialize read-modify-write cycles. The in-memory implementations
// enforce the same constraints a production store must enforce.
//
// ============================================================================

mod error;
mod locks;
mod order_store;
mod user_directory;

pub use error::StoreError;
pub use locks::KeyedLocks;
pub use order_store::{InMemoryOrderStore, OrderStore};
pub use user_directory::{InMemoryUserDirectory, UserDirectory};
