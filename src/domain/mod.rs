//! Domain layer - Pure business rules
//!
//! No persistence here: only error types, validation, and the state
//! rules for orders and stock.

pub mod errors;
pub mod inventory;
pub mod orders;
pub mod roles;
pub mod storage;
pub mod validation;

pub use errors::DomainError;
pub use inventory::{StockLevels, TransactionKind};
pub use orders::OrderStatus;
pub use roles::Role;
pub use storage::ObjectStorage;
