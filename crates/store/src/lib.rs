//! Store contract for the surge workspace.
//!
//! The core components only assume a transactional key-value/relational
//! store: every mutating call is one logical transaction, and lease
//! acquisition in particular is a single conditional write. [`MemoryStore`]
//! implements the contract in-process; a durable backend would implement
//! [`Store`] against its own engine.

pub mod backend;
pub mod error;
pub mod memory;

pub use backend::{ProfileUpdate, Store};
pub use error::StoreError;
pub use memory::MemoryStore;
