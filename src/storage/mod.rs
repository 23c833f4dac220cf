//! Persistence layer
//!
//! The ledger talks to storage through the [`PersistenceGateway`] trait;
//! backends are selected at node construction.

pub mod gateway;
pub mod json_store;

pub use gateway::{MemoryGateway, PersistenceError, PersistenceGateway};
pub use json_store::JsonStore;
