//! Hotelier Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - SurrealDB implementations of the `hotelier-core` repository traits
//!
//! The consistency-critical writes (reservation create/update/
//! transition, completed-payment writes, charge writes, daily close)
//! run as single multi-statement transactions so the invariant check
//! and the write are one atomic unit.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
