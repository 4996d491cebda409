//! Hotelier Core — domain models, error taxonomy, and repository traits.
//!
//! This crate holds the shared vocabulary of the system: the entities a
//! hotel manages (rooms, guests, reservations, payments, charges, daily
//! closes), the typed error values every operation returns, and the
//! repository traits the storage layer implements. It performs no I/O.

pub mod error;
pub mod models;
pub mod repository;
