//! Domain models for Hotelier.
//!
//! One module per entity, each with the entity struct plus its
//! `Create*`/`Update*` input types. All statuses are closed enums —
//! never free-form strings.

pub mod audit;
pub mod charge;
pub mod daily_close;
pub mod guest;
pub mod payment;
pub mod reservation;
pub mod room;
pub mod room_type;
pub mod tenant;
