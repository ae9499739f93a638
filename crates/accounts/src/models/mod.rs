//! Domain models for the accounts service.
//!
//! These are validated domain objects, separate from the wire/row types each
//! directory backend decodes.

pub mod user;

pub use user::{NewUserRecord, UserRecord};
