//! Stashbox Core - Shared domain types for account provisioning.
//!
//! This crate provides the value types used across all Stashbox components:
//! - `accounts` - Provisioning service (HTTP API, directory, OTP issuer)
//! - `cli` - Command-line tools for migrations and manual provisioning
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Parsing happens here so that every layer above works
//! with values that are already known to be well-formed.
//!
//! # Modules
//!
//! - [`types`] - Emails, full names, avatars and document identifiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
