//! Core types for Stashbox.
//!
//! This module provides type-safe wrappers for the values that flow through
//! account provisioning.

pub mod avatar;
pub mod email;
pub mod full_name;
pub mod id;

pub use avatar::{Avatar, AvatarError};
pub use email::{Email, EmailError};
pub use full_name::{FullName, FullNameError};
pub use id::*;
