//! Stashbox account provisioning.
//!
//! Given an email and full name, looks the email up in the user directory,
//! sends an email OTP, and creates the user record on first sign-up. The
//! library is shared by the `stashbox-accounts` server, the CLI, and the
//! integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod appwrite;
pub mod config;
pub mod directory;
pub mod error;
pub mod middleware;
pub mod models;
pub mod otp;
pub mod routes;
pub mod services;
pub mod state;
