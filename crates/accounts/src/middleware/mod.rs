//! HTTP middleware stack for the accounts service.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID
//! 4. Rate limiting (account creation only)

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::account_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
