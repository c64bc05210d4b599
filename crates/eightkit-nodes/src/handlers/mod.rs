//! Operation handlers
//!
//! One function per remote operation. Every handler takes an
//! [`ApiClient`](eightkit_client::ApiClient), validates its inputs before
//! any network call and returns failures as typed errors.

pub mod app;
pub mod check;
pub mod last_updated;
pub mod lock;
pub mod lookup;
pub mod resources;
pub mod values;
