//! HTTP surface of the stream resolver.

pub mod api;
pub mod metrics;
pub mod rate_limit;
pub mod state;
