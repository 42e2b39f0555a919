//! Debrid backend integration.
//!
//! This module provides a `DebridClient` trait over the backend's job API,
//! the Real-Debrid implementation, bounded polling helpers and the
//! `DebridResolver` that turns a torrent candidate into a playable stream.

mod realdebrid;
mod resolver;
mod retry;
mod types;

pub use realdebrid::RealDebridClient;
pub use resolver::{DebridResolver, ResolveError};
pub use retry::{poll_until, Poll, RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};
pub use types::*;
