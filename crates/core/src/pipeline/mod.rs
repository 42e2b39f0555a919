//! Stream pipeline: request context, tiering and the resolve loop.

mod runner;
mod tiers;
mod types;

pub use runner::StreamPipeline;
pub use tiers::{partition, EpisodeTiers, Tier};
pub use types::*;
