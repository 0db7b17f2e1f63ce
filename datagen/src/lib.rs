pub mod config;
pub mod generate;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod transform;
pub mod workflow;

pub use pipeline::{Envelope, Pipeline};
