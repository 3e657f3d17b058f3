//! AdScan processing worker.
//!
//! Scans a video for the configured target classes and writes three
//! artifacts into a numbered run directory: an annotated visualization
//! video, one audio-free clip per detected segment, and a textual
//! occurrence summary consumed by the downstream report generator.

pub mod config;
pub mod error;
pub mod export;
pub mod outdir;
pub mod pipeline;
pub mod report;

pub use config::RunConfig;
pub use error::{WorkerError, WorkerResult};
