//! Shared data models for the AdScan pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Per-frame detections and bounding boxes
//! - Presence segments and their buffered expansions
//! - The end-of-run occurrence summary

pub mod detection;
pub mod segment;
pub mod summary;

// Re-export common types
pub use detection::{BoundingBox, Detection, FrameSample};
pub use segment::{ExpandedSegment, Segment};
pub use summary::{RunSummary, SegmentReport};
