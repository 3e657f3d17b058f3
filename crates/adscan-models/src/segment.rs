//! Presence segments and buffered expansion.

use serde::{Deserialize, Serialize};

/// A raw, un-padded time interval during which the target was continuously
/// detected. Invariant: `end_sec > start_sec`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds from the beginning of the video.
    pub start_sec: f64,
    /// End time in seconds.
    pub end_sec: f64,
}

impl Segment {
    pub fn new(start_sec: f64, end_sec: f64) -> Self {
        Self { start_sec, end_sec }
    }

    /// Duration of this segment in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.end_sec - self.start_sec).max(0.0)
    }

    /// Pad the segment by the configured pre/post buffers and clamp the
    /// result to `[0, video_duration]`.
    ///
    /// Adjacent expanded segments are never merged, even when their padded
    /// ranges overlap; each maps to exactly one exported clip.
    pub fn expand(
        &self,
        pre_buffer_sec: f64,
        post_buffer_sec: f64,
        video_duration_sec: f64,
    ) -> ExpandedSegment {
        ExpandedSegment {
            original: *self,
            start_sec: (self.start_sec - pre_buffer_sec).max(0.0),
            end_sec: (self.end_sec + post_buffer_sec).min(video_duration_sec),
        }
    }
}

/// A segment padded for clip extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpandedSegment {
    /// The un-padded segment this expansion was derived from.
    pub original: Segment,
    /// Padded start, clamped to 0.
    pub start_sec: f64,
    /// Padded end, clamped to the video duration.
    pub end_sec: f64,
}

impl ExpandedSegment {
    /// Duration of the padded interval in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.end_sec - self.start_sec).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_duration() {
        let seg = Segment::new(1.0, 3.5);
        assert!((seg.duration_secs() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_expand_applies_buffers() {
        let seg = Segment::new(10.0, 12.0);
        let expanded = seg.expand(2.0, 3.0, 100.0);
        assert!((expanded.start_sec - 8.0).abs() < 1e-9);
        assert!((expanded.end_sec - 15.0).abs() < 1e-9);
        assert!((expanded.duration_secs() - 7.0).abs() < 1e-9);
        assert_eq!(expanded.original, seg);
    }

    #[test]
    fn test_expand_clamps_start_to_zero() {
        let seg = Segment::new(0.5, 4.0);
        let expanded = seg.expand(2.0, 3.0, 100.0);
        assert_eq!(expanded.start_sec, 0.0);
    }

    #[test]
    fn test_expand_clamps_end_to_video_duration() {
        let seg = Segment::new(95.0, 99.0);
        let expanded = seg.expand(2.0, 3.0, 100.0);
        assert!((expanded.end_sec - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_expansions_are_independent() {
        let a = Segment::new(5.0, 6.0);
        let b = Segment::new(7.0, 8.0);
        let ea = a.expand(2.0, 3.0, 100.0);
        let eb = b.expand(2.0, 3.0, 100.0);
        // Padded ranges overlap (9.0 > 5.0) yet both expansions survive.
        assert!(ea.end_sec > eb.start_sec);
        assert_eq!(ea.original, a);
        assert_eq!(eb.original, b);
    }
}
