//! State machine for converting per-frame presence signals into segments.
//!
//! The segmenter consumes a stream of (target present, timestamp) samples
//! and produces the ordered list of intervals during which the target was
//! continuously on screen.
//!
//! # State Machine
//!
//! ```text
//!                      present = true
//!     ┌──────────────────────────────────────────┐
//!     │                                          │
//!     ▼                                          │
//! ┌────────┐                                ┌────────┐
//! │ Active │────────────────────────────────│  Idle  │
//! └────────┘       present = false          └────────┘
//!     │
//!     │  close: keep iff duration >= min_segment_secs
//!     └────────────────────────────────────────────►
//! ```
//!
//! The minimum-duration test is applied only at close time, with an
//! inclusive comparison; runs shorter than the minimum are dropped, never
//! merged into a neighbouring segment.

use adscan_models::Segment;

/// Internal state for the segmenter state machine.
enum State {
    /// No target on screen.
    Idle,
    /// Target on screen since the recorded timestamp.
    Active { started_at: f64 },
}

/// Accumulates presence samples into closed segments.
///
/// Pure with respect to its inputs: the same (present, timestamp) sequence
/// always yields the same segment list, independent of any I/O.
pub struct PresenceSegmenter {
    min_segment_secs: f64,
    state: State,
    segments: Vec<Segment>,
}

impl PresenceSegmenter {
    /// Create a new segmenter with the given minimum segment duration.
    pub fn new(min_segment_secs: f64) -> Self {
        Self {
            min_segment_secs,
            state: State::Idle,
            segments: Vec::new(),
        }
    }

    /// Process a single frame sample.
    ///
    /// # Arguments
    /// - `present`: whether any target class was detected in this frame
    /// - `at_secs`: the frame's timestamp in seconds
    pub fn step(&mut self, present: bool, at_secs: f64) {
        match (&self.state, present) {
            // Target appeared: open a segment
            (State::Idle, true) => {
                self.state = State::Active { started_at: at_secs };
            }

            // Target disappeared: close the segment, keeping it only when
            // it lasted long enough
            (State::Active { started_at }, false) => {
                self.push_if_long_enough(*started_at, at_secs);
                self.state = State::Idle;
            }

            // Same state, nothing to record
            _ => {}
        }
    }

    /// Consume the segmenter and return the closed segment list.
    ///
    /// Must be called once the stream is exhausted so a segment still open
    /// at end-of-stream is closed at the last frame's timestamp, under the
    /// same minimum-duration test as a mid-stream close.
    pub fn finalize(mut self, last_secs: f64) -> Vec<Segment> {
        if let State::Active { started_at } = self.state {
            self.push_if_long_enough(started_at, last_secs);
            self.state = State::Idle;
        }
        self.segments
    }

    fn push_if_long_enough(&mut self, started_at: f64, ended_at: f64) {
        let duration = ended_at - started_at;
        // Inclusive boundary; the duration > 0 guard upholds the
        // end > start segment invariant when the minimum is zero.
        if duration >= self.min_segment_secs && duration > 0.0 {
            self.segments.push(Segment::new(started_at, ended_at));
        }
    }

    /// Segments closed so far.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments closed so far.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total duration of segments closed so far, in seconds.
    pub fn closed_duration_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_secs()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a segmenter with a boolean signal sampled at `fps`, finalizing
    /// at the last frame's timestamp.
    fn run_signal(signal: &[bool], fps: f64, min_segment_secs: f64) -> Vec<Segment> {
        let mut segmenter = PresenceSegmenter::new(min_segment_secs);
        let mut last = 0.0;
        for (i, &present) in signal.iter().enumerate() {
            last = i as f64 / fps;
            segmenter.step(present, last);
        }
        segmenter.finalize(last)
    }

    #[test]
    fn test_single_run_mid_stream() {
        // [false]*10 + [true]*20 + [false]*10 at 10 fps
        let mut signal = vec![false; 10];
        signal.extend(vec![true; 20]);
        signal.extend(vec![false; 10]);

        let segments = run_signal(&signal, 10.0, 0.5);
        assert_eq!(segments.len(), 1);
        assert!((segments[0].start_sec - 1.0).abs() < 1e-9);
        assert!((segments[0].end_sec - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_frame_blip_dropped() {
        let mut signal = vec![false; 5];
        signal.push(true);
        signal.extend(vec![false; 5]);

        // 1 frame at 10 fps = 0.1s, below the 0.5s minimum
        let segments = run_signal(&signal, 10.0, 0.5);
        assert!(segments.is_empty());
    }

    #[test]
    fn test_minimum_duration_boundary_is_inclusive() {
        let mut segmenter = PresenceSegmenter::new(0.5);
        segmenter.step(true, 1.0);
        segmenter.step(false, 1.5);
        let segments = segmenter.finalize(1.5);
        assert_eq!(segments.len(), 1);

        // One frame-timestep less is dropped
        let mut segmenter = PresenceSegmenter::new(0.5);
        segmenter.step(true, 1.0);
        segmenter.step(false, 1.4);
        assert!(segmenter.finalize(1.4).is_empty());
    }

    #[test]
    fn test_gap_splits_segments_without_merging() {
        // Two qualifying runs separated by a single absent frame
        let mut signal = vec![true; 10];
        signal.push(false);
        signal.extend(vec![true; 10]);

        let segments = run_signal(&signal, 10.0, 0.5);
        assert_eq!(segments.len(), 2);
        assert!(segments[0].end_sec <= segments[1].start_sec);
    }

    #[test]
    fn test_open_segment_closed_at_end_of_stream() {
        let mut signal = vec![false; 5];
        signal.extend(vec![true; 10]);

        let segments = run_signal(&signal, 10.0, 0.5);
        assert_eq!(segments.len(), 1);
        assert!((segments[0].start_sec - 0.5).abs() < 1e-9);
        assert!((segments[0].end_sec - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_short_tail_at_end_of_stream_dropped() {
        let mut signal = vec![false; 10];
        signal.extend(vec![true; 2]);

        let segments = run_signal(&signal, 10.0, 0.5);
        assert!(segments.is_empty());
    }

    #[test]
    fn test_all_absent_yields_nothing() {
        assert!(run_signal(&[false; 50], 10.0, 0.5).is_empty());
    }

    #[test]
    fn test_deterministic_over_reruns() {
        let mut signal = vec![false; 7];
        signal.extend(vec![true; 13]);
        signal.extend(vec![false; 3]);
        signal.extend(vec![true; 9]);

        let first = run_signal(&signal, 10.0, 0.5);
        let second = run_signal(&signal, 10.0, 0.5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_segment_count_matches_qualifying_transitions() {
        // Three true runs: 1.0s, 0.1s (dropped), 0.8s
        let mut signal = vec![true; 10];
        signal.extend(vec![false; 5]);
        signal.push(true);
        signal.extend(vec![false; 5]);
        signal.extend(vec![true; 8]);

        let segments = run_signal(&signal, 10.0, 0.5);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_running_totals_count_closed_segments_only() {
        let mut segmenter = PresenceSegmenter::new(0.5);
        segmenter.step(true, 0.0);
        segmenter.step(false, 2.0);
        assert_eq!(segmenter.segment_count(), 1);
        assert!((segmenter.closed_duration_secs() - 2.0).abs() < 1e-9);

        // A currently-open segment does not contribute yet
        segmenter.step(true, 5.0);
        assert_eq!(segmenter.segment_count(), 1);
        assert!((segmenter.closed_duration_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_minimum_still_requires_positive_duration() {
        let mut segmenter = PresenceSegmenter::new(0.0);
        segmenter.step(true, 1.0);
        let segments = segmenter.finalize(1.0);
        assert!(segments.is_empty());
    }
}
