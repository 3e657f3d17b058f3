//! End-of-run occurrence summary.
//!
//! The rendered text is parsed by the downstream report generator, so the
//! field labels, units and decimal places in [`RunSummary::render`] are a
//! compatibility contract and must not change.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::segment::{ExpandedSegment, Segment};

/// Per-segment entry of the summary.
///
/// Every detected segment gets a report entry; `clip_path` is `None` when
/// the clip export for that segment failed or was never attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    /// 1-based position in detection order.
    pub index: usize,
    /// The expansion used for clip extraction (carries the original too).
    pub expanded: ExpandedSegment,
    /// Path of the exported clip, if the export succeeded.
    pub clip_path: Option<PathBuf>,
}

impl SegmentReport {
    /// The raw, un-padded segment.
    pub fn original(&self) -> Segment {
        self.expanded.original
    }
}

/// Aggregate occurrence statistics for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Target class names as configured by the operator.
    pub target_classes: Vec<String>,
    /// Total video duration in seconds.
    pub video_duration_sec: f64,
    /// One entry per detected segment, in detection order.
    pub segments: Vec<SegmentReport>,
}

impl RunSummary {
    /// Sum of raw (un-expanded) segment durations in seconds.
    pub fn total_target_secs(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.original().duration_secs())
            .sum()
    }

    /// Fraction of the video during which the target was present, as a
    /// percentage. Reports 0 for a zero-length video rather than failing.
    pub fn duration_ratio_percent(&self) -> f64 {
        if self.video_duration_sec > 0.0 {
            self.total_target_secs() / self.video_duration_sec * 100.0
        } else {
            0.0
        }
    }

    /// Number of segments whose clip export succeeded.
    pub fn exported_count(&self) -> usize {
        self.segments.iter().filter(|s| s.clip_path.is_some()).count()
    }

    /// Render the summary text artifact.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("目标类别: {}\n", self.target_classes.join(", ")));
        out.push_str(&format!("总出现时长: {:.2}秒\n", self.total_target_secs()));
        out.push_str(&format!("检测到的片段数: {}\n\n", self.segments.len()));
        out.push_str("各片段详情:\n");

        for report in &self.segments {
            let original = report.original();
            out.push_str(&format!("\n片段 {}:\n", report.index));
            if let Some(path) = &report.clip_path {
                out.push_str(&format!("  文件路径: {}\n", path.display()));
            }
            out.push_str(&format!(
                "  原始时间: {:.1}s - {:.1}s (时长: {:.1}s)\n",
                original.start_sec,
                original.end_sec,
                original.duration_secs()
            ));
            out.push_str(&format!(
                "  扩展时间: {:.1}s - {:.1}s (时长: {:.1}s)\n",
                report.expanded.start_sec,
                report.expanded.end_sec,
                report.expanded.duration_secs()
            ));
        }

        out.push_str(&format!(
            "\n目标出现时长占比: {:.2}%\n",
            self.duration_ratio_percent()
        ));

        out
    }
}
