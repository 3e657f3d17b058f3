//! Object detection seam.
//!
//! The model is a black-box dependency behind [`FrameDetector`], so the
//! pipeline and its tests never touch inference internals; a stub impl is
//! enough to drive the frame loop.

pub mod yolo;

pub use yolo::{YoloDetector, YoloDetectorConfig, COCO_CLASSES};

use std::collections::HashSet;

use adscan_models::Detection;
use tracing::info;

use crate::error::{MediaError, MediaResult};
use crate::frames::RgbFrame;

/// A frame-level object detector.
///
/// Implementations apply their own confidence threshold; class filtering is
/// the adapter's job.
pub trait FrameDetector: Send + Sync {
    /// Run inference on one frame.
    fn detect(&self, frame: &RgbFrame) -> MediaResult<Vec<Detection>>;

    /// Ordered class-name table of the underlying model. Detection
    /// `class_id`s index into this table.
    fn class_names(&self) -> &[String];
}

/// Resolve requested class names to ids against a model's class table,
/// case-insensitively.
///
/// Returns an error when none of the requested names are known; that is a
/// configuration error and must abort the run before the frame loop.
pub fn resolve_target_ids(class_names: &[String], targets: &[String]) -> MediaResult<Vec<usize>> {
    let wanted: Vec<String> = targets.iter().map(|t| t.to_lowercase()).collect();

    let ids: Vec<usize> = class_names
        .iter()
        .enumerate()
        .filter(|(_, name)| wanted.contains(&name.to_lowercase()))
        .map(|(id, _)| id)
        .collect();

    if ids.is_empty() {
        return Err(MediaError::UnknownTargetClasses(targets.to_vec()));
    }
    Ok(ids)
}

/// Detector adapter restricting detections to the configured target classes.
pub struct TargetDetector {
    detector: Box<dyn FrameDetector>,
    target_ids: HashSet<usize>,
}

impl TargetDetector {
    /// Wrap a detector, resolving `target_classes` against its class table.
    ///
    /// Fails fast when no target class is known to the model.
    pub fn new(detector: Box<dyn FrameDetector>, target_classes: &[String]) -> MediaResult<Self> {
        let ids = resolve_target_ids(detector.class_names(), target_classes)?;
        info!(classes = ?target_classes, ids = ?ids, "Resolved target classes");

        Ok(Self {
            detector,
            target_ids: ids.into_iter().collect(),
        })
    }

    /// Detections for this frame, filtered to the target classes.
    pub fn detect(&self, frame: &RgbFrame) -> MediaResult<Vec<Detection>> {
        let detections = self.detector.detect(frame)?;
        Ok(detections
            .into_iter()
            .filter(|d| self.target_ids.contains(&d.class_id))
            .collect())
    }

    /// Class name for a detection's id, for overlay labels.
    pub fn class_name(&self, class_id: usize) -> Option<&str> {
        self.detector.class_names().get(class_id).map(String::as_str)
    }

    /// The underlying model's class table.
    pub fn class_names(&self) -> &[String] {
        self.detector.class_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adscan_models::BoundingBox;

    struct StubDetector {
        names: Vec<String>,
        detections: Vec<Detection>,
    }

    impl FrameDetector for StubDetector {
        fn detect(&self, _frame: &RgbFrame) -> MediaResult<Vec<Detection>> {
            Ok(self.detections.clone())
        }

        fn class_names(&self) -> &[String] {
            &self.names
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn detection(class_id: usize) -> Detection {
        Detection {
            class_id,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            confidence: 0.9,
        }
    }

    fn blank_frame() -> RgbFrame {
        RgbFrame {
            width: 4,
            height: 4,
            data: vec![0; 4 * 4 * 3],
        }
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let table = names(&["person", "Billboard", "drinks"]);
        let ids = resolve_target_ids(&table, &names(&["billboard", "DRINKS"])).unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_resolve_unknown_classes_fails() {
        let table = names(&["person", "car"]);
        let err = resolve_target_ids(&table, &names(&["billboard"])).unwrap_err();
        assert!(matches!(err, MediaError::UnknownTargetClasses(_)));
    }

    #[test]
    fn test_resolve_partial_match_succeeds() {
        let table = names(&["person", "billboard"]);
        let ids = resolve_target_ids(&table, &names(&["billboard", "spaceship"])).unwrap();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_adapter_filters_to_target_classes() {
        let stub = StubDetector {
            names: names(&["person", "billboard", "drinks"]),
            detections: vec![detection(0), detection(1), detection(2), detection(1)],
        };
        let adapter = TargetDetector::new(Box::new(stub), &names(&["billboard"])).unwrap();

        let detections = adapter.detect(&blank_frame()).unwrap();
        assert_eq!(detections.len(), 2);
        assert!(detections.iter().all(|d| d.class_id == 1));
    }

    #[test]
    fn test_adapter_rejects_unresolvable_config() {
        let stub = StubDetector {
            names: names(&["person"]),
            detections: vec![],
        };
        assert!(TargetDetector::new(Box::new(stub), &names(&["billboard"])).is_err());
    }

    #[test]
    fn test_class_name_lookup() {
        let stub = StubDetector {
            names: names(&["person", "billboard"]),
            detections: vec![],
        };
        let adapter = TargetDetector::new(Box::new(stub), &names(&["person"])).unwrap();
        assert_eq!(adapter.class_name(1), Some("billboard"));
        assert_eq!(adapter.class_name(9), None);
    }
}
