//! Detection geometry.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel coordinates of the source frame.
///
/// Corner form: `(x1, y1)` is the top-left corner, `(x2, y2)` the
/// bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Area in square pixels.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Clamp the box to frame bounds.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> Self {
        let w = frame_width as f32;
        let h = frame_height as f32;
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }

    /// Intersection over Union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// A single detected object in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Index into the detector's class-name table.
    pub class_id: usize,
    /// Box in pixel coordinates of the original frame.
    pub bbox: BoundingBox,
    /// Detection confidence [0, 1].
    pub confidence: f32,
}

/// One frame's worth of derived detection state.
///
/// Ephemeral: consumed by the segmenter and the overlay renderer, then
/// dropped; only aggregate statistics outlive the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Zero-based frame index in decode order.
    pub frame_index: u64,
    /// Frame timestamp in seconds (`frame_index / fps`).
    pub timestamp_sec: f64,
    /// Detections already filtered to the configured target classes.
    pub detections: Vec<Detection>,
}

impl FrameSample {
    /// Whether any target class is present in this frame.
    pub fn has_target(&self) -> bool {
        !self.detections.is_empty()
    }

    /// Summed bounding-box area of this frame's detections, in pixels.
    pub fn detection_area(&self) -> f64 {
        self.detections.iter().map(|d| d.bbox.area() as f64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_dimensions() {
        let bbox = BoundingBox::new(10.0, 20.0, 110.0, 70.0);
        assert!((bbox.width() - 100.0).abs() < f32::EPSILON);
        assert!((bbox.height() - 50.0).abs() < f32::EPSILON);
        assert!((bbox.area() - 5000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_degenerate_bbox_has_zero_area() {
        let bbox = BoundingBox::new(50.0, 50.0, 40.0, 60.0);
        assert_eq!(bbox.width(), 0.0);
        assert_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn test_clamped_to_frame() {
        let bbox = BoundingBox::new(-5.0, -10.0, 700.0, 500.0).clamped(640, 480);
        assert_eq!(bbox.x1, 0.0);
        assert_eq!(bbox.y1, 0.0);
        assert_eq!(bbox.x2, 640.0);
        assert_eq!(bbox.y2, 480.0);
    }

    #[test]
    fn test_iou_identical_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_iou_disjoint_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn test_frame_sample_presence() {
        let empty = FrameSample {
            frame_index: 0,
            timestamp_sec: 0.0,
            detections: vec![],
        };
        assert!(!empty.has_target());
        assert_eq!(empty.detection_area(), 0.0);

        let sample = FrameSample {
            frame_index: 3,
            timestamp_sec: 0.1,
            detections: vec![
                Detection {
                    class_id: 1,
                    bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                    confidence: 0.8,
                },
                Detection {
                    class_id: 1,
                    bbox: BoundingBox::new(20.0, 0.0, 30.0, 20.0),
                    confidence: 0.6,
                },
            ],
        };
        assert!(sample.has_target());
        assert!((sample.detection_area() - 300.0).abs() < 1e-9);
    }
}
