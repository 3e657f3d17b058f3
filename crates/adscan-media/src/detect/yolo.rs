//! YOLOv8-family ONNX detector.
//!
//! Inference runs through ONNX Runtime with automatic execution provider
//! selection: CUDA on Linux (behind the `cuda` feature), CoreML on macOS,
//! CPU everywhere else.
//!
//! The class table travels with the configuration rather than being baked
//! in: fine-tuned models ship their own label sets (billboards, product
//! placements, ...), and the COCO-80 table is only the default.

use std::path::Path;
use std::sync::Mutex;

use adscan_models::{BoundingBox, Detection};
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::ArrayView2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::frames::RgbFrame;

use super::FrameDetector;

/// COCO class names (80 classes), the default label table.
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
    "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
    "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
    "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier",
    "toothbrush",
];

/// Configuration for the YOLO detector.
#[derive(Debug, Clone)]
pub struct YoloDetectorConfig {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Ordered class-name table matching the model's training labels
    pub class_names: Vec<String>,
    /// Confidence threshold for detections
    pub confidence_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f32,
    /// Square input edge the model was exported with
    pub input_size: u32,
}

impl Default for YoloDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/yolov8n.onnx".to_string(),
            class_names: COCO_CLASSES.iter().map(|s| s.to_string()).collect(),
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            input_size: 640,
        }
    }
}

/// Object detector backed by a YOLOv8 ONNX model.
pub struct YoloDetector {
    session: Mutex<Session>,
    config: YoloDetectorConfig,
}

impl YoloDetector {
    /// Load the model and build a detector.
    ///
    /// Fails when the model file is missing, unloadable, or the class table
    /// is empty; all of these abort a run before the frame loop starts.
    pub fn new(config: YoloDetectorConfig) -> MediaResult<Self> {
        let model_path = Path::new(&config.model_path);
        if !model_path.exists() {
            return Err(MediaError::model_not_found(&config.model_path));
        }
        if config.class_names.is_empty() {
            return Err(MediaError::detection_failed("empty class-name table"));
        }

        let session = Mutex::new(load_session(model_path)?);
        info!(
            model_path = %config.model_path,
            classes = config.class_names.len(),
            input_size = config.input_size,
            "Object detector initialized"
        );

        Ok(Self { session, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &YoloDetectorConfig {
        &self.config
    }

    /// Scale the frame to the model's square input and pack it as a
    /// normalized NCHW tensor.
    fn preprocess(&self, frame: &RgbFrame) -> MediaResult<Value> {
        let src = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| MediaError::internal("frame buffer does not match its dimensions"))?;

        let edge = self.config.input_size;
        let resized = image::imageops::resize(&src, edge, edge, FilterType::Triangle);

        // One pass over the resized pixels, writing each channel into its
        // own plane of the NCHW buffer.
        let plane = (edge * edge) as usize;
        let mut tensor_data = vec![0.0f32; 3 * plane];
        for (x, y, px) in resized.enumerate_pixels() {
            let offset = (y * edge + x) as usize;
            tensor_data[offset] = px[0] as f32 / 255.0;
            tensor_data[plane + offset] = px[1] as f32 / 255.0;
            tensor_data[2 * plane + offset] = px[2] as f32 / 255.0;
        }

        let shape = vec![1usize, 3, edge as usize, edge as usize];
        Tensor::from_array((shape, tensor_data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| MediaError::internal(format!("tensor creation failed: {}", e)))
    }

    /// Run the session and return the flattened `output0` tensor.
    fn infer(&self, input: Value) -> MediaResult<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::internal("detector session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| MediaError::detection_failed(format!("inference failed: {}", e)))?;

        let value = outputs
            .get("output0")
            .ok_or_else(|| MediaError::detection_failed("model produced no output0 tensor"))?;

        let (_, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::detection_failed(format!("output extraction failed: {}", e)))?;

        Ok(data.to_vec())
    }

    /// Decode the raw `[1, 4 + C, N]` output into frame-space detections.
    ///
    /// Each of the N candidate columns carries a center-format box followed
    /// by C class scores, with C taken from the configured class table.
    fn decode(&self, raw: &[f32], frame_width: u32, frame_height: u32) -> MediaResult<Vec<Detection>> {
        let num_classes = self.config.class_names.len();
        let features = 4 + num_classes;

        if raw.is_empty() || raw.len() % features != 0 {
            return Err(MediaError::detection_failed(format!(
                "output of {} values does not factor into {} features",
                raw.len(),
                features
            )));
        }
        let candidates = raw.len() / features;

        let grid = ArrayView2::from_shape((features, candidates), raw)
            .map_err(|e| MediaError::detection_failed(format!("output reshape failed: {}", e)))?;

        // Model space -> source pixel space
        let sx = frame_width as f32 / self.config.input_size as f32;
        let sy = frame_height as f32 / self.config.input_size as f32;

        let mut detections = Vec::new();
        for col in grid.columns() {
            let (class_id, score) = (0..num_classes)
                .map(|c| (c, col[4 + c]))
                .fold((0, 0.0f32), |best, cur| if cur.1 > best.1 { cur } else { best });

            if score < self.config.confidence_threshold {
                continue;
            }

            let (cx, cy, w, h) = (col[0], col[1], col[2], col[3]);
            let bbox = BoundingBox::new(
                (cx - w / 2.0) * sx,
                (cy - h / 2.0) * sy,
                (cx + w / 2.0) * sx,
                (cy + h / 2.0) * sy,
            )
            .clamped(frame_width, frame_height);

            detections.push(Detection {
                class_id,
                bbox,
                confidence: score,
            });
        }

        Ok(suppress_overlaps(detections, self.config.nms_threshold))
    }
}

impl FrameDetector for YoloDetector {
    fn detect(&self, frame: &RgbFrame) -> MediaResult<Vec<Detection>> {
        let input = self.preprocess(frame)?;
        let raw = self.infer(input)?;
        let detections = self.decode(&raw, frame.width, frame.height)?;

        debug!(count = detections.len(), "Object detection completed");
        Ok(detections)
    }

    fn class_names(&self) -> &[String] {
        &self.config.class_names
    }
}

/// Greedy NMS: walk candidates in confidence order, keeping each one that
/// does not overlap an already-kept box of the same class beyond the
/// threshold. Cross-class overlaps are left alone.
fn suppress_overlaps(mut candidates: Vec<Detection>, nms_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len());
    for cand in candidates {
        let survives = kept
            .iter()
            .all(|k| k.class_id != cand.class_id || k.bbox.iou(&cand.bbox) <= nms_threshold);
        if survives {
            kept.push(cand);
        }
    }
    kept
}

/// Build an ONNX Runtime session, preferring a hardware provider when one
/// is compiled in and reachable.
fn load_session(model_path: &Path) -> MediaResult<Session> {
    let model_bytes = std::fs::read(model_path)
        .map_err(|e| MediaError::internal(format!("could not read model file: {}", e)))?;

    let builder = Session::builder()
        .map_err(|e| MediaError::internal(format!("session builder failed: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| MediaError::internal(format!("optimization level rejected: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!("Using CUDA execution provider for object detection");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, trying alternatives");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!("Using CoreML execution provider for object detection");
                return Ok(session);
            }
        }
        debug!("CoreML execution provider not available, using CPU");
    }

    info!("Using CPU execution provider for object detection");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| MediaError::internal(format!("model load failed: {}", e)))
}
