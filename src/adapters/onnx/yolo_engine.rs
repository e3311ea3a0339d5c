use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::application::ports::DetectorPort;
use crate::domain::detection::RawDetection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::InferenceParams;

pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana",
    "apple", "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza",
    "donut", "cake", "chair", "couch", "potted plant", "bed", "dining table", "toilet", "tv",
    "laptop", "mouse", "remote", "keyboard", "cell phone", "microwave", "oven", "toaster",
    "sink", "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Opciones de construcción de la sesión ONNX.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub input_size: u32,
    pub intra_threads: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { input_size: 640, intra_threads: 4 }
    }
}

/// Detector YOLOv8 exportado a ONNX. La sesión de `ort` necesita `&mut`
/// para ejecutar, así que las sesiones que comparten modelo se turnan.
pub struct OnnxYoloEngine {
    session: Mutex<Session>,
    input_size: u32,
}

impl OnnxYoloEngine {
    pub fn load(path: &Path, opts: EngineOptions) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(opts.intra_threads)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session: Mutex::new(session), input_size: opts.input_size })
    }

    pub fn infer(&self, rgb: &RgbImage, params: &InferenceParams) -> Result<Vec<RawDetection>> {
        let imgsz = self.input_size as usize;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Nearest);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Tensor::from_array((input_shape, input.into_raw_vec()))?;

        let mut session = self.session.lock().map_err(|_| anyhow!("sesión ONNX envenenada"))?;
        let outputs = session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        // [4 + clases, candidatos]
        let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;
        if view.shape()[0] <= 4 {
            return Err(anyhow!("salida YOLO inesperada: {:?}", dims));
        }
        let num_candidates = view.shape()[1];
        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;

        let mut candidates = Vec::new();

        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let Some((class_id, &max_score)) = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };

            if max_score >= params.conf_threshold {
                let cx = view[[0, i]];
                let cy = view[[1, i]];
                let w = view[[2, i]];
                let h = view[[3, i]];

                candidates.push(RawDetection {
                    x1: (cx - w / 2.0) * sx,
                    y1: (cy - h / 2.0) * sy,
                    x2: (cx + w / 2.0) * sx,
                    y2: (cy + h / 2.0) * sy,
                    score: max_score,
                    class_id,
                    label: COCO_CLASSES.get(class_id).unwrap_or(&"object").to_string(),
                });
            }
        }

        Ok(non_max_suppression(candidates, params.iou_threshold, params.max_detections))
    }
}

impl DetectorPort for OnnxYoloEngine {
    fn predict(&self, image: &RgbImage, params: &InferenceParams) -> DomainResult<Vec<RawDetection>> {
        self.infer(image, params).map_err(|e| DomainError::Inference(e.to_string()))
    }
}

fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = ix * iy;
    let union = (a.x2 - a.x1) * (a.y2 - a.y1) + (b.x2 - b.x1) * (b.y2 - b.y1) - inter;
    if union > 0.0 { inter / union } else { 0.0 }
}

/// NMS voraz por clase: ordena por confianza y descarta solapes > `iou_threshold`.
pub fn non_max_suppression(mut dets: Vec<RawDetection>, iou_threshold: f32, max_detections: usize) -> Vec<RawDetection> {
    dets.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets {
        if keep.len() >= max_detections {
            break;
        }
        let overlaps = keep
            .iter()
            .any(|k| k.class_id == det.class_id && iou(k, &det) > iou_threshold);
        if !overlaps {
            keep.push(det);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, class_id: usize) -> RawDetection {
        RawDetection { x1, y1, x2, y2, score, class_id, label: COCO_CLASSES[class_id].into() }
    }

    #[test]
    fn suppresses_overlapping_boxes_of_same_class() {
        let dets = vec![
            det(0.0, 0.0, 10.0, 10.0, 0.6, 0),
            det(1.0, 1.0, 11.0, 11.0, 0.9, 0),
            det(50.0, 50.0, 60.0, 60.0, 0.7, 0),
        ];
        let kept = non_max_suppression(dets, 0.45, 100);
        let scores: Vec<f32> = kept.iter().map(|d| d.score).collect();
        assert_eq!(scores, vec![0.9, 0.7]);
    }

    #[test]
    fn different_classes_are_not_suppressed() {
        let dets = vec![det(0.0, 0.0, 10.0, 10.0, 0.8, 0), det(0.0, 0.0, 10.0, 10.0, 0.7, 16)];
        let kept = non_max_suppression(dets, 0.45, 100);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].label, "dog");
    }

    #[test]
    fn respects_max_detections() {
        let dets = (0..5).map(|i| det(i as f32 * 20.0, 0.0, i as f32 * 20.0 + 10.0, 10.0, 0.5, 0)).collect();
        assert_eq!(non_max_suppression(dets, 0.45, 3).len(), 3);
        assert!(non_max_suppression(vec![det(0.0, 0.0, 1.0, 1.0, 0.9, 0)], 0.45, 0).is_empty());
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = det(0.0, 0.0, 4.0, 4.0, 0.5, 0);
        assert_eq!(iou(&a, &a), 1.0);
        assert_eq!(iou(&a, &det(10.0, 10.0, 12.0, 12.0, 0.5, 0)), 0.0);
    }
}
