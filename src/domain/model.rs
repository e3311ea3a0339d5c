use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "yolov8n";

/// Entrada del catálogo fijo de modelos que el cliente puede elegir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub id: &'static str,
    pub label: &'static str,
}

pub const MODEL_CATALOG: &[ModelDescriptor] = &[
    ModelDescriptor { id: "yolov8n", label: "YOLOv8 Nano (fastest)" },
    ModelDescriptor { id: "yolov8s", label: "YOLOv8 Small" },
    ModelDescriptor { id: "yolov8m", label: "YOLOv8 Medium" },
    ModelDescriptor { id: "yolov8l", label: "YOLOv8 Large" },
    ModelDescriptor { id: "yolov8x", label: "YOLOv8 XLarge (most accurate)" },
];

pub fn find_model(id: &str) -> Option<&'static ModelDescriptor> {
    MODEL_CATALOG.iter().find(|m| m.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceParams {
    pub conf_threshold: f32,    // 0..1
    pub iou_threshold: f32,     // 0..1
    pub max_detections: usize,
}

/// Parámetros mutables de una sesión. Sólo los modifica un mensaje de
/// control de esa misma conexión.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub confidence: f64,
    pub iou: f64,
    pub max_detections: u64,
    pub model_id: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            iou: 0.45,
            max_detections: 100,
            model_id: DEFAULT_MODEL.to_string(),
        }
    }
}

impl SessionSettings {
    pub fn with_model(model_id: impl Into<String>) -> Self {
        Self { model_id: model_id.into(), ..Self::default() }
    }

    pub fn params(&self) -> InferenceParams {
        InferenceParams {
            conf_threshold: self.confidence as f32,
            iou_threshold: self.iou as f32,
            max_detections: usize::try_from(self.max_detections).unwrap_or(usize::MAX),
        }
    }
}
