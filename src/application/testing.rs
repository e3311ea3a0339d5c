//! Dobles de prueba para los puertos de detección y decodificación.

use async_trait::async_trait;
use image::RgbImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::ports::{DetectorFactoryPort, DetectorPort, ImageDecoderPort, ModelCatalogPort};
use crate::domain::{
    detection::RawDetection,
    errors::{DomainError, DomainResult},
    model::{InferenceParams, ModelDescriptor, MODEL_CATALOG},
    protocol::FramePayload,
};

/// Devuelve una única caja que ocupa toda la imagen, etiquetada con
/// `<modelo>:<ancho>x<alto>` para poder identificar modelo y frame.
pub struct FakeDetector {
    model_id: String,
    predict_delay: Option<Duration>,
}

impl DetectorPort for FakeDetector {
    fn predict(&self, image: &RgbImage, params: &InferenceParams) -> DomainResult<Vec<RawDetection>> {
        if let Some(d) = self.predict_delay {
            std::thread::sleep(d);
        }
        let (w, h) = image.dimensions();
        let det = RawDetection {
            x1: 0.0,
            y1: 0.0,
            x2: w as f32,
            y2: h as f32,
            score: 0.9,
            class_id: 0,
            label: format!("{}:{}x{}", self.model_id, w, h),
        };
        Ok(std::iter::repeat(det)
            .take(params.max_detections.min(1))
            .filter(|d| d.score >= params.conf_threshold)
            .collect())
    }
}

pub struct CountingFactory {
    known: Vec<String>,
    loads: Mutex<HashMap<String, usize>>,
    load_delay: Option<Duration>,
    predict_delay: Option<Duration>,
}

impl CountingFactory {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|s| s.to_string()).collect(),
            loads: Mutex::new(HashMap::new()),
            load_delay: None,
            predict_delay: None,
        }
    }

    pub fn with_load_delay(mut self, d: Duration) -> Self {
        self.load_delay = Some(d);
        self
    }

    pub fn with_predict_delay(mut self, d: Duration) -> Self {
        self.predict_delay = Some(d);
        self
    }

    pub fn loads(&self, model_id: &str) -> usize {
        self.loads.lock().unwrap().get(model_id).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl DetectorFactoryPort for CountingFactory {
    async fn load(&self, model_id: &str) -> DomainResult<Arc<dyn DetectorPort>> {
        *self.loads.lock().unwrap().entry(model_id.to_string()).or_insert(0) += 1;
        if let Some(d) = self.load_delay {
            tokio::time::sleep(d).await;
        }
        if !self.known.iter().any(|k| k == model_id) {
            return Err(DomainError::model_load(model_id, "modelo desconocido"));
        }
        Ok(Arc::new(FakeDetector {
            model_id: model_id.to_string(),
            predict_delay: self.predict_delay,
        }))
    }
}

/// Interpreta el texto `"<ancho>x<alto>"` como una imagen en negro de ese
/// tamaño. Cualquier otra cosa es un error de decodificación.
pub struct FakeDecoder;

impl ImageDecoderPort for FakeDecoder {
    fn decode(&self, payload: &FramePayload) -> DomainResult<RgbImage> {
        let text = match payload {
            FramePayload::Encoded(text) => text.clone(),
            FramePayload::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        let (w, h) = text
            .split_once('x')
            .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
            .ok_or_else(|| DomainError::ImageDecode(format!("frame inválido: {}", text)))?;
        Ok(RgbImage::new(w, h))
    }
}

pub struct StaticCatalog;

impl ModelCatalogPort for StaticCatalog {
    fn list_models(&self) -> Vec<ModelDescriptor> {
        MODEL_CATALOG.to_vec()
    }
}
