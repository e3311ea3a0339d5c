use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;

use crate::domain::{
    detection::RawDetection,
    errors::DomainResult,
    model::{InferenceParams, ModelDescriptor},
    protocol::FramePayload,
};

/// Detector ya cargado. La inferencia es CPU/GPU-bound y síncrona; desde
/// código async se invoca dentro de `spawn_blocking`.
pub trait DetectorPort: Send + Sync {
    fn predict(&self, image: &RgbImage, params: &InferenceParams) -> DomainResult<Vec<RawDetection>>;
}

/// Construye el detector de un modelo. Falla con `DomainError::ModelLoad`
/// si el identificador no existe o falta el fichero del modelo.
#[async_trait]
pub trait DetectorFactoryPort: Send + Sync {
    async fn load(&self, model_id: &str) -> DomainResult<Arc<dyn DetectorPort>>;
}

pub trait ImageDecoderPort: Send + Sync {
    fn decode(&self, payload: &FramePayload) -> DomainResult<RgbImage>;
}

pub trait ModelCatalogPort: Send + Sync {
    fn list_models(&self) -> Vec<ModelDescriptor>;
}
