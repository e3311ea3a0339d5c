use std::sync::Arc;

use crate::{
    application::{
        model_cache::ModelCache,
        ports::{ImageDecoderPort, ModelCatalogPort},
    },
    domain::{
        detection::{normalize_all, Detection},
        errors::{DomainError, DomainResult},
        model::{ModelDescriptor, SessionSettings},
        protocol::FramePayload,
    },
};

/// Caso de uso de detección: decodifica un frame, lo pasa por el modelo
/// elegido y devuelve las cajas normalizadas.
/// Lo comparten todas las sesiones; el estado mutable vive en cada `Session`.
#[derive(Clone)]
pub struct DetectionService {
    models: Arc<ModelCache>,
    decoder: Arc<dyn ImageDecoderPort>,
    catalog: Arc<dyn ModelCatalogPort>,
    default_model: String,
}

impl DetectionService {
    pub fn new(
        models: Arc<ModelCache>,
        decoder: Arc<dyn ImageDecoderPort>,
        catalog: Arc<dyn ModelCatalogPort>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            models,
            decoder,
            catalog,
            default_model: default_model.into(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn list_models(&self) -> Vec<ModelDescriptor> {
        self.catalog.list_models()
    }

    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    /// Garantiza que el modelo esté cargado. Se usa antes de confirmar un
    /// cambio de modelo y para precargar el modelo por defecto.
    pub async fn ensure_model(&self, model_id: &str) -> DomainResult<()> {
        self.models.get_or_load(model_id).await.map(|_| ())
    }

    pub async fn detect(&self, settings: &SessionSettings, payload: FramePayload) -> DomainResult<Vec<Detection>> {
        let detector = self.models.get_or_load(&settings.model_id).await?;
        let decoder = self.decoder.clone();
        let params = settings.params();

        // Decodificar e inferir bloquea: fuera del runtime async para no
        // frenar la E/S de las demás sesiones.
        tokio::task::spawn_blocking(move || {
            let rgb = decoder.decode(&payload)?;
            let (w, h) = rgb.dimensions();
            let raw = detector.predict(&rgb, &params)?;
            Ok::<_, DomainError>(normalize_all(&raw, w, h))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("Tarea de inferencia abortada: {}", e)))?
    }
}
