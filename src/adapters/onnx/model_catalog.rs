use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::onnx::yolo_engine::{EngineOptions, OnnxYoloEngine};
use crate::application::ports::{DetectorFactoryPort, DetectorPort, ModelCatalogPort};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{find_model, ModelDescriptor, MODEL_CATALOG};

/// Catálogo fijo de modelos respaldado por ficheros `<dir>/<id>.onnx`.
pub struct OnnxModelCatalog {
    models_dir: PathBuf,
    options: EngineOptions,
}

impl OnnxModelCatalog {
    pub fn new(models_dir: impl Into<PathBuf>, options: EngineOptions) -> Self {
        Self { models_dir: models_dir.into(), options }
    }

    pub fn model_path(&self, model_id: &str) -> PathBuf {
        self.models_dir.join(format!("{}.onnx", model_id))
    }

    async fn validate_model(&self, model_id: &str) -> DomainResult<PathBuf> {
        if find_model(model_id).is_none() {
            return Err(DomainError::model_load(model_id, "no está en el catálogo"));
        }
        let path = self.model_path(model_id);
        if !file_exists(&path).await {
            return Err(DomainError::model_load(
                model_id,
                format!("model file not found: {}", path.display()),
            ));
        }
        Ok(path)
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

impl ModelCatalogPort for OnnxModelCatalog {
    fn list_models(&self) -> Vec<ModelDescriptor> {
        MODEL_CATALOG.to_vec()
    }
}

#[async_trait]
impl DetectorFactoryPort for OnnxModelCatalog {
    async fn load(&self, model_id: &str) -> DomainResult<Arc<dyn DetectorPort>> {
        let path = self.validate_model(model_id).await?;
        let options = self.options;

        // Construir la sesión ONNX lee el modelo entero y reserva memoria:
        // trabajo bloqueante.
        let engine = tokio::task::spawn_blocking(move || OnnxYoloEngine::load(&path, options))
            .await
            .map_err(|e| DomainError::model_load(model_id, e))?
            .map_err(|e| DomainError::model_load(model_id, format!("{:#}", e)))?;

        Ok(Arc::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> OnnxModelCatalog {
        OnnxModelCatalog::new("/nonexistent/models", EngineOptions::default())
    }

    #[test]
    fn resolves_model_file_inside_models_dir() {
        assert_eq!(catalog().model_path("yolov8s"), PathBuf::from("/nonexistent/models/yolov8s.onnx"));
    }

    #[test]
    fn lists_the_fixed_catalog() {
        let ids: Vec<&str> = catalog().list_models().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["yolov8n", "yolov8s", "yolov8m", "yolov8l", "yolov8x"]);
    }

    #[tokio::test]
    async fn unknown_identifier_fails_to_load() {
        let err = catalog().load("resnet50").await.err().unwrap();
        assert!(matches!(err, DomainError::ModelLoad { ref model, .. } if model == "resnet50"));
    }

    #[tokio::test]
    async fn missing_asset_fails_to_load() {
        let err = catalog().load("yolov8n").await.err().unwrap();
        assert!(err.to_string().contains("model file not found"));
    }
}
