use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No se pudo cargar el modelo '{model}': {reason}")]
    ModelLoad { model: String, reason: String },
    #[error("Frame no decodificable: {0}")]
    ImageDecode(String),
    #[error("Fallo de inferencia: {0}")]
    Inference(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
}

impl DomainError {
    pub fn model_load(model: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModelLoad { model: model.into(), reason: reason.to_string() }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
