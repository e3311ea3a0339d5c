use serde::{Deserialize, Serialize};

use crate::domain::model::ModelDescriptor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok".into() }
    }
}

/// Opción de modelo tal y como la pinta el selector del cliente.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelOption {
    pub value: String,
    pub label: String,
}

impl From<ModelDescriptor> for ModelOption {
    fn from(m: ModelDescriptor) -> Self {
        Self { value: m.id.to_string(), label: m.label.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelOption>,
}
