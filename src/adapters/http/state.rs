use std::sync::Arc;
use crate::application::services::DetectionService;

/// Estado compartido para los manejadores HTTP de Axum.
/// Cada conexión WebSocket crea su propia `Session` a partir de este servicio.
#[derive(Clone)]
pub struct HttpState {
    pub detection: Arc<DetectionService>,
}
