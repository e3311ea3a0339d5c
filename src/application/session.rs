//! Máquina de estados de una conexión.
//!
//! `Accepted -> Active -> Closed`. Cada sesión procesa sus mensajes en
//! serie: no se lee el siguiente hasta haber respondido al frame actual.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::services::DetectionService;
use crate::domain::{
    errors::{DomainError, DomainResult},
    model::SessionSettings,
    protocol::{self, summarize_detections, DetectionReply, Field, FramePayload, InboundMessage, SettingsUpdate},
};

const FRAME_LOG_INTERVAL: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Accepted,
    Active,
    Closed,
}

pub struct Session {
    service: Arc<DetectionService>,
    settings: SessionSettings,
    frames: u64,
    state: SessionState,
}

impl Session {
    pub fn new(service: Arc<DetectionService>) -> Self {
        let settings = SessionSettings::with_model(service.default_model());
        Self {
            service,
            settings,
            frames: 0,
            state: SessionState::Accepted,
        }
    }

    #[cfg(test)]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn handle_text(&mut self, raw: &str) -> DomainResult<Option<DetectionReply>> {
        self.handle_message(protocol::parse(raw)).await
    }

    /// Procesa un mensaje. Los de control no producen respuesta; cada frame
    /// produce exactamente una.
    pub async fn handle_message(&mut self, message: InboundMessage) -> DomainResult<Option<DetectionReply>> {
        if self.state == SessionState::Closed {
            return Err(DomainError::OperationFailed("Sesión cerrada".into()));
        }

        let reply = match message {
            InboundMessage::Settings(update) => {
                self.apply_settings(update).await;
                None
            }
            InboundMessage::Frame(payload) => Some(self.process_frame(payload).await?),
        };

        self.state = SessionState::Active;
        Ok(reply)
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    async fn apply_settings(&mut self, update: SettingsUpdate) {
        match update.confidence() {
            Field::Valid(v) => self.settings.confidence = v,
            Field::Invalid(v) => warn!("Ajuste ignorado: confidence={}", v),
            Field::Absent => {}
        }
        match update.iou() {
            Field::Valid(v) => self.settings.iou = v,
            Field::Invalid(v) => warn!("Ajuste ignorado: iou={}", v),
            Field::Absent => {}
        }
        match update.max_detections() {
            Field::Valid(v) => self.settings.max_detections = v,
            Field::Invalid(v) => warn!("Ajuste ignorado: maxDetections={}", v),
            Field::Absent => {}
        }
        match update.model() {
            Field::Valid(id) if id != self.settings.model_id => {
                // El cambio sólo se confirma si el modelo carga.
                match self.service.ensure_model(&id).await {
                    Ok(()) => {
                        info!("Modelo cambiado: {} -> {}", self.settings.model_id, id);
                        self.settings.model_id = id;
                        debug!("Modelos residentes: {:?}", self.service.models().loaded_models());
                    }
                    Err(e) => warn!("Cambio de modelo rechazado, se mantiene '{}': {}", self.settings.model_id, e),
                }
            }
            Field::Invalid(v) => warn!("Ajuste ignorado: model={}", v),
            _ => {}
        }
        info!(
            "Ajustes de sesión: conf={} iou={} max_det={} model={}",
            self.settings.confidence, self.settings.iou, self.settings.max_detections, self.settings.model_id
        );
    }

    async fn process_frame(&mut self, payload: FramePayload) -> DomainResult<DetectionReply> {
        self.frames += 1;
        if self.frames % FRAME_LOG_INTERVAL == 0 {
            debug!("Frame #{} recibido ({} bytes)", self.frames, payload.len());
        }
        if payload.is_empty() {
            return Err(DomainError::ImageDecode("frame vacío".into()));
        }

        let detections = self.service.detect(&self.settings, payload).await?;
        if !detections.is_empty() {
            info!("Frame #{}: {} detecciones ({})", self.frames, detections.len(), summarize_detections(&detections));
        }

        Ok(DetectionReply { detections })
    }
}
