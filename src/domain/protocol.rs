//! Codec del protocolo de sesión sobre WebSocket.
//!
//! Entrante: o bien un mensaje de control `{"type":"settings", ...}`, o bien
//! un frame (la imagen codificada es el propio mensaje, sin sobre). Saliente:
//! `{"detections": [...]}` una vez por frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::detection::Detection;
use super::errors::{DomainError, DomainResult};

/// Contenido de un frame tal y como llegó por el socket.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    /// Texto base64 (opcionalmente con prefijo `data:<mime>;base64,`).
    Encoded(String),
    /// Bytes de imagen ya codificada (JPEG/PNG), llegados como mensaje binario.
    Raw(Vec<u8>),
}

impl FramePayload {
    pub fn len(&self) -> usize {
        match self {
            FramePayload::Encoded(s) => s.len(),
            FramePayload::Raw(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Settings(SettingsUpdate),
    Frame(FramePayload),
}

/// Campos opcionales de un mensaje de control. Se guardan sin tipar para
/// poder validar cada uno por separado.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub iou: Option<Value>,
    #[serde(default, rename = "maxDetections")]
    pub max_detections: Option<Value>,
    #[serde(default)]
    pub model: Option<Value>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ControlMessage {
    Settings(SettingsUpdate),
}

/// Resultado de validar un campo de ajustes.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Absent,
    Valid(T),
    Invalid(Value),
}

impl SettingsUpdate {
    pub fn confidence(&self) -> Field<f64> {
        validate(&self.confidence, as_float)
    }

    pub fn iou(&self) -> Field<f64> {
        validate(&self.iou, as_float)
    }

    pub fn max_detections(&self) -> Field<u64> {
        validate(&self.max_detections, as_count)
    }

    pub fn model(&self) -> Field<String> {
        validate(&self.model, |v| {
            v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
        })
    }
}

fn validate<T>(field: &Option<Value>, convert: impl Fn(&Value) -> Option<T>) -> Field<T> {
    match field {
        None | Some(Value::Null) => Field::Absent,
        Some(v) => match convert(v) {
            Some(t) => Field::Valid(t),
            None => Field::Invalid(v.clone()),
        },
    }
}

fn as_float(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    f.is_finite().then_some(f)
}

fn as_count(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            // 3.0 o 3.7 -> 3; los negativos no valen
            n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.trunc() as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Clasifica un mensaje de texto. Cualquier cosa que no sea un control
/// `settings` bien formado se trata como frame.
pub fn parse(raw: &str) -> InboundMessage {
    match serde_json::from_str::<ControlMessage>(raw) {
        Ok(ControlMessage::Settings(update)) => InboundMessage::Settings(update),
        Err(_) => InboundMessage::Frame(FramePayload::Encoded(raw.to_string())),
    }
}

/// Los mensajes binarios siempre son frames.
pub fn parse_binary(raw: Vec<u8>) -> InboundMessage {
    InboundMessage::Frame(FramePayload::Raw(raw))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReply {
    pub detections: Vec<Detection>,
}

pub fn encode(reply: &DetectionReply) -> DomainResult<String> {
    serde_json::to_string(reply).map_err(|e| DomainError::OperationFailed(e.to_string()))
}

pub fn summarize_detections(detections: &[Detection]) -> String {
    let mut counts = BTreeMap::new();
    for det in detections {
        *counts.entry(det.label.as_str()).or_insert(0) += 1;
    }
    counts.iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}
