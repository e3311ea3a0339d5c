use anyhow::{Context, Result};
use base64::{prelude::BASE64_STANDARD, Engine};
use image::RgbImage;

use crate::application::ports::ImageDecoderPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::protocol::FramePayload;

/// Decodifica frames JPEG/PNG enviados en base64 (o en binario) a RGB.
pub struct Base64ImageDecoder;

impl Base64ImageDecoder {
    pub fn new() -> Self { Self }
}

impl Default for Base64ImageDecoder {
    fn default() -> Self { Self::new() }
}

/// Quita el prefijo `data:image/jpeg;base64,` que deja `canvas.toDataURL`.
fn strip_data_url(text: &str) -> &str {
    let text = text.trim();
    match text.split_once(',') {
        Some((head, body)) if head.starts_with("data:") => body,
        _ => text,
    }
}

fn decode_bytes(bytes: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(bytes).context("formato de imagen no reconocido")?;
    Ok(img.to_rgb8())
}

fn decode_payload(payload: &FramePayload) -> Result<RgbImage> {
    match payload {
        FramePayload::Encoded(text) => {
            let bytes = BASE64_STANDARD
                .decode(strip_data_url(text))
                .context("base64 inválido")?;
            decode_bytes(&bytes)
        }
        FramePayload::Raw(bytes) => decode_bytes(bytes),
    }
}

impl ImageDecoderPort for Base64ImageDecoder {
    fn decode(&self, payload: &FramePayload) -> DomainResult<RgbImage> {
        decode_payload(payload).map_err(|e| DomainError::ImageDecode(format!("{:#}", e)))
    }
}
