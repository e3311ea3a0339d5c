use serde::{Deserialize, Serialize};

/// Caja tal y como la entrega el detector, en píxeles de la imagen original.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
    pub label: String,
}

/// Detección normalizada que viaja al cliente: coordenadas en fracciones
/// del ancho/alto de la imagen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

const CONFIDENCE_DECIMALS: i32 = 3;
const COORD_DECIMALS: i32 = 4;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    // Empates al par, igual que el cliente de referencia.
    (value * factor).round_ties_even() / factor
}

impl Detection {
    /// Reescala una caja en píxeles a [0,1] respecto a `width`/`height`.
    ///
    /// No se recorta: una caja que se sale de la imagen produce valores > 1.0
    /// (o < 0.0) y se envía tal cual.
    pub fn normalize(raw: &RawDetection, width: u32, height: u32) -> Self {
        let w = f64::from(width.max(1));
        let h = f64::from(height.max(1));
        Self {
            label: raw.label.clone(),
            confidence: round_to(f64::from(raw.score), CONFIDENCE_DECIMALS),
            x1: round_to(f64::from(raw.x1) / w, COORD_DECIMALS),
            y1: round_to(f64::from(raw.y1) / h, COORD_DECIMALS),
            x2: round_to(f64::from(raw.x2) / w, COORD_DECIMALS),
            y2: round_to(f64::from(raw.y2) / h, COORD_DECIMALS),
        }
    }
}

/// Normaliza todas las cajas conservando el orden del detector.
pub fn normalize_all(raw: &[RawDetection], width: u32, height: u32) -> Vec<Detection> {
    raw.iter().map(|d| Detection::normalize(d, width, height)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> RawDetection {
        RawDetection { x1, y1, x2, y2, score, class_id: 0, label: "person".into() }
    }

    #[test]
    fn normalizes_against_width_and_height_without_clamping() {
        let det = Detection::normalize(&raw(10.0, 20.0, 110.0, 220.0, 0.9), 100, 200);
        assert_eq!(det.x1, 0.1);
        assert_eq!(det.y1, 0.1);
        assert_eq!(det.x2, 1.1);
        assert_eq!(det.y2, 1.1);
        assert_eq!(det.label, "person");
    }

    #[test]
    fn rounds_confidence_and_coordinates() {
        let det = Detection::normalize(&raw(1.0, 1.0, 2.0, 2.0, 0.87654), 3, 7);
        assert_eq!(det.confidence, 0.877);
        assert_eq!(det.x1, 0.3333);
        assert_eq!(det.y1, 0.1429);
        assert_eq!(det.x2, 0.6667);
        assert_eq!(det.y2, 0.2857);
    }

    #[test]
    fn exact_ties_round_to_even() {
        // 20 / 640 = 0.03125 exacto
        let det = Detection::normalize(&raw(20.0, 0.0, 640.0, 480.0, 0.0625), 640, 480);
        assert_eq!(det.x1, 0.0312);
        assert_eq!(det.confidence, 0.062);
    }

    #[test]
    fn keeps_detector_order() {
        let dets = vec![raw(0.0, 0.0, 1.0, 1.0, 0.2), raw(0.0, 0.0, 1.0, 1.0, 0.9)];
        let out = normalize_all(&dets, 10, 10);
        assert_eq!(out[0].confidence, 0.2);
        assert_eq!(out[1].confidence, 0.9);
    }
}
