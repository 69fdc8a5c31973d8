use serde::{Deserialize, Serialize};

/// Caja tal y como la entrega el motor de inferencia, en píxeles de la imagen
/// original pero sin recortar ni redondear.
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub xmin: u32,
    pub ymin: u32,
    pub xmax: u32,
    pub ymax: u32,
    pub confidence: f64,
    #[serde(rename = "class")]
    pub class_id: usize,
    pub name: String,
}

impl Detection {
    /// Normaliza una detección cruda: coordenadas dentro de `width`x`height`,
    /// truncadas a enteros, con `xmin <= xmax` e `ymin <= ymax`, y confianza
    /// en [0, 1] redondeada a 2 decimales.
    pub fn from_raw(raw: RawDetection, width: u32, height: u32) -> Self {
        let clamp_x = |v: f32| clamp_coord(v, width);
        let clamp_y = |v: f32| clamp_coord(v, height);

        let (x1, x2) = (clamp_x(raw.x1), clamp_x(raw.x2));
        let (y1, y2) = (clamp_y(raw.y1), clamp_y(raw.y2));

        Self {
            xmin: x1.min(x2),
            ymin: y1.min(y2),
            xmax: x1.max(x2),
            ymax: y1.max(y2),
            confidence: round_confidence(raw.score),
            class_id: raw.class_id,
            name: raw.label,
        }
    }
}

fn clamp_coord(v: f32, limit: u32) -> u32 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, limit as f32) as u32
}

fn round_confidence(score: f32) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    let clamped = (score as f64).clamp(0.0, 1.0);
    (clamped * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub num_objects: usize,
    pub predictions: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(predictions: Vec<Detection>) -> Self {
        Self { num_objects: predictions.len(), predictions }
    }

    /// Paso único de normalización tras la inferencia. Conserva el orden del motor.
    pub fn from_raw(raw: Vec<RawDetection>, width: u32, height: u32) -> Self {
        Self::new(
            raw.into_iter()
                .map(|r| Detection::from_raw(r, width, height))
                .collect(),
        )
    }
}
