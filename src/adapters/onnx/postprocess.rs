use ndarray::{s, ArrayView1, ArrayView3, Axis};

use crate::adapters::onnx::labels::ClassLabels;
use crate::domain::detection::RawDetection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::YoloParams;

/// Candidatos que entran como mucho en la NMS.
const MAX_NMS_CANDIDATES: usize = 30_000;

/// Forma de la salida del modelo exportado a ONNX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `[1, N, 5 + nc]`: cx, cy, w, h, objectness, clases (YOLOv5).
    RowsWithObjectness,
    /// `[1, 4 + nc, N]`: cx, cy, w, h, clases (YOLOv8 / YOLO11).
    ChannelsFirst,
}

impl OutputLayout {
    pub fn infer(dims: &[usize]) -> DomainResult<Self> {
        if dims.len() != 3 || dims[0] == 0 {
            return Err(DomainError::Inference(format!("unexpected output shape {dims:?}")));
        }
        let layout = if dims[1] > dims[2] { Self::RowsWithObjectness } else { Self::ChannelsFirst };
        if layout.num_classes(dims) == 0 {
            return Err(DomainError::Inference(format!("output shape {dims:?} has no class scores")));
        }
        Ok(layout)
    }

    pub fn num_classes(&self, dims: &[usize]) -> usize {
        match self {
            Self::RowsWithObjectness => dims[2].saturating_sub(5),
            Self::ChannelsFirst => dims[1].saturating_sub(4),
        }
    }
}

/// Transformación letterbox aplicada en el preprocesado, para deshacerla sobre las cajas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    pub fn new(src_w: u32, src_h: u32, input_size: u32) -> Self {
        let scale = (input_size as f32 / src_w as f32).min(input_size as f32 / src_h as f32);
        let new_w = (src_w as f32 * scale).round();
        let new_h = (src_h as f32 * scale).round();
        Self {
            scale,
            pad_x: ((input_size as f32 - new_w) / 2.0).floor(),
            pad_y: ((input_size as f32 - new_h) / 2.0).floor(),
        }
    }

    /// Caja centro/tamaño en el espacio del modelo -> esquinas en la imagen original.
    fn unmap(&self, cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
        let x1 = (cx - w / 2.0 - self.pad_x) / self.scale;
        let y1 = (cy - h / 2.0 - self.pad_y) / self.scale;
        let x2 = (cx + w / 2.0 - self.pad_x) / self.scale;
        let y2 = (cy + h / 2.0 - self.pad_y) / self.scale;
        (x1, y1, x2, y2)
    }
}

fn argmax(scores: ArrayView1<f32>) -> (usize, f32) {
    scores
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_i, best), (i, &v)| {
            if v > best { (i, v) } else { (best_i, best) }
        })
}

/// Decodifica el primer elemento del batch, filtra por confianza y aplica NMS.
/// El resultado queda ordenado por confianza descendente.
pub fn decode_output(
    dims: &[usize],
    data: &[f32],
    params: &YoloParams,
    letterbox: &Letterbox,
    labels: &ClassLabels,
) -> DomainResult<Vec<RawDetection>> {
    let layout = OutputLayout::infer(dims)?;
    let output = ArrayView3::from_shape((dims[0], dims[1], dims[2]), data)
        .map_err(|e| DomainError::Inference(format!("output tensor: {e}")))?;
    let view = output.index_axis(Axis(0), 0);

    let mut candidates = Vec::new();
    let mut push = |cx: f32, cy: f32, w: f32, h: f32, score: f32, class_id: usize| {
        let (x1, y1, x2, y2) = letterbox.unmap(cx, cy, w, h);
        candidates.push(RawDetection { x1, y1, x2, y2, score, class_id, label: labels.name(class_id) });
    };

    match layout {
        OutputLayout::RowsWithObjectness => {
            for row in view.axis_iter(Axis(0)) {
                let objectness = row[4];
                if objectness <= params.conf_threshold {
                    continue;
                }
                let (class_id, class_score) = argmax(row.slice(s![5..]));
                let score = objectness * class_score;
                if score > params.conf_threshold {
                    push(row[0], row[1], row[2], row[3], score, class_id);
                }
            }
        }
        OutputLayout::ChannelsFirst => {
            for i in 0..view.shape()[1] {
                let (class_id, score) = argmax(view.slice(s![4.., i]));
                if score > params.conf_threshold {
                    push(view[[0, i]], view[[1, i]], view[[2, i]], view[[3, i]], score, class_id);
                }
            }
        }
    }

    Ok(non_max_suppression(candidates, params.iou_threshold, params.max_detections))
}

pub fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);

    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

/// NMS voraz por clase.
pub fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(MAX_NMS_CANDIDATES);

    let mut kept: Vec<RawDetection> = Vec::new();
    for cand in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == cand.class_id && iou(k, &cand) > iou_threshold);
        if !overlaps {
            kept.push(cand);
        }
    }
    kept
}
