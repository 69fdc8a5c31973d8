use clap::Parser;
use std::time::Duration;

use crate::domain::model::{InferenceConfig, ModelId, YoloParams};

/// Configuración de arranque. Cada opción se puede dar también por variable de entorno.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "YOLO object detection over HTTP uploads", long_about = None)]
pub struct Args {
    /// ONNX model path
    #[arg(long, env = "YOLO_MODEL", default_value = "best.onnx")]
    pub model: String,

    /// Class names file, one per line (defaults to the 80 COCO classes)
    #[arg(long, env = "YOLO_LABELS")]
    pub labels: Option<String>,

    /// TrueType font for label text on rendered images
    #[arg(long, env = "YOLO_FONT")]
    pub font: Option<String>,

    #[arg(long, env = "YOLO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "YOLO_PORT", default_value_t = 5050)]
    pub port: u16,

    /// Square network input size
    #[arg(long, env = "YOLO_INPUT_SIZE", default_value_t = 640, value_parser = clap::value_parser!(u32).range(32..=4096))]
    pub input_size: u32,

    #[arg(long, env = "YOLO_CONF_THRESHOLD", default_value_t = 0.25, value_parser = parse_unit_interval)]
    pub conf_threshold: f32,

    #[arg(long, env = "YOLO_IOU_THRESHOLD", default_value_t = 0.45, value_parser = parse_unit_interval)]
    pub iou_threshold: f32,

    #[arg(long, env = "YOLO_MAX_DETECTIONS", default_value_t = 1000)]
    pub max_detections: usize,

    /// Maximum accepted image size in MiB
    #[arg(long, env = "YOLO_MAX_UPLOAD_MB", default_value_t = 16)]
    pub max_upload_mb: usize,

    /// Per-request inference timeout in seconds (0 disables it)
    #[arg(long, env = "YOLO_INFERENCE_TIMEOUT_SECS", default_value_t = 0)]
    pub inference_timeout_secs: u64,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "YOLO_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

fn parse_unit_interval(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{s}: {e}"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} is not in [0, 1]"))
    }
}

impl Args {
    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            model: ModelId::from_path(&self.model),
            params: YoloParams {
                input_size: self.input_size,
                conf_threshold: self.conf_threshold,
                iou_threshold: self.iou_threshold,
                max_detections: self.max_detections,
            },
            labels_path: self.labels.clone(),
            intra_threads: self.intra_threads.max(1),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.max(1) * 1024 * 1024
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        (self.inference_timeout_secs > 0).then(|| Duration::from_secs(self.inference_timeout_secs))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_setup() {
        let args = Args::try_parse_from(["yolo-web-detect"]).unwrap();
        assert_eq!(args.model, "best.onnx");
        assert_eq!(args.port, 5050);
        assert_eq!(args.bind_addr(), "0.0.0.0:5050");
        assert_eq!(args.max_upload_bytes(), 16 * 1024 * 1024);
        assert!(args.inference_timeout().is_none());

        let cfg = args.inference_config();
        assert_eq!(cfg.model.name, "best");
        assert_eq!(cfg.params.input_size, 640);
        assert!(cfg.labels_path.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "yolo-web-detect",
            "--model",
            "models/yolo11n.onnx",
            "--labels",
            "models/classes.txt",
            "--port",
            "8090",
            "--conf-threshold",
            "0.5",
            "--inference-timeout-secs",
            "3",
        ])
        .unwrap();

        let cfg = args.inference_config();
        assert_eq!(cfg.model.name, "yolo11n");
        assert_eq!(cfg.labels_path.as_deref(), Some("models/classes.txt"));
        assert_eq!(cfg.params.conf_threshold, 0.5);
        assert_eq!(args.port, 8090);
        assert_eq!(args.inference_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn thresholds_outside_unit_interval_are_rejected() {
        assert!(Args::try_parse_from(["yolo-web-detect", "--iou-threshold", "1.5"]).is_err());
        assert!(Args::try_parse_from(["yolo-web-detect", "--input-size", "8"]).is_err());
    }
}
