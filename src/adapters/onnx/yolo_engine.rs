use anyhow::{Context, Result};
use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::Array4;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::adapters::onnx::labels::ClassLabels;
use crate::adapters::onnx::postprocess::{decode_output, Letterbox, OutputLayout};
use crate::application::ports::DetectorPort;
use crate::domain::detection::RawDetection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{InferenceConfig, YoloParams};

const LETTERBOX_FILL: Rgb<u8> = Rgb([114, 114, 114]);

/// Sesión ONNX de un detector YOLO. `Session::run` necesita `&mut`, así que
/// las inferencias concurrentes se serializan con un mutex.
pub struct OnnxYoloEngine {
    session: Mutex<Session>,
    params: YoloParams,
    labels: ClassLabels,
    layout: OutputLayout,
}

impl OnnxYoloEngine {
    pub fn load(config: &InferenceConfig) -> Result<Self> {
        let path = &config.model.onnx_path;
        let mut builder = Session::builder()?.with_intra_threads(config.intra_threads)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path).with_context(|| format!("reading model {path}"))?;
        let session = builder
            .commit_from_memory(&model_bytes)
            .with_context(|| format!("loading ONNX model {path}"))?;

        let labels = match &config.labels_path {
            Some(p) => ClassLabels::load(p)?,
            None => ClassLabels::coco(),
        };

        let mut engine = Self {
            session: Mutex::new(session),
            params: config.params.clone(),
            labels,
            layout: OutputLayout::ChannelsFirst,
        };

        // Inferencia en vacío para validar el modelo y conocer la forma de salida.
        let size = engine.params.input_size;
        let (input, _) = preprocess(&RgbImage::from_pixel(size, size, LETTERBOX_FILL), size);
        let (dims, _) = engine.run(input)?;
        engine.layout = OutputLayout::infer(&dims)?;

        let num_classes = engine.layout.num_classes(&dims);
        info!(
            "Modelo '{}' listo: salida {:?} ({:?}), {} clases, {} etiquetas",
            config.model.name,
            dims,
            engine.layout,
            num_classes,
            engine.labels.len()
        );
        if num_classes != engine.labels.len() {
            warn!(
                "El modelo tiene {} clases pero hay {} etiquetas; los ids sin nombre usarán 'class_<id>'",
                num_classes,
                engine.labels.len()
            );
        }

        Ok(engine)
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    fn run(&self, input: Vec<f32>) -> DomainResult<(Vec<usize>, Vec<f32>)> {
        let imgsz = self.params.input_size as i64;
        let input_shape = vec![1, 3, imgsz, imgsz];
        let input_tensor = Value::from_array((input_shape, input)).map_err(inference_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DomainError::Inference("session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![input_tensor]).map_err(inference_error)?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>().map_err(inference_error)?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x.max(0) as usize).collect();
        Ok((dims, data_out.to_vec()))
    }
}

impl DetectorPort for OnnxYoloEngine {
    fn detect(&self, image: &RgbImage) -> DomainResult<Vec<RawDetection>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DomainError::InvalidInput("image has no pixels".into()));
        }
        let (input, letterbox) = preprocess(image, self.params.input_size);
        let (dims, data) = self.run(input)?;
        decode_output(&dims, &data, &self.params, &letterbox, &self.labels)
    }
}

fn inference_error(e: ort::Error) -> DomainError {
    DomainError::Inference(e.to_string())
}

/// Letterbox a `imgsz`x`imgsz`, NCHW, valores en [0, 1].
fn preprocess(rgb: &RgbImage, imgsz: u32) -> (Vec<f32>, Letterbox) {
    let letterbox = Letterbox::new(rgb.width(), rgb.height(), imgsz);
    let new_w = ((rgb.width() as f32 * letterbox.scale).round() as u32).clamp(1, imgsz);
    let new_h = ((rgb.height() as f32 * letterbox.scale).round() as u32).clamp(1, imgsz);

    let resized = image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(imgsz, imgsz, LETTERBOX_FILL);
    image::imageops::replace(&mut canvas, &resized, letterbox.pad_x as i64, letterbox.pad_y as i64);

    let size = imgsz as usize;
    let mut input = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
    }

    (input.into_raw_vec_and_offset().0, letterbox)
}
