use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbImage;
use tracing::debug;

use crate::{
    application::ports::{AnnotatorPort, DetectorPort},
    domain::{
        detection::DetectionResult,
        errors::{DomainError, DomainResult},
    },
};

/// Adaptador de inferencia: envuelve el detector y lo presenta con una
/// interfaz uniforme (`detect` / `render`).
/// Se construye una vez al arrancar y se comparte en solo lectura entre peticiones.
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn DetectorPort>,
    annotator: Arc<dyn AnnotatorPort>,
    timeout: Option<Duration>,
}

impl DetectionService {
    pub fn new(detector: Arc<dyn DetectorPort>, annotator: Arc<dyn AnnotatorPort>) -> Self {
        Self { detector, annotator, timeout: None }
    }

    /// Límite por petición para la llamada de inferencia. `None` desactiva el límite.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Ejecuta el modelo una vez y normaliza el resultado a `DetectionResult`.
    pub async fn detect(&self, image: RgbImage) -> DomainResult<DetectionResult> {
        let detector = self.detector.clone();
        self.run_blocking(move || {
            let (w, h) = image.dimensions();
            let started = Instant::now();
            let raw = detector.detect(&image)?;
            let result = DetectionResult::from_raw(raw, w, h);
            debug!(
                "detect {}x{}: {} objetos en {:.1} ms",
                w,
                h,
                result.num_objects,
                started.elapsed().as_secs_f32() * 1000.0
            );
            Ok(result)
        })
        .await
    }

    /// Igual que `detect`, pero devuelve una copia de la imagen con cajas y etiquetas dibujadas.
    pub async fn render(&self, image: RgbImage) -> DomainResult<RgbImage> {
        let detector = self.detector.clone();
        let annotator = self.annotator.clone();
        self.run_blocking(move || {
            let (w, h) = image.dimensions();
            let raw = detector.detect(&image)?;
            let result = DetectionResult::from_raw(raw, w, h);
            debug!("render {}x{}: {} objetos", w, h, result.num_objects);
            Ok(annotator.annotate(&image, &result.predictions))
        })
        .await
    }

    async fn run_blocking<T, F>(&self, job: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> DomainResult<T> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(job);

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, handle)
                .await
                .map_err(|_| DomainError::InferenceTimeout(limit.as_millis() as u64))?,
            None => handle.await,
        };

        joined.map_err(|e| DomainError::Inference(format!("inference worker failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::detection::{Detection, RawDetection};
    use image::Rgb;

    struct OneBox;

    impl DetectorPort for OneBox {
        fn detect(&self, _image: &RgbImage) -> DomainResult<Vec<RawDetection>> {
            Ok(vec![RawDetection {
                x1: -4.0, y1: 2.5, x2: 40.0, y2: 20.0, score: 0.456, class_id: 1, label: "bicycle".into(),
            }])
        }
    }

    /// Marca el píxel (0, 0) y cuenta las cajas recibidas en el canal rojo.
    struct MarkCorner;

    impl AnnotatorPort for MarkCorner {
        fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
            let mut out = image.clone();
            out.put_pixel(0, 0, Rgb([detections.len() as u8, 0, 0]));
            out
        }
    }

    fn service() -> DetectionService {
        DetectionService::new(Arc::new(OneBox), Arc::new(MarkCorner))
    }

    #[tokio::test]
    async fn detect_normalizes_backend_output() {
        let result = service().detect(RgbImage::new(32, 16)).await.unwrap();
        assert_eq!(result.num_objects, 1);
        let d = &result.predictions[0];
        assert_eq!((d.xmin, d.ymin, d.xmax, d.ymax), (0, 2, 32, 16));
        assert_eq!(d.confidence, 0.46);
        assert_eq!(d.name, "bicycle");
    }

    #[tokio::test]
    async fn render_passes_normalized_boxes_to_the_annotator() {
        let out = service().render(RgbImage::from_pixel(8, 8, Rgb([9, 9, 9]))).await.unwrap();
        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(*out.get_pixel(0, 0), Rgb([1, 0, 0]));
        assert_eq!(*out.get_pixel(7, 7), Rgb([9, 9, 9]));
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let svc = service().with_timeout(Some(Duration::ZERO));
        assert!(svc.timeout.is_none());
    }
}
