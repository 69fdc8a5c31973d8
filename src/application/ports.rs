use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{
    detection::{Detection, RawDetection},
    errors::DomainResult,
    model::ModelId,
};

/// Motor de detección opaco: imagen RGB dentro, cajas crudas fuera.
/// Se invoca desde el pool bloqueante, por eso es síncrono.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, image: &RgbImage) -> DomainResult<Vec<RawDetection>>;
}

/// Dibuja las detecciones sobre una copia de la imagen.
pub trait AnnotatorPort: Send + Sync {
    fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}
