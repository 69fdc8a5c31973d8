use std::sync::Arc;
use crate::application::services::DetectionService;

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Adaptador de inferencia, creado una sola vez al arrancar.
    pub detection: Arc<DetectionService>,
    /// Tamaño máximo aceptado para el campo `image`, en bytes.
    pub max_upload_bytes: usize,
}
