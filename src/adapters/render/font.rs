use ab_glyph::FontVec;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};

/// Rutas habituales de una fuente sans-serif en Linux, macOS y Windows.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn read_font(path: &str) -> DomainResult<FontVec> {
    let bytes = fs::read(path).map_err(|e| DomainError::NotFound(format!("font {path}: {e}")))?;
    FontVec::try_from_vec(bytes)
        .map_err(|_| DomainError::InvalidInput(format!("{path} is not a TrueType/OpenType font")))
}

/// Fuente para las etiquetas. Una ruta explícita que no carga es un error;
/// sin ruta se prueban las fuentes del sistema y, si no hay ninguna, se dibuja sin texto.
pub fn load_label_font(explicit: Option<&str>) -> DomainResult<Option<FontVec>> {
    if let Some(path) = explicit {
        let font = read_font(path)?;
        info!("Fuente de etiquetas: {}", path);
        return Ok(Some(font));
    }

    for candidate in SYSTEM_FONT_CANDIDATES {
        if !Path::new(candidate).is_file() {
            continue;
        }
        match read_font(candidate) {
            Ok(font) => {
                info!("Fuente de etiquetas: {}", candidate);
                return Ok(Some(font));
            }
            Err(e) => warn!("Fuente ignorada: {}", e),
        }
    }

    warn!("No se encontró ninguna fuente; las imágenes anotadas no llevarán texto en las etiquetas");
    Ok(None)
}
