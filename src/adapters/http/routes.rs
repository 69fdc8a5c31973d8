use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use tracing::{debug, info};

use crate::adapters::codec::{decode_rgb, encode_jpeg};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::HttpState;
use crate::domain::detection::DetectionResult;
use crate::domain::errors::{DomainError, DomainResult};

const INDEX_HTML: &str = include_str!("../../../static/index.html");
const IMAGE_FIELD: &str = "image";

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// POST /predict: detecciones en JSON.
pub async fn predict(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectionResult>, ApiError> {
    let bytes = read_image_field(multipart, st.max_upload_bytes)
        .await
        .map_err(ApiError::json)?;
    let image = decode_rgb(&bytes, st.max_upload_bytes).map_err(ApiError::json)?;
    debug!("POST /predict: imagen {}x{}", image.width(), image.height());

    let result = st.detection.detect(image).await.map_err(ApiError::json)?;
    info!("POST /predict: {} objetos", result.num_objects);
    Ok(Json(result))
}

/// POST /predict-img: la imagen anotada como JPEG.
pub async fn predict_img(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = read_image_field(multipart, st.max_upload_bytes)
        .await
        .map_err(ApiError::text)?;
    let image = decode_rgb(&bytes, st.max_upload_bytes).map_err(ApiError::text)?;
    debug!("POST /predict-img: imagen {}x{}", image.width(), image.height());

    let rendered = st.detection.render(image).await.map_err(ApiError::text)?;
    let jpeg = encode_jpeg(&rendered).map_err(ApiError::text)?;
    info!("POST /predict-img: {} bytes JPEG", jpeg.len());

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg))
}

/// Devuelve el contenido del campo `image`. Una petición que no es multipart
/// o que no trae ese campo cuenta como "sin imagen".
async fn read_image_field(
    multipart: Result<Multipart, MultipartRejection>,
    max_upload_bytes: usize,
) -> DomainResult<Bytes> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            debug!("Petición sin cuerpo multipart: {}", rejection);
            return Err(DomainError::MissingImage);
        }
    };

    let to_domain = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            DomainError::TooLarge(max_upload_bytes)
        } else {
            DomainError::MalformedUpload(e.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(to_domain)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        return field.bytes().await.map_err(to_domain);
    }
    Err(DomainError::MissingImage)
}
