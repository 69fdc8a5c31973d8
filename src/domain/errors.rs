use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No image provided")]
    MissingImage,
    #[error("Invalid image: {0}")]
    Decode(String),
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),
    #[error("Image exceeds the {0} byte upload limit")]
    TooLarge(usize),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Inference timed out after {0} ms")]
    InferenceTimeout(u64),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
