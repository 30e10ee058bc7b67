#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum UiError {
    #[error("Element not found: {0}")]
    MissingElement(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JavaScript error: {0}")]
    Js(String),
}

pub type Result<T> = std::result::Result<T, UiError>;
