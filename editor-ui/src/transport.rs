use async_trait::async_trait;
use editor_types::{with_background_marker, SubmitBody};

use crate::error::Result;

/// Asynchronous submission of an edit form
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Form action with the background-save marker appended
    pub url: String,
    /// Lowercase HTTP method of the form
    pub method: String,
    /// Entries a native submission of the form would send
    pub body: SubmitBody,
}

impl SaveRequest {
    pub fn new(action: &str, method: Option<&str>, body: SubmitBody) -> Self {
        let method = method
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("post")
            .to_ascii_lowercase();
        Self {
            url: with_background_marker(action),
            method,
            body,
        }
    }
}

/// Sends a background save and returns the replacement message fragment.
///
/// Anything other than HTTP 200 is an error.
#[async_trait(?Send)]
pub trait SaveTransport {
    async fn submit(&self, request: SaveRequest) -> Result<String>;
}
