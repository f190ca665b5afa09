//! Step image uploads to a third-party image host.
//!
//! The bytes are forwarded as a multipart form (`image` field) with the API
//! key as the `key` query parameter; the host answers with
//! `{ "data": { "url": "..." } }`. The first failure is returned as is.

use std::time::Duration;

use screener_core::error::CoreError;

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Accepted image MIME types.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

/// HTTP timeout for a single upload.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImageHostError {
    /// `IMAGE_HOST_URL` / `IMAGE_HOST_API_KEY` are not configured.
    #[error("Image uploads are not configured")]
    Disabled,

    /// The HTTP request failed (network, DNS, timeout, etc.).
    #[error("Image host request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The host returned a non-2xx status code.
    #[error("Image host returned HTTP {0}")]
    HttpStatus(u16),

    /// The host answered 2xx without a usable URL.
    #[error("Unexpected image host response: {0}")]
    InvalidResponse(String),
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ImageHostConfig {
    /// Upload endpoint.
    pub url: String,
    pub api_key: String,
}

impl ImageHostConfig {
    /// Read `IMAGE_HOST_URL` and `IMAGE_HOST_API_KEY`; `None` unless both are set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("IMAGE_HOST_URL").ok().filter(|v| !v.trim().is_empty())?;
        let api_key = std::env::var("IMAGE_HOST_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        Some(Self { url, api_key })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the declared content type and size of an uploaded image.
pub fn validate_image(content_type: &str, len: usize) -> Result<(), CoreError> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(CoreError::Validation(format!(
            "Unsupported image type '{content_type}'. Must be one of: {}",
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }
    if len == 0 {
        return Err(CoreError::Validation("Image file is empty".to_string()));
    }
    if len > MAX_IMAGE_BYTES {
        return Err(CoreError::Validation(format!(
            "Image is {len} bytes, maximum is {MAX_IMAGE_BYTES}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ImageHostClient {
    client: reqwest::Client,
    config: ImageHostConfig,
}

impl ImageHostClient {
    pub fn new(config: ImageHostConfig) -> Result<Self, ImageHostError> {
        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    /// Upload one image and return its public URL.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ImageHostError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(&self.config.url)
            .query(&[("key", self.config.api_key.as_str())])
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ImageHostError::HttpStatus(response.status().as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        parse_upload_response(&body)
    }
}

/// Extract the hosted URL from the image host's JSON answer.
pub fn parse_upload_response(body: &serde_json::Value) -> Result<String, ImageHostError> {
    body.pointer("/data/url")
        .and_then(|v| v.as_str())
        .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
        .map(str::to_string)
        .ok_or_else(|| ImageHostError::InvalidResponse(body.to_string()))
}
