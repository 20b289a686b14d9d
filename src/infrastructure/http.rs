// SPDX-License-Identifier: MPL-2.0
//! Shared HTTP plumbing for the provider adapters.

use crate::application::port::{BitmapCodec, GenerationError, ImageFormat};
use crate::domain::Bitmap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::time::Duration;

const USER_AGENT: &str = concat!("NanoLayer/", env!("CARGO_PKG_VERSION"));

/// Builds the client used for provider calls.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::network(e.to_string()))
}

pub(crate) fn transport_error(err: &reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::network(format!("request timed out: {err}"))
    } else {
        GenerationError::network(err.to_string())
    }
}

/// Turns a non-success response into a tagged error, keeping the body as
/// the message.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    };
    tracing::warn!(status = status.as_u16(), "provider returned an error status");
    Err(GenerationError::from_status(status.as_u16(), message))
}

/// PNG-encodes `bitmap` and returns it base64 encoded.
pub(crate) fn png_base64(
    codec: &dyn BitmapCodec,
    bitmap: &Bitmap,
) -> Result<String, GenerationError> {
    let bytes = codec
        .encode(bitmap, ImageFormat::Png)
        .map_err(|e| GenerationError::decode(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

pub(crate) fn png_data_uri(
    codec: &dyn BitmapCodec,
    bitmap: &Bitmap,
) -> Result<String, GenerationError> {
    Ok(format!(
        "data:{};base64,{}",
        ImageFormat::Png.mime_type(),
        png_base64(codec, bitmap)?
    ))
}

pub(crate) fn decode_base64(data: &str) -> Result<Vec<u8>, GenerationError> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| GenerationError::decode(format!("invalid base64 image data: {e}")))
}

/// Payload of a `data:` URI, or `None` for any other URL.
pub(crate) fn data_uri_payload(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    meta.ends_with(";base64").then_some(payload)
}

pub(crate) fn decode_image(
    codec: &dyn BitmapCodec,
    bytes: &[u8],
) -> Result<Bitmap, GenerationError> {
    codec
        .decode(bytes)
        .map_err(|e| GenerationError::decode(e.to_string()))
}
