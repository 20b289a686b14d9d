// SPDX-License-Identifier: MPL-2.0
//! [`ImageGenerator`] and [`ImageAnalyzer`] for the Gemini API.
//!
//! Both use `models/{model}:generateContent`. Images go first as
//! `inlineData` parts, the text prompt last.

use super::codec::ImageRsCodec;
use super::http;
use crate::application::port::{
    GenerationError, GenerationErrorKind, GenerationOutcome, GenerationRequest, ImageAnalyzer,
    ImageGenerator,
};
use crate::config::{defaults, Config};
use crate::domain::{Bitmap, GenerationModel, ResolutionTier};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

// Serialized as `{"inlineData": {...}}` or `{"text": "..."}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    InlineData(InlineData),
    Text(String),
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct TextContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<TextContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseInlineData {
    #[serde(default)]
    data: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    response_id: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> Option<&[ResponsePart]> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .filter(|parts| !parts.is_empty())
    }

    fn image_data(&self) -> Result<&str, GenerationError> {
        let parts = self.parts().ok_or_else(|| {
            GenerationError::new(GenerationErrorKind::EmptyResponse, "No content generated")
        })?;
        parts
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.as_str())
            .find(|d| !d.is_empty())
            .ok_or_else(|| {
                GenerationError::new(
                    GenerationErrorKind::EmptyResponse,
                    "No image data found in response",
                )
            })
    }

    fn text(&self) -> String {
        self.parts()
            .unwrap_or_default()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Replaces a raw JSON error body with the API's `error.message`.
fn readable(mut err: GenerationError) -> GenerationError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&err.message) {
        err.message = envelope.error.message;
    }
    err
}

/// Client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: GenerationModel,
    analysis_model: String,
    system_instruction: Option<String>,
    codec: ImageRsCodec,
}

impl GeminiClient {
    /// Creates a client against the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        model: GenerationModel,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: defaults::DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            analysis_model: defaults::ANALYSIS_MODEL.to_string(),
            system_instruction: None,
            codec: ImageRsCodec,
        })
    }

    /// Builds a client from settings.
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be built.
    pub fn from_config(config: &Config, model: GenerationModel) -> Result<Self, GenerationError> {
        let client = Self::new(config.gemini_api_key.clone(), model, config.request_timeout())?
            .with_base_url(config.gemini_base_url());
        Ok(match &config.system_instruction {
            Some(instruction) => client.with_system_instruction(instruction.clone()),
            None => client,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key.as_deref().ok_or_else(|| {
            GenerationError::new(
                GenerationErrorKind::MissingCredentials,
                "API Key is missing. Please configure it in Settings.",
            )
        })
    }

    fn image_part(&self, bitmap: &Bitmap) -> Result<Part, GenerationError> {
        Ok(Part::InlineData(InlineData {
            mime_type: "image/png",
            data: http::png_base64(&self.codec, bitmap)?,
        }))
    }

    fn build_body(&self, request: &GenerationRequest) -> Result<GenerateContentBody, GenerationError> {
        let mut parts = Vec::with_capacity(request.reference_images.len() + 2);
        if let Some(base) = &request.base_image {
            parts.push(self.image_part(base)?);
        }
        for reference in &request.reference_images {
            parts.push(self.image_part(reference)?);
        }
        parts.push(Part::Text(
            request.with_reference_note(&request.region_prompt()),
        ));

        let system_instruction = request
            .style_instruction
            .clone()
            .or_else(|| self.system_instruction.clone())
            .filter(|s| !s.trim().is_empty())
            .map(|text| TextContent {
                parts: vec![TextPart { text }],
            });

        let image_config = ImageConfig {
            aspect_ratio: request.aspect_ratio.map(|a| a.as_str()),
            image_size: request.resolution_for(self.model).map(ResolutionTier::as_str),
        };
        let generation_config = (image_config.aspect_ratio.is_some()
            || image_config.image_size.is_some())
        .then_some(GenerationConfig { image_config });

        Ok(GenerateContentBody {
            contents: vec![Content { parts }],
            system_instruction,
            generation_config,
        })
    }

    async fn call(
        &self,
        model: &str,
        body: &GenerateContentBody,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response = http::ensure_success(response).await.map_err(readable)?;
        response
            .json()
            .await
            .map_err(|e| GenerationError::decode(format!("invalid Gemini response: {e}")))
    }
}

impl ImageGenerator for GeminiClient {
    fn model(&self) -> GenerationModel {
        self.model
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        // Fail on a missing key before encoding any image.
        self.api_key()?;
        let body = self.build_body(request)?;
        tracing::info!(
            model = self.model.id(),
            edit = request.is_edit(),
            references = request.reference_images.len(),
            "sending Gemini request"
        );

        let response = self.call(self.model.id(), &body).await?;
        let bytes = http::decode_base64(response.image_data()?)?;
        let image = http::decode_image(&self.codec, &bytes)?;
        tracing::info!(
            width = image.width(),
            height = image.height(),
            "Gemini generation finished"
        );

        Ok(GenerationOutcome {
            image,
            cost_estimate: None,
            request_id: response.response_id,
        })
    }
}

impl ImageAnalyzer for GeminiClient {
    async fn analyze(&self, image: &Bitmap, prompt: &str) -> Result<String, GenerationError> {
        self.api_key()?;
        let body = GenerateContentBody {
            contents: vec![Content {
                parts: vec![self.image_part(image)?, Part::Text(prompt.to_string())],
            }],
            system_instruction: None,
            generation_config: None,
        };
        tracing::info!(model = %self.analysis_model, "sending analysis request");
        let response = self.call(&self.analysis_model, &body).await?;
        Ok(response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AspectRatio, RelativeRegion};

    fn client(model: GenerationModel) -> GeminiClient {
        GeminiClient::new(Some("key".into()), model, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_names_model() {
        let gemini = client(GenerationModel::GeminiFlashImage).with_base_url("https://g.test/v1beta/");
        assert_eq!(
            gemini.endpoint("gemini-2.5-flash-image"),
            "https://g.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn edit_body_orders_images_before_text() {
        let request = GenerationRequest {
            base_image: Some(Bitmap::filled(2, 2, [1, 2, 3, 255])),
            reference_images: vec![Bitmap::filled(1, 1, [0, 0, 0, 255])],
            region_hint: Some(RelativeRegion {
                x: 0,
                y: 0,
                width: 50,
                height: 50,
            }),
            aspect_ratio: Some(AspectRatio::Square),
            resolution: Some(ResolutionTier::TwoK),
            ..GenerationRequest::new("make it snow")
        };
        let body = client(GenerationModel::GeminiProImage)
            .build_body(&request)
            .unwrap();
        let json = serde_json::to_value(&body).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert!(parts[1]["inlineData"]["data"].is_string());
        let text = parts[2]["text"].as_str().unwrap();
        assert!(text.contains("Change that specific area to: make it snow."));
        assert!(text.ends_with("(Use the provided 1 reference image(s) as style/content context)"));
        assert_eq!(json["generationConfig"]["imageConfig"]["aspectRatio"], "1:1");
        assert_eq!(json["generationConfig"]["imageConfig"]["imageSize"], "2K");
    }

    #[test]
    fn flash_model_gets_no_image_size_or_empty_config() {
        let request = GenerationRequest {
            resolution: Some(ResolutionTier::FourK),
            ..GenerationRequest::new("a cat")
        };
        let body = client(GenerationModel::GeminiFlashImage)
            .build_body(&request)
            .unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert!(json.get("systemInstruction").is_none());
        assert_eq!(json["contents"][0]["parts"][0]["text"], "a cat");
    }

    #[test]
    fn system_instruction_is_wrapped_in_parts() {
        let body = client(GenerationModel::GeminiFlashImage)
            .with_system_instruction("pixel art")
            .build_body(&GenerationRequest::new("a cat"))
            .unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "pixel art");
    }

    #[test]
    fn response_image_is_first_inline_part() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "Here you go"},
                {"inlineData": {"mimeType": "image/png", "data": "QUJD"}}
            ]}}],
            "responseId": "abc"
        }))
        .unwrap();
        assert_eq!(response.image_data().unwrap(), "QUJD");
        assert_eq!(response.text(), "Here you go");
        assert_eq!(response.response_id.as_deref(), Some("abc"));
    }

    #[test]
    fn response_without_image_is_empty_response() {
        let text_only: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "I can't"}]}}]
        }))
        .unwrap();
        let err = text_only.image_data().unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::EmptyResponse);
        assert_eq!(err.message, "No image data found in response");

        let nothing: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert_eq!(nothing.image_data().unwrap_err().message, "No content generated");
        assert_eq!(nothing.text(), "");
    }

    #[test]
    fn api_error_body_is_reduced_to_message() {
        let raw = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = readable(GenerationError::from_status(429, raw));
        assert_eq!(err.kind, GenerationErrorKind::Quota);
        assert_eq!(err.message, "Quota exceeded");

        let plain = readable(GenerationError::from_status(500, "oops"));
        assert_eq!(plain.message, "oops");
    }

    #[tokio::test]
    async fn missing_key_fails_for_both_operations() {
        let gemini =
            GeminiClient::new(None, GenerationModel::GeminiFlashImage, Duration::from_secs(5))
                .unwrap();
        let err = gemini.generate(&GenerationRequest::new("p")).await.unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::MissingCredentials);
        let err = gemini
            .analyze(&Bitmap::filled(1, 1, [0, 0, 0, 255]), "describe")
            .await
            .unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::MissingCredentials);
    }
}
