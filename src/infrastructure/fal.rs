// SPDX-License-Identifier: MPL-2.0
//! [`ImageGenerator`] for fal.ai hosted models.
//!
//! Calls the synchronous `https://fal.run/{model}` endpoint; edits go to
//! `{model}/edit` with the base image first in `image_urls`, followed by the
//! reference images. Images are sent inline as PNG data URIs.

use super::codec::ImageRsCodec;
use super::http;
use crate::application::port::{
    GenerationError, GenerationErrorKind, GenerationOutcome, GenerationRequest, ImageGenerator,
};
use crate::config::{defaults, Config};
use crate::domain::{Bitmap, CostTable, GenerationModel, ResolutionTier};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_ID_HEADER: &str = "x-fal-request-id";

#[derive(Debug, Serialize, PartialEq)]
struct FalInput {
    prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FalImage {
    url: Option<String>,
    file_data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FalResponse {
    #[serde(default)]
    images: Vec<FalImage>,
    image: Option<FalImage>,
    request_id: Option<String>,
}

/// Where the result image lives.
#[derive(Debug, PartialEq)]
enum ImageSource {
    Remote(String),
    Inline(String),
}

impl FalResponse {
    fn image_source(self) -> Option<ImageSource> {
        let image = self.images.into_iter().next().or(self.image)?;
        if let Some(url) = image.url.filter(|u| !u.is_empty()) {
            return Some(match http::data_uri_payload(&url) {
                Some(payload) => ImageSource::Inline(payload.to_string()),
                None => ImageSource::Remote(url),
            });
        }
        image
            .file_data
            .filter(|d| !d.is_empty())
            .map(ImageSource::Inline)
    }
}

/// Client for fal.ai.
#[derive(Debug, Clone)]
pub struct FalClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: GenerationModel,
    system_instruction: Option<String>,
    costs: CostTable,
    codec: ImageRsCodec,
}

impl FalClient {
    /// Creates a client against the public endpoint.
    ///
    /// A missing key is only reported when a request is made.
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
            base_url: defaults::DEFAULT_FAL_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            system_instruction: None,
            costs: CostTable::default(),
            codec: ImageRsCodec,
        })
    }

    /// Builds a client from settings (key, endpoint, timeout, model).
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be built.
    pub fn from_config(config: &Config, model: GenerationModel) -> Result<Self, GenerationError> {
        let client = Self::new(config.fal_api_key.clone(), model, config.request_timeout())?
            .with_base_url(config.fal_base_url());
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

    /// Instruction used when a request carries none.
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    fn endpoint(&self, is_edit: bool) -> String {
        format!("{}/{}", self.base_url, self.model.billing_key(is_edit))
    }

    fn build_input(&self, request: &GenerationRequest) -> Result<FalInput, GenerationError> {
        let mut image_urls = Vec::new();
        if let Some(base) = &request.base_image {
            image_urls.push(http::png_data_uri(&self.codec, base)?);
            for reference in &request.reference_images {
                image_urls.push(http::png_data_uri(&self.codec, reference)?);
            }
        }
        let system_prompt = request
            .style_instruction
            .clone()
            .or_else(|| self.system_instruction.clone())
            .filter(|s| !s.trim().is_empty());

        Ok(FalInput {
            prompt: request.region_prompt(),
            image_urls,
            aspect_ratio: request.aspect_ratio.map(|a| a.as_str()),
            image_size: request.resolution_for(self.model).map(ResolutionTier::as_str),
            system_prompt,
        })
    }

    async fn fetch_image(&self, source: ImageSource) -> Result<Bitmap, GenerationError> {
        let bytes = match source {
            ImageSource::Inline(data) => http::decode_base64(&data)?,
            ImageSource::Remote(url) => {
                tracing::debug!(%url, "downloading fal result");
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| http::transport_error(&e))?;
                let response = http::ensure_success(response).await?;
                response
                    .bytes()
                    .await
                    .map_err(|e| http::transport_error(&e))?
                    .to_vec()
            }
        };
        http::decode_image(&self.codec, &bytes)
    }
}

impl ImageGenerator for FalClient {
    fn model(&self) -> GenerationModel {
        self.model
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::new(
                GenerationErrorKind::MissingCredentials,
                "FAL_KEY is not configured",
            ));
        };
        let is_edit = request.is_edit();
        let endpoint = self.endpoint(is_edit);
        let input = self.build_input(request)?;
        tracing::info!(
            %endpoint,
            references = request.reference_images.len(),
            region = request.region_hint.is_some(),
            "sending fal request"
        );

        let response = self
            .client
            .post(&endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("Key {api_key}"))
            .json(&input)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response = http::ensure_success(response).await?;
        let header_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let payload: FalResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::decode(format!("invalid fal response: {e}")))?;
        let request_id = header_id.or_else(|| payload.request_id.clone());

        let source = payload.image_source().ok_or_else(|| {
            GenerationError::new(
                GenerationErrorKind::EmptyResponse,
                "fal returned no image",
            )
        })?;
        let image = self.fetch_image(source).await?;
        let cost = self
            .costs
            .cost_for(self.model, is_edit, image.width(), image.height());
        tracing::info!(
            width = image.width(),
            height = image.height(),
            cost,
            request_id = request_id.as_deref().unwrap_or("-"),
            "fal generation finished"
        );

        Ok(GenerationOutcome {
            image,
            cost_estimate: Some(cost),
            request_id,
        })
    }
}
