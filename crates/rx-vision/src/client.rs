//! OpenAI-compatible vision client.
//!
//! Sends one user message carrying the instruction and an embedded data-URL
//! image, asking for a JSON-object reply.

use std::time::Instant;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, ImageUrlArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use rx_core::ProbeError;
use tracing::info;

use crate::image::EncodedImage;

/// Token usage and timing metrics from a model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionMetrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

/// Complete response from a model call.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub metrics: VisionMetrics,
}

/// One extraction request: an instruction and the image it applies to.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub instruction: String,
    pub image: EncodedImage,
    pub temperature: f32,
}

/// A hosted model that can read an image and answer in text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse, ProbeError>;
}

/// Converts any error into a `ProbeError::Transport`.
pub(crate) fn transport_err(e: impl ToString) -> ProbeError {
    ProbeError::Transport(e.to_string())
}

pub(crate) fn log_metrics(provider: &str, metrics: &VisionMetrics) {
    info!(
        "{}: {}ms, tokens: {}/{} (in/out)",
        provider, metrics.elapsed_ms, metrics.input_tokens, metrics.output_tokens
    );
}

/// Extracts content and metrics from a completion response.
fn extract_response(
    response: CreateChatCompletionResponse,
    elapsed_ms: u64,
) -> Result<VisionResponse, ProbeError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.is_empty())
        .ok_or(ProbeError::EmptyResponse)?;

    let (input_tokens, output_tokens) = response
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    let metrics = VisionMetrics { input_tokens, output_tokens, elapsed_ms };
    log_metrics("OpenAI", &metrics);

    Ok(VisionResponse { content, metrics })
}

/// Builds the single user message: instruction text followed by the image.
fn build_message(request: &VisionRequest) -> Result<ChatCompletionRequestMessage, ProbeError> {
    let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
        ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(request.instruction.as_str())
            .build()
            .map_err(transport_err)?
            .into(),
        ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(
                ImageUrlArgs::default()
                    .url(request.image.data_url())
                    .build()
                    .map_err(transport_err)?,
            )
            .build()
            .map_err(transport_err)?
            .into(),
    ];

    Ok(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessageArgs::default()
            .content(parts)
            .build()
            .map_err(transport_err)?,
    ))
}

/// Client for OpenAI-compatible chat completion APIs with image input.
pub struct OpenAiVisionClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiVisionClient {
    /// Creates a client for `model`, optionally against a non-default base URL.
    pub fn new(model: &str, api_key: &str, api_base: Option<&str>) -> Self {
        let config = match api_base {
            Some(base) => OpenAIConfig::new().with_api_key(api_key).with_api_base(base),
            None => OpenAIConfig::new().with_api_key(api_key),
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse, ProbeError> {
        let start = Instant::now();

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![build_message(request)?])
            .response_format(ResponseFormat::JsonObject)
            .temperature(request.temperature)
            .build()
            .map_err(transport_err)?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(transport_err)?;

        extract_response(response, start.elapsed().as_millis() as u64)
    }
}
