//! Anthropic Claude Messages API client with image input.

use async_trait::async_trait;
use reqwest::Client;
use rx_core::ProbeError;
use serde::{Deserialize, Serialize};

use crate::client::{log_metrics, transport_err, VisionMetrics, VisionModel, VisionRequest, VisionResponse};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    #[serde(default)]
    usage: Usage,
}

fn build_request<'a>(model: &'a str, request: &'a VisionRequest) -> AnthropicRequest<'a> {
    AnthropicRequest {
        model,
        max_tokens: MAX_TOKENS,
        temperature: request.temperature,
        messages: vec![AnthropicMessage {
            role: "user",
            content: vec![
                ContentBlock::Image {
                    source: ImageSource {
                        kind: "base64",
                        media_type: request.image.media_type,
                        data: &request.image.base64,
                    },
                },
                ContentBlock::Text { text: &request.instruction },
            ],
        }],
    }
}

/// Client for Anthropic's Claude API.
pub struct AnthropicVisionClient {
    client: Client,
    model: String,
    api_key: String,
    api_url: String,
}

impl AnthropicVisionClient {
    pub fn new(model: &str, api_key: &str) -> Self {
        tracing::info!("AnthropicVisionClient: model={}, api_key_len={}", model, api_key.len());
        Self {
            client: Client::new(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            api_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Points the client at a different Messages endpoint.
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }
}

#[async_trait]
impl VisionModel for AnthropicVisionClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse, ProbeError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&build_request(&self.model, request))
            .send()
            .await
            .map_err(transport_err)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProbeError::Api { status, body });
        }

        let resp: MessagesResponse = response.json().await.map_err(transport_err)?;

        let content = resp
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        if content.is_empty() {
            return Err(ProbeError::EmptyResponse);
        }

        let metrics = VisionMetrics {
            input_tokens: resp.usage.input_tokens.unwrap_or(0),
            output_tokens: resp.usage.output_tokens.unwrap_or(0),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        log_metrics("Anthropic", &metrics);

        Ok(VisionResponse { content, metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::EncodedImage;
    use serde_json::json;

    #[test]
    fn request_puts_image_before_text() {
        let request = VisionRequest {
            instruction: "Read it.".into(),
            image: EncodedImage {
                media_type: "image/png",
                base64: "AQID".into(),
            },
            temperature: 0.5,
        };

        let body = serde_json::to_value(build_request("claude-sonnet-4-5", &request)).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "claude-sonnet-4-5",
                "max_tokens": 4096,
                "temperature": 0.5,
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "AQID"}},
                        {"type": "text", "text": "Read it."}
                    ]
                }]
            })
        );
    }

    #[test]
    fn response_skips_non_text_blocks() {
        let resp: MessagesResponse = serde_json::from_value(json!({
            "content": [{"type": "thinking"}, {"type": "text", "text": "{\"a\":1}"}],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }))
        .unwrap();

        let texts: Vec<String> = resp.content.into_iter().filter_map(|c| c.text).collect();
        assert_eq!(texts, vec!["{\"a\":1}".to_string()]);
        assert_eq!(resp.usage.input_tokens, Some(12));
    }
}
