//! Unified vision client that routes to the appropriate provider based on model name.

use async_trait::async_trait;
use rx_config::{ConfigError, CredentialKey, Credentials, VisionSettings};
use rx_core::ProbeError;

use crate::anthropic::AnthropicVisionClient;
use crate::client::{OpenAiVisionClient, VisionModel, VisionRequest, VisionResponse};

/// Provider type determined from model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Anthropic,
}

impl ProviderType {
    pub fn for_model(model: &str) -> Self {
        match model.starts_with("claude-") {
            true => ProviderType::Anthropic,
            false => ProviderType::OpenAI,
        }
    }

    /// The credential this provider authenticates with.
    pub fn credential(&self) -> CredentialKey {
        match self {
            ProviderType::OpenAI => CredentialKey::OpenAiApiKey,
            ProviderType::Anthropic => CredentialKey::ClaudeApiKey,
        }
    }
}

/// Client that sends requests to OpenAI or Anthropic depending on the configured model.
pub enum UnifiedVisionClient {
    OpenAI(OpenAiVisionClient),
    Anthropic(AnthropicVisionClient),
}

impl UnifiedVisionClient {
    /// Builds the client for `settings.model`, failing fast if its key is missing.
    pub fn from_settings(settings: &VisionSettings, credentials: &Credentials) -> Result<Self, ConfigError> {
        let provider = ProviderType::for_model(&settings.model);
        let api_key = credentials.require(provider.credential())?;

        Ok(match provider {
            ProviderType::OpenAI => UnifiedVisionClient::OpenAI(OpenAiVisionClient::new(
                &settings.model,
                api_key,
                settings.api_base.as_deref(),
            )),
            ProviderType::Anthropic => {
                UnifiedVisionClient::Anthropic(AnthropicVisionClient::new(&settings.model, api_key))
            }
        })
    }

    pub fn provider(&self) -> ProviderType {
        match self {
            UnifiedVisionClient::OpenAI(_) => ProviderType::OpenAI,
            UnifiedVisionClient::Anthropic(_) => ProviderType::Anthropic,
        }
    }
}

#[async_trait]
impl VisionModel for UnifiedVisionClient {
    fn model(&self) -> &str {
        match self {
            UnifiedVisionClient::OpenAI(c) => c.model(),
            UnifiedVisionClient::Anthropic(c) => c.model(),
        }
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse, ProbeError> {
        match self {
            UnifiedVisionClient::OpenAI(c) => c.complete(request).await,
            UnifiedVisionClient::Anthropic(c) => c.complete(request).await,
        }
    }
}
