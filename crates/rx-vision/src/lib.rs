//! Prescription OCR probe over hosted vision-language models.
//!
//! Encodes an image, sends it with a fixed extraction prompt to an OpenAI-compatible
//! or Anthropic endpoint, and reports the reply.

mod anthropic;
mod client;
mod image;
pub mod probe;
mod prompts;
mod unified;

pub use anthropic::AnthropicVisionClient;
pub use client::{OpenAiVisionClient, VisionMetrics, VisionModel, VisionRequest, VisionResponse};
pub use image::{encode, media_type_for, EncodedImage};
pub use probe::{analyze, analyze_outcome, run, Extraction};
pub use prompts::EXTRACTION_PROMPT;
pub use unified::{ProviderType, UnifiedVisionClient};
