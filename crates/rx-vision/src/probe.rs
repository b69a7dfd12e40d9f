//! The OCR probe: send one image, print what comes back.

use std::io::{self, Write};
use std::path::Path;

use rx_core::{Prescription, ProbeOutcome};
use tracing::{info, warn};

use crate::client::{VisionMetrics, VisionModel, VisionRequest};
use crate::image::EncodedImage;
use crate::prompts::EXTRACTION_PROMPT;

/// What the model said about one image.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The reply exactly as returned.
    pub raw: String,
    /// The reply parsed as a prescription, when it conforms.
    pub record: Option<Prescription>,
    pub metrics: VisionMetrics,
}

/// Encodes `path`, sends it with the extraction prompt, and classifies the result.
pub async fn analyze_outcome(
    model: &dyn VisionModel,
    path: &Path,
    temperature: f32,
) -> ProbeOutcome<Extraction> {
    let image = match EncodedImage::from_path(path) {
        Ok(image) => image,
        Err(e) => return e.into(),
    };

    let request = VisionRequest {
        instruction: EXTRACTION_PROMPT.to_string(),
        image,
        temperature,
    };

    info!("Sending {} to {}", path.display(), model.model());
    let response = match model.complete(&request).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Vision call failed: {}", e);
            return e.into();
        }
    };

    let record = match serde_json::from_str::<Prescription>(&response.content) {
        Ok(record) => {
            let unreadable = record.unreadable_fields();
            if !unreadable.is_empty() {
                info!("Unreadable fields: {}", unreadable.join(", "));
            }
            for query in record.medications.iter().filter_map(|m| m.pharmacy_search_query()) {
                info!("Pharmacy search: {}", query);
            }
            Some(record)
        }
        Err(e) => {
            warn!("Reply is not a prescription record: {}", e);
            None
        }
    };

    ProbeOutcome::Success(Extraction {
        raw: response.content,
        record,
        metrics: response.metrics,
    })
}

/// Text form of [`analyze_outcome`]: the raw reply, or `Error: <detail>`.
pub async fn analyze(model: &dyn VisionModel, path: &Path, temperature: f32) -> String {
    render(&analyze_outcome(model, path, temperature).await)
}

fn render(outcome: &ProbeOutcome<Extraction>) -> String {
    match outcome {
        ProbeOutcome::Success(extraction) => extraction.raw.clone(),
        ProbeOutcome::Empty => "Error: No response content".to_string(),
        ProbeOutcome::TransportFailure(detail) | ProbeOutcome::ConfigurationInvalid(detail) => {
            format!("Error: {}", detail)
        }
    }
}

/// Probe entry point. Prints the report to `out` and returns the outcome.
///
/// A missing image is reported without touching the model.
pub async fn run<W: Write>(
    model: &dyn VisionModel,
    image_path: &Path,
    temperature: f32,
    out: &mut W,
) -> io::Result<ProbeOutcome<Extraction>> {
    if !image_path.exists() {
        writeln!(out, "Error: File not found at {}", image_path.display())?;
        return Ok(ProbeOutcome::ConfigurationInvalid(format!(
            "File not found at {}",
            image_path.display()
        )));
    }

    writeln!(out, "Analyzing {}...", image_path.display())?;
    let outcome = analyze_outcome(model, image_path, temperature).await;
    writeln!(out, "\n--- Result ---\n")?;
    writeln!(out, "{}", render(&outcome))?;

    Ok(outcome)
}
