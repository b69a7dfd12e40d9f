use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rx_config::{Credentials, VisionSettings, DEFAULT_TEMPERATURE, DEFAULT_VISION_MODEL};
use rx_core::ProbeOutcome;
use rx_vision::UnifiedVisionClient;
use tracing::warn;

#[derive(Parser)]
#[command(name = "ocr-probe")]
#[command(about = "Send one prescription image to a vision model and print the extracted fields")]
struct Cli {
    /// Prescription image to analyze
    #[arg(env = "RX_IMAGE_PATH")]
    image: PathBuf,
    /// Vision model (claude-* models are sent to Anthropic)
    #[arg(long, default_value = DEFAULT_VISION_MODEL)]
    model: String,
    /// Sampling temperature
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,
    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,
    /// Dotenv file with fallback credentials
    #[arg(long, default_value = rx_cli::DEFAULT_ENV_FILE)]
    env_file: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    rx_cli::init_tracing();

    let credentials = Credentials::load(&cli.env_file)?;
    let settings = VisionSettings {
        model: cli.model,
        temperature: cli.temperature,
        api_base: cli.api_base,
    };

    let mut stdout = io::stdout().lock();

    let client = match UnifiedVisionClient::from_settings(&settings, &credentials) {
        Ok(client) => client,
        Err(e) => {
            warn!("{}", e);
            writeln!(stdout, "Error: {}", e)?;
            return rx_cli::finish("OCR probe", &ProbeOutcome::<()>::ConfigurationInvalid(e.to_string()));
        }
    };

    let outcome = rx_vision::run(&client, &cli.image, settings.temperature, &mut stdout).await?;
    rx_cli::finish("OCR probe", &outcome)
}
