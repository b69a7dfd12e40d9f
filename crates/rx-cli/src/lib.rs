//! Shared start-up for the probe binaries.

use anyhow::Result;
use rx_core::ProbeOutcome;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Fallback credential file read when `--env-file` is not given.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Logs go to stderr so stdout carries only the probe report.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();
}

/// Logs how the probe ended.
///
/// Every outcome has already been reported on stdout, so none of them is a
/// process failure. Only an error writing the report ends the run non-zero.
pub fn finish<T>(probe: &str, outcome: &ProbeOutcome<T>) -> Result<()> {
    info!(outcome = outcome.label(), "{} finished", probe);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_outcomes_finish_cleanly() {
        assert!(finish("OCR probe", &ProbeOutcome::Success("{}")).is_ok());
        assert!(finish("OCR probe", &ProbeOutcome::<()>::TransportFailure("connection refused".into())).is_ok());
        assert!(finish("OCR probe", &ProbeOutcome::<()>::ConfigurationInvalid("File not found".into())).is_ok());
        assert!(finish("Database probe", &ProbeOutcome::<()>::Empty).is_ok());
    }
}
