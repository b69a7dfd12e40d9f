//! Core domain types, error definitions, and probe outcomes.
//!
//! This crate defines the types shared by both probes: the prescription record
//! shape, the error enum raised by the network clients, and the closed set of
//! outcomes a probe run can end in.

use std::path::PathBuf;

use thiserror::Error;

mod prescription;

pub use prescription::{Medication, Prescription, NOT_AVAILABLE};

/// Errors that can occur while a probe talks to a remote service.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("No response content")]
    EmptyResponse,

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Parse(err.to_string())
    }
}

/// How a probe run ended.
///
/// Every run prints a human-readable report; this is the machine-readable
/// counterpart so callers can branch on kind instead of parsing text.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    /// The remote call returned a payload.
    Success(T),
    /// The remote call succeeded but returned nothing.
    Empty,
    /// Network, auth, or API-level failure.
    TransportFailure(String),
    /// A precondition failed before any network call was made.
    ConfigurationInvalid(String),
}

impl<T> ProbeOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Success(_) => "success",
            ProbeOutcome::Empty => "empty",
            ProbeOutcome::TransportFailure(_) => "transport_failure",
            ProbeOutcome::ConfigurationInvalid(_) => "configuration_invalid",
        }
    }
}

impl<T> From<ProbeError> for ProbeOutcome<T> {
    fn from(err: ProbeError) -> Self {
        match err {
            err @ ProbeError::Io { .. } => ProbeOutcome::ConfigurationInvalid(err.to_string()),
            ProbeError::EmptyResponse => ProbeOutcome::Empty,
            other => ProbeOutcome::TransportFailure(other.to_string()),
        }
    }
}
