//! Credential store and probe settings.
//!
//! Credentials are resolved once at startup into an explicit [`Credentials`] value
//! and passed to whatever needs them. Each key is taken from the environment when
//! set and non-empty, otherwise from a dotenv-format fallback table supplied at
//! runtime. Nothing secret is compiled in.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

/// Configuration loading errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read fallback file: {0}")]
    Fallback(#[from] dotenvy::Error),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

/// The credentials the probes know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    OpenAiApiKey,
    SupabaseUrl,
    SupabaseKey,
    ClaudeApiKey,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 4] = [
        CredentialKey::OpenAiApiKey,
        CredentialKey::SupabaseUrl,
        CredentialKey::SupabaseKey,
        CredentialKey::ClaudeApiKey,
    ];

    /// Environment variable holding this credential.
    pub fn env_var(&self) -> &'static str {
        match self {
            CredentialKey::OpenAiApiKey => "OPENAI_API_KEY",
            CredentialKey::SupabaseUrl => "SUPABASE_URL",
            CredentialKey::SupabaseKey => "SUPABASE_KEY",
            CredentialKey::ClaudeApiKey => "CLAUDE_API_KEY",
        }
    }

    /// Whether the value may be printed in full.
    pub fn is_secret(&self) -> bool {
        !matches!(self, CredentialKey::SupabaseUrl)
    }
}

/// Fallback values used when the environment leaves a credential unset.
#[derive(Debug, Clone, Default)]
pub struct Fallbacks {
    values: HashMap<String, String>,
}

impl Fallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a dotenv-format file. A missing file yields an empty table.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => {
                debug!("No fallback file at {}", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut values = HashMap::new();
        for item in iter {
            let (key, value) = item?;
            values.insert(key, value);
        }
        debug!("Loaded {} fallback entries from {}", values.len(), path.display());
        Ok(Self { values })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, env_var: &str) -> Option<&str> {
        self.values.get(env_var).map(String::as_str)
    }
}

/// Resolved credentials, fixed for the life of the process.
#[derive(Clone, Default)]
pub struct Credentials {
    values: HashMap<CredentialKey, String>,
}

impl Credentials {
    /// Resolves every key from the process environment, falling back to `env_file`.
    pub fn load(env_file: &Path) -> Result<Self, ConfigError> {
        let fallbacks = Fallbacks::from_file(env_file)?;
        Ok(Self::from_sources(|name| std::env::var(name).ok(), &fallbacks))
    }

    /// Resolves every key from `lookup`, falling back to `fallbacks`.
    ///
    /// An empty value from `lookup` counts as unset.
    pub fn from_sources(lookup: impl Fn(&str) -> Option<String>, fallbacks: &Fallbacks) -> Self {
        let mut values = HashMap::new();

        for key in CredentialKey::ALL {
            let name = key.env_var();
            let resolved = match lookup(name).filter(|v| !v.is_empty()) {
                Some(v) => {
                    debug!("{} resolved from environment", name);
                    Some(v)
                }
                None => {
                    let fallback = fallbacks.get(name).map(str::to_string);
                    if fallback.is_some() {
                        debug!("{} resolved from fallback table", name);
                    }
                    fallback
                }
            };
            if let Some(v) = resolved {
                values.insert(key, v);
            }
        }

        Self { values }
    }

    pub fn get(&self, key: CredentialKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Like [`Credentials::get`], but a missing value is an error.
    pub fn require(&self, key: CredentialKey) -> Result<&str, ConfigError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingCredential(key.env_var()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in CredentialKey::ALL {
            let shown = match self.get(key) {
                None => "<unset>",
                Some(_) if key.is_secret() => "<redacted>",
                Some(v) => v,
            };
            map.entry(&key.env_var(), &shown);
        }
        map.finish()
    }
}

pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_TABLE: &str = "prescriptions";

/// Settings for the OCR probe's model call.
#[derive(Debug, Clone)]
pub struct VisionSettings {
    pub model: String,
    pub temperature: f32,
    /// OpenAI-compatible base URL; `None` uses the provider default.
    pub api_base: Option<String>,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_VISION_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            api_base: None,
        }
    }
}

/// Settings for the database probe.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub table: String,
    pub timeout: Duration,
    /// Delete the inserted row again after a successful insert.
    pub cleanup: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            timeout: Duration::from_secs(30),
            cleanup: false,
        }
    }
}
