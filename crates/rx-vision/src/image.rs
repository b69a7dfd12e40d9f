//! Reading and base64-encoding prescription images.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use rx_core::ProbeError;

/// An image ready to embed in a model request.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub media_type: &'static str,
    pub base64: String,
}

impl EncodedImage {
    /// Reads `path` and encodes it, guessing the media type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, ProbeError> {
        Ok(Self {
            media_type: media_type_for(path),
            base64: encode(path)?,
        })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

/// Reads the whole file at `path` and returns its standard base64 encoding.
pub fn encode(path: &Path) -> Result<String, ProbeError> {
    let bytes = fs::read(path).map_err(|source| ProbeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

/// Media type for the data URL. Anything unrecognised is sent as JPEG.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}
