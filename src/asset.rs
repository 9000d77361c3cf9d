//! Generated assets: the immutable result of a successful generation.

use crate::error::MediaError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// MIME type the image service returns by default.
pub const PNG_MIME: &str = "image/png";

/// Image payload returned for a prompt.
///
/// Held behind an `Arc` once produced and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAsset {
    /// Base64 text exactly as delivered by the service.
    pub encoded_payload: String,
    pub mime_hint: String,
}

impl GeneratedAsset {
    pub fn new(encoded_payload: impl Into<String>, mime_hint: impl Into<String>) -> Self {
        Self {
            encoded_payload: encoded_payload.into(),
            mime_hint: mime_hint.into(),
        }
    }

    pub fn png(encoded_payload: impl Into<String>) -> Self {
        Self::new(encoded_payload, PNG_MIME)
    }

    /// Directly renderable image source: `data:<mime>;base64,<payload>`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_hint, self.encoded_payload)
    }

    /// Decode the payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, MediaError> {
        STANDARD
            .decode(self.encoded_payload.trim())
            .map_err(|e| MediaError::Decode(e.to_string()))
    }

    /// blake3 fingerprint of the encoded payload, hex encoded.
    pub fn fingerprint(&self) -> String {
        hex::encode(blake3::hash(self.encoded_payload.as_bytes()).as_bytes())
    }

    /// File extension matching the MIME hint, for writing decoded bytes.
    pub fn file_extension(&self) -> &'static str {
        match self.mime_hint.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}
