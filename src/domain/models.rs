use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LANGUAGE: &str = "English";

const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// Birth data for a horoscope reading. None of the fields are validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RashifalRequest {
    pub dob: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl RashifalRequest {
    pub fn language(&self) -> &str {
        resolve_language(self.language.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    pub language: Option<String>,
}

impl LanguageQuery {
    pub fn language(&self) -> &str {
        resolve_language(self.language.as_deref())
    }
}

/// Blank or missing languages fall back to English.
pub fn resolve_language(language: Option<&str>) -> &str {
    match language.map(str::trim) {
        Some(lang) if !lang.is_empty() => lang,
        _ => DEFAULT_LANGUAGE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageReadingKind {
    Palm,
    Face,
}

impl fmt::Display for ImageReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageReadingKind::Palm => write!(f, "palm"),
            ImageReadingKind::Face => write!(f, "face"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageUpload {
    /// Anything not declared as `image/*` is sent upstream as JPEG.
    pub fn new(bytes: Vec<u8>, declared_type: Option<&str>) -> Self {
        let mime_type = match declared_type {
            Some(mime) if mime.starts_with("image/") => mime.to_string(),
            _ => FALLBACK_IMAGE_MIME.to_string(),
        };
        Self { bytes, mime_type }
    }
}

/// What a reading endpoint does when the model gateway fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpstreamErrorPolicy {
    /// Answer 200 with the error text in place of the reading.
    #[default]
    Embed,
    /// Answer 502 Bad Gateway.
    Propagate,
}

impl FromStr for UpstreamErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embed" => Ok(UpstreamErrorPolicy::Embed),
            "propagate" => Ok(UpstreamErrorPolicy::Propagate),
            other => Err(format!("unknown upstream error policy '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub status: String,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RashifalResponse {
    pub status: String,
    pub rashifal: String,
}
