//! Image input handling for recognition providers.

use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AnimatchError, AnimatchResult};

/// MIME type assumed when a data URI header is missing or unrecognized.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

static DATA_URI_MIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(image/(?:png|jpeg|webp|jpg));base64,").expect("valid data uri regex")
});

static DATA_URI_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:(.*?);base64,").expect("valid data uri header regex"));

/// An image submitted for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// Raw encoded image bytes (PNG, JPEG, GIF, WebP).
    Bytes {
        data: Vec<u8>,
        mime_type: Option<String>,
    },
    /// A `data:<mime>;base64,<payload>` URI, as produced by browser uploads.
    DataUri(String),
    /// A remotely hosted image.
    Url(String),
}

/// Base64 payload plus MIME type, ready to inline into a provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Render back to a data URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

impl ImageInput {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            data: data.into(),
            mime_type: None,
        }
    }

    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self::DataUri(uri.into())
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Read an image file from disk.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> AnimatchResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(data))
    }

    /// The remote URL, if this input is one.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Convert to an inline base64 payload.
    ///
    /// Fails for URL inputs and for empty payloads.
    pub fn to_inline(&self) -> AnimatchResult<InlineImage> {
        match self {
            Self::Bytes { data, mime_type } => {
                if data.is_empty() {
                    return Err(AnimatchError::InvalidImage("No image data provided".to_string()));
                }
                let mime_type = match mime_type {
                    Some(mime) => mime.clone(),
                    None => detect_mime_type(data)?.to_string(),
                };
                Ok(InlineImage {
                    mime_type,
                    data: STANDARD.encode(data),
                })
            }
            Self::DataUri(uri) => parse_data_uri(uri),
            Self::Url(url) => Err(AnimatchError::InvalidImage(format!(
                "Remote image {} cannot be inlined",
                url
            ))),
        }
    }
}

/// Split a data URI into MIME type and base64 payload.
///
/// Unknown image types fall back to [`DEFAULT_MIME_TYPE`]; a string without a
/// data URI header is treated as a bare base64 payload.
pub fn parse_data_uri(uri: &str) -> AnimatchResult<InlineImage> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(AnimatchError::InvalidImage("No image data provided".to_string()));
    }

    let mime_type = DATA_URI_MIME
        .captures(uri)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

    let data = DATA_URI_HEADER.replace(uri, "").into_owned();
    if data.is_empty() {
        return Err(AnimatchError::InvalidImage("Data URI has no payload".to_string()));
    }

    Ok(InlineImage { mime_type, data })
}

/// Detect an image MIME type from its magic number.
pub fn detect_mime_type(content: &[u8]) -> AnimatchResult<&'static str> {
    if content.len() < 8 {
        return Err(AnimatchError::InvalidImage(
            "Content too short to detect format".to_string(),
        ));
    }

    if content.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Ok("image/png")
    } else if content.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Ok("image/jpeg")
    } else if content.starts_with(b"GIF87a") || content.starts_with(b"GIF89a") {
        Ok("image/gif")
    } else if content.starts_with(b"RIFF") && content.len() > 12 && &content[8..12] == b"WEBP" {
        Ok("image/webp")
    } else {
        Err(AnimatchError::InvalidImage("Unknown image format".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_uri_webp() {
        let inline = parse_data_uri("data:image/webp;base64,AAAA").unwrap();
        assert_eq!(inline.mime_type, "image/webp");
        assert_eq!(inline.data, "AAAA");
    }

    #[test]
    fn test_parse_data_uri_unknown_type_defaults_to_jpeg() {
        let inline = parse_data_uri("data:image/bmp;base64,Qk0=").unwrap();
        assert_eq!(inline.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(inline.data, "Qk0=");
    }

    #[test]
    fn test_parse_bare_base64() {
        let inline = parse_data_uri("iVBORw0KGgo=").unwrap();
        assert_eq!(inline.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(inline.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_parse_empty_data_uri() {
        assert!(parse_data_uri("  ").is_err());
        assert!(parse_data_uri("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_detect_png_and_jpeg() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime_type(&png).unwrap(), "image/png");
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(detect_mime_type(&jpeg).unwrap(), "image/jpeg");
    }

    #[test]
    fn test_detect_webp() {
        let mut webp = Vec::new();
        webp.extend_from_slice(b"RIFF");
        webp.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        webp.extend_from_slice(b"WEBP");
        webp.push(0x00);
        assert_eq!(detect_mime_type(&webp).unwrap(), "image/webp");
    }

    #[test]
    fn test_detect_unknown_and_short() {
        assert!(detect_mime_type(&[0u8; 8]).is_err());
        assert!(detect_mime_type(&[0x89, 0x50]).is_err());
    }

    #[test]
    fn test_bytes_to_inline() {
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let inline = ImageInput::from_bytes(png.clone()).to_inline().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, STANDARD.encode(&png));
        assert!(inline.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_empty_bytes_rejected() {
        let err = ImageInput::from_bytes(Vec::new()).to_inline().unwrap_err();
        assert!(matches!(err, AnimatchError::InvalidImage(_)));
    }

    #[test]
    fn test_url_cannot_inline() {
        let input = ImageInput::from_url("https://example.com/a.png");
        assert_eq!(input.as_url(), Some("https://example.com/a.png"));
        assert!(input.to_inline().is_err());
    }
}
