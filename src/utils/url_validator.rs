//! Well-formedness check for URLs submitted to `/shorten`
//!
//! Only shape is checked: scheme, parseability and host. Reachability and
//! content are not.

use std::fmt;

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    Empty,
    SurroundingWhitespace,
    DangerousScheme(String),
    UnsupportedScheme(String),
    Malformed(String),
    MissingHost,
}

impl fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "URL cannot be empty"),
            Self::SurroundingWhitespace => {
                write!(f, "URL must not start or end with whitespace")
            }
            Self::DangerousScheme(scheme) => write!(f, "URL scheme '{}' is not allowed", scheme),
            Self::UnsupportedScheme(scheme) => write!(
                f,
                "URL scheme '{}' is not supported; use http:// or https://",
                scheme
            ),
            Self::Malformed(reason) => write!(f, "invalid URL: {}", reason),
            Self::MissingHost => write!(f, "URL must include a host"),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 直接拒绝的危险协议
const DANGEROUS_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

/// Accept an absolute `http`/`https` URL with a host.
///
/// The input is stored byte-for-byte, so it is not trimmed or normalized here.
pub fn validate_url(raw: &str) -> Result<(), UrlValidationError> {
    if raw.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if raw.trim() != raw {
        return Err(UrlValidationError::SurroundingWhitespace);
    }

    // 先按前缀识别协议，不依赖解析结果
    if let Some((scheme, _)) = raw.split_once(':') {
        let scheme = scheme.to_ascii_lowercase();
        if DANGEROUS_SCHEMES.contains(&scheme.as_str()) {
            return Err(UrlValidationError::DangerousScheme(scheme));
        }
    }

    let parsed = Url::parse(raw).map_err(|e| UrlValidationError::Malformed(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlValidationError::MissingHost),
    }
}
