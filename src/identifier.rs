//! EPREL registration number parsing
//!
//! Products carry a QR code pointing at `https://eprel.ec.europa.eu/qr/<digits>`.
//! The digits are the registration number used by every registry endpoint.

use std::fmt;

/// Host serving QR landing pages
const QR_HOST: &str = "eprel.ec.europa.eu";

/// Path prefix that precedes the registration number
const QR_PATH_PREFIX: &str = "/qr/";

/// EPREL registration number
///
/// Always a non-empty run of ASCII digits.
///
/// # Examples
///
/// ```
/// use eprel_downloader::identifier::EprelId;
///
/// let id = EprelId::from_qr_url("https://eprel.ec.europa.eu/qr/12345").unwrap();
/// assert_eq!(id.as_str(), "12345");
/// assert!(EprelId::from_qr_url("https://eprel.ec.europa.eu/qr/abc").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EprelId(String);

impl EprelId {
    /// Parse a bare registration number
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or contains anything but digits.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentifierError::InvalidFormat(
                "registration number cannot be empty".to_string(),
            ));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentifierError::InvalidFormat(format!(
                "registration number must be numeric, got '{s}'"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Extract the registration number from a QR code URL
    ///
    /// Accepts exactly `http(s)://eprel.ec.europa.eu/qr/<digits>`. Any other
    /// shape (other host, missing or non-numeric id, trailing slash, query
    /// string) yields `None` rather than an error.
    pub fn from_qr_url(url: &str) -> Option<Self> {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        let digits = rest.strip_prefix(QR_HOST)?.strip_prefix(QR_PATH_PREFIX)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(digits.to_string()))
    }

    /// Registration number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EprelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convenience wrapper returning the id as a plain string
pub fn extract_eprel_id(qr_url: &str) -> Option<String> {
    EprelId::from_qr_url(qr_url).map(|id| id.0)
}

/// Errors that can occur during identifier parsing
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    /// Invalid identifier format
    #[error("identifier error: {0}")]
    InvalidFormat(String),
}
