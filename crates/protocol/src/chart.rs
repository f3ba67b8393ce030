//! Chart image payloads.
//!
//! Backends send chart images as data URLs (`data:image/png;base64,...`)
//! or as bare base64. `decode` strips any data-URL prefix before decoding;
//! hosts want raw bytes.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// A base64-encoded chart image as received from the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChartPayload(pub String);

/// Error decoding a chart payload.
#[derive(Debug)]
pub struct ChartDecodeError(pub String);

impl std::fmt::Display for ChartDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid chart payload: {}", self.0)
    }
}

impl std::error::Error for ChartDecodeError {}

impl ChartPayload {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    /// The base64 body with any `data:<mime>;base64,` prefix stripped.
    pub fn base64_body(&self) -> &str {
        let s = self.0.trim();
        if s.starts_with("data:") {
            match s.find("base64,") {
                Some(idx) => &s[idx + "base64,".len()..],
                // data URL without a base64 marker; decode will reject it
                None => s,
            }
        } else {
            s
        }
    }

    /// Decode to raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ChartDecodeError> {
        base64::engine::general_purpose::STANDARD
            .decode(self.base64_body())
            .map_err(|e| ChartDecodeError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_data_url_prefix() {
        let payload = ChartPayload::new("data:image/png;base64,AQID");
        assert_eq!(payload.base64_body(), "AQID");
        assert_eq!(payload.decode().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_bare_base64_accepted() {
        let payload = ChartPayload::new("AQID");
        assert_eq!(payload.decode().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_garbage_rejected() {
        let payload = ChartPayload::new("not base64 at all!");
        assert!(payload.decode().is_err());
    }
}
