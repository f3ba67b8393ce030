//! SheetPilot backend exchange — v1 frozen wire format.
//!
//! This crate defines the canonical payloads exchanged with the remote
//! inference backend: the command/response exchange and the upload
//! exchange. The wire format is JSON with snake_case keys.
//!
//! The transport itself is out of scope here; `Backend` is the seam an
//! actual transport (or a local stand-in) implements. Changes to the wire
//! shapes require a version bump in `PROTOCOL_VERSION`.

use serde::{Deserialize, Serialize};

pub mod chart;

pub use chart::ChartPayload;

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Reply to a natural-language command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandReply {
    /// Whether the backend understood and executed the command
    pub ok: bool,
    /// Human-readable result text (may embed a leading numeric token)
    pub note: String,
    /// Optional chart image produced alongside the note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartPayload>,
}

impl CommandReply {
    pub fn text(note: impl Into<String>) -> Self {
        Self { ok: true, note: note.into(), chart: None }
    }

    pub fn failure(note: impl Into<String>) -> Self {
        Self { ok: false, note: note.into(), chart: None }
    }
}

/// Reply to a completed tabular upload.
///
/// `rows` is header-free: `headers` carries the column names once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReply {
    pub file_id: String,
    pub original_name: String,
    #[serde(rename = "parsed_headers")]
    pub headers: Vec<String>,
    pub parsed_row_count: usize,
    pub rows: Vec<Vec<String>>,
}

/// Error from a backend exchange.
#[derive(Debug)]
pub enum BackendError {
    /// Backend unreachable or transport-level failure
    Transport(String),
    /// Backend answered but the payload did not parse
    Malformed(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "Backend unreachable: {}", msg),
            BackendError::Malformed(msg) => write!(f, "Malformed backend reply: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// The command-exchange seam. One natural-language command in, one reply
/// out. Implementations must not retry internally; the caller owns retry
/// policy (which, for the placement protocol, is "the user types it again").
pub trait Backend {
    fn send_command(&mut self, text: &str) -> Result<CommandReply, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_reply_wire_shape() {
        let reply = CommandReply {
            ok: true,
            note: "Sum of Amount: 42.5".to_string(),
            chart: None,
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"ok":true,"note":"Sum of Amount: 42.5"}"#);
    }

    #[test]
    fn test_upload_reply_round_trip() {
        let json = r#"{
            "file_id": "f-1",
            "original_name": "sales.csv",
            "parsed_headers": ["Region", "Total"],
            "parsed_row_count": 1,
            "rows": [["East", "10"]]
        }"#;
        let upload: UploadReply = serde_json::from_str(json).unwrap();
        assert_eq!(upload.headers, vec!["Region", "Total"]);
        assert_eq!(upload.parsed_row_count, 1);
        assert_eq!(upload.rows[0][1], "10");
    }

    #[test]
    fn test_chart_field_optional_on_wire() {
        let reply: CommandReply = serde_json::from_str(r#"{"ok":false,"note":"no"}"#).unwrap();
        assert!(reply.chart.is_none());
        assert!(!reply.ok);
    }
}
