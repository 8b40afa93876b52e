//! Inbound frames — the canonical protocol as a closed tagged union.
//!
//! Every frame carries a `type` discriminator. [`ServerFrame::parse`]
//! distinguishes an unknown discriminator from a malformed body so the
//! dispatcher can log the right thing; neither outcome is ever fatal.

use serde::{Deserialize, Serialize};
use vantage_core::ProtocolError;

/// Discriminator strings of the closed canonical event set.
const KNOWN_KINDS: &[&str] = &[
    "ack",
    "node_started",
    "node_completed",
    "node_error",
    "final_response",
    "error",
];

/// One inbound frame from the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// The backend accepted the query and began a turn.
    Ack,

    /// A backend node (agent or tool) started work.
    NodeStarted {
        /// Node name, stable within the turn.
        node: String,
        /// Backend-side start timestamp (informational).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },

    /// A backend node finished successfully.
    NodeCompleted {
        /// Node name as announced in `node_started`.
        node: String,
        /// Wall-clock duration of the node in milliseconds.
        #[serde(default)]
        elapsed_ms: u64,
        /// Short human-readable summary of the node's output.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preview: Option<String>,
    },

    /// A backend node failed.
    NodeError {
        /// Node name as announced in `node_started`.
        node: String,
        /// Failure description.
        error: String,
    },

    /// Terminal success: the full response for the turn.
    FinalResponse {
        /// Complete assistant response text.
        response: String,
        /// Turn-level metadata.
        metadata: ResponseMetadata,
    },

    /// Terminal failure reported by the backend.
    Error {
        /// Error text for the turn.
        message: String,
    },
}

/// Metadata attached to a terminal `final_response` frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Total turn duration in milliseconds.
    #[serde(default)]
    pub total_elapsed_ms: u64,
}

impl ServerFrame {
    /// The frame's discriminator string as it appears on the wire.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::NodeStarted { .. } => "node_started",
            Self::NodeCompleted { .. } => "node_completed",
            Self::NodeError { .. } => "node_error",
            Self::FinalResponse { .. } => "final_response",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this frame terminates its turn.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalResponse { .. } | Self::Error { .. })
    }

    /// Parse one inbound text frame.
    ///
    /// An unrecognized `type` yields [`ProtocolError::UnknownKind`];
    /// anything else that fails to deserialize yields
    /// [`ProtocolError::Malformed`].
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        match serde_json::from_str::<Self>(text) {
            Ok(frame) => Ok(frame),
            Err(err) => {
                // Pull the discriminator back out to classify the failure.
                let kind = serde_json::from_str::<serde_json::Value>(text)
                    .ok()
                    .and_then(|v| v.get("type").and_then(|t| t.as_str().map(String::from)));
                match kind {
                    Some(kind) if !KNOWN_KINDS.contains(&kind.as_str()) => {
                        Err(ProtocolError::UnknownKind { kind })
                    }
                    _ => Err(ProtocolError::Malformed {
                        message: err.to_string(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_ack() {
        let frame = ServerFrame::parse(r#"{"type":"ack"}"#).unwrap();
        assert_eq!(frame, ServerFrame::Ack);
        assert!(!frame.is_terminal());
    }

    #[test]
    fn parse_node_started() {
        let frame = ServerFrame::parse(
            r#"{"type":"node_started","node":"market_data","timestamp":"2026-08-05T14:00:00Z"}"#,
        )
        .unwrap();
        assert_matches!(frame, ServerFrame::NodeStarted { ref node, .. } if node == "market_data");
    }

    #[test]
    fn parse_node_started_without_timestamp() {
        let frame = ServerFrame::parse(r#"{"type":"node_started","node":"screener"}"#).unwrap();
        assert_matches!(
            frame,
            ServerFrame::NodeStarted {
                timestamp: None,
                ..
            }
        );
    }

    #[test]
    fn parse_node_completed() {
        let frame = ServerFrame::parse(
            r#"{"type":"node_completed","node":"market_data","elapsed_ms":800,"preview":"42 tickers"}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            ServerFrame::NodeCompleted {
                node: "market_data".into(),
                elapsed_ms: 800,
                preview: Some("42 tickers".into()),
            }
        );
    }

    #[test]
    fn parse_node_error() {
        let frame =
            ServerFrame::parse(r#"{"type":"node_error","node":"screener","error":"rate limited"}"#)
                .unwrap();
        assert_matches!(frame, ServerFrame::NodeError { ref error, .. } if error == "rate limited");
    }

    #[test]
    fn parse_final_response() {
        let frame = ServerFrame::parse(
            r#"{"type":"final_response","response":"Here are the gainers.","metadata":{"total_elapsed_ms":1200}}"#,
        )
        .unwrap();
        assert!(frame.is_terminal());
        assert_matches!(
            frame,
            ServerFrame::FinalResponse { metadata: ResponseMetadata { total_elapsed_ms: 1200 }, .. }
        );
    }

    #[test]
    fn parse_error_frame() {
        let frame = ServerFrame::parse(r#"{"type":"error","message":"model overloaded"}"#).unwrap();
        assert!(frame.is_terminal());
    }

    #[test]
    fn unknown_kind_is_classified() {
        let err = ServerFrame::parse(r#"{"type":"market_update","session":{}}"#).unwrap_err();
        assert_matches!(err, ProtocolError::UnknownKind { ref kind } if kind == "market_update");
    }

    #[test]
    fn malformed_json_is_classified() {
        let err = ServerFrame::parse("{not json").unwrap_err();
        assert_matches!(err, ProtocolError::Malformed { .. });
    }

    #[test]
    fn known_kind_with_bad_body_is_malformed() {
        // node_error requires an `error` field
        let err = ServerFrame::parse(r#"{"type":"node_error","node":"x"}"#).unwrap_err();
        assert_matches!(err, ProtocolError::Malformed { .. });
    }

    #[test]
    fn missing_type_is_malformed() {
        let err = ServerFrame::parse(r#"{"node":"x"}"#).unwrap_err();
        assert_matches!(err, ProtocolError::Malformed { .. });
    }

    #[test]
    fn kind_strings_match_wire() {
        assert_eq!(ServerFrame::Ack.kind(), "ack");
        let frame = ServerFrame::NodeCompleted {
            node: "n".into(),
            elapsed_ms: 1,
            preview: None,
        };
        assert_eq!(frame.kind(), "node_completed");
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "node_completed");
    }

    #[test]
    fn every_known_kind_round_trips() {
        for kind in super::KNOWN_KINDS {
            // Each known discriminator must at least be recognized; bodies
            // differ, so only assert the classification is never UnknownKind.
            let text = format!(r#"{{"type":"{kind}"}}"#);
            match ServerFrame::parse(&text) {
                Ok(_) => {}
                Err(err) => assert_matches!(err, ProtocolError::Malformed { .. }),
            }
        }
    }
}
