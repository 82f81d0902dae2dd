//! Inbound frame classification and constructed responses
//!
//! Classification is a pure function over a minimal envelope: just enough
//! fields to route per the responder's dispatch table. Unknown discriminants
//! classify as [`Request::Unknown`] and draw no response, matching the real
//! peer's permissive behaviour.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single access token the responder accepts on `auth`.
pub const ACCEPTED_ACCESS_TOKEN: &str = "ABCDEFGHIJKLMNOPQ";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    id: u64,
    #[serde(default)]
    access_token: String,
}

/// A classified inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Auth { access_token: String },
    SubscribeEvents { id: u64 },
    GetStates { id: u64 },
    Ping { id: u64 },
    /// Test-only control signal, not a real protocol message.
    FakeDisconnect,
    /// Anything else; deliberately ignored rather than rejected.
    Unknown,
}

/// Decode the envelope of one inbound frame and classify it.
pub fn classify(raw: &[u8]) -> serde_json::Result<Request> {
    let envelope: Envelope = serde_json::from_slice(raw)?;
    Ok(match envelope.kind.as_str() {
        "auth" => Request::Auth {
            access_token: envelope.access_token,
        },
        "subscribe_events" => Request::SubscribeEvents { id: envelope.id },
        "get_states" => Request::GetStates { id: envelope.id },
        "ping" => Request::Ping { id: envelope.id },
        "fake_disconnect_test" => Request::FakeDisconnect,
        _ => Request::Unknown,
    })
}

/// Generic command response, echoing the request id.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub success: bool,
    pub result: Value,
}

impl ResultResponse {
    pub fn ok(id: u64) -> Self {
        Self {
            id,
            kind: "result",
            success: true,
            result: Value::String("some result".to_string()),
        }
    }

    /// Serialize pretty-printed, the way the real peer always responds.
    pub fn to_pretty_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
