//! Canned protocol payloads
//!
//! The doubles answer with fixed fixtures rather than constructed JSON so
//! client-side parsing tests can assert byte-for-byte. Each payload is
//! embedded once at compile time and shared read-only by any number of
//! simulated sessions, and is pretty-printed because the real peer always
//! pretty-prints.

/// One canonical response message, identified by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMessage {
    AuthRequired,
    AuthOk,
    AuthFail,
    ResultOk,
    NewEvent,
    States,
    Pong,
    ServiceCallOk,
    Config,
    ServiceEvent,
}

impl MockMessage {
    /// The fixture bytes for this message kind.
    pub fn payload(self) -> &'static [u8] {
        match self {
            MockMessage::AuthRequired => include_bytes!("../testdata/auth_required.json"),
            MockMessage::AuthOk => include_bytes!("../testdata/auth_ok.json"),
            MockMessage::AuthFail => include_bytes!("../testdata/auth_notok.json"),
            MockMessage::ResultOk => include_bytes!("../testdata/result_msg.json"),
            MockMessage::NewEvent => include_bytes!("../testdata/event.json"),
            MockMessage::States => include_bytes!("../testdata/result_states.json"),
            MockMessage::Pong => include_bytes!("../testdata/pong.json"),
            MockMessage::ServiceCallOk => include_bytes!("../testdata/service_call_ok.json"),
            MockMessage::Config => include_bytes!("../testdata/result_config.json"),
            MockMessage::ServiceEvent => include_bytes!("../testdata/service_event.json"),
        }
    }

    /// All kinds, in catalog order.
    pub const ALL: [MockMessage; 10] = [
        MockMessage::AuthRequired,
        MockMessage::AuthOk,
        MockMessage::AuthFail,
        MockMessage::ResultOk,
        MockMessage::NewEvent,
        MockMessage::States,
        MockMessage::Pong,
        MockMessage::ServiceCallOk,
        MockMessage::Config,
        MockMessage::ServiceEvent,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn every_fixture_is_valid_json() {
        for kind in MockMessage::ALL {
            let parsed: Result<Value, _> = serde_json::from_slice(kind.payload());
            assert!(parsed.is_ok(), "{:?} is not valid JSON", kind);
        }
    }

    #[test]
    fn fixture_discriminants_match_their_kind() {
        let expect = [
            (MockMessage::AuthRequired, "auth_required"),
            (MockMessage::AuthOk, "auth_ok"),
            (MockMessage::AuthFail, "auth_invalid"),
            (MockMessage::ResultOk, "result"),
            (MockMessage::NewEvent, "event"),
            (MockMessage::States, "result"),
            (MockMessage::Pong, "pong"),
            (MockMessage::ServiceCallOk, "result"),
            (MockMessage::Config, "result"),
            (MockMessage::ServiceEvent, "event"),
        ];
        for (kind, expected) in expect {
            let parsed: Value = serde_json::from_slice(kind.payload()).unwrap();
            assert_eq!(parsed["type"], expected, "{:?}", kind);
        }
    }
}
