//! Event payload model for the detail trace.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The direction/phase an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A request this service sent to another node.
    #[serde(rename = "outbound-request")]
    OutboundRequest,
    /// The response received for a previously sent request.
    #[serde(rename = "inbound-response")]
    InboundResponse,
    /// A mirror of the inbound request, recorded on the output side while
    /// its response is still in progress.
    #[serde(rename = "inbound-request-mirror")]
    InboundRequestMirror,
    /// The final response this service sent back to its caller.
    #[serde(rename = "outbound-response")]
    OutboundResponse,
}

/// One ordered, timestamp-correlated entry of a trace sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub invoke: String,

    /// `"<node>.<command>"`.
    pub event_name: String,

    /// `"<protocol>.<method>"` when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    pub kind: EventKind,

    /// Original payload, present only while raw-data capture is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<Value>,

    pub payload: Value,

    /// Whole milliseconds between the armed start and this response; only
    /// on response-kind events whose invoke matched a pending timer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

/// Build the `"<node>.<command>"` event name.
pub(crate) fn event_name(node: &str, cmd: &str) -> String {
    format!("{}.{}", node, cmd)
}

/// Build the lowercased `"<protocol>.<method>"` value; empty protocol means
/// no value, empty method leaves the protocol alone.
pub(crate) fn protocol_value(protocol: &str, method: &str) -> Option<String> {
    if protocol.is_empty() {
        return None;
    }
    let mut value = protocol.to_ascii_lowercase();
    if !method.is_empty() {
        value.push('.');
        value.push_str(&method.to_ascii_lowercase());
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_value(EventKind::OutboundRequest).unwrap(),
            json!("outbound-request")
        );
        assert_eq!(
            serde_json::to_value(EventKind::InboundRequestMirror).unwrap(),
            json!("inbound-request-mirror")
        );
    }

    #[test]
    fn test_absent_optionals_are_omitted() {
        let event = Event {
            invoke: "i1".to_string(),
            event_name: event_name("client", "get-health"),
            protocol: None,
            kind: EventKind::OutboundRequest,
            raw_payload: None,
            payload: json!({"q": ""}),
            elapsed_ms: None,
        };

        let value = serde_json::to_value(&event).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["eventName"], json!("client.get-health"));
        assert!(!object.contains_key("protocol"));
        assert!(!object.contains_key("rawPayload"));
        assert!(!object.contains_key("elapsedMs"));
    }

    #[test]
    fn test_protocol_value_shapes() {
        assert_eq!(protocol_value("HTTP", "GET"), Some("http.get".to_string()));
        assert_eq!(protocol_value("kafka", ""), Some("kafka".to_string()));
        assert_eq!(protocol_value("", "get"), None);
    }
}
