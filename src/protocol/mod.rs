// Bridge wire protocol
//
// One JSON document per direction per exchange, newline-delimited.
// The same framing is used byte-for-byte on both ends: a command or
// response is a single line of JSON terminated by '\n'.

mod codec;

pub use codec::{ClientCodec, CodecError, ServerCodec, MAX_FRAME_SIZE};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One discrete instruction for the host's executor.
///
/// Wire shape: `{"type": "<name>", "params": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Registered handler key (e.g., "create_object")
    #[serde(rename = "type")]
    pub name: String,
    /// Handler-specific parameters; validated by the handler, not the transport
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Command {
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Command with no parameters
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }
}

/// Outcome of exactly one Command, in acceptance order.
///
/// Wire shape: `{"status": "success"|"error", "result": ..., "message": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,
    /// Present iff status is success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present iff status is error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            result: Some(result),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            result: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_shape() {
        let mut params = Map::new();
        params.insert("kind".to_string(), json!("cube"));
        params.insert("color".to_string(), json!("red"));
        let cmd = Command::new("create_object", params);

        let wire = serde_json::to_value(&cmd).unwrap();
        assert_eq!(wire["type"], "create_object");
        assert_eq!(wire["params"]["kind"], "cube");
    }

    #[test]
    fn test_command_params_default_to_empty() {
        let cmd: Command = serde_json::from_str(r#"{"type":"get_scene_info"}"#).unwrap();
        assert_eq!(cmd.name, "get_scene_info");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn test_success_response_omits_message() {
        let resp = Response::success(json!({"object_id": "Cube"}));
        let wire = serde_json::to_string(&resp).unwrap();
        assert!(wire.contains(r#""status":"success""#));
        assert!(wire.contains(r#""object_id":"Cube""#));
        assert!(!wire.contains("message"));
    }

    #[test]
    fn test_error_response_omits_result() {
        let resp = Response::error("unknown command: unknown_op");
        let wire = serde_json::to_string(&resp).unwrap();
        assert!(wire.contains(r#""status":"error""#));
        assert!(wire.contains("unknown command: unknown_op"));
        assert!(!wire.contains("result"));
    }

    #[test]
    fn test_command_roundtrip_equality() {
        let mut params = Map::new();
        params.insert("object_name".to_string(), json!("Cube"));
        params.insert("location".to_string(), json!([1.0, 2.0, 3.0]));
        let cmd = Command::new("modify_object", params);

        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: Command = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_response_roundtrip_equality() {
        let resp = Response::success(json!({"objects": ["Cube", "Light"]}));
        let bytes = serde_json::to_vec(&resp).unwrap();
        let decoded: Response = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(resp, decoded);
    }
}
