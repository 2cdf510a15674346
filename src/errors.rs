// Bridge error taxonomy
//
// One enum covers every failure class the bridge can surface. The
// mediating service maps these onto HTTP statuses; the agent loop feeds
// them back to the model as tool results.

use std::time::Duration;

use crate::protocol::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Malformed frame or JSON. Fatal to the current connection only.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Command name resolved to no handler. The connection stays usable.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A host-side handler failed. The host keeps listening.
    #[error("handler error: {0}")]
    Handler(String),

    /// No response within the deadline. The connection is poisoned and
    /// must not be reused; the host may still be mid-operation.
    #[error("timed out after {0:?} waiting for host response")]
    Timeout(Duration),

    /// Connection refused, reset, or closed mid-exchange.
    #[error("transport error: {0}")]
    Transport(String),
}

impl BridgeError {
    /// Whether the failure indicates bad input rather than a bridge/host fault.
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, BridgeError::UnknownCommand(_) | BridgeError::Handler(_))
    }
}

impl From<CodecError> for BridgeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => BridgeError::Transport(e.to_string()),
            other => BridgeError::Protocol(other.to_string()),
        }
    }
}
