// Bridge client
//
// Owns the TCP connection to the command executor. One cached connection
// guarded by a mutex keeps at most one command in flight; a timed-out
// connection is poisoned and never reused, because no cancellation signal
// reaches the host.

use futures::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::errors::BridgeError;
use crate::protocol::{ClientCodec, Command, Response};

type Connection = Framed<TcpStream, ClientCodec>;

/// Configuration for the executor connection
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Executor host (e.g., "127.0.0.1")
    pub host: String,
    /// Executor port (the host addon's default is 9876)
    pub port: u16,
    /// Per-call deadline for ordinary scene commands
    pub timeout: Duration,
    /// Per-call deadline for asset download/import commands, which may
    /// legitimately block the executor for their full transfer time
    pub asset_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9876,
            timeout: Duration::from_secs(20),
            asset_timeout: Duration::from_secs(300),
        }
    }
}

impl BridgeConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Synchronous (per caller) request/response client for the executor.
pub struct BridgeClient {
    config: BridgeConfig,
    conn: Mutex<Option<Connection>>,
}

impl BridgeClient {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Call with the default scene-command deadline.
    pub async fn call(&self, name: &str, params: Map<String, Value>) -> Result<Value, BridgeError> {
        self.call_with_timeout(name, params, self.config.timeout)
            .await
    }

    /// Write one framed command and block until its framed response or the
    /// deadline. The connection mutex spans the whole exchange, so the
    /// one-in-flight invariant holds end-to-end. The deadline covers the
    /// entire exchange, dialing included; a host that blackholes the
    /// connect or stalls mid-write cannot hang the caller past it.
    pub async fn call_with_timeout(
        &self,
        name: &str,
        params: Map<String, Value>,
        deadline: Duration,
    ) -> Result<Value, BridgeError> {
        let command = Command::new(name, params);
        let mut guard = self.conn.lock().await;

        match timeout(deadline, Self::exchange(&self.config, &mut *guard, &command)).await {
            Ok(result) => result,
            Err(_) => {
                // Poisoned: a late response would correlate with the wrong
                // command if this connection were reused
                info!(command = %command.name, ?deadline, "Bridge call timed out, discarding connection");
                *guard = None;
                Err(BridgeError::Timeout(deadline))
            }
        }
    }

    /// One dial-if-needed, send, await-response cycle. Runs entirely
    /// inside the caller's deadline.
    async fn exchange(
        config: &BridgeConfig,
        guard: &mut Option<Connection>,
        command: &Command,
    ) -> Result<Value, BridgeError> {
        // A cached connection may have gone stale since the last call. If
        // the send itself fails on it, dial fresh and retry once; a send
        // that succeeded is never retried (the host may have acted on it).
        let mut reused = guard.is_some();
        loop {
            if guard.is_none() {
                let stream = TcpStream::connect(config.addr()).await.map_err(|e| {
                    BridgeError::Transport(format!("connect to {} failed: {}", config.addr(), e))
                })?;
                debug!(addr = %config.addr(), "Bridge connection opened");
                *guard = Some(Framed::new(stream, ClientCodec::new()));
            }
            let conn = match guard.as_mut() {
                Some(conn) => conn,
                None => return Err(BridgeError::Transport("connection lost".to_string())),
            };

            match conn.send(command.clone()).await {
                Ok(()) => break,
                Err(e) if reused => {
                    warn!(error = %e, "Cached bridge connection stale, redialing");
                    *guard = None;
                    reused = false;
                }
                Err(e) => {
                    *guard = None;
                    return Err(BridgeError::from(e));
                }
            }
        }

        let conn = match guard.as_mut() {
            Some(conn) => conn,
            None => return Err(BridgeError::Transport("connection lost".to_string())),
        };

        let response = match conn.next().await {
            Some(Ok(response)) => response,
            Some(Err(e)) => {
                *guard = None;
                return Err(BridgeError::from(e));
            }
            None => {
                *guard = None;
                return Err(BridgeError::Transport(
                    "connection closed before response".to_string(),
                ));
            }
        };

        response_to_result(&command.name, response)
    }

    /// Drop the cached connection (next call dials fresh).
    pub async fn disconnect(&self) {
        *self.conn.lock().await = None;
    }
}

fn response_to_result(name: &str, response: Response) -> Result<Value, BridgeError> {
    if response.is_success() {
        return Ok(response.result.unwrap_or(Value::Null));
    }

    let message = response
        .message
        .unwrap_or_else(|| "host reported an error with no message".to_string());

    if message.starts_with("unknown command") {
        Err(BridgeError::UnknownCommand(name.to_string()))
    } else {
        Err(BridgeError::Handler(message))
    }
}
