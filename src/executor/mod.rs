// Command executor
//
// TCP command server embedded in the host process. Every connection
// decodes one JSON command at a time; all handler invocations across all
// connections funnel through a single-consumer dispatch queue, so the
// host's non-reentrant scene-graph API is never entered concurrently.

mod registry;

pub use registry::{CommandHandler, HandlerRegistry};

use anyhow::{Context, Result};
use futures::{FutureExt, SinkExt, StreamExt};
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::protocol::{Command, Response, ServerCodec};

/// Depth of the dispatch queue. Connections block here while an earlier
/// command is still executing, which is the intended backpressure.
const DISPATCH_QUEUE_DEPTH: usize = 32;

struct Job {
    command: Command,
    reply: oneshot::Sender<Response>,
}

/// TCP command server for the host application.
pub struct CommandExecutor {
    listener: TcpListener,
    registry: Arc<HandlerRegistry>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CommandExecutor {
    /// Bind the listening socket. Call `run()` to start serving.
    pub async fn bind(addr: &str, registry: HandlerRegistry) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind command executor to {}", addr))?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            listener,
            registry: Arc::new(registry),
            shutdown_tx,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read local address")
    }

    /// Handle that stops the accept loop and the dispatcher
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the accept loop until shutdown. Handler failures never
    /// terminate this loop.
    pub async fn run(self) -> Result<()> {
        let addr = self.local_addr()?;
        info!(%addr, commands = self.registry.len(), "Command executor listening");

        let (job_tx, job_rx) = mpsc::channel::<Job>(DISPATCH_QUEUE_DEPTH);

        // Single consumer: the only path into the host's mutation API
        let registry = Arc::clone(&self.registry);
        let dispatcher = tokio::spawn(dispatch_loop(registry, job_rx));

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(%peer, "Client connected");
                            let tx = job_tx.clone();
                            tokio::spawn(async move {
                                handle_connection(stream, tx).await;
                                debug!(%peer, "Client disconnected");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Accept failed");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping command executor");
                    break;
                }
            }
        }

        // Dropping the last sender ends the dispatcher once in-flight
        // work drains
        drop(job_tx);
        dispatcher.await.context("Dispatcher task panicked")?;
        Ok(())
    }
}

/// Consume jobs strictly one at a time. This task is the serialization
/// point for the single-mutator invariant.
async fn dispatch_loop(registry: Arc<HandlerRegistry>, mut job_rx: mpsc::Receiver<Job>) {
    while let Some(job) = job_rx.recv().await {
        let name = job.command.name.clone();
        let response = execute_command(&registry, job.command).await;
        if job.reply.send(response).is_err() {
            // Client went away mid-command; the work is already done
            warn!(command = %name, "Client dropped before response was sent");
        }
    }
}

/// Look up and invoke one handler, converting every failure mode into an
/// error Response.
async fn execute_command(registry: &HandlerRegistry, command: Command) -> Response {
    let handler = match registry.get(&command.name) {
        Some(h) => Arc::clone(h),
        None => {
            warn!(command = %command.name, "Unknown command");
            return Response::error(format!("unknown command: {}", command.name));
        }
    };

    debug!(command = %command.name, "Dispatching command");

    // A panicking handler must not take the dispatcher down with it
    let outcome = AssertUnwindSafe(handler.handle(command.params))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(result)) => Response::success(result),
        Ok(Err(e)) => {
            warn!(command = %command.name, error = %e, "Handler failed");
            Response::error(e.to_string())
        }
        Err(_) => {
            error!(command = %command.name, "Handler panicked");
            Response::error(format!("handler panicked: {}", command.name))
        }
    }
}

/// Per-connection read→dispatch→respond cycle. Exactly one Response is
/// written per decoded Command, in order, before the next read.
async fn handle_connection(stream: TcpStream, job_tx: mpsc::Sender<Job>) {
    let mut framed = Framed::new(stream, ServerCodec::new());

    while let Some(decoded) = framed.next().await {
        let command = match decoded {
            Ok(cmd) => cmd,
            Err(e) => {
                // Protocol error: fatal to this connection only
                warn!(error = %e, "Dropping connection on malformed frame");
                break;
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        if job_tx
            .send(Job {
                command,
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            // Executor is shutting down
            break;
        }

        let response = match reply_rx.await {
            Ok(r) => r,
            Err(_) => break,
        };

        if let Err(e) = framed.send(response).await {
            warn!(error = %e, "Failed to write response");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    struct OkHandler;

    #[async_trait]
    impl CommandHandler for OkHandler {
        fn name(&self) -> &str {
            "ping"
        }

        async fn handle(&self, _params: Map<String, Value>) -> Result<Value> {
            Ok(json!({"pong": true}))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl CommandHandler for FailingHandler {
        fn name(&self) -> &str {
            "fail"
        }

        async fn handle(&self, _params: Map<String, Value>) -> Result<Value> {
            bail!("object not found: Cube")
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl CommandHandler for PanickingHandler {
        fn name(&self) -> &str {
            "panic"
        }

        async fn handle(&self, _params: Map<String, Value>) -> Result<Value> {
            panic!("handler bug")
        }
    }

    fn test_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(OkHandler));
        registry.register(Arc::new(FailingHandler));
        registry.register(Arc::new(PanickingHandler));
        registry
    }

    #[tokio::test]
    async fn test_execute_known_command() {
        let registry = test_registry();
        let response = execute_command(&registry, Command::bare("ping")).await;
        assert!(response.is_success());
        assert_eq!(response.result.unwrap()["pong"], true);
    }

    #[tokio::test]
    async fn test_execute_unknown_command() {
        let registry = test_registry();
        let response = execute_command(&registry, Command::bare("unknown_op")).await;
        assert!(!response.is_success());
        assert_eq!(response.message.unwrap(), "unknown command: unknown_op");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_error_response() {
        let registry = test_registry();
        let response = execute_command(&registry, Command::bare("fail")).await;
        assert!(!response.is_success());
        assert_eq!(response.message.unwrap(), "object not found: Cube");
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let registry = test_registry();
        let response = execute_command(&registry, Command::bare("panic")).await;
        assert!(!response.is_success());
        assert!(response.message.unwrap().contains("panicked"));

        // Dispatch still works afterwards
        let response = execute_command(&registry, Command::bare("ping")).await;
        assert!(response.is_success());
    }
}
