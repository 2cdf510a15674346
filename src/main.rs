// Scenelink - LLM agent bridge for a running 3D scene editor
// Main entry point

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::{Map, Value};

use scenelink::agent::{AgentConfig, AgentLoop, AgentOutcome};
use scenelink::bridge::BridgeClient;
use scenelink::config::{load_settings, Settings};
use scenelink::executor::CommandExecutor;
use scenelink::host::build_registry;
use scenelink::server::{MediatorServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "scenelink")]
#[command(about = "LLM agent bridge for a running 3D scene editor", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the demo host: a command executor over an in-memory scene
    Host {
        /// Bind address for the executor socket
        #[arg(long, default_value = "127.0.0.1:9876")]
        bind: String,
    },
    /// Run the mediating HTTP service
    Serve {
        /// Bind address override for the HTTP server
        #[arg(long)]
        bind: Option<String>,
        /// Bridge address override ("host:port")
        #[arg(long)]
        bridge: Option<String>,
    },
    /// Run one agent invocation against the mediating service
    Agent {
        /// What to build in the scene
        #[arg(long)]
        prompt: String,
        /// Mediating service URL override
        #[arg(long)]
        server: Option<String>,
    },
    /// Send a single command over the bridge (debugging)
    Call {
        /// Command name, e.g. get_scene_info
        command: String,
        /// JSON object of parameters
        #[arg(long, default_value = "{}")]
        params: String,
        /// Bridge address override ("host:port")
        #[arg(long)]
        bridge: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    match args.command {
        Command::Host { bind } => run_host(bind).await,
        Command::Serve { bind, bridge } => run_serve(bind, bridge).await,
        Command::Agent { prompt, server } => run_agent(prompt, server).await,
        Command::Call {
            command,
            params,
            bridge,
        } => run_call(command, params, bridge).await,
    }
}

fn init_tracing() {
    // Default: INFO level, overridable with RUST_LOG
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn run_host(bind: String) -> Result<()> {
    let registry = build_registry();
    let executor = CommandExecutor::bind(&bind, registry).await?;

    let shutdown = executor.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown.send(());
        }
    });

    executor.run().await
}

async fn run_serve(bind: Option<String>, bridge: Option<String>) -> Result<()> {
    let settings = bridge_override(load_settings()?, bridge)?;
    let bridge = BridgeClient::new(settings.bridge_config());

    let server_config = ServerConfig {
        bind_address: bind.unwrap_or(settings.server.bind_address),
    };
    MediatorServer::new(bridge, server_config).serve().await
}

async fn run_agent(prompt: String, server: Option<String>) -> Result<()> {
    let settings = load_settings()?;
    let api_key = settings.require_api_key()?;

    let server_url =
        server.unwrap_or_else(|| format!("http://{}", settings.server.bind_address));

    let mut agent = AgentLoop::new(AgentConfig {
        server_url,
        model: settings.agent.model.clone(),
        api_key,
        max_turns: settings.agent.max_turns,
    })?;

    match agent.run(&prompt).await? {
        AgentOutcome::Done { reply, turns } => {
            println!("{}", reply);
            tracing::info!(turns, "Agent completed");
            Ok(())
        }
        AgentOutcome::Failed { reason } => {
            bail!("Agent failed: {}", reason)
        }
    }
}

async fn run_call(command: String, params: String, bridge: Option<String>) -> Result<()> {
    let settings = bridge_override(load_settings()?, bridge)?;
    let bridge = BridgeClient::new(settings.bridge_config());

    let params: Map<String, Value> =
        serde_json::from_str(&params).context("--params must be a JSON object")?;

    let result = bridge.call(&command, params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Apply a --bridge "host:port" override on top of the loaded settings.
fn bridge_override(mut settings: Settings, bridge: Option<String>) -> Result<Settings> {
    if let Some(addr) = bridge {
        let (host, port) = addr
            .rsplit_once(':')
            .with_context(|| format!("--bridge must be host:port, got {}", addr))?;
        settings.bridge.host = host.to_string();
        settings.bridge.port = port
            .parse()
            .with_context(|| format!("--bridge port must be a number, got {}", port))?;
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_override_applies() {
        let settings =
            bridge_override(Settings::default(), Some("192.168.1.20:7000".to_string())).unwrap();
        assert_eq!(settings.bridge.host, "192.168.1.20");
        assert_eq!(settings.bridge.port, 7000);
    }

    #[test]
    fn test_bridge_override_absent_keeps_settings() {
        let settings = bridge_override(Settings::default(), None).unwrap();
        assert_eq!(settings.bridge.port, 9876);
    }

    #[test]
    fn test_bridge_override_rejects_bad_addr() {
        assert!(bridge_override(Settings::default(), Some("no-port".to_string())).is_err());
        assert!(bridge_override(Settings::default(), Some("host:notanumber".to_string())).is_err());
    }

    #[test]
    fn test_cli_accepts_bridge_flags() {
        let args =
            Args::try_parse_from(["scenelink", "serve", "--bridge", "127.0.0.1:7000"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Serve { bridge: Some(addr), .. } if addr == "127.0.0.1:7000"
        ));

        let args = Args::try_parse_from([
            "scenelink",
            "call",
            "get_scene_info",
            "--bridge",
            "127.0.0.1:7000",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Call { bridge: Some(_), .. }
        ));
    }
}
