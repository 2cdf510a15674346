// Integration tests for the mediating service
//
// Full stack: a real command executor on an ephemeral port, a bridge
// client pointed at it, and the HTTP router served on another ephemeral
// port, driven with reqwest. These pin the status mapping the agent
// relies on: 200, 400, 404, 502, 504.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use scenelink::bridge::{BridgeClient, BridgeConfig};
use scenelink::executor::{CommandExecutor, CommandHandler, HandlerRegistry};
use scenelink::host::build_registry;
use scenelink::server::{create_router, AppState};

struct SleepHandler;

#[async_trait]
impl CommandHandler for SleepHandler {
    fn name(&self) -> &str {
        "slow_op"
    }

    async fn handle(&self, _params: Map<String, Value>) -> Result<Value> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(Value::Null)
    }
}

async fn spawn_executor(registry: HandlerRegistry) -> Result<SocketAddr> {
    let executor = CommandExecutor::bind("127.0.0.1:0", registry).await?;
    let addr = executor.local_addr()?;
    tokio::spawn(async move {
        let _ = executor.run().await;
    });
    Ok(addr)
}

/// Serve the router over a bridge with the given per-command timeout;
/// returns the HTTP base URL.
async fn spawn_server(bridge_addr: SocketAddr, timeout: Duration) -> Result<String> {
    let bridge = BridgeClient::new(BridgeConfig {
        host: bridge_addr.ip().to_string(),
        port: bridge_addr.port(),
        timeout,
        asset_timeout: Duration::from_secs(10),
    });
    let state = Arc::new(AppState {
        bridge: Arc::new(bridge),
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

/// Executor plus server with a generous timeout; the common setup.
async fn spawn_stack() -> Result<String> {
    let bridge_addr = spawn_executor(build_registry()).await?;
    spawn_server(bridge_addr, Duration::from_secs(5)).await
}

#[tokio::test]
async fn test_create_object_returns_200_with_result() -> Result<()> {
    let base = spawn_stack().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/v1/objects/create", base))
        .json(&json!({"kind": "cube", "color": "blue"}))
        .send()
        .await?;

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["object_id"], "Cube");
    Ok(())
}

#[tokio::test]
async fn test_unknown_command_maps_to_404() -> Result<()> {
    let base = spawn_stack().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/v1/tools/run", base))
        .json(&json!({"type": "no_such_op", "params": {}}))
        .send()
        .await?;

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"]["type"], "unknown_command");
    Ok(())
}

#[tokio::test]
async fn test_handler_error_maps_to_400() -> Result<()> {
    let base = spawn_stack().await?;
    let client = reqwest::Client::new();

    // Object does not exist; the host reports it and the service relays
    // the fault to the caller
    let resp = client
        .post(format!("{}/v1/scene/object", base))
        .json(&json!({"object_name": "Ghost"}))
        .send()
        .await?;

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"]["type"], "handler_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Ghost"));
    Ok(())
}

#[tokio::test]
async fn test_missing_field_maps_to_400_without_bridge_call() -> Result<()> {
    // No executor at all behind the bridge: validation must reject the
    // request before any bridge traffic happens
    let base = spawn_server(
        "127.0.0.1:1".parse().unwrap(),
        Duration::from_secs(1),
    )
    .await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/v1/objects/create", base))
        .json(&json!({"color": "blue"}))
        .send()
        .await?;

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"]["type"], "validation_error");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_bridge_maps_to_502() -> Result<()> {
    let base = spawn_server(
        "127.0.0.1:1".parse().unwrap(),
        Duration::from_secs(1),
    )
    .await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/v1/scene/info", base))
        .json(&json!({}))
        .send()
        .await?;

    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"]["type"], "bridge_error");
    Ok(())
}

#[tokio::test]
async fn test_slow_command_maps_to_504() -> Result<()> {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(SleepHandler));
    let bridge_addr = spawn_executor(registry).await?;
    let base = spawn_server(bridge_addr, Duration::from_millis(200)).await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/v1/tools/run", base))
        .json(&json!({"type": "slow_op", "params": {}}))
        .send()
        .await?;

    assert_eq!(resp.status(), 504);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"]["type"], "timeout");
    Ok(())
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let base = spawn_stack().await?;
    let resp = reqwest::get(format!("{}/health", base)).await?;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_asset_search_route() -> Result<()> {
    let base = spawn_stack().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/v1/assets/search", base))
        .json(&json!({"asset_type": "models"}))
        .send()
        .await?;

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await?;
    let assets = body["assets"].as_array().unwrap();
    assert!(!assets.is_empty());
    for entry in assets {
        assert_eq!(entry["asset_type"], "models");
    }
    assert_eq!(body["count"], assets.len());
    Ok(())
}

#[tokio::test]
async fn test_assets_status_discovers_disabled_extension() -> Result<()> {
    use scenelink::host::build_registry_with_scene;
    use scenelink::host::scene::SceneGraph;
    use tokio::sync::Mutex;

    // Host without the asset extension: the status command still answers,
    // and the asset tools resolve to unknown commands
    let scene = Arc::new(Mutex::new(SceneGraph::new("Scene")));
    let bridge_addr = spawn_executor(build_registry_with_scene(scene, false)).await?;
    let base = spawn_server(bridge_addr, Duration::from_secs(5)).await?;
    let client = reqwest::Client::new();

    let status: Value = client
        .post(format!("{}/v1/assets/status", base))
        .json(&json!({}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(status["enabled"], false);

    let search = client
        .post(format!("{}/v1/assets/search", base))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(search.status(), 404);
    Ok(())
}

#[tokio::test]
async fn test_full_edit_sequence_through_http() -> Result<()> {
    let base = spawn_stack().await?;
    let client = reqwest::Client::new();

    let create: Value = client
        .post(format!("{}/v1/objects/create", base))
        .json(&json!({"kind": "sphere"}))
        .send()
        .await?
        .json()
        .await?;
    let name = create["object_id"].as_str().unwrap().to_string();

    let modify = client
        .post(format!("{}/v1/objects/modify", base))
        .json(&json!({"object_name": name, "location": [1.0, 2.0, 3.0]}))
        .send()
        .await?;
    assert_eq!(modify.status(), 200);

    let material = client
        .post(format!("{}/v1/objects/material", base))
        .json(&json!({"object_name": name, "color": "green"}))
        .send()
        .await?;
    assert_eq!(material.status(), 200);

    let info: Value = client
        .post(format!("{}/v1/scene/object", base))
        .json(&json!({"object_name": name}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(info["location"], json!([1.0, 2.0, 3.0]));

    let delete = client
        .post(format!("{}/v1/objects/delete", base))
        .json(&json!({"object_name": name}))
        .send()
        .await?;
    assert_eq!(delete.status(), 200);

    let scene: Value = client
        .post(format!("{}/v1/scene/info", base))
        .json(&json!({}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(scene["object_count"], 0);
    Ok(())
}
