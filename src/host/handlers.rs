// Scene command handlers for the demo host
//
// Each handler implements one command name's effect on the scene graph.
// Parameter validation lives here, not in the transport.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::executor::CommandHandler;

use super::scene::SceneGraph;

pub type SharedScene = Arc<Mutex<SceneGraph>>;

/// Required string parameter
pub(super) fn require_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .with_context(|| format!("missing required parameter: {}", key))?
        .as_str()
        .with_context(|| format!("parameter {} must be a string", key))
}

/// Optional string parameter
pub(super) fn optional_str<'a>(params: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .with_context(|| format!("parameter {} must be a string", key)),
    }
}

/// Optional [x, y, z] parameter
pub(super) fn optional_vec3(params: &Map<String, Value>, key: &str) -> Result<Option<[f64; 3]>> {
    let value = match params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };
    let items = value
        .as_array()
        .with_context(|| format!("parameter {} must be an array of 3 numbers", key))?;
    if items.len() != 3 {
        bail!("parameter {} must have exactly 3 components", key);
    }
    let mut out = [0.0; 3];
    for (i, item) in items.iter().enumerate() {
        out[i] = item
            .as_f64()
            .with_context(|| format!("parameter {} component {} must be a number", key, i))?;
    }
    Ok(Some(out))
}

pub struct GetSceneInfo {
    pub scene: SharedScene,
}

#[async_trait]
impl CommandHandler for GetSceneInfo {
    fn name(&self) -> &str {
        "get_scene_info"
    }

    async fn handle(&self, _params: Map<String, Value>) -> Result<Value> {
        Ok(self.scene.lock().await.info())
    }
}

pub struct GetObjectInfo {
    pub scene: SharedScene,
}

#[async_trait]
impl CommandHandler for GetObjectInfo {
    fn name(&self) -> &str {
        "get_object_info"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let name = require_str(&params, "object_name")?;
        let scene = self.scene.lock().await;
        let object = scene.get(name)?;
        Ok(serde_json::to_value(object)?)
    }
}

pub struct CreateObject {
    pub scene: SharedScene,
}

#[async_trait]
impl CommandHandler for CreateObject {
    fn name(&self) -> &str {
        "create_object"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let kind = require_str(&params, "kind")?;
        let name = optional_str(&params, "name")?;
        let color = optional_str(&params, "color")?;
        let location = optional_vec3(&params, "location")?.unwrap_or([0.0; 3]);

        let mut scene = self.scene.lock().await;
        let object = scene.create(kind, name, location, color)?;
        Ok(json!({"object_id": object.name}))
    }
}

pub struct ModifyObject {
    pub scene: SharedScene,
}

#[async_trait]
impl CommandHandler for ModifyObject {
    fn name(&self) -> &str {
        "modify_object"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let name = require_str(&params, "object_name")?;
        let location = optional_vec3(&params, "location")?;
        let rotation = optional_vec3(&params, "rotation")?;
        let scale = optional_vec3(&params, "scale")?;

        let mut scene = self.scene.lock().await;
        let object = scene.get_mut(name)?;
        if let Some(location) = location {
            object.location = location;
        }
        if let Some(rotation) = rotation {
            object.rotation = rotation;
        }
        if let Some(scale) = scale {
            object.scale = scale;
        }
        Ok(serde_json::to_value(&*object)?)
    }
}

pub struct DeleteObject {
    pub scene: SharedScene,
}

#[async_trait]
impl CommandHandler for DeleteObject {
    fn name(&self) -> &str {
        "delete_object"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let name = require_str(&params, "object_name")?;
        self.scene.lock().await.delete(name)?;
        Ok(json!({"deleted": name}))
    }
}

/// Always-on discovery command: reports whether the asset-library
/// extension namespace is registered, so callers can find out before
/// hitting "unknown command" on the asset tools.
pub struct GetAssetsStatus {
    pub enabled: bool,
}

#[async_trait]
impl CommandHandler for GetAssetsStatus {
    fn name(&self) -> &str {
        "get_assets_status"
    }

    async fn handle(&self, _params: Map<String, Value>) -> Result<Value> {
        let message = if self.enabled {
            "asset library integration is enabled"
        } else {
            "asset library integration is disabled"
        };
        Ok(json!({"enabled": self.enabled, "message": message}))
    }
}

pub struct SetMaterial {
    pub scene: SharedScene,
}

#[async_trait]
impl CommandHandler for SetMaterial {
    fn name(&self) -> &str {
        "set_material"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let name = require_str(&params, "object_name")?;
        let color = require_str(&params, "color")?;

        let mut scene = self.scene.lock().await;
        let object = scene.get_mut(name)?;
        object.material = Some(super::scene::Material {
            base_color: color.to_string(),
        });
        Ok(json!({"object": name, "base_color": color}))
    }
}
