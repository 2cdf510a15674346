// Asset-library extension handlers
//
// The demo host simulates the third-party asset integrations the real
// editor addon talks to: a searchable library with blocking downloads,
// and text-to-model generation behind a submit/poll job handle. Real
// integrations are long-running opaque operations invoked through the
// same command protocol; the simulation keeps their shapes and timing
// behavior without the network.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::executor::CommandHandler;

use super::handlers::{optional_str, require_str, SharedScene};

/// A submitted model-generation job
#[derive(Debug, Clone)]
struct GenerationJob {
    prompt: String,
    submitted: Instant,
}

/// Simulated asset library with a job store for generation requests.
pub struct AssetLibrary {
    scene: SharedScene,
    jobs: Mutex<HashMap<String, GenerationJob>>,
    /// Simulated wall time for a generation job to complete
    generation_time: Duration,
    /// Simulated wall time for a download (blocks the executor slot)
    download_time: Duration,
}

impl AssetLibrary {
    pub fn new(scene: SharedScene) -> Arc<Self> {
        Arc::new(Self {
            scene,
            jobs: Mutex::new(HashMap::new()),
            generation_time: Duration::from_millis(0),
            download_time: Duration::from_millis(0),
        })
    }

    /// Variant with nonzero simulated latencies, for exercising timeout
    /// and poll behavior.
    pub fn with_latencies(
        scene: SharedScene,
        generation_time: Duration,
        download_time: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            scene,
            jobs: Mutex::new(HashMap::new()),
            generation_time,
            download_time,
        })
    }

    /// Library entries available to search_assets
    fn catalog() -> &'static [(&'static str, &'static str)] {
        &[
            ("studio_small_03", "hdris"),
            ("abandoned_factory_canteen_01", "hdris"),
            ("rocky_terrain_02", "textures"),
            ("worn_planks", "textures"),
            ("wooden_table_02", "models"),
            ("ceramic_vase_01", "models"),
            ("potted_plant_04", "models"),
        ]
    }
}

pub struct SearchAssets {
    pub library: Arc<AssetLibrary>,
}

#[async_trait]
impl CommandHandler for SearchAssets {
    fn name(&self) -> &str {
        "search_assets"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let asset_type = optional_str(&params, "asset_type")?.unwrap_or("all");
        let query = optional_str(&params, "query")?.unwrap_or("");

        let matches: Vec<Value> = AssetLibrary::catalog()
            .iter()
            .filter(|(id, ty)| {
                (asset_type == "all" || *ty == asset_type) && id.contains(query)
            })
            .map(|(id, ty)| json!({"asset_id": id, "asset_type": ty}))
            .collect();

        Ok(json!({"assets": matches, "count": matches.len()}))
    }
}

pub struct DownloadAsset {
    pub library: Arc<AssetLibrary>,
}

#[async_trait]
impl CommandHandler for DownloadAsset {
    fn name(&self) -> &str {
        "download_asset"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let asset_id = require_str(&params, "asset_id")?;
        let asset_type = require_str(&params, "asset_type")?;
        let resolution = optional_str(&params, "resolution")?.unwrap_or("1k");

        if !AssetLibrary::catalog()
            .iter()
            .any(|(id, ty)| *id == asset_id && *ty == asset_type)
        {
            bail!("asset not found: {} ({})", asset_id, asset_type);
        }

        // Blocks the executor's single processing slot for the transfer
        // duration. Callers reach this command through the long asset
        // deadline, not the scene-command one.
        tokio::time::sleep(self.library.download_time).await;

        let object_name = {
            let mut scene = self.library.scene.lock().await;
            scene
                .create(asset_type, Some(asset_id), [0.0; 3], None)?
                .name
                .clone()
        };

        Ok(json!({
            "imported": object_name,
            "asset_id": asset_id,
            "resolution": resolution,
        }))
    }
}

pub struct GenerateModel {
    pub library: Arc<AssetLibrary>,
}

#[async_trait]
impl CommandHandler for GenerateModel {
    fn name(&self) -> &str {
        "generate_model"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let prompt = require_str(&params, "prompt")?;

        let job_id = Uuid::new_v4().to_string();
        self.library.jobs.lock().await.insert(
            job_id.clone(),
            GenerationJob {
                prompt: prompt.to_string(),
                submitted: Instant::now(),
            },
        );

        // Submit only; completion is observed through poll_job
        Ok(json!({"job_id": job_id, "status": "submitted"}))
    }
}

pub struct PollJob {
    pub library: Arc<AssetLibrary>,
}

#[async_trait]
impl CommandHandler for PollJob {
    fn name(&self) -> &str {
        "poll_job"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let job_id = require_str(&params, "job_id")?;

        let jobs = self.library.jobs.lock().await;
        let job = match jobs.get(job_id) {
            Some(job) => job,
            None => bail!("job not found: {}", job_id),
        };

        let status = if job.submitted.elapsed() >= self.library.generation_time {
            "completed"
        } else {
            "running"
        };
        Ok(json!({"job_id": job_id, "status": status}))
    }
}

pub struct ImportGenerated {
    pub library: Arc<AssetLibrary>,
}

#[async_trait]
impl CommandHandler for ImportGenerated {
    fn name(&self) -> &str {
        "import_generated"
    }

    async fn handle(&self, params: Map<String, Value>) -> Result<Value> {
        let job_id = require_str(&params, "job_id")?;

        let job = {
            let jobs = self.library.jobs.lock().await;
            match jobs.get(job_id) {
                Some(job) => job.clone(),
                None => bail!("job not found: {}", job_id),
            }
        };

        if job.submitted.elapsed() < self.library.generation_time {
            bail!("job not finished: {}", job_id);
        }

        let object_name = {
            let base = job.prompt.replace(' ', "_");
            let mut scene = self.library.scene.lock().await;
            scene.create("model", Some(&base), [0.0; 3], None)?.name.clone()
        };

        Ok(json!({"imported": object_name, "job_id": job_id}))
    }
}
