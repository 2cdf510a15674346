// Demo host
//
// Stand-in for the editor-embedded side of the bridge: an in-memory
// scene graph plus the command handlers the real addon would register.
// Lets the executor, bridge, and agent be exercised end-to-end without a
// running editor.

pub mod assets;
pub mod handlers;
pub mod scene;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::executor::HandlerRegistry;

use assets::{AssetLibrary, DownloadAsset, GenerateModel, ImportGenerated, PollJob, SearchAssets};
use handlers::{
    CreateObject, DeleteObject, GetAssetsStatus, GetObjectInfo, GetSceneInfo, ModifyObject,
    SetMaterial, SharedScene,
};
use scene::SceneGraph;

/// Registry with the full demo command namespace: core scene handlers
/// plus the asset-library extension.
pub fn build_registry() -> HandlerRegistry {
    let scene: SharedScene = Arc::new(Mutex::new(SceneGraph::new("Scene")));
    build_registry_with_scene(scene, true)
}

/// Registry over a caller-supplied scene; `with_assets` mirrors the
/// addon's per-integration gating of the extension namespace.
pub fn build_registry_with_scene(scene: SharedScene, with_assets: bool) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry.register(Arc::new(GetSceneInfo {
        scene: Arc::clone(&scene),
    }));
    registry.register(Arc::new(GetObjectInfo {
        scene: Arc::clone(&scene),
    }));
    registry.register(Arc::new(CreateObject {
        scene: Arc::clone(&scene),
    }));
    registry.register(Arc::new(ModifyObject {
        scene: Arc::clone(&scene),
    }));
    registry.register(Arc::new(DeleteObject {
        scene: Arc::clone(&scene),
    }));
    registry.register(Arc::new(SetMaterial {
        scene: Arc::clone(&scene),
    }));
    // Discovery stays in the core namespace whether or not the
    // extension is registered
    registry.register(Arc::new(GetAssetsStatus {
        enabled: with_assets,
    }));

    if with_assets {
        let library = AssetLibrary::new(Arc::clone(&scene));
        registry.register_extension(Arc::new(SearchAssets {
            library: Arc::clone(&library),
        }));
        registry.register_extension(Arc::new(DownloadAsset {
            library: Arc::clone(&library),
        }));
        registry.register_extension(Arc::new(GenerateModel {
            library: Arc::clone(&library),
        }));
        registry.register_extension(Arc::new(PollJob {
            library: Arc::clone(&library),
        }));
        registry.register_extension(Arc::new(ImportGenerated { library }));
    }

    registry
}
