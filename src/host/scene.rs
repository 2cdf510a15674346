// In-memory scene graph for the demo host
//
// Stands in for the real editor's scene API behind the command handlers.
// Single-threaded by contract: only the executor's dispatch queue touches
// it, one command at a time.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// One object in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub kind: String,
    pub location: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub base_color: String,
}

/// The demo host's scene. BTreeMap keeps listing order stable for
/// idempotent read-only queries.
#[derive(Debug, Default)]
pub struct SceneGraph {
    name: String,
    objects: BTreeMap<String, SceneObject>,
}

impl SceneGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: BTreeMap::new(),
        }
    }

    /// Add an object, allocating an editor-style unique name: "Cube",
    /// then "Cube.001", "Cube.002", ...
    pub fn create(
        &mut self,
        kind: &str,
        requested_name: Option<&str>,
        location: [f64; 3],
        color: Option<&str>,
    ) -> Result<&SceneObject> {
        let base = match requested_name {
            Some(name) => name.to_string(),
            None => capitalize(kind),
        };
        let name = self.allocate_name(&base);

        let object = SceneObject {
            name: name.clone(),
            kind: kind.to_string(),
            location,
            rotation: [0.0; 3],
            scale: [1.0; 3],
            material: color.map(|c| Material {
                base_color: c.to_string(),
            }),
        };
        self.objects.insert(name.clone(), object);
        Ok(&self.objects[&name])
    }

    pub fn get(&self, name: &str) -> Result<&SceneObject> {
        match self.objects.get(name) {
            Some(obj) => Ok(obj),
            None => bail!("object not found: {}", name),
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut SceneObject> {
        match self.objects.get_mut(name) {
            Some(obj) => Ok(obj),
            None => bail!("object not found: {}", name),
        }
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        if self.objects.remove(name).is_none() {
            bail!("object not found: {}", name);
        }
        Ok(())
    }

    /// Summary for get_scene_info
    pub fn info(&self) -> Value {
        json!({
            "name": self.name,
            "object_count": self.objects.len(),
            "objects": self.objects.keys().collect::<Vec<_>>(),
        })
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn allocate_name(&self, base: &str) -> String {
        if !self.objects.contains_key(base) {
            return base.to_string();
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{}.{:03}", base, counter);
            if !self.objects.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

fn capitalize(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_allocates_editor_style_names() {
        let mut scene = SceneGraph::new("Scene");
        let first = scene.create("cube", None, [0.0; 3], None).unwrap().name.clone();
        let second = scene.create("cube", None, [0.0; 3], None).unwrap().name.clone();
        let third = scene.create("cube", None, [0.0; 3], None).unwrap().name.clone();

        assert_eq!(first, "Cube");
        assert_eq!(second, "Cube.001");
        assert_eq!(third, "Cube.002");
    }

    #[test]
    fn test_create_with_color_sets_material() {
        let mut scene = SceneGraph::new("Scene");
        let obj = scene
            .create("sphere", None, [1.0, 2.0, 3.0], Some("red"))
            .unwrap();
        assert_eq!(obj.material.as_ref().unwrap().base_color, "red");
        assert_eq!(obj.location, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_get_missing_object_fails() {
        let scene = SceneGraph::new("Scene");
        let err = scene.get("Cube").unwrap_err();
        assert_eq!(err.to_string(), "object not found: Cube");
    }

    #[test]
    fn test_delete_removes_object() {
        let mut scene = SceneGraph::new("Scene");
        scene.create("cube", None, [0.0; 3], None).unwrap();
        assert_eq!(scene.object_count(), 1);

        scene.delete("Cube").unwrap();
        assert_eq!(scene.object_count(), 0);
        assert!(scene.delete("Cube").is_err());
    }

    #[test]
    fn test_info_lists_objects_in_stable_order() {
        let mut scene = SceneGraph::new("Scene");
        scene.create("cube", None, [0.0; 3], None).unwrap();
        scene.create("light", None, [0.0; 3], None).unwrap();

        let info = scene.info();
        assert_eq!(info["object_count"], 2);
        assert_eq!(info["objects"], json!(["Cube", "Light"]));

        // Read-only query is idempotent
        assert_eq!(scene.info(), info);
    }
}
