// Tool catalog
//
// The closed set of callable operations advertised to the model. Built
// once at startup and immutable for the process lifetime. This table is
// the source of truth for the command namespace: the host registry and
// the mediating routes mirror it 1:1, and a test pins the two together.

use serde::Serialize;
use serde_json::{json, Value};

/// One catalog entry, serialized as a Gemini function declaration.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

fn tool(name: &str, description: &str, parameters: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn string_prop(description: &str) -> Value {
    json!({"type": "STRING", "description": description})
}

fn vec3_prop(description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "description": description,
        "items": {"type": "NUMBER"},
    })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

/// Commands whose handlers legitimately block the executor for a long
/// time (asset transfers). The mediating service gives these the long
/// deadline instead of the scene-command one.
pub fn is_long_running(name: &str) -> bool {
    matches!(name, "download_asset")
}

/// The full static catalog. Mirrors the executor's command namespace.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "get_scene_info",
            "Retrieve general information about the current scene: its name, \
             object count, and object names.",
            object_schema(json!({}), &[]),
        ),
        tool(
            "get_object_info",
            "Get detailed information about one object: kind, location, \
             rotation, scale, and material.",
            object_schema(
                json!({"object_name": string_prop("Name of the object to inspect.")}),
                &["object_name"],
            ),
        ),
        tool(
            "create_object",
            "Create a new object in the scene. Returns the allocated object id.",
            object_schema(
                json!({
                    "kind": string_prop("Object kind, e.g. cube, sphere, plane, cylinder, light, camera."),
                    "name": string_prop("Optional explicit name for the object."),
                    "color": string_prop("Optional base color, e.g. red or #ff0000."),
                    "location": vec3_prop("Optional [x, y, z] position."),
                }),
                &["kind"],
            ),
        ),
        tool(
            "modify_object",
            "Change an existing object's location, rotation, or scale.",
            object_schema(
                json!({
                    "object_name": string_prop("Name of the object to modify."),
                    "location": vec3_prop("New [x, y, z] position."),
                    "rotation": vec3_prop("New [x, y, z] Euler rotation in radians."),
                    "scale": vec3_prop("New [x, y, z] scale factors."),
                }),
                &["object_name"],
            ),
        ),
        tool(
            "delete_object",
            "Remove an object from the scene.",
            object_schema(
                json!({"object_name": string_prop("Name of the object to delete.")}),
                &["object_name"],
            ),
        ),
        tool(
            "set_material",
            "Assign a base color material to an object.",
            object_schema(
                json!({
                    "object_name": string_prop("Name of the object."),
                    "color": string_prop("Base color, e.g. red or #ff0000."),
                }),
                &["object_name", "color"],
            ),
        ),
        tool(
            "get_assets_status",
            "Check whether the asset library integration (search, download, \
             generation) is enabled on the host. Call this before using any \
             asset tool.",
            object_schema(json!({}), &[]),
        ),
        tool(
            "search_assets",
            "Search the asset library, optionally filtered by type \
             (hdris, textures, models) and a substring query.",
            object_schema(
                json!({
                    "asset_type": string_prop("Asset type filter: hdris, textures, models, or all."),
                    "query": string_prop("Substring to match against asset ids."),
                }),
                &[],
            ),
        ),
        tool(
            "download_asset",
            "Download and import an asset from the library. May take a \
             while; the download blocks until finished.",
            object_schema(
                json!({
                    "asset_id": string_prop("Id of the asset to download."),
                    "asset_type": string_prop("Type of the asset: hdris, textures, or models."),
                    "resolution": string_prop("Optional resolution, e.g. 1k, 2k, 4k."),
                }),
                &["asset_id", "asset_type"],
            ),
        ),
        tool(
            "generate_model",
            "Submit a text-to-3D-model generation job. Returns a job_id to \
             poll; the model is not in the scene until imported.",
            object_schema(
                json!({"prompt": string_prop("Short English description of the desired model.")}),
                &["prompt"],
            ),
        ),
        tool(
            "poll_job",
            "Check the status of a generation job.",
            object_schema(
                json!({"job_id": string_prop("Job id returned by generate_model.")}),
                &["job_id"],
            ),
        ),
        tool(
            "import_generated",
            "Import a finished generation job's model into the scene.",
            object_schema(
                json!({"job_id": string_prop("Job id of a completed generation job.")}),
                &["job_id"],
            ),
        ),
    ]
}
