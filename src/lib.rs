// Scenelink - LLM agent bridge for a running 3D scene editor
// Library exports

pub mod agent;
pub mod bridge;
pub mod config;
pub mod errors;
pub mod executor;
pub mod host;
pub mod protocol;
pub mod server;
