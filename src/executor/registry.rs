// Command handler registry
//
// Closed dispatch table for the executor. Handlers implement the effect
// of one command name on the host's scene graph; asset-library handlers
// live in a separate extension namespace that the embedding host enables
// only when the integration is configured.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Host-side function implementing one command name.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name this handler answers to (e.g., "create_object")
    fn name(&self) -> &str;

    /// Execute against the host. Errors become error Responses; they never
    /// terminate the executor.
    async fn handle(&self, params: Map<String, Value>) -> Result<Value>;
}

/// Registry of command handlers: a core table plus the asset-library
/// extension namespace.
#[derive(Default)]
pub struct HandlerRegistry {
    core: HashMap<String, Arc<dyn CommandHandler>>,
    extensions: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a core handler
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        self.core.insert(handler.name().to_string(), handler);
    }

    /// Register an asset-library extension handler
    pub fn register_extension(&mut self, handler: Arc<dyn CommandHandler>) {
        self.extensions.insert(handler.name().to_string(), handler);
    }

    /// Resolve a command name to exactly one handler
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.core.get(name).or_else(|| self.extensions.get(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All registered names, core and extension
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .core
            .keys()
            .chain(self.extensions.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.core.len() + self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty() && self.extensions.is_empty()
    }
}
