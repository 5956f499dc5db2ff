//! Registry sink for loaded definitions
//!
//! [`ContainerSink`] is the seam the loader writes into. [`ContainerBuilder`]
//! is the bundled implementation: ordered tables that a container runtime
//! picks up once loading is done.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::definition::{Alias, ResolvedValue, ServiceDefinition};
use crate::value::Mapping;

/// Where the loader registers what it compiles
pub trait ContainerSink {
    /// Register a definition; replaces any definition or alias with the same id
    fn set_definition(&mut self, id: &str, definition: ServiceDefinition);

    /// Register an alias; replaces any definition or alias with the same id
    fn set_alias(&mut self, id: &str, alias: Alias);

    fn set_parameter(&mut self, key: &str, value: ResolvedValue);

    /// Record a source file the result depends on
    fn add_resource(&mut self, path: &Path);

    fn has_extension(&self, namespace: &str) -> bool;

    /// Registered extension namespaces, for error messages
    fn extension_namespaces(&self) -> Vec<String>;

    /// Hand a top-level namespace's config to its extension
    fn load_from_extension(&mut self, namespace: &str, config: Mapping);
}

/// In-memory definition, alias and parameter tables
#[derive(Debug, Default, Serialize)]
pub struct ContainerBuilder {
    definitions: IndexMap<String, ServiceDefinition>,
    aliases: IndexMap<String, Alias>,
    parameters: IndexMap<String, ResolvedValue>,
    resources: Vec<PathBuf>,
    extensions: IndexMap<String, Vec<Mapping>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-loaded with extension namespaces
    pub fn with_extensions<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = Self::new();
        for ns in namespaces {
            builder.register_extension(ns);
        }
        builder
    }

    pub fn register_extension(&mut self, namespace: impl Into<String>) {
        self.extensions.entry(namespace.into()).or_default();
    }

    pub fn definition(&self, id: &str) -> Option<&ServiceDefinition> {
        self.definitions.get(id)
    }

    pub fn definitions(&self) -> &IndexMap<String, ServiceDefinition> {
        &self.definitions
    }

    pub fn alias(&self, id: &str) -> Option<&Alias> {
        self.aliases.get(id)
    }

    pub fn aliases(&self) -> &IndexMap<String, Alias> {
        &self.aliases
    }

    pub fn parameter(&self, key: &str) -> Option<&ResolvedValue> {
        self.parameters.get(key)
    }

    pub fn parameters(&self) -> &IndexMap<String, ResolvedValue> {
        &self.parameters
    }

    pub fn resources(&self) -> &[PathBuf] {
        &self.resources
    }

    /// Configs dispatched to an extension, in load order
    pub fn extension_config(&self, namespace: &str) -> &[Mapping] {
        self.extensions
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// True when `id` names a definition or an alias
    pub fn has(&self, id: &str) -> bool {
        self.definitions.contains_key(id) || self.aliases.contains_key(id)
    }

    /// Dump the resolved tables as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl ContainerSink for ContainerBuilder {
    fn set_definition(&mut self, id: &str, definition: ServiceDefinition) {
        debug!(id, "registering service definition");
        self.aliases.shift_remove(id);
        self.definitions.insert(id.to_string(), definition);
    }

    fn set_alias(&mut self, id: &str, alias: Alias) {
        debug!(id, target = %alias.target, "registering alias");
        self.definitions.shift_remove(id);
        self.aliases.insert(id.to_string(), alias);
    }

    fn set_parameter(&mut self, key: &str, value: ResolvedValue) {
        self.parameters.insert(key.to_string(), value);
    }

    fn add_resource(&mut self, path: &Path) {
        if !self.resources.iter().any(|p| p == path) {
            self.resources.push(path.to_path_buf());
        }
    }

    fn has_extension(&self, namespace: &str) -> bool {
        self.extensions.contains_key(namespace)
    }

    fn extension_namespaces(&self) -> Vec<String> {
        self.extensions.keys().cloned().collect()
    }

    fn load_from_extension(&mut self, namespace: &str, config: Mapping) {
        debug!(namespace, "dispatching extension configuration");
        self.extensions
            .entry(namespace.to_string())
            .or_default()
            .push(config);
    }
}
