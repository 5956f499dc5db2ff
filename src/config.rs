//! Loader configuration
//!
//! Where to look for resources and which extension namespaces a fresh
//! [`ContainerBuilder`] accepts.
//!
//! Resolution order for [`LoaderConfig::from_env`]:
//! 1. `DI_LOADER_PATH`: search paths in the platform's path-list syntax
//! 2. `DI_LOADER_EXTENSIONS`: comma-separated extension namespaces
//! 3. Current directory as the only search path

#[cfg(feature = "yaml")]
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
#[cfg(feature = "yaml")]
use tracing::info;

use crate::container::ContainerBuilder;
use crate::locator::FileLocator;

pub const PATH_ENV: &str = "DI_LOADER_PATH";
pub const EXTENSIONS_ENV: &str = "DI_LOADER_EXTENSIONS";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Directories searched for resources, after the importing file's directory
    pub search_paths: Vec<PathBuf>,
    /// Extension namespaces allowed at the top level of documents
    pub extensions: Vec<String>,
}

impl LoaderConfig {
    pub fn from_env() -> Self {
        let search_paths = match std::env::var_os(PATH_ENV) {
            Some(paths) => std::env::split_paths(&paths).collect(),
            None => vec![PathBuf::from(".")],
        };

        let extensions = std::env::var(EXTENSIONS_ENV)
            .map(|list| parse_list(&list))
            .unwrap_or_default();

        Self {
            search_paths,
            extensions,
        }
    }

    /// Load configuration from a YAML file
    #[cfg(feature = "yaml")]
    pub fn from_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        info!("Loading loader configuration from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|error| {
            crate::error::LoaderError::Io {
                path: path.to_path_buf(),
                error,
            }
        })?;

        serde_yaml::from_str(&content).map_err(|e| crate::error::LoaderError::InvalidConfiguration {
            message: format!("The loader configuration in {} is not valid: {}", path.display(), e),
            file: path.to_path_buf(),
            source: None,
        })
    }

    pub fn locator(&self) -> FileLocator {
        FileLocator::new(self.search_paths.iter().cloned())
    }

    pub fn container(&self) -> ContainerBuilder {
        ContainerBuilder::with_extensions(self.extensions.iter().cloned())
    }
}

fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
