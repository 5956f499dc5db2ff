//! Resource location
//!
//! Turns a resource name from a document (`imports`, `includes`) or a caller
//! into a file path.

use std::path::{Path, PathBuf};

use crate::error::{LoaderError, Result};

/// Resolve a resource name to an existing file
pub trait Locate {
    /// `current_dir` is the directory of the importing file, searched first
    fn locate(&self, resource: &str, current_dir: Option<&Path>) -> Result<PathBuf>;
}

/// Searches the importing file's directory, then each configured path in order
#[derive(Debug, Clone, Default)]
pub struct FileLocator {
    paths: Vec<PathBuf>,
}

impl FileLocator {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Locate for FileLocator {
    fn locate(&self, resource: &str, current_dir: Option<&Path>) -> Result<PathBuf> {
        if resource.is_empty() {
            return Err(LoaderError::ResourceNotFound {
                resource: resource.to_string(),
                searched: "an empty file name is not valid to be located".to_string(),
            });
        }

        let path = Path::new(resource);
        if path.is_absolute() {
            return if path.exists() {
                Ok(path.to_path_buf())
            } else {
                Err(LoaderError::ResourceNotFound {
                    resource: resource.to_string(),
                    searched: resource.to_string(),
                })
            };
        }

        let candidates: Vec<&Path> = current_dir
            .into_iter()
            .chain(self.paths.iter().map(PathBuf::as_path))
            .collect();

        candidates
            .iter()
            .map(|dir| dir.join(path))
            .find(|file| file.exists())
            .ok_or_else(|| LoaderError::ResourceNotFound {
                resource: resource.to_string(),
                searched: candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
