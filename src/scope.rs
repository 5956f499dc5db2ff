//! Per-document state shared by the resolver and the definition compiler
//!
//! One [`DocumentScope`] exists per document pass. It owns the anonymous id
//! counter for that origin file and borrows the sink the pass writes into.
//! Resolving an inline entity compiles a definition, and compiling a
//! definition resolves its values, so both live as `impl` blocks on this type
//! (see `resolver.rs` and `compiler.rs`).

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::trace;

use crate::container::ContainerSink;
use crate::error::LoaderError;

/// Synthesized ids for definitions that have no declared id
///
/// Ids combine a counter starting at 1 with a digest of the origin path, so
/// they are unique within one file's pass and repeat if the file is loaded again.
#[derive(Debug, Clone)]
pub struct AnonymousIds {
    digest: String,
    counter: usize,
}

impl AnonymousIds {
    pub fn for_file(file: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(file.to_string_lossy().as_bytes());
        Self {
            digest: hex::encode(hasher.finalize()),
            counter: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        let id = format!("{}_{}", self.counter, self.digest);
        trace!(id = %id, "synthesized anonymous service id");
        id
    }
}

/// Mutable context for compiling one document
pub struct DocumentScope<'a> {
    pub(crate) sink: &'a mut dyn ContainerSink,
    pub(crate) file: &'a Path,
    pub(crate) anonymous: AnonymousIds,
}

impl<'a> DocumentScope<'a> {
    pub fn new(sink: &'a mut dyn ContainerSink, file: &'a Path) -> Self {
        Self {
            sink,
            file,
            anonymous: AnonymousIds::for_file(file),
        }
    }

    pub fn file(&self) -> &Path {
        self.file
    }

    pub fn next_anonymous_id(&mut self) -> String {
        self.anonymous.next_id()
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> LoaderError {
        LoaderError::invalid(self.file, message)
    }
}
