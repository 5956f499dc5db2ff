//! File loader and top-level document handler
//!
//! ```text
//! resource ─ locate ─ read ─ decode ─▶ document
//!                                        │
//!        imports (recursive load) ◀──────┤
//!        parameters ─ resolve ───────────┤
//!        extension namespaces ─ dispatch ┤
//!        services ─ compile ─────────────┘
//! ```
//!
//! Imports run first so the importing document can override what they define.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::container::ContainerSink;
use crate::decode::Decode;
use crate::error::{LoaderError, Result};
use crate::keywords::suggest;
use crate::locator::Locate;
use crate::scope::DocumentScope;
use crate::value::{list_to_mapping, Key, Mapping, Value};

/// Top-level keys handled by the loader itself
pub const RESERVED_NAMESPACES: &[&str] = &["imports", "includes", "parameters", "services"];

/// Loads service configuration files into a [`ContainerSink`]
pub struct FileLoader<'c> {
    container: &'c mut dyn ContainerSink,
    locator: Box<dyn Locate>,
    decoder: Option<Box<dyn Decode>>,
    current_dir: Option<PathBuf>,
    loading: Vec<PathBuf>,
}

impl<'c> FileLoader<'c> {
    /// Loader with the bundled decoder, if one is compiled in
    pub fn new(container: &'c mut dyn ContainerSink, locator: impl Locate + 'static) -> Self {
        Self {
            container,
            locator: Box::new(locator),
            decoder: default_decoder(),
            current_dir: None,
            loading: Vec::new(),
        }
    }

    pub fn with_decoder(mut self, decoder: impl Decode + 'static) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    pub fn without_decoder(mut self) -> Self {
        self.decoder = None;
        self
    }

    /// True when `resource` is a file this loader can decode
    ///
    /// An explicit `ty` must match the decoder's format name.
    pub fn supports(&self, resource: &str, ty: Option<&str>) -> bool {
        let Some(decoder) = &self.decoder else {
            return false;
        };
        let extension = Path::new(resource)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        decoder.extensions().contains(&extension) && ty.map_or(true, |t| t == decoder.format())
    }

    /// Locate, decode and register the definitions of one resource
    pub fn load(&mut self, resource: &str) -> Result<()> {
        let path = self.locator.locate(resource, self.current_dir.as_deref())?;
        self.load_path(&path)
    }

    pub(crate) fn load_path(&mut self, path: &Path) -> Result<()> {
        // `..` segments and symlinks would hide a cycle from the loading stack
        let path = std::fs::canonicalize(path).map_err(|error| LoaderError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let path = path.as_path();

        if self.loading.iter().any(|p| p == path) {
            let chain = self
                .loading
                .iter()
                .chain(std::iter::once(&path.to_path_buf()))
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\" > \"");
            return Err(LoaderError::CircularImport {
                file: path.to_path_buf(),
                chain,
            });
        }

        info!("Loading service configuration from {}", path.display());
        let document = self.read(path)?;
        self.container.add_resource(path);

        self.loading.push(path.to_path_buf());
        let result = self.load_document(document, path);
        self.loading.pop();
        result
    }

    fn read(&self, path: &Path) -> Result<Option<Value>> {
        let Some(decoder) = &self.decoder else {
            return Err(LoaderError::UnsupportedFeature(format!(
                "Unable to load \"{}\": no configuration decoder is available. Enable the \"yaml\" feature or provide a decoder.",
                path.display()
            )));
        };

        if !path.is_file() {
            return Err(LoaderError::invalid(
                path,
                format!("The service file \"{}\" is not valid.", path.display()),
            ));
        }

        let contents = std::fs::read_to_string(path).map_err(|error| LoaderError::Io {
            path: path.to_path_buf(),
            error,
        })?;

        decoder
            .decode(&contents)
            .map_err(|e| LoaderError::InvalidConfiguration {
                message: format!(
                    "The file \"{}\" does not contain valid {}.",
                    path.display(),
                    decoder.format().to_uppercase()
                ),
                file: path.to_path_buf(),
                source: Some(e),
            })
    }

    /// Register everything one decoded document declares
    ///
    /// `None` (an empty document) registers nothing.
    pub fn load_document(&mut self, document: Option<Value>, file: &Path) -> Result<()> {
        let Some(document) = document else {
            debug!(file = %file.display(), "empty service configuration");
            return Ok(());
        };

        let mut content = match document {
            Value::Mapping(content) => content,
            other => {
                return Err(LoaderError::invalid(
                    file,
                    format!(
                        "The service file \"{}\" is not valid. It should contain a mapping, {} found. Check your configuration syntax.",
                        file.display(),
                        other.type_name()
                    ),
                ));
            }
        };

        self.validate_namespaces(&content, file)?;
        self.process_imports(&content, file)?;

        let parameters = take_present(&mut content, "parameters");
        let services = take_present(&mut content, "services");
        content.shift_remove(&Key::from("imports"));
        content.shift_remove(&Key::from("includes"));

        let mut scope = DocumentScope::new(&mut *self.container, file);

        if let Some(parameters) = parameters {
            let Value::Mapping(parameters) = parameters else {
                return Err(LoaderError::invalid(
                    file,
                    format!(
                        "The \"parameters\" key should contain a mapping in {}. Check your configuration syntax.",
                        file.display()
                    ),
                ));
            };
            for (key, value) in parameters {
                let value = scope.resolve(value)?;
                scope.sink.set_parameter(&key.to_string(), value);
            }
        }

        for (namespace, config) in content {
            let config = match config {
                Value::Mapping(config) => config,
                _ => Mapping::new(),
            };
            scope.sink.load_from_extension(&namespace.to_string(), config);
        }

        if let Some(services) = services {
            let services = match services {
                Value::Sequence(items) => Value::Mapping(list_to_mapping(items)),
                other => other,
            };
            let Value::Mapping(services) = services else {
                return Err(LoaderError::invalid(
                    file,
                    format!(
                        "The \"services\" key should contain a mapping or a sequence in {}. Check your configuration syntax.",
                        file.display()
                    ),
                ));
            };
            let count = services.len();
            for (key, entry) in services {
                let id = match key {
                    Key::Name(id) => id,
                    Key::Index(_) => scope.next_anonymous_id(),
                };
                scope.compile_definition(&id, entry)?;
            }
            debug!(file = %file.display(), count, "compiled service entries");
        }

        Ok(())
    }

    /// Every top-level key must be reserved or belong to a registered extension
    fn validate_namespaces(&self, content: &Mapping, file: &Path) -> Result<()> {
        for key in content.keys() {
            let namespace = key.to_string();
            if RESERVED_NAMESPACES.contains(&namespace.as_str())
                || self.container.has_extension(&namespace)
            {
                continue;
            }

            let known = self.container.extension_namespaces();
            let found = if known.is_empty() {
                "none".to_string()
            } else {
                format!("\"{}\"", known.join("\", \""))
            };
            let mut message = format!(
                "There is no extension able to load the configuration for \"{}\" (in {}). Looked for namespace \"{}\", found {}.",
                namespace,
                file.display(),
                namespace,
                found
            );
            if let Some(hint) = suggest(
                &namespace,
                known
                    .iter()
                    .map(String::as_str)
                    .chain(RESERVED_NAMESPACES.iter().copied()),
            ) {
                message.push_str(&format!(" Did you mean \"{}\"?", hint));
            }
            return Err(LoaderError::invalid(file, message));
        }
        Ok(())
    }

    pub(crate) fn set_current_dir(&mut self, dir: Option<PathBuf>) {
        self.current_dir = dir;
    }

    pub(crate) fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub(crate) fn locator(&self) -> &dyn Locate {
        self.locator.as_ref()
    }
}

fn take_present(content: &mut Mapping, key: &str) -> Option<Value> {
    content
        .shift_remove(&Key::from(key))
        .filter(|v| !v.is_null())
}

#[cfg(feature = "yaml")]
fn default_decoder() -> Option<Box<dyn Decode>> {
    Some(Box::new(crate::decode::YamlDecoder))
}

#[cfg(not(feature = "yaml"))]
fn default_decoder() -> Option<Box<dyn Decode>> {
    None
}
