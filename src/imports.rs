//! Import processing
//!
//! Two mutually exclusive top-level forms pull other files in before the
//! current document registers anything:
//!
//! ```yaml
//! imports:
//!   - { resource: services/mailer.yaml }
//!   - { resource: optional.yaml, ignore_errors: true }
//!
//! includes:
//!   - services/mailer.yaml
//! ```
//!
//! Resources resolve against the importing file's directory first.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{LoaderError, Result};
use crate::loader::FileLoader;
use crate::value::{Key, Mapping, Value};

impl FileLoader<'_> {
    /// Load every resource listed under `imports` or `includes`, in order
    pub fn process_imports(&mut self, document: &Mapping, file: &Path) -> Result<()> {
        let imports = present(document, "imports");
        let includes = present(document, "includes");

        let (key, entries) = match (imports, includes) {
            (None, None) => return Ok(()),
            (Some(_), Some(_)) => {
                return Err(LoaderError::invalid(
                    file,
                    format!(
                        "The \"imports\" and \"includes\" keys cannot be used together in {}. Check your configuration syntax.",
                        file.display()
                    ),
                ));
            }
            (Some(imports), None) => ("imports", imports),
            (None, Some(includes)) => ("includes", includes),
        };

        let entries: Vec<&Value> = match entries {
            Value::Sequence(items) => items.iter().collect(),
            Value::Mapping(items) => items.values().collect(),
            _ => {
                return Err(LoaderError::invalid(
                    file,
                    format!(
                        "The \"{}\" key should contain a sequence in {}. Check your configuration syntax.",
                        key,
                        file.display()
                    ),
                ));
            }
        };

        for entry in entries {
            let (resource, ignore_errors) = if key == "imports" {
                import_entry(entry, file)?
            } else {
                (include_entry(entry, file)?, false)
            };

            self.set_current_dir(file.parent().map(Path::to_path_buf));
            self.import(&resource, ignore_errors, file)?;
        }
        Ok(())
    }

    /// Load one resource on behalf of `origin`
    ///
    /// With `ignore_errors` a resource that cannot be found is skipped. Errors
    /// inside a resource that was found still propagate.
    pub fn import(&mut self, resource: &str, ignore_errors: bool, origin: &Path) -> Result<()> {
        debug!(resource, origin = %origin.display(), ignore_errors, "importing resource");

        let path = match self.locator().locate(resource, self.current_dir()) {
            Ok(path) => path,
            Err(e) if ignore_errors && e.is_not_found() => {
                warn!(resource, origin = %origin.display(), "skipping missing import: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let previous = self.current_dir().map(Path::to_path_buf);
        let result = self.load_path(&path);
        self.set_current_dir(previous);
        result
    }
}

fn present<'a>(document: &'a Mapping, key: &str) -> Option<&'a Value> {
    document.get(&Key::from(key)).filter(|v| !v.is_null())
}

fn import_entry(entry: &Value, file: &Path) -> Result<(String, bool)> {
    let Value::Mapping(entry) = entry else {
        return Err(LoaderError::invalid(
            file,
            format!(
                "The values in the \"imports\" key should be mappings with a \"resource\" key in {}. Check your configuration syntax.",
                file.display()
            ),
        ));
    };

    let resource = match entry.get(&Key::from("resource")).and_then(Value::as_str) {
        Some(resource) => resource.to_string(),
        None => {
            return Err(LoaderError::invalid(
                file,
                format!(
                    "An import in {} is missing a string \"resource\" key.",
                    file.display()
                ),
            ));
        }
    };

    let ignore_errors = match entry.get(&Key::from("ignore_errors")) {
        None => false,
        Some(value) if value.is_null() => false,
        Some(value) => value.as_bool().ok_or_else(|| {
            LoaderError::invalid(
                file,
                format!(
                    "The \"ignore_errors\" option of import \"{}\" in {} must be a boolean.",
                    resource,
                    file.display()
                ),
            )
        })?,
    };

    Ok((resource, ignore_errors))
}

fn include_entry(entry: &Value, file: &Path) -> Result<String> {
    entry.as_str().map(String::from).ok_or_else(|| {
        LoaderError::invalid(
            file,
            format!(
                "The values in the \"includes\" key should be file names in {}, {} found.",
                file.display(),
                entry.type_name()
            ),
        )
    })
}
