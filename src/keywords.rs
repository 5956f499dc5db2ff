//! Closed keyword table for service definitions

use std::path::Path;

use crate::error::{LoaderError, Result};
use crate::value::Mapping;

/// Keys accepted in a service definition mapping
pub const KEYWORDS: &[&str] = &[
    "alias",
    "parent",
    "class",
    "shared",
    "synthetic",
    "lazy",
    "public",
    "abstract",
    "deprecated",
    "factory",
    "file",
    "arguments",
    "properties",
    "configurator",
    "calls",
    "tags",
    "decorates",
    "decoration_inner_name",
    "decoration_priority",
    "autowire",
    "autowiring_types",
    "setup",
];

/// Legacy spellings folded into a canonical keyword before field population
pub const LEGACY_KEYWORDS: &[&str] = &["autowired"];

/// Keys allowed next to `alias`
pub const ALIAS_KEYWORDS: &[&str] = &["alias", "public"];

pub fn is_keyword(key: &str) -> bool {
    KEYWORDS.contains(&key) || LEGACY_KEYWORDS.contains(&key)
}

/// Reject any key outside the keyword table
pub fn check_definition(id: &str, service: &Mapping, file: &Path) -> Result<()> {
    for key in service.keys() {
        let known = key.as_name().is_some_and(is_keyword);
        if !known {
            let key = key.to_string();
            let mut message = format!(
                "The configuration key \"{}\" is unsupported for service definition \"{}\" in \"{}\". Allowed configuration keys are \"{}\".",
                key,
                id,
                file.display(),
                KEYWORDS.join("\", \"")
            );
            if let Some(hint) = suggest(&key, KEYWORDS.iter().copied()) {
                message.push_str(&format!(" Did you mean \"{}\"?", hint));
            }
            return Err(LoaderError::invalid(file, message));
        }
    }
    Ok(())
}

/// Closest candidate by Jaro-Winkler similarity, if any is close enough
pub fn suggest<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|c| (c, strsim::jaro_winkler(input, c)))
        .filter(|(_, score)| *score >= 0.85)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}
