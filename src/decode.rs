//! Source decoders
//!
//! A [`Decode`] implementation turns file contents into a [`Value`] tree.
//! The loader never looks at source text itself.
//!
//! The bundled [`YamlDecoder`] maps YAML onto the value model and reads
//! tagged nodes as entities:
//!
//! ```yaml
//! services:
//!   manager: !EntityManager [slave]      # entity head "EntityManager"
//!   my_mailer:
//!     arguments: [!expr "service('x')"]  # expression entity
//! ```

use crate::error::DecodeError;
use crate::value::Value;

/// Format parser seam
pub trait Decode {
    /// Format name accepted as an explicit resource type
    fn format(&self) -> &str;

    /// File extensions this decoder handles, without the dot
    fn extensions(&self) -> &[&str];

    /// Decode a document; `None` for an empty document
    fn decode(&self, contents: &str) -> Result<Option<Value>, DecodeError>;
}

#[cfg(feature = "yaml")]
pub use yaml::YamlDecoder;

#[cfg(feature = "yaml")]
mod yaml {
    use serde_yaml::value::TaggedValue;

    use super::Decode;
    use crate::error::DecodeError;
    use crate::value::{list_to_mapping, Entity, Key, Mapping, Scalar, Value};

    /// YAML documents with `!Head` tags read as entities
    #[derive(Debug, Default, Clone, Copy)]
    pub struct YamlDecoder;

    impl Decode for YamlDecoder {
        fn format(&self) -> &str {
            "yaml"
        }

        fn extensions(&self) -> &[&str] {
            &["yaml", "yml"]
        }

        fn decode(&self, contents: &str) -> Result<Option<Value>, DecodeError> {
            let raw: serde_yaml::Value =
                serde_yaml::from_str(contents).map_err(|e| DecodeError::Syntax {
                    message: e.to_string(),
                })?;
            match raw {
                serde_yaml::Value::Null => Ok(None),
                raw => convert(raw).map(Some),
            }
        }
    }

    fn convert(raw: serde_yaml::Value) -> Result<Value, DecodeError> {
        Ok(match raw {
            serde_yaml::Value::Null => Value::null(),
            serde_yaml::Value::Bool(b) => Value::bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::int(i),
                None => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_yaml::Value::String(s) => Value::string(s),
            serde_yaml::Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(convert)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            serde_yaml::Value::Mapping(entries) => Value::Mapping(convert_mapping(entries)?),
            serde_yaml::Value::Tagged(tagged) => Value::Entity(convert_tagged(*tagged)?),
        })
    }

    fn convert_mapping(entries: serde_yaml::Mapping) -> Result<Mapping, DecodeError> {
        let mut mapping = Mapping::with_capacity(entries.len());
        for (key, value) in entries {
            let key = match key {
                serde_yaml::Value::String(s) => Key::Name(s),
                serde_yaml::Value::Number(n) => match n.as_u64() {
                    Some(i) => Key::Index(i as usize),
                    None => Key::Name(n.to_string()),
                },
                serde_yaml::Value::Bool(b) => Key::Name(b.to_string()),
                other => {
                    return Err(DecodeError::Unsupported(format!(
                        "mapping key {:?} is not a string or an integer",
                        other
                    )));
                }
            };
            mapping.insert(key, convert(value)?);
        }
        Ok(mapping)
    }

    fn convert_tagged(tagged: TaggedValue) -> Result<Entity, DecodeError> {
        let head = tagged.tag.to_string();
        let head = head.strip_prefix('!').unwrap_or(&head).to_string();
        let attributes = match convert(tagged.value)? {
            Value::Scalar(Scalar::Null) => Mapping::new(),
            Value::Sequence(items) => list_to_mapping(items),
            Value::Mapping(mapping) => mapping,
            single => list_to_mapping(vec![single]),
        };
        Ok(Entity::new(head, attributes))
    }

}
