//! Reference resolution
//!
//! Rewrites symbolic syntax inside any value:
//!
//! ```text
//! "@mailer"          → Reference(mailer, FailOnMissing)
//! "@?logger"         → Reference(logger, IgnoreOnMissing)
//! "@@literal"        → "@literal"
//! "@=service('x')"   → Expression
//! expr("...")        → Expression
//! App\Foo(args)      → anonymous definition + Reference to it
//! ```

use crate::definition::{Expression, Reference, ResolvedValue};
use crate::error::Result;
use crate::scope::DocumentScope;
use crate::value::{Entity, Scalar, Value};

impl DocumentScope<'_> {
    /// Resolve references, expressions and inline definitions in `value`
    pub fn resolve(&mut self, value: Value) -> Result<ResolvedValue> {
        match value {
            Value::Entity(entity) => self.resolve_entity(entity),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>>>()
                .map(ResolvedValue::Sequence),
            Value::Mapping(mapping) => {
                let mut resolved = indexmap::IndexMap::with_capacity(mapping.len());
                for (key, item) in mapping {
                    resolved.insert(key, self.resolve(item)?);
                }
                Ok(ResolvedValue::Mapping(resolved))
            }
            Value::Scalar(Scalar::String(s)) => Ok(resolve_string(s)),
            Value::Scalar(scalar) => Ok(ResolvedValue::Scalar(scalar)),
        }
    }

    fn resolve_entity(&mut self, entity: Entity) -> Result<ResolvedValue> {
        let head = entity.head_str().map(str::to_string);
        match head.as_deref() {
            Some("expression") | Some("expr") => {
                let source = entity.attributes.into_values().next();
                match source.as_ref().and_then(Value::as_str) {
                    Some(code) => Ok(Expression::new(code).into()),
                    None => Err(self.invalid(format!(
                        "An expression entity must contain a single string attribute in {}.",
                        self.file.display()
                    ))),
                }
            }
            Some(reference) if reference.starts_with('@') => {
                Ok(resolve_string(reference.to_string()))
            }
            _ => {
                let id = self.next_anonymous_id();
                self.compile_definition(&id, Value::Entity(entity))?;
                Ok(Reference::new(id).into())
            }
        }
    }
}

/// Resolve `@`-prefixed string syntax; other strings pass through
pub fn resolve_string(s: String) -> ResolvedValue {
    if let Some(code) = s.strip_prefix("@=") {
        return Expression::new(code).into();
    }
    if !s.starts_with('@') {
        return ResolvedValue::Scalar(Scalar::String(s));
    }

    // A trailing "=" is a strict-type hint with no meaning here
    let strip_hint = |rest: &str| rest.strip_suffix('=').unwrap_or(rest).to_string();

    if s.starts_with("@@") {
        ResolvedValue::string(strip_hint(&s[1..]))
    } else if let Some(rest) = s.strip_prefix("@?") {
        Reference::optional(strip_hint(rest)).into()
    } else {
        Reference::new(strip_hint(&s[1..])).into()
    }
}
