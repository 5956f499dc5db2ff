//! Service definition records
//!
//! The output of a load pass: definitions, aliases and the resolved values they
//! carry. Nothing here builds objects; these are instructions for a container
//! runtime.

use indexmap::IndexMap;
use serde::Serialize;

#[cfg(test)]
use crate::value::Value;
use crate::value::{Key, Scalar};

// =============================================================================
// REFERENCES AND EXPRESSIONS
// =============================================================================

/// What the runtime does when a referenced service does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InvalidBehavior {
    /// `@id`
    #[default]
    FailOnMissing,
    /// `@?id`, resolves to null when missing
    IgnoreOnMissing,
    /// Optional without an exception path; never produced by the loader
    IgnoreOnMissingSilently,
}

/// Pointer to another service id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub id: String,
    pub invalid_behavior: InvalidBehavior,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            invalid_behavior: InvalidBehavior::FailOnMissing,
        }
    }

    pub fn optional(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            invalid_behavior: InvalidBehavior::IgnoreOnMissing,
        }
    }
}

/// Code evaluated by the runtime against the container (`@=...` or `expr(...)`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expression(pub String);

impl Expression {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }
}

// =============================================================================
// RESOLVED VALUES
// =============================================================================

/// A value after reference resolution
///
/// Entities never survive resolution: they become an [`Expression`], a
/// [`Reference`], or a reference to a synthesized anonymous definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Scalar(Scalar),
    Sequence(Vec<ResolvedValue>),
    Mapping(IndexMap<Key, ResolvedValue>),
    Reference(Reference),
    Expression(Expression),
}

impl ResolvedValue {
    pub fn string(s: impl Into<String>) -> Self {
        ResolvedValue::Scalar(Scalar::String(s.into()))
    }

    /// Empty slot left where an autowiring `...` marker stood
    pub fn placeholder() -> Self {
        ResolvedValue::string("")
    }

    /// Literal conversion for values that contain no references or entities
    #[cfg(test)]
    pub(crate) fn literal(value: Value) -> Option<Self> {
        match value {
            Value::Scalar(s) => Some(ResolvedValue::Scalar(s)),
            Value::Sequence(items) => items
                .into_iter()
                .map(ResolvedValue::literal)
                .collect::<Option<Vec<_>>>()
                .map(ResolvedValue::Sequence),
            Value::Mapping(m) => m
                .into_iter()
                .map(|(k, v)| ResolvedValue::literal(v).map(|v| (k, v)))
                .collect::<Option<IndexMap<_, _>>>()
                .map(ResolvedValue::Mapping),
            Value::Entity(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResolvedValue::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            ResolvedValue::Reference(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Reference> for ResolvedValue {
    fn from(r: Reference) -> Self {
        ResolvedValue::Reference(r)
    }
}

impl From<Expression> for ResolvedValue {
    fn from(e: Expression) -> Self {
        ResolvedValue::Expression(e)
    }
}

impl From<&str> for ResolvedValue {
    fn from(s: &str) -> Self {
        ResolvedValue::string(s)
    }
}

// =============================================================================
// CALLABLES
// =============================================================================

/// Receiver of a `(target, method)` callable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallTarget {
    /// Static call on a class
    Class(String),
    /// Method call on another service
    Service(Reference),
}

/// Factory or configurator descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Callable {
    /// Plain function name
    Function(String),
    Method { target: CallTarget, method: String },
}

impl Callable {
    pub fn static_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Callable::Method {
            target: CallTarget::Class(class.into()),
            method: method.into(),
        }
    }

    pub fn service_method(reference: Reference, method: impl Into<String>) -> Self {
        Callable::Method {
            target: CallTarget::Service(reference),
            method: method.into(),
        }
    }
}

/// Method invoked after construction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodCall {
    pub method: String,
    pub arguments: Vec<ResolvedValue>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Vec<ResolvedValue>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// `decorates` / `decoration_inner_name` / `decoration_priority`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratedService {
    pub id: String,
    pub inner_name: Option<String>,
    pub priority: i64,
}

/// Scalar attributes attached to one occurrence of a tag
pub type TagAttributes = IndexMap<String, Scalar>;

// =============================================================================
// DEFINITION
// =============================================================================

/// How to construct and wire one service
///
/// Flags are `None` when the document did not set them, so a child definition
/// can defer to its parent for everything it leaves unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceDefinition {
    pub parent: Option<String>,
    pub class: Option<String>,
    pub factory: Option<Callable>,
    pub arguments: Vec<ResolvedValue>,
    pub properties: IndexMap<String, ResolvedValue>,
    pub calls: Vec<MethodCall>,
    pub tags: IndexMap<String, Vec<TagAttributes>>,
    pub shared: Option<bool>,
    pub synthetic: Option<bool>,
    pub lazy: Option<bool>,
    pub public: Option<bool>,
    pub r#abstract: Option<bool>,
    pub autowired: Option<bool>,
    /// Present (possibly empty) when the service is deprecated
    pub deprecated: Option<String>,
    pub decorated_service: Option<DecoratedService>,
    pub autowiring_types: Vec<String>,
    pub file: Option<String>,
    pub configurator: Option<Callable>,
}

impl ServiceDefinition {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::default()
        }
    }

    /// Child definition that inherits unset fields from `parent`
    pub fn child_of(parent: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Self::default()
        }
    }

    pub fn is_shared(&self) -> bool {
        self.shared.unwrap_or(true)
    }

    pub fn is_public(&self) -> bool {
        self.public.unwrap_or(true)
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic.unwrap_or(false)
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy.unwrap_or(false)
    }

    pub fn is_abstract(&self) -> bool {
        self.r#abstract.unwrap_or(false)
    }

    pub fn is_autowired(&self) -> bool {
        self.autowired.unwrap_or(false)
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
    }

    pub fn add_tag(&mut self, name: impl Into<String>, attributes: TagAttributes) {
        self.tags.entry(name.into()).or_default().push(attributes);
    }

    pub fn add_method_call(&mut self, call: MethodCall) {
        self.calls.push(call);
    }

    /// Autowiring types are a set; repeated entries are kept once
    pub fn add_autowiring_type(&mut self, ty: impl Into<String>) {
        let ty = ty.into();
        if !self.autowiring_types.contains(&ty) {
            self.autowiring_types.push(ty);
        }
    }
}

/// Redirect from one id to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub target: String,
    pub public: bool,
}

impl Alias {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            public: true,
        }
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }
}
