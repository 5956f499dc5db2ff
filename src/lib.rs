//! di-loader: service container definitions from configuration files
//!
//! This crate turns declarative service configuration into definitions on a
//! container builder:
//! - Value model for decoded documents (scalars, sequences, mappings, entities)
//! - Reference resolver for `@id`, `@?id`, `@=expr` and inline entities
//! - Definition compiler for the closed service keyword table
//! - Import processor with circular import detection
//! - Top-level document handler dispatching extension namespaces
//!
//! Decoding is pluggable through [`Decode`]; YAML is bundled behind the
//! default `yaml` feature.

pub mod compiler;
pub mod config;
pub mod container;
pub mod decode;
pub mod definition;
pub mod error;
pub mod imports;
pub mod keywords;
pub mod loader;
pub mod locator;
pub mod resolver;
pub mod scope;
pub mod value;

// Re-export commonly used types
pub use config::LoaderConfig;
pub use container::{ContainerBuilder, ContainerSink};
pub use decode::Decode;
#[cfg(feature = "yaml")]
pub use decode::YamlDecoder;
pub use definition::{
    Alias, CallTarget, Callable, DecoratedService, Expression, InvalidBehavior, MethodCall,
    Reference, ResolvedValue, ServiceDefinition, TagAttributes,
};
pub use error::{DecodeError, LoaderError, Result};
pub use loader::FileLoader;
pub use locator::{FileLocator, Locate};
pub use scope::DocumentScope;
pub use value::{Entity, Key, Mapping, Scalar, Value};
