//! Definition compiler
//!
//! Turns one raw `services` entry into a [`ServiceDefinition`] (or an
//! [`Alias`]) and registers it. Work happens in three passes:
//!
//! 1. **Normalize** shorthand: entity entries, `id < parent` keys, string
//!    entries (`Class`, `factory:method`, `@alias`)
//! 2. **Validate** the entry against the closed keyword table
//! 3. **Populate** fields in a fixed order, resolving references as it goes
//!
//! ```text
//! mailer: App\Mailer                       → class
//! router: App\RouterFactory::createRouter  → factory (class, method)
//! translator: "@translator_default"        → alias
//! manager: App\EntityManager(slave)        → class + arguments
//! newsletter < mail_manager: {...}         → child definition
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::definition::{
    Alias, CallTarget, Callable, DecoratedService, MethodCall, ResolvedValue, ServiceDefinition,
    TagAttributes,
};
use crate::error::{LoaderError, Result};
use crate::keywords::{check_definition, ALIAS_KEYWORDS};
use crate::resolver::resolve_string;
use crate::scope::DocumentScope;
use crate::value::{Entity, Key, Mapping, Scalar, Value};

/// `child < parent` service keys
static INLINE_PARENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+<\s+(\S+)$").unwrap());

/// Positional argument that asks the runtime to autowire the slot
const AUTOWIRE_MARKER: &str = "...";

fn take(service: &mut Mapping, key: &str) -> Option<Value> {
    service.shift_remove(&Key::Name(key.to_string()))
}

/// Like [`take`] but treats an explicit null as absent
fn take_set(service: &mut Mapping, key: &str) -> Option<Value> {
    take(service, key).filter(|v| !v.is_null())
}

impl DocumentScope<'_> {
    /// Compile one service entry and register the result with the sink
    pub fn compile_definition(&mut self, id: &str, entry: Value) -> Result<()> {
        let entry = self.unwrap_entity(id, entry)?;

        let (id, inline_parent) = match INLINE_PARENT_RE.captures(id) {
            Some(caps) => {
                let (child, parent) = (caps[1].to_string(), caps[2].to_string());
                if let Some(explicit) = entry.get("parent").and_then(Value::as_str) {
                    if explicit != parent {
                        return Err(self.invalid(format!(
                            "Two parent services \"{}\" and \"{}\" are defined for service \"{}\" in \"{}\". Check your configuration syntax.",
                            explicit,
                            parent,
                            child,
                            self.file.display()
                        )));
                    }
                }
                (child, Some(parent))
            }
            None => (id.to_string(), None),
        };
        let id = id.as_str();

        let mut service = match entry {
            Value::Mapping(service) => service,
            Value::Scalar(Scalar::String(s)) if s.contains(':') => {
                Mapping::from([(Key::from("factory"), Value::string(s))])
            }
            Value::Scalar(Scalar::String(s)) if s.starts_with('@') => {
                self.sink.set_alias(id, Alias::new(&s[1..]));
                return Ok(());
            }
            Value::Scalar(Scalar::String(s)) => {
                Mapping::from([(Key::from("class"), Value::string(s))])
            }
            other => {
                return Err(self.invalid(format!(
                    "A service definition must be a mapping, a string or an entity but {} found for service \"{}\" in {}. Check your configuration syntax.",
                    other.type_name(),
                    id,
                    self.file.display()
                )));
            }
        };

        check_definition(id, &service, self.file)?;

        // `alias: ~` compiles as a plain definition
        match service.get(&Key::from("alias")).map(Value::is_null) {
            Some(false) => return self.compile_alias(id, service),
            Some(true) => {
                take(&mut service, "alias");
            }
            None => {}
        }

        if let Some(parent) = inline_parent {
            service.insert(Key::from("parent"), Value::string(parent));
        }

        let mut definition = match take_set(&mut service, "parent") {
            Some(parent) => ServiceDefinition::child_of(self.expect_string(id, "parent", parent)?),
            None => ServiceDefinition::default(),
        };

        if let Some(class) = take_set(&mut service, "class") {
            let class = self.unwrap_arguments(id, &mut service, class)?;
            definition.class = Some(self.expect_string(id, "class", class)?);
        }

        definition.shared = self.flag(id, &mut service, "shared")?;
        definition.synthetic = self.flag(id, &mut service, "synthetic")?;
        definition.lazy = self.flag(id, &mut service, "lazy")?;
        definition.public = self.flag(id, &mut service, "public")?;
        definition.r#abstract = self.flag(id, &mut service, "abstract")?;

        if let Some(deprecated) = take(&mut service, "deprecated") {
            definition.deprecated = Some(match deprecated {
                Value::Scalar(Scalar::String(message)) => message,
                Value::Scalar(Scalar::Null) | Value::Scalar(Scalar::Bool(_)) => String::new(),
                other => {
                    return Err(self.type_error(id, "deprecated", "a string", &other));
                }
            });
        }

        if let Some(factory) = take_set(&mut service, "factory") {
            let factory = self.unwrap_arguments(id, &mut service, factory)?;
            definition.factory = Some(self.parse_callable(id, "factory", factory)?);
        }

        if let Some(file) = take_set(&mut service, "file") {
            definition.file = Some(self.expect_string(id, "file", file)?);
        }

        if let Some(arguments) = take_set(&mut service, "arguments") {
            let arguments = self.expect_list(id, "arguments", arguments)?;
            let mut resolved = Vec::with_capacity(arguments.len());
            for argument in arguments {
                if argument.as_str() == Some(AUTOWIRE_MARKER) {
                    resolved.push(ResolvedValue::placeholder());
                    definition.autowired = Some(true);
                } else {
                    resolved.push(self.resolve(argument)?);
                }
            }
            definition.arguments = resolved;
        }

        if let Some(setup) = take_set(&mut service, "setup") {
            self.expand_setup(id, &mut service, setup)?;
        }

        if let Some(properties) = take_set(&mut service, "properties") {
            let properties = match properties {
                Value::Mapping(properties) => properties,
                other => return Err(self.type_error(id, "properties", "a mapping", &other)),
            };
            for (name, value) in properties {
                let value = self.resolve(value)?;
                definition.properties.insert(name.to_string(), value);
            }
        }

        if let Some(configurator) = take_set(&mut service, "configurator") {
            definition.configurator = Some(self.parse_callable(id, "configurator", configurator)?);
        }

        if let Some(calls) = take_set(&mut service, "calls") {
            for call in self.entries(id, "calls", calls)? {
                let call = self.parse_call(id, call)?;
                definition.add_method_call(call);
            }
        }

        if let Some(tags) = take_set(&mut service, "tags") {
            for tag in self.entries(id, "tags", tags)? {
                let (name, attributes) = self.parse_tag(id, tag)?;
                definition.add_tag(name, attributes);
            }
        }

        if let Some(decorates) = take_set(&mut service, "decorates") {
            let inner_name = take_set(&mut service, "decoration_inner_name")
                .map(|v| self.expect_string(id, "decoration_inner_name", v))
                .transpose()?;
            let priority = match take_set(&mut service, "decoration_priority") {
                Some(p) => p
                    .as_int()
                    .ok_or_else(|| self.type_error(id, "decoration_priority", "an integer", &p))?,
                None => 0,
            };
            definition.decorated_service = Some(DecoratedService {
                id: self.expect_string(id, "decorates", decorates)?,
                inner_name,
                priority,
            });
        }

        let mut autowire = self.flag(id, &mut service, "autowire")?;
        if let Some(autowired) = self.flag(id, &mut service, "autowired")? {
            if autowire.is_some_and(|a| a != autowired) {
                return Err(self.contradictory_autowiring(id));
            }
            autowire = Some(autowired);
        }
        if let Some(autowire) = autowire {
            if definition.is_autowired() && !autowire {
                return Err(self.contradictory_autowiring(id));
            }
            definition.autowired = Some(autowire);
        }

        if let Some(types) = take_set(&mut service, "autowiring_types") {
            match types {
                Value::Scalar(Scalar::String(ty)) => definition.add_autowiring_type(ty),
                Value::Sequence(types) => {
                    for ty in types {
                        let Value::Scalar(Scalar::String(ty)) = ty else {
                            return Err(self.invalid(format!(
                                "A \"autowiring_types\" attribute must be of type string for service \"{}\" in {}. Check your configuration syntax.",
                                id,
                                self.file.display()
                            )));
                        };
                        definition.add_autowiring_type(ty);
                    }
                }
                other => {
                    return Err(self.type_error(
                        id,
                        "autowiring_types",
                        "a string or a sequence",
                        &other,
                    ));
                }
            }
        }

        self.sink.set_definition(id, definition);
        Ok(())
    }

    // =========================================================================
    // NORMALIZATION
    // =========================================================================

    /// `Head(args)` entries become `{class|factory: Head, arguments: args}`
    fn unwrap_entity(&self, id: &str, entry: Value) -> Result<Value> {
        let (head, attributes) = match entry {
            Value::Entity(Entity {
                head: Scalar::String(head),
                attributes,
            }) => (head, attributes),
            Value::Entity(Entity { head, .. }) => {
                return Err(self.invalid(format!(
                    "The entity head for service \"{}\" in {} must be a string, {} found.",
                    id,
                    self.file.display(),
                    head.type_name()
                )));
            }
            other => return Ok(other),
        };
        let field = if head.contains(':') { "factory" } else { "class" };
        Ok(Value::Mapping(Mapping::from([
            (Key::from("arguments"), Value::from_mapping(attributes)),
            (Key::from(field), Value::string(head)),
        ])))
    }

    /// Split an entity-typed `class`/`factory` value into head and arguments
    fn unwrap_arguments(&self, id: &str, service: &mut Mapping, value: Value) -> Result<Value> {
        let (head, attributes) = match value {
            Value::Entity(Entity { head, attributes }) => (head, attributes),
            other => return Ok(other),
        };
        if !attributes.is_empty() {
            let explicit = service
                .get(&Key::from("arguments"))
                .is_some_and(|v| !v.is_null());
            if explicit {
                return Err(self.invalid(format!(
                    "Duplicated definition of arguments for service \"{}\" in \"{}\". Check your configuration syntax.",
                    id,
                    self.file.display()
                )));
            }
            service.insert(Key::from("arguments"), Value::from_mapping(attributes));
        }
        Ok(Value::Scalar(head))
    }

    /// Fold legacy `setup` entries into `properties` (`$name`) and `calls`
    fn expand_setup(&self, id: &str, service: &mut Mapping, setup: Value) -> Result<()> {
        let mut properties = Mapping::new();
        let mut calls = Vec::new();

        for item in self.entries(id, "setup", setup)? {
            let (name, args) = match item {
                Value::Entity(entity) => {
                    let args = entity.attributes_value();
                    (Value::Scalar(entity.head), args)
                }
                Value::Sequence(mut pair) if !pair.is_empty() => {
                    let args = if pair.len() > 1 {
                        pair.swap_remove(1)
                    } else {
                        Value::Sequence(vec![])
                    };
                    (pair.swap_remove(0), args)
                }
                name @ Value::Scalar(_) => (name, Value::Sequence(vec![])),
                other => {
                    return Err(self.type_error(
                        id,
                        "setup",
                        "an entity, a pair or a method name",
                        &other,
                    ));
                }
            };

            let name = match name {
                Value::Scalar(Scalar::String(name)) if !name.is_empty() => name,
                other => {
                    return Err(self.invalid(format!(
                        "A \"setup\" entry for service \"{}\" in {} must be named by a non-empty string, {} found.",
                        id,
                        self.file.display(),
                        other.type_name()
                    )));
                }
            };

            match name.strip_prefix('$') {
                Some(property) => {
                    properties.insert(Key::from(property), args);
                }
                None => calls.push(Value::Sequence(vec![Value::string(name), args])),
            }
        }

        if !properties.is_empty() {
            let merged = match take(service, "properties") {
                None | Some(Value::Scalar(Scalar::Null)) => properties,
                Some(Value::Mapping(mut existing)) => {
                    existing.extend(properties);
                    existing
                }
                Some(other) => return Err(self.type_error(id, "properties", "a mapping", &other)),
            };
            service.insert(Key::from("properties"), Value::Mapping(merged));
        }

        if !calls.is_empty() {
            let merged = match take(service, "calls") {
                None | Some(Value::Scalar(Scalar::Null)) => calls,
                Some(Value::Sequence(mut existing)) => {
                    existing.extend(calls);
                    existing
                }
                Some(Value::Mapping(existing)) => {
                    existing.into_values().chain(calls).collect()
                }
                Some(other) => return Err(self.type_error(id, "calls", "a sequence", &other)),
            };
            service.insert(Key::from("calls"), Value::Sequence(merged));
        }

        Ok(())
    }

    fn compile_alias(&mut self, id: &str, mut service: Mapping) -> Result<()> {
        if let Some(key) = service
            .keys()
            .find(|k| !k.as_name().is_some_and(|k| ALIAS_KEYWORDS.contains(&k)))
        {
            return Err(self.invalid(format!(
                "The configuration key \"{}\" is unsupported for alias definition \"{}\" in \"{}\". Allowed configuration keys are \"{}\".",
                key,
                id,
                self.file.display(),
                ALIAS_KEYWORDS.join("\" and \"")
            )));
        }

        let target = take(&mut service, "alias").unwrap_or_else(Value::null);
        let target = self.expect_string(id, "alias", target)?;
        let public = self.flag(id, &mut service, "public")?.unwrap_or(true);
        self.sink.set_alias(id, Alias::new(target).with_public(public));
        Ok(())
    }

    // =========================================================================
    // FIELD PARSERS
    // =========================================================================

    /// Parse a factory or configurator descriptor
    ///
    /// `Class::method`, `@service::method`, `service:method`, `[target, method]`
    /// or a bare function name.
    fn parse_callable(&mut self, id: &str, field: &str, value: Value) -> Result<Callable> {
        match value {
            Value::Scalar(Scalar::String(s)) => {
                if let Some((target, method)) = s.split_once("::") {
                    let target = if target.starts_with('@') {
                        self.call_target(id, field, resolve_string(target.to_string()))?
                    } else {
                        CallTarget::Class(target.to_string())
                    };
                    Ok(Callable::Method {
                        target,
                        method: method.to_string(),
                    })
                } else if let Some((service, method)) = s.split_once(':') {
                    let service = if service.starts_with('@') {
                        service.to_string()
                    } else {
                        format!("@{}", service)
                    };
                    Ok(Callable::Method {
                        target: self.call_target(id, field, resolve_string(service))?,
                        method: method.to_string(),
                    })
                } else {
                    Ok(Callable::Function(s))
                }
            }
            Value::Sequence(mut pair) if pair.len() == 2 => {
                let method = pair.pop().unwrap_or_else(Value::null);
                let target = pair.pop().unwrap_or_else(Value::null);
                let method = self.expect_string(id, field, method)?;
                let target = self.resolve(target)?;
                Ok(Callable::Method {
                    target: self.call_target(id, field, target)?,
                    method,
                })
            }
            other => Err(self.type_error(
                id,
                field,
                "a string or a [target, method] pair",
                &other,
            )),
        }
    }

    fn call_target(&self, id: &str, field: &str, target: ResolvedValue) -> Result<CallTarget> {
        match target {
            ResolvedValue::Reference(reference) => Ok(CallTarget::Service(reference)),
            ResolvedValue::Scalar(Scalar::String(class)) => Ok(CallTarget::Class(class)),
            _ => Err(self.invalid(format!(
                "The \"{}\" target for service \"{}\" in {} must be a class name or a service reference.",
                field,
                id,
                self.file.display()
            ))),
        }
    }

    /// One `calls` entry: `method(args)`, `{method, arguments}`, `[method, args]` or `method`
    fn parse_call(&mut self, id: &str, call: Value) -> Result<MethodCall> {
        let (method, args) = match call {
            Value::Entity(entity) => {
                let args = Value::from_mapping(entity.attributes);
                (Value::Scalar(entity.head), Some(args))
            }
            Value::Mapping(mut call) => match take(&mut call, "method") {
                Some(method) => (method, take(&mut call, "arguments")),
                None => {
                    return Err(self.invalid(format!(
                        "A \"calls\" entry for service \"{}\" in {} is missing a \"method\" key.",
                        id,
                        self.file.display()
                    )));
                }
            },
            Value::Sequence(mut pair) if !pair.is_empty() => {
                let args = if pair.len() > 1 {
                    Some(pair.swap_remove(1))
                } else {
                    None
                };
                (pair.swap_remove(0), args)
            }
            method @ Value::Scalar(_) => (method, None),
            other => {
                return Err(self.type_error(id, "calls", "a method call", &other));
            }
        };

        let method = self.expect_string(id, "calls", method)?;
        let arguments = match args.filter(|a| !a.is_null()) {
            Some(args) => self
                .expect_list(id, "calls", args)?
                .into_iter()
                .map(|arg| self.resolve(arg))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok(MethodCall::new(method, arguments))
    }

    /// One `tags` entry: `name`, `name(attr: value)` or `{name: ..., attr: value}`
    fn parse_tag(&self, id: &str, tag: Value) -> Result<(String, TagAttributes)> {
        let (name, attributes) = match tag {
            Value::Scalar(Scalar::String(name)) => (Value::string(name), Mapping::new()),
            Value::Entity(entity) => {
                let mut attributes = entity.attributes;
                attributes.shift_remove(&Key::from("name"));
                (Value::Scalar(entity.head), attributes)
            }
            Value::Mapping(mut attributes) => match take(&mut attributes, "name") {
                Some(name) => (name, attributes),
                None => {
                    return Err(self.invalid(format!(
                        "A \"tags\" entry is missing a \"name\" key for service \"{}\" in {}.",
                        id,
                        self.file.display()
                    )));
                }
            },
            _ => {
                return Err(self.invalid(format!(
                    "A \"tags\" entry must be a mapping for service \"{}\" in {}. Check your configuration syntax.",
                    id,
                    self.file.display()
                )));
            }
        };

        let name = match name {
            Value::Scalar(Scalar::String(name)) if !name.is_empty() => name,
            _ => {
                return Err(self.invalid(format!(
                    "The tag name for service \"{}\" in {} must be a non-empty string.",
                    id,
                    self.file.display()
                )));
            }
        };

        let mut scalars = TagAttributes::new();
        for (attribute, value) in attributes {
            let Value::Scalar(value) = value else {
                return Err(self.invalid(format!(
                    "A \"tags\" attribute must be of a scalar-type for service \"{}\", tag \"{}\", attribute \"{}\" in {}. Check your configuration syntax.",
                    id,
                    name,
                    attribute,
                    self.file.display()
                )));
            };
            scalars.insert(attribute.to_string(), value);
        }

        Ok((name, scalars))
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Entries of a collection-valued field, in document order
    fn entries(&self, id: &str, field: &str, value: Value) -> Result<Vec<Value>> {
        match value {
            Value::Sequence(items) => Ok(items),
            Value::Mapping(items) => Ok(items.into_values().collect()),
            other => Err(self.invalid(format!(
                "Parameter \"{}\" must be an array for service \"{}\" in {}, {} found. Check your configuration syntax.",
                field,
                id,
                self.file.display(),
                other.type_name()
            ))),
        }
    }

    fn expect_list(&self, id: &str, field: &str, value: Value) -> Result<Vec<Value>> {
        let type_name = value.type_name();
        value.into_list().ok_or_else(|| {
            self.invalid(format!(
                "Parameter \"{}\" must be a list of positional values for service \"{}\" in {}, {} found.",
                field,
                id,
                self.file.display(),
                type_name
            ))
        })
    }

    fn expect_string(&self, id: &str, field: &str, value: Value) -> Result<String> {
        match value {
            Value::Scalar(Scalar::String(s)) => Ok(s),
            other => Err(self.type_error(id, field, "a string", &other)),
        }
    }

    fn flag(&self, id: &str, service: &mut Mapping, field: &str) -> Result<Option<bool>> {
        match take_set(service, field) {
            Some(Value::Scalar(Scalar::Bool(b))) => Ok(Some(b)),
            Some(other) => Err(self.type_error(id, field, "a boolean", &other)),
            None => Ok(None),
        }
    }

    fn type_error(
        &self,
        id: &str,
        field: &str,
        expected: &str,
        found: &Value,
    ) -> LoaderError {
        self.invalid(format!(
            "Parameter \"{}\" must be {} for service \"{}\" in {}, {} found. Check your configuration syntax.",
            field,
            expected,
            id,
            self.file.display(),
            found.type_name()
        ))
    }

    fn contradictory_autowiring(&self, id: &str) -> LoaderError {
        self.invalid(format!(
            "Contradictory definition of autowiring for service \"{}\" in \"{}\". Check your configuration syntax.",
            id,
            self.file.display()
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerBuilder;
    use crate::definition::{Expression, Reference};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const FILE: &str = "/app/config/services.yaml";

    fn compile(builder: &mut ContainerBuilder, id: &str, entry: Value) -> Result<()> {
        let mut scope = DocumentScope::new(builder, Path::new(FILE));
        scope.compile_definition(id, entry)
    }

    fn compiled(id: &str, entry: Value) -> ServiceDefinition {
        let mut builder = ContainerBuilder::new();
        compile(&mut builder, id, entry).unwrap();
        builder.definition(id).cloned().expect("definition registered")
    }

    fn compile_err(id: &str, entry: Value) -> String {
        let mut builder = ContainerBuilder::new();
        let err = compile(&mut builder, id, entry).unwrap_err();
        assert!(err.is_invalid_configuration());
        err.to_string()
    }

    #[test]
    fn test_class_shorthand() {
        let def = compiled("authenticator", Value::string("App\\Users\\Authenticator"));
        assert_eq!(def, ServiceDefinition::new("App\\Users\\Authenticator"));
        assert!(def.arguments.is_empty());
    }

    #[test]
    fn test_class_entity_entry() {
        let def = compiled(
            "slave_entity_manager",
            Value::entity("App\\EntityManager", vec![Value::string("slave")]),
        );
        assert_eq!(def.class.as_deref(), Some("App\\EntityManager"));
        assert_eq!(def.arguments, vec![ResolvedValue::string("slave")]);
    }

    #[test]
    fn test_static_factory_string() {
        let def = compiled("router", Value::string("App\\Http\\RouterFactory::createRouter"));
        assert_eq!(
            def.factory,
            Some(Callable::static_method("App\\Http\\RouterFactory", "createRouter"))
        );
        assert!(def.class.is_none());
    }

    #[test]
    fn test_service_factory_string() {
        let def = compiled("validator", Value::string("validator_factory:createValidator"));
        assert_eq!(
            def.factory,
            Some(Callable::service_method(
                Reference::new("validator_factory"),
                "createValidator"
            ))
        );
    }

    #[test]
    fn test_service_factory_with_explicit_reference() {
        let def = compiled(
            "entity_manager",
            Value::mapping([("factory", Value::string("@doctrine::getManager"))]),
        );
        assert_eq!(
            def.factory,
            Some(Callable::service_method(Reference::new("doctrine"), "getManager"))
        );

        let def = compiled(
            "cache",
            Value::mapping([("factory", Value::string("@?cache_factory:create"))]),
        );
        assert_eq!(
            def.factory,
            Some(Callable::service_method(Reference::optional("cache_factory"), "create"))
        );
    }

    #[test]
    fn test_factory_entity_supplies_arguments() {
        let def = compiled(
            "translator",
            Value::entity("translator_factory:create", vec![Value::string("cs")]),
        );
        assert_eq!(def.arguments, vec![ResolvedValue::string("cs")]);
        assert_eq!(
            def.factory,
            Some(Callable::service_method(Reference::new("translator_factory"), "create"))
        );
    }

    #[test]
    fn test_factory_pair() {
        let def = compiled(
            "form",
            Value::mapping([
                (
                    "factory",
                    Value::Sequence(vec![Value::string("@form.factory"), Value::string("create")]),
                ),
                ("arguments", Value::Sequence(vec![Value::string("registration")])),
            ]),
        );
        assert_eq!(
            def.factory,
            Some(Callable::service_method(Reference::new("form.factory"), "create"))
        );
        assert_eq!(def.arguments, vec![ResolvedValue::string("registration")]);
    }

    #[test]
    fn test_function_factory() {
        let def = compiled("clock", Value::mapping([("factory", Value::string("make_clock"))]));
        assert_eq!(def.factory, Some(Callable::Function("make_clock".to_string())));
    }

    #[test]
    fn test_string_alias_shorthand() {
        let mut builder = ContainerBuilder::new();
        compile(&mut builder, "translator", Value::string("@translator_default")).unwrap();
        assert!(builder.definition("translator").is_none());
        assert_eq!(
            builder.alias("translator"),
            Some(&Alias::new("translator_default"))
        );
    }

    #[test]
    fn test_alias_mapping() {
        let mut builder = ContainerBuilder::new();
        let entry = Value::mapping([
            ("alias", Value::string("mailer.smtp")),
            ("public", Value::bool(false)),
        ]);
        compile(&mut builder, "mailer", entry).unwrap();
        let alias = builder.alias("mailer").unwrap();
        assert_eq!(alias.target, "mailer.smtp");
        assert!(!alias.public);
    }

    #[test]
    fn test_null_alias_compiles_definition() {
        let mut builder = ContainerBuilder::new();
        let entry = Value::mapping([
            ("alias", Value::null()),
            ("class", Value::string("App\\Mailer")),
        ]);
        compile(&mut builder, "mailer", entry).unwrap();
        assert!(builder.alias("mailer").is_none());
        assert_eq!(
            builder.definition("mailer").and_then(|d| d.class.as_deref()),
            Some("App\\Mailer")
        );
    }

    #[test]
    fn test_alias_rejects_other_keys() {
        let msg = compile_err(
            "mailer",
            Value::mapping([
                ("alias", Value::string("mailer.smtp")),
                ("class", Value::string("App\\Mailer")),
            ]),
        );
        assert!(msg.contains("\"class\""));
        assert!(msg.contains("alias definition \"mailer\""));
    }

    #[test]
    fn test_inline_parent_syntax() {
        let mut builder = ContainerBuilder::new();
        let entry = Value::mapping([("class", Value::string("App\\NewsletterManager"))]);
        compile(&mut builder, "newsletter_manager < mail_manager", entry).unwrap();
        let def = builder.definition("newsletter_manager").unwrap();
        assert_eq!(def.parent.as_deref(), Some("mail_manager"));
        assert_eq!(def.class.as_deref(), Some("App\\NewsletterManager"));
        assert!(builder.definition("newsletter_manager < mail_manager").is_none());
    }

    #[test]
    fn test_inline_parent_with_matching_explicit_parent() {
        let def = {
            let mut builder = ContainerBuilder::new();
            let entry = Value::mapping([("parent", Value::string("mail_manager"))]);
            compile(&mut builder, "newsletter < mail_manager", entry).unwrap();
            builder.definition("newsletter").cloned().unwrap()
        };
        assert_eq!(def.parent.as_deref(), Some("mail_manager"));
    }

    #[test]
    fn test_inline_parent_conflict() {
        let msg = compile_err(
            "newsletter < mail_manager",
            Value::mapping([("parent", Value::string("other_manager"))]),
        );
        assert!(msg.contains("Two parent services"));
        assert!(msg.contains("\"newsletter\""));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let msg = compile_err(
            "mailer",
            Value::mapping([
                ("class", Value::string("App\\Mailer")),
                ("constructor", Value::string("create")),
            ]),
        );
        assert!(msg.contains("\"constructor\""));
        assert!(msg.contains("\"mailer\""));
        assert!(msg.contains(FILE));
    }

    #[test]
    fn test_non_mapping_entry_rejected() {
        let msg = compile_err("mailer", Value::int(3));
        assert!(msg.contains("integer found"));
    }

    #[test]
    fn test_flags_and_deprecation() {
        let def = compiled(
            "legacy",
            Value::mapping([
                ("class", Value::string("App\\Legacy")),
                ("shared", Value::bool(false)),
                ("lazy", Value::bool(true)),
                ("public", Value::bool(false)),
                ("abstract", Value::bool(true)),
                ("synthetic", Value::bool(true)),
                ("deprecated", Value::null()),
                ("file", Value::string("%kernel.root_dir%/legacy.php")),
            ]),
        );
        assert!(!def.is_shared());
        assert!(def.is_lazy());
        assert!(!def.is_public());
        assert!(def.is_abstract());
        assert!(def.is_synthetic());
        assert_eq!(def.deprecated.as_deref(), Some(""));
        assert_eq!(def.file.as_deref(), Some("%kernel.root_dir%/legacy.php"));
    }

    #[test]
    fn test_non_boolean_flag_rejected() {
        let msg = compile_err("svc", Value::mapping([("lazy", Value::string("yes"))]));
        assert!(msg.contains("\"lazy\" must be a boolean"));
    }

    #[test]
    fn test_duplicated_arguments_from_class_entity() {
        let msg = compile_err(
            "manager",
            Value::mapping([
                ("class", Value::entity("App\\EntityManager", vec![Value::string("slave")])),
                ("arguments", Value::Sequence(vec![Value::string("master")])),
            ]),
        );
        assert!(msg.contains("Duplicated definition of arguments"));
    }

    #[test]
    fn test_duplicated_arguments_from_factory_entity() {
        let msg = compile_err(
            "translator",
            Value::mapping([
                ("factory", Value::entity("factory:create", vec![Value::string("cs")])),
                ("arguments", Value::Sequence(vec![Value::string("en")])),
            ]),
        );
        assert!(msg.contains("Duplicated definition of arguments"));
    }

    #[test]
    fn test_class_entity_without_attributes_keeps_explicit_arguments() {
        let def = compiled(
            "manager",
            Value::mapping([
                ("class", Value::entity("App\\EntityManager", vec![])),
                ("arguments", Value::Sequence(vec![Value::string("master")])),
            ]),
        );
        assert_eq!(def.arguments, vec![ResolvedValue::string("master")]);
    }

    #[test]
    fn test_autowire_marker() {
        let def = compiled(
            "translator",
            Value::entity("App\\Translator", vec![Value::string("...")]),
        );
        assert!(def.is_autowired());
        assert_eq!(def.arguments, vec![ResolvedValue::placeholder()]);

        let def = compiled(
            "form",
            Value::entity(
                "App\\Form",
                vec![Value::string("..."), Value::string("registration"), Value::string("...")],
            ),
        );
        assert!(def.is_autowired());
        assert_eq!(
            def.arguments,
            vec![
                ResolvedValue::placeholder(),
                ResolvedValue::string("registration"),
                ResolvedValue::placeholder(),
            ]
        );
    }

    #[test]
    fn test_autowire_false_conflicts_with_marker() {
        let msg = compile_err(
            "translator",
            Value::mapping([
                ("class", Value::string("App\\Translator")),
                ("arguments", Value::Sequence(vec![Value::string("...")])),
                ("autowire", Value::bool(false)),
            ]),
        );
        assert!(msg.contains("Contradictory definition of autowiring"));
    }

    #[test]
    fn test_autowire_and_legacy_autowired() {
        let def = compiled(
            "dispatcher",
            Value::mapping([
                ("class", Value::string("App\\Dispatcher")),
                ("autowire", Value::bool(true)),
                ("autowired", Value::bool(true)),
            ]),
        );
        assert!(def.is_autowired());

        let def = compiled(
            "dispatcher",
            Value::mapping([("autowired", Value::bool(false))]),
        );
        assert_eq!(def.autowired, Some(false));

        let msg = compile_err(
            "dispatcher",
            Value::mapping([
                ("autowire", Value::bool(true)),
                ("autowired", Value::bool(false)),
            ]),
        );
        assert!(msg.contains("Contradictory definition of autowiring"));
    }

    #[test]
    fn test_arguments_resolve_references_and_expressions() {
        let def = compiled(
            "my_mailer",
            Value::mapping([(
                "arguments",
                Value::Sequence(vec![
                    Value::string("@=service('mailer_configuration').getMailerMethod()"),
                    Value::string("@logger"),
                    Value::string("@@escaped"),
                ]),
            )]),
        );
        assert_eq!(
            def.arguments,
            vec![
                Expression::new("service('mailer_configuration').getMailerMethod()").into(),
                Reference::new("logger").into(),
                ResolvedValue::string("@escaped"),
            ]
        );
    }

    #[test]
    fn test_named_arguments_rejected() {
        let msg = compile_err(
            "svc",
            Value::mapping([("arguments", Value::mapping([("host", Value::string("x"))]))]),
        );
        assert!(msg.contains("\"arguments\" must be a list"));
    }

    #[test]
    fn test_calls_forms() {
        let def = compiled(
            "newsletter_manager",
            Value::mapping([(
                "calls",
                Value::Sequence(vec![
                    Value::entity("setMailer", vec![Value::string("@my_mailer")]),
                    Value::string("enableDebug"),
                    Value::Sequence(vec![
                        Value::string("setLocale"),
                        Value::Sequence(vec![Value::string("cs")]),
                    ]),
                    Value::mapping([
                        ("method", Value::string("setLogger")),
                        ("arguments", Value::Sequence(vec![Value::string("@?logger")])),
                    ]),
                ]),
            )]),
        );
        assert_eq!(
            def.calls,
            vec![
                MethodCall::new("setMailer", vec![Reference::new("my_mailer").into()]),
                MethodCall::new("enableDebug", vec![]),
                MethodCall::new("setLocale", vec![ResolvedValue::string("cs")]),
                MethodCall::new("setLogger", vec![Reference::optional("logger").into()]),
            ]
        );
    }

    #[test]
    fn test_calls_must_be_collection() {
        let msg = compile_err("svc", Value::mapping([("calls", Value::string("setMailer"))]));
        assert!(msg.contains("Parameter \"calls\" must be an array"));
    }

    #[test]
    fn test_call_mapping_requires_method() {
        let msg = compile_err(
            "svc",
            Value::mapping([(
                "calls",
                Value::Sequence(vec![Value::mapping([("arguments", Value::Sequence(vec![]))])]),
            )]),
        );
        assert!(msg.contains("missing a \"method\" key"));
    }

    #[test]
    fn test_setup_expansion() {
        let def = compiled(
            "database",
            Value::mapping([
                ("class", Value::string("App\\Database")),
                (
                    "setup",
                    Value::Sequence(vec![
                        Value::entity(
                            "$substitutions",
                            vec![Value::string("%database.substitutions%")],
                        ),
                        Value::string("setCacheStorage"),
                    ]),
                ),
            ]),
        );
        assert_eq!(
            def.properties.get("substitutions"),
            Some(&ResolvedValue::Sequence(vec![ResolvedValue::string(
                "%database.substitutions%"
            )]))
        );
        assert_eq!(def.properties.len(), 1);
        assert_eq!(def.calls, vec![MethodCall::new("setCacheStorage", vec![])]);
    }

    #[test]
    fn test_setup_merges_after_explicit_entries() {
        let def = compiled(
            "database",
            Value::mapping([
                ("properties", Value::mapping([("debug", Value::bool(true))])),
                ("calls", Value::Sequence(vec![Value::string("connect")])),
                (
                    "setup",
                    Value::Sequence(vec![
                        Value::Sequence(vec![
                            Value::string("setLogger"),
                            Value::Sequence(vec![Value::string("@logger")]),
                        ]),
                        Value::Sequence(vec![Value::string("$timeout"), Value::int(30)]),
                    ]),
                ),
            ]),
        );
        assert_eq!(
            def.calls,
            vec![
                MethodCall::new("connect", vec![]),
                MethodCall::new("setLogger", vec![Reference::new("logger").into()]),
            ]
        );
        assert_eq!(
            def.properties.keys().collect::<Vec<_>>(),
            vec!["debug", "timeout"]
        );
        assert_eq!(
            def.properties["timeout"],
            ResolvedValue::Scalar(Scalar::Int(30))
        );
    }

    #[test]
    fn test_properties_resolve_references() {
        let def = compiled(
            "mailer",
            Value::mapping([(
                "properties",
                Value::mapping([("transport", Value::string("@transport"))]),
            )]),
        );
        assert_eq!(def.properties["transport"], Reference::new("transport").into());
    }

    #[test]
    fn test_configurator_forms() {
        let def = compiled(
            "newsletter",
            Value::mapping([(
                "configurator",
                Value::Sequence(vec![
                    Value::string("@email_configurator"),
                    Value::string("configure"),
                ]),
            )]),
        );
        assert_eq!(
            def.configurator,
            Some(Callable::service_method(
                Reference::new("email_configurator"),
                "configure"
            ))
        );

        let def = compiled(
            "newsletter",
            Value::mapping([("configurator", Value::string("configure_newsletter"))]),
        );
        assert_eq!(
            def.configurator,
            Some(Callable::Function("configure_newsletter".to_string()))
        );

        let def = compiled(
            "newsletter",
            Value::mapping([("configurator", Value::string("email_configurator:configure"))]),
        );
        assert_eq!(
            def.configurator,
            Some(Callable::service_method(
                Reference::new("email_configurator"),
                "configure"
            ))
        );

        let def = compiled(
            "newsletter",
            Value::mapping([("configurator", Value::string("App\\Configurator::configure"))]),
        );
        assert_eq!(
            def.configurator,
            Some(Callable::static_method("App\\Configurator", "configure"))
        );
    }

    #[test]
    fn test_tags_forms() {
        let mut listener_attrs = Mapping::new();
        listener_attrs.insert(Key::from("event"), Value::string("kernel.response"));
        listener_attrs.insert(Key::from("method"), Value::string("onKernelResponse"));

        let def = compiled(
            "app.response_listener",
            Value::mapping([(
                "tags",
                Value::Sequence(vec![Value::Entity(Entity::new(
                    "kernel.event_listener",
                    listener_attrs,
                ))]),
            )]),
        );
        let mut expected = TagAttributes::new();
        expected.insert("event".to_string(), Scalar::String("kernel.response".to_string()));
        expected.insert("method".to_string(), Scalar::String("onKernelResponse".to_string()));
        assert_eq!(def.tags["kernel.event_listener"], vec![expected.clone()]);

        let def = compiled(
            "app.response_listener",
            Value::mapping([(
                "tags",
                Value::Sequence(vec![Value::mapping([
                    ("name", Value::string("kernel.event_listener")),
                    ("event", Value::string("kernel.response")),
                    ("method", Value::string("onKernelResponse")),
                ])]),
            )]),
        );
        assert_eq!(def.tags["kernel.event_listener"], vec![expected]);

        let def = compiled(
            "captcha_type",
            Value::mapping([("tags", Value::Sequence(vec![Value::string("form.type")]))]),
        );
        assert_eq!(def.tags["form.type"], vec![TagAttributes::new()]);
    }

    #[test]
    fn test_tag_errors() {
        let msg = compile_err(
            "svc",
            Value::mapping([(
                "tags",
                Value::Sequence(vec![Value::mapping([("event", Value::string("x"))])]),
            )]),
        );
        assert!(msg.contains("missing a \"name\" key"));

        let msg = compile_err(
            "svc",
            Value::mapping([(
                "tags",
                Value::Sequence(vec![Value::mapping([("name", Value::string(""))])]),
            )]),
        );
        assert!(msg.contains("must be a non-empty string"));

        let msg = compile_err(
            "svc",
            Value::mapping([(
                "tags",
                Value::Sequence(vec![Value::mapping([
                    ("name", Value::string("kernel.event_listener")),
                    ("event", Value::Sequence(vec![Value::string("a")])),
                ])]),
            )]),
        );
        assert!(msg.contains("attribute \"event\""));

        let msg = compile_err("svc", Value::mapping([("tags", Value::string("form.type"))]));
        assert!(msg.contains("Parameter \"tags\" must be an array"));
    }

    #[test]
    fn test_tag_attributes_are_not_resolved() {
        let def = compiled(
            "svc",
            Value::mapping([(
                "tags",
                Value::Sequence(vec![Value::mapping([
                    ("name", Value::string("monolog.logger")),
                    ("channel", Value::string("@not_a_reference")),
                ])]),
            )]),
        );
        assert_eq!(
            def.tags["monolog.logger"][0]["channel"],
            Scalar::String("@not_a_reference".to_string())
        );
    }

    #[test]
    fn test_decoration() {
        let def = compiled(
            "mailer.logging",
            Value::mapping([
                ("decorates", Value::string("mailer")),
                ("decoration_inner_name", Value::string("mailer.inner")),
                ("decoration_priority", Value::int(5)),
            ]),
        );
        assert_eq!(
            def.decorated_service,
            Some(DecoratedService {
                id: "mailer".to_string(),
                inner_name: Some("mailer.inner".to_string()),
                priority: 5,
            })
        );

        let def = compiled("mailer.logging", Value::mapping([("decorates", Value::string("mailer"))]));
        assert_eq!(def.decorated_service.unwrap().priority, 0);
    }

    #[test]
    fn test_autowiring_types() {
        let def = compiled(
            "logger",
            Value::mapping([("autowiring_types", Value::string("Psr\\Log\\LoggerInterface"))]),
        );
        assert_eq!(def.autowiring_types, vec!["Psr\\Log\\LoggerInterface"]);

        let def = compiled(
            "logger",
            Value::mapping([(
                "autowiring_types",
                Value::Sequence(vec![Value::string("A"), Value::string("B")]),
            )]),
        );
        assert_eq!(def.autowiring_types, vec!["A", "B"]);

        let msg = compile_err(
            "logger",
            Value::mapping([("autowiring_types", Value::Sequence(vec![Value::int(1)]))]),
        );
        assert!(msg.contains("must be of type string"));
    }

    #[test]
    fn test_anonymous_argument_definition() {
        let mut builder = ContainerBuilder::new();
        let entry = Value::mapping([(
            "arguments",
            Value::Sequence(vec![Value::entity("App\\Transport", vec![Value::string("smtp")])]),
        )]);
        compile(&mut builder, "mailer", entry).unwrap();

        let mailer = builder.definition("mailer").unwrap();
        let reference = mailer.arguments[0].as_reference().unwrap();
        assert!(reference.id.starts_with("1_"));
        let transport = builder.definition(&reference.id).unwrap();
        assert_eq!(transport.class.as_deref(), Some("App\\Transport"));
    }
}
