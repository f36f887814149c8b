//! The error registry: definition tables, generated types and factories.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use stratum_error::{Error, Result};

use crate::config::{DeserializeOptions, ErrorObjectConfig, RegistryConfig};
use crate::declare::HighLevelKind;
use crate::definition::{HighLevelTable, LowLevelTable, ResolvedHighLevel, ResolvedLowLevel};
use crate::object::{ErrorObject, message_of};
use crate::value::{JsonObject, Metadata};

/// The distinct type generated for one high level definition.
///
/// A registry creates at most one per high level name and hands out the
/// same `Arc` every time, so identity is pointer identity.
pub struct GeneratedType {
    definition: ResolvedHighLevel,
}

impl GeneratedType {
    fn new(definition: ResolvedHighLevel) -> Self {
        Self { definition }
    }

    /// External name, used in serialized output and for round-trip lookup.
    pub fn name(&self) -> &str {
        &self.definition.generated_type_name
    }

    /// The high level table key this type was generated for.
    pub fn high_level_name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ResolvedHighLevel {
        &self.definition
    }

    /// Build an instance.
    ///
    /// High level values are the defaults; low level `status_code`,
    /// `log_level` and `on_convert` override them. `sub_code` and `type`
    /// only ever come from the low level definition.
    fn instantiate(
        self: &Arc<Self>,
        low: Option<&ResolvedLowLevel>,
        message: String,
        base_config: Option<&ErrorObjectConfig>,
        location: &Location<'_>,
    ) -> ErrorObject {
        let high = &self.definition;
        let mut err = ErrorObject::assemble(
            self.name().to_string(),
            message,
            self.config_for(low, base_config),
            Some(Arc::clone(self)),
            location,
        );
        err.set_code(high.code.clone());
        if let Some(status_code) = &high.status_code {
            err.set_status_code(status_code.clone());
        }
        if let Some(log_level) = &high.log_level {
            err.set_log_level(log_level.clone());
        }

        if let Some(low) = low {
            err.set_error_type(low.error_type.clone());
            if let Some(status_code) = &low.status_code {
                err.set_status_code(status_code.clone());
            }
            if let Some(sub_code) = &low.sub_code {
                err.set_sub_code(sub_code.clone());
            }
            if let Some(log_level) = &low.log_level {
                err.set_log_level(log_level.clone());
            }
        }
        err
    }

    /// The base config with the high level, then the low level, `on_convert`
    /// layered on top.
    fn config_for(
        &self,
        low: Option<&ResolvedLowLevel>,
        base_config: Option<&ErrorObjectConfig>,
    ) -> ErrorObjectConfig {
        let mut config = base_config.cloned().unwrap_or_default();
        if let Some(convert) = &self.definition.on_convert {
            config.on_convert = Some(convert.clone());
        }
        if let Some(convert) = low.and_then(|low| low.on_convert.as_ref()) {
            config.on_convert = Some(convert.clone());
        }
        config
    }

    /// Rebuild an instance of this type from serialized data.
    ///
    /// Only the type identity, the message and the fields present in `data`
    /// are restored; definition defaults are not filled in. `low` is the low
    /// level definition named by the payload's `type` and only selects
    /// `on_convert`.
    fn deserialize(
        self: &Arc<Self>,
        data: &JsonObject,
        low: Option<&ResolvedLowLevel>,
        opts: &DeserializeOptions,
        base_config: Option<&ErrorObjectConfig>,
        location: &Location<'_>,
    ) -> ErrorObject {
        let mut err = ErrorObject::assemble(
            self.name().to_string(),
            message_of(data),
            self.config_for(low, base_config),
            Some(Arc::clone(self)),
            location,
        );
        ErrorObject::copy_deserialization_data(&mut err, data, opts);
        err
    }
}

impl fmt::Debug for GeneratedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedType")
            .field("name", &self.name())
            .field("high_level_name", &self.high_level_name())
            .finish()
    }
}

/// Metadata applied to every error created by a context-derived registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryContext {
    pub metadata: Option<Metadata>,
    pub safe_metadata: Option<Metadata>,
}

impl RegistryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let target = self.metadata.get_or_insert_with(Metadata::new);
        for (key, value) in metadata {
            target.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_safe_metadata<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let target = self.safe_metadata.get_or_insert_with(Metadata::new);
        for (key, value) in metadata {
            target.insert(key.into(), value.into());
        }
        self
    }

    fn apply(&self, err: &mut ErrorObject) {
        if let Some(metadata) = &self.metadata {
            err.extend_metadata(metadata.clone());
        }
        if let Some(safe_metadata) = &self.safe_metadata {
            err.extend_safe_metadata(safe_metadata.clone());
        }
    }
}

/// State shared by a registry and every registry derived from it.
struct RegistryCore {
    high_level: BTreeMap<String, ResolvedHighLevel>,
    low_level: BTreeMap<String, ResolvedLowLevel>,
    /// generated type name -> high level name, for deserialization.
    type_name_index: HashMap<String, String>,
    generated: RwLock<HashMap<String, Arc<GeneratedType>>>,
    config: RegistryConfig,
}

/// Owns the definition tables and builds errors from them.
///
/// Cloning is cheap; clones and [`with_context`](Self::with_context)
/// derivations share the same tables and generated-type cache.
#[derive(Clone)]
pub struct ErrorRegistry {
    core: Arc<RegistryCore>,
    context: Option<Arc<RegistryContext>>,
}

impl ErrorRegistry {
    /// Build a registry.
    ///
    /// Fails with `DuplicateTypeName` when two high level definitions
    /// resolve to the same generated type name.
    pub fn new(high: HighLevelTable, low: LowLevelTable, config: RegistryConfig) -> Result<Self> {
        let mut high_level = BTreeMap::new();
        let mut type_name_index = HashMap::new();
        for (name, def) in &high {
            let resolved = ResolvedHighLevel::resolve(name, def);
            if let Some(previous) =
                type_name_index.insert(resolved.generated_type_name.clone(), name.clone())
            {
                return Err(Error::duplicate_type_name(
                    resolved.generated_type_name,
                    previous,
                    name.clone(),
                )
                .with_operation("registry::new"));
            }
            high_level.insert(name.clone(), resolved);
        }

        let low_level = low
            .iter()
            .map(|(name, def)| (name.clone(), ResolvedLowLevel::resolve(name, def)))
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(
            high_level = high_level.len(),
            low_level = low_level.len(),
            "error registry created"
        );

        Ok(Self {
            core: Arc::new(RegistryCore {
                high_level,
                low_level,
                type_name_index,
                generated: RwLock::new(HashMap::new()),
                config,
            }),
            context: None,
        })
    }

    /// Look up a high level definition.
    pub fn definition(&self, name: &str) -> Option<&ResolvedHighLevel> {
        self.core.high_level.get(name)
    }

    /// Look up a low level definition.
    pub fn low_level_definition(&self, name: &str) -> Option<&ResolvedLowLevel> {
        self.core.low_level.get(name)
    }

    pub fn high_level_names(&self) -> impl Iterator<Item = &str> {
        self.core.high_level.keys().map(String::as_str)
    }

    pub fn low_level_names(&self) -> impl Iterator<Item = &str> {
        self.core.low_level.keys().map(String::as_str)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.core.config
    }

    /// The context bound by [`with_context`](Self::with_context), if any.
    pub fn context(&self) -> Option<&RegistryContext> {
        self.context.as_deref()
    }

    /// The generated type for a high level name, created on first use.
    pub fn generated_type(&self, name: &str) -> Result<Arc<GeneratedType>> {
        let def = self.definition(name).ok_or_else(|| {
            Error::definition_not_found(name).with_operation("registry::generated_type")
        })?;

        if let Some(ty) = self.core.generated.read().get(name) {
            return Ok(Arc::clone(ty));
        }

        let mut cache = self.core.generated.write();
        let ty = cache.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(
                high_level = name,
                type_name = %def.generated_type_name,
                "generated error type"
            );
            Arc::new(GeneratedType::new(def.clone()))
        });
        Ok(Arc::clone(ty))
    }

    /// Whether `err` was built from the generated type for `name` by this
    /// registry (or one sharing its tables).
    pub fn instance_of(&self, err: &ErrorObject, name: &str) -> Result<bool> {
        let ty = self.generated_type(name)?;
        Ok(err
            .generated_type()
            .is_some_and(|generated| Arc::ptr_eq(generated, &ty)))
    }

    /// Create an error from a high level definition only.
    ///
    /// The message is `message`, else the definition's message, else its
    /// code. An empty `message` counts as absent.
    #[track_caller]
    pub fn new_bare_error(&self, name: &str, message: Option<&str>) -> Result<ErrorObject> {
        let location = Location::caller();
        let ty = self
            .generated_type(name)
            .map_err(|e| e.with_operation("registry::new_bare_error"))?;

        let message = match message {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => ty.definition().bare_message(),
        };

        tracing::trace!(high_level = name, "creating bare error");
        let err = ty.instantiate(
            None,
            message,
            self.core.config.base_error_config.as_ref(),
            location,
        );
        Ok(self.finish(err))
    }

    /// Create an error combining a high level and a low level definition.
    #[track_caller]
    pub fn new_error(&self, name: &str, low_level_name: &str) -> Result<ErrorObject> {
        let location = Location::caller();
        let low = self.low_level_definition(low_level_name).ok_or_else(|| {
            Error::low_level_definition_not_found(low_level_name)
                .with_operation("registry::new_error")
        })?;
        let ty = self
            .generated_type(name)
            .map_err(|e| e.with_operation("registry::new_error"))?;

        tracing::trace!(high_level = name, low_level = low_level_name, "creating error");
        let err = ty.instantiate(
            Some(low),
            low.message.clone(),
            self.core.config.base_error_config.as_ref(),
            location,
        );
        Ok(self.finish(err))
    }

    /// Post-construction steps shared by both factories.
    fn finish(&self, mut err: ErrorObject) -> ErrorObject {
        if let Some(on_create) = &self.core.config.on_create_error {
            on_create(&mut err);
        }
        if let Some(context) = &self.context {
            context.apply(&mut err);
        }
        err
    }

    /// Rebuild an error from serialized data.
    ///
    /// A `name` matching a generated type name yields an instance of that
    /// type; anything else degrades to an unregistered [`ErrorObject`].
    #[track_caller]
    pub fn from_json(&self, data: &Value, opts: Option<&DeserializeOptions>) -> Result<ErrorObject> {
        let location = Location::caller();
        let Value::Object(map) = data else {
            return Err(Error::invalid_input("from_json: data is not an object")
                .with_operation("registry::from_json"));
        };
        let default_opts = DeserializeOptions::default();
        let opts = opts.unwrap_or(&default_opts);

        let type_name = map.get("name").and_then(Value::as_str);
        let high_level_name = type_name.and_then(|name| self.core.type_name_index.get(name));

        match high_level_name {
            Some(high_level_name) => {
                let ty = self.generated_type(high_level_name)?;
                let low = map
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(|name| self.low_level_definition(name));
                Ok(ty.deserialize(
                    map,
                    low,
                    opts,
                    self.core.config.base_error_config.as_ref(),
                    location,
                ))
            }
            None => {
                tracing::debug!(
                    type_name = type_name.unwrap_or("<missing>"),
                    "unrecognized error type name, deserializing as base error"
                );
                ErrorObject::from_json(data, Some(opts))
            }
        }
    }

    /// A registry sharing this one's tables and cache whose errors all
    /// receive `context`'s metadata.
    pub fn with_context(&self, context: RegistryContext) -> Self {
        Self {
            core: Arc::clone(&self.core),
            context: Some(Arc::new(context)),
        }
    }

    // =========================================================================
    // Typed access through declared kinds
    // =========================================================================

    pub fn generated_type_of<K: HighLevelKind>(&self) -> Result<Arc<GeneratedType>> {
        self.generated_type(K::NAME)
    }

    #[track_caller]
    pub fn new_error_of<K: HighLevelKind>(&self, low_level_name: &str) -> Result<ErrorObject> {
        self.new_error(K::NAME, low_level_name)
    }

    #[track_caller]
    pub fn new_bare_error_of<K: HighLevelKind>(&self, message: Option<&str>) -> Result<ErrorObject> {
        self.new_bare_error(K::NAME, message)
    }

    pub fn is<K: HighLevelKind>(&self, err: &ErrorObject) -> Result<bool> {
        self.instance_of(err, K::NAME)
    }
}

impl fmt::Debug for ErrorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRegistry")
            .field("high_level", &self.core.high_level.keys().collect::<Vec<_>>())
            .field("low_level", &self.core.low_level.keys().collect::<Vec<_>>())
            .field("generated", &self.core.generated.read().len())
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{HighLevelDefinition, LowLevelDefinition};
    use crate::value::Code;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stratum_error::ErrorKind;

    fn registry() -> ErrorRegistry {
        registry_with(RegistryConfig::default())
    }

    fn registry_with(config: RegistryConfig) -> ErrorRegistry {
        let mut high = HighLevelTable::new();
        high.insert(
            "INTERNAL_SERVER_ERROR".into(),
            HighLevelDefinition::new()
                .with_class_name("InternalServerError")
                .with_status_code(500),
        );
        high.insert(
            "AUTH_ERROR".into(),
            HighLevelDefinition::new()
                .with_class_name("AuthError")
                .with_code("AUTH")
                .with_log_level("warn"),
        );
        high.insert(
            "NOT_FOUND".into(),
            HighLevelDefinition::new().with_message("resource not found"),
        );

        let mut low = LowLevelTable::new();
        low.insert(
            "DATABASE_FAILURE".into(),
            LowLevelDefinition::new("There is an issue with the database")
                .with_status_code(503)
                .with_sub_code("E_DB"),
        );
        low.insert(
            "BAD_TOKEN".into(),
            LowLevelDefinition::new("token invalid").with_status_code(401),
        );

        ErrorRegistry::new(high, low, config).unwrap()
    }

    #[test]
    fn test_generated_type_is_cached() {
        let registry = registry();
        let first = registry.generated_type("INTERNAL_SERVER_ERROR").unwrap();
        let second = registry.generated_type("INTERNAL_SERVER_ERROR").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "InternalServerError");
        assert_eq!(first.high_level_name(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn test_generated_type_unknown_name() {
        let err = registry().generated_type("invalid").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DefinitionNotFound);
        assert!(err.message().contains("not defined"));
    }

    #[test]
    fn test_instance_of() {
        let registry = registry();
        let err = registry
            .new_error("INTERNAL_SERVER_ERROR", "DATABASE_FAILURE")
            .unwrap();
        assert!(registry.instance_of(&err, "INTERNAL_SERVER_ERROR").unwrap());
        assert!(!registry.instance_of(&err, "AUTH_ERROR").unwrap());
        assert_eq!(
            registry.instance_of(&err, "missing").unwrap_err().kind(),
            ErrorKind::DefinitionNotFound
        );

        let base = ErrorObject::new("plain");
        assert!(!registry.instance_of(&base, "INTERNAL_SERVER_ERROR").unwrap());
    }

    #[test]
    fn test_instance_of_is_registry_scoped() {
        let a = registry();
        let b = registry();
        let err = a.new_error("AUTH_ERROR", "BAD_TOKEN").unwrap();
        assert!(a.instance_of(&err, "AUTH_ERROR").unwrap());
        assert!(!b.instance_of(&err, "AUTH_ERROR").unwrap());
    }

    #[test]
    fn test_new_error_combines_definitions() {
        let err = registry()
            .new_error("INTERNAL_SERVER_ERROR", "DATABASE_FAILURE")
            .unwrap();

        assert_eq!(err.name(), "InternalServerError");
        assert_eq!(err.code(), Some(&Code::from("INTERNAL_SERVER_ERROR")));
        assert_eq!(err.sub_code(), Some(&Code::from("E_DB")));
        assert_eq!(err.status_code(), Some(&Code::Number(503)));
        assert_eq!(err.error_type(), Some("DATABASE_FAILURE"));
        assert_eq!(err.message(), "There is an issue with the database");
    }

    #[test]
    fn test_high_level_defaults_survive_without_low_level_values() {
        let err = registry().new_error("AUTH_ERROR", "BAD_TOKEN").unwrap();
        assert_eq!(err.log_level(), Some(&Code::from("warn")));
        assert_eq!(err.status_code(), Some(&Code::Number(401)));
        assert!(err.sub_code().is_none());
    }

    #[test]
    fn test_new_error_unknown_names() {
        let registry = registry();
        let err = registry
            .new_error("INTERNAL_SERVER_ERROR", "invalid")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LowLevelDefinitionNotFound);
        assert!(err.message().contains("low level error"));

        let err = registry.new_error("invalid", "BAD_TOKEN").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DefinitionNotFound);
        assert_eq!(err.operation(), "registry::new_error");
    }

    #[test]
    fn test_new_bare_error_message_resolution() {
        let registry = registry();

        let err = registry
            .new_bare_error("INTERNAL_SERVER_ERROR", Some("bare error msg"))
            .unwrap();
        assert_eq!(err.message(), "bare error msg");
        assert!(err.error_type().is_none());
        assert!(err.sub_code().is_none());
        assert_eq!(err.status_code(), Some(&Code::Number(500)));

        let err = registry.new_bare_error("NOT_FOUND", None).unwrap();
        assert_eq!(err.message(), "resource not found");

        let err = registry.new_bare_error("AUTH_ERROR", None).unwrap();
        assert_eq!(err.message(), "AUTH");

        let err = registry.new_bare_error("AUTH_ERROR", Some("")).unwrap();
        assert_eq!(err.message(), "AUTH");
    }

    #[test]
    fn test_new_bare_error_unknown_name() {
        let err = registry().new_bare_error("invalid", Some("msg")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DefinitionNotFound);
        assert!(err.message().contains("not defined"));
    }

    #[test]
    fn test_stack_starts_at_call_site() {
        let err = registry().new_error("AUTH_ERROR", "BAD_TOKEN").unwrap();
        let line = line!() - 1;
        let expected = format!("{}:{}:", file!(), line);
        assert!(
            err.stack().contains(&expected),
            "stack {:?} should point at {}",
            err.stack(),
            expected
        );
        assert!(err.stack().starts_with("AuthError: token invalid\n"));

        let err = registry().new_bare_error("NOT_FOUND", None).unwrap();
        let expected = format!("{}:{}:", file!(), line!() - 1);
        assert!(err.stack().contains(&expected), "{}", err.stack());
    }

    #[test]
    fn test_on_create_error_hook() {
        let config = RegistryConfig::new().with_on_create_error(|err| {
            err.set_error_id("fixed-id");
        });
        let registry = registry_with(config);
        let err = registry.new_error("AUTH_ERROR", "BAD_TOKEN").unwrap();
        assert_eq!(err.error_id(), Some("fixed-id"));

        let err = registry.new_bare_error("AUTH_ERROR", None).unwrap();
        assert_eq!(err.error_id(), Some("fixed-id"));
    }

    #[test]
    fn test_base_error_config_is_applied() {
        let config = RegistryConfig::new()
            .with_base_error_config(ErrorObjectConfig::new().with_omit_empty_metadata(true));
        let err = registry_with(config)
            .new_error("AUTH_ERROR", "BAD_TOKEN")
            .unwrap();
        assert!(err.config().omit_empty_metadata);
        assert!(!err.to_json(&[]).contains_key("meta"));
    }

    #[test]
    fn test_on_convert_precedence() {
        let mut high = HighLevelTable::new();
        high.insert(
            "AUTH_ERROR".into(),
            HighLevelDefinition::new().with_on_convert(|_: &ErrorObject| "high"),
        );
        let mut low = LowLevelTable::new();
        low.insert(
            "WITH_CONVERT".into(),
            LowLevelDefinition::new("m").with_on_convert(|_: &ErrorObject| "low"),
        );
        low.insert("PLAIN".into(), LowLevelDefinition::new("m"));
        let registry = ErrorRegistry::new(high, low, RegistryConfig::default()).unwrap();

        let err = registry.new_error("AUTH_ERROR", "WITH_CONVERT").unwrap();
        assert_eq!(err.convert_to::<&str>(), Some("low"));

        let err = registry.new_error("AUTH_ERROR", "PLAIN").unwrap();
        assert_eq!(err.convert_to::<&str>(), Some("high"));

        let err = registry.new_bare_error("AUTH_ERROR", None).unwrap();
        assert!(err.has_on_convert_defined());
    }

    #[test]
    fn test_duplicate_generated_type_name_fails() {
        let mut high = HighLevelTable::new();
        high.insert("A".into(), HighLevelDefinition::new().with_class_name("Same"));
        high.insert("B".into(), HighLevelDefinition::new().with_class_name("Same"));

        let err = ErrorRegistry::new(high, LowLevelTable::new(), RegistryConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateTypeName);
        assert_eq!(err.context_value("type_name"), Some("Same"));
    }

    #[test]
    fn test_with_context() {
        let registry = registry();
        let scoped = registry.with_context(
            RegistryContext::new()
                .with_metadata([("a", 1)])
                .with_safe_metadata([("tenant", "acme")]),
        );

        let err = scoped
            .new_error("AUTH_ERROR", "BAD_TOKEN")
            .unwrap()
            .with_metadata([("b", 2)]);
        assert_eq!(err.to_json(&[])["meta"], json!({"a": 1, "b": 2, "tenant": "acme"}));
        assert_eq!(err.to_json_safe(&[])["meta"], json!({"tenant": "acme"}));

        let err = scoped.new_bare_error("AUTH_ERROR", None).unwrap();
        assert_eq!(err.metadata().get("a"), Some(&json!(1)));

        let plain = registry.new_error("AUTH_ERROR", "BAD_TOKEN").unwrap();
        assert!(plain.metadata().is_empty());
        assert!(registry.context().is_none());
    }

    #[test]
    fn test_with_context_shares_generated_types() {
        let registry = registry();
        let scoped = registry.with_context(RegistryContext::new().with_metadata([("a", 1)]));

        let ty = registry.generated_type("AUTH_ERROR").unwrap();
        let scoped_ty = scoped.generated_type("AUTH_ERROR").unwrap();
        assert!(Arc::ptr_eq(&ty, &scoped_ty));

        let err = scoped.new_error("AUTH_ERROR", "BAD_TOKEN").unwrap();
        assert!(registry.instance_of(&err, "AUTH_ERROR").unwrap());
    }

    #[test]
    fn test_from_json_round_trip() {
        let registry = registry();
        let original = registry
            .new_error("INTERNAL_SERVER_ERROR", "DATABASE_FAILURE")
            .unwrap()
            .with_error_id("e-42")
            .with_metadata([("query", "select 1")]);

        let data = Value::Object(original.to_json(&[]));
        let restored = registry.from_json(&data, None).unwrap();

        assert!(registry.instance_of(&restored, "INTERNAL_SERVER_ERROR").unwrap());
        assert_eq!(restored.code(), original.code());
        assert_eq!(restored.sub_code(), original.sub_code());
        assert_eq!(restored.status_code(), original.status_code());
        assert_eq!(restored.message(), original.message());
        assert_eq!(restored.error_id(), original.error_id());
        assert_eq!(restored.stack(), original.stack());
        assert_eq!(restored.metadata(), original.metadata());
    }

    #[test]
    fn test_from_json_unknown_name_falls_back() {
        let registry = registry();
        let data = json!({"name": "ForeignError", "code": "X", "message": "remote"});
        let err = registry.from_json(&data, None).unwrap();

        assert!(err.generated_type().is_none());
        assert_eq!(err.name(), "ForeignError");
        assert_eq!(err.code(), Some(&Code::from("X")));
        assert!(!registry.instance_of(&err, "AUTH_ERROR").unwrap());
    }

    #[test]
    fn test_from_json_keeps_only_payload_fields() {
        let registry = registry();
        let data = json!({"name": "InternalServerError", "message": "m"});
        let err = registry.from_json(&data, None).unwrap();

        assert!(registry.instance_of(&err, "INTERNAL_SERVER_ERROR").unwrap());
        assert_eq!(err.message(), "m");
        assert!(err.code().is_none());
        assert!(err.status_code().is_none());
        assert!(err.log_level().is_none());
        assert!(err.error_type().is_none());
    }

    #[test]
    fn test_from_json_respects_omitted_fields() {
        let registry = registry();
        let original = registry.new_error("AUTH_ERROR", "BAD_TOKEN").unwrap();
        assert!(original.status_code().is_some());
        assert!(original.log_level().is_some());

        let data = Value::Object(original.to_json(&["statusCode", "logLevel"]));
        let restored = registry.from_json(&data, None).unwrap();

        assert_eq!(restored.code(), original.code());
        assert_eq!(restored.error_type(), Some("BAD_TOKEN"));
        assert!(restored.status_code().is_none());
        assert!(restored.log_level().is_none());
    }

    #[test]
    fn test_from_json_keeps_converter_precedence() {
        let mut high = HighLevelTable::new();
        high.insert(
            "AUTH_ERROR".into(),
            HighLevelDefinition::new().with_on_convert(|_: &ErrorObject| "high"),
        );
        let mut low = LowLevelTable::new();
        low.insert(
            "WITH_CONVERT".into(),
            LowLevelDefinition::new("m").with_on_convert(|_: &ErrorObject| "low"),
        );
        low.insert("PLAIN".into(), LowLevelDefinition::new("m"));
        let registry = ErrorRegistry::new(high, low, RegistryConfig::default()).unwrap();

        for low_level in ["WITH_CONVERT", "PLAIN"] {
            let original = registry.new_error("AUTH_ERROR", low_level).unwrap();
            let restored = registry
                .from_json(&Value::Object(original.to_json(&[])), None)
                .unwrap();
            assert_eq!(
                restored.convert_to::<&str>(),
                original.convert_to::<&str>(),
                "{low_level}"
            );
        }

        let data = json!({"name": "AUTH_ERROR", "message": "m", "type": "UNKNOWN"});
        let restored = registry.from_json(&data, None).unwrap();
        assert_eq!(restored.convert_to::<&str>(), Some("high"));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        let err = registry().from_json(&json!(42), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = registry();
        assert_eq!(
            registry.high_level_names().collect::<Vec<_>>(),
            vec!["AUTH_ERROR", "INTERNAL_SERVER_ERROR", "NOT_FOUND"]
        );
        assert_eq!(
            registry.low_level_names().collect::<Vec<_>>(),
            vec!["BAD_TOKEN", "DATABASE_FAILURE"]
        );
    }

    #[test]
    fn test_concurrent_generation_yields_one_type() {
        let registry = registry();
        let types: Vec<Arc<GeneratedType>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.generated_type("AUTH_ERROR").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(types.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
