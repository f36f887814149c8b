//! Per-object serialization settings and registry-wide options.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::object::ErrorObject;
use crate::value::JsonObject;

/// Caller-defined conversion of an error into another representation.
pub type ConvertFn = Arc<dyn Fn(&ErrorObject) -> Box<dyn Any + Send> + Send + Sync>;

/// Transform applied to a draft serialization before field omission.
pub type PreSerializeFn = Arc<dyn Fn(JsonObject) -> JsonObject + Send + Sync>;

/// Hook invoked on every error a registry creates.
pub type CreateErrorFn = Arc<dyn Fn(&mut ErrorObject) + Send + Sync>;

/// Serialization configuration carried by each [`ErrorObject`].
///
/// The data fields can be loaded from a catalog file; the callbacks are
/// attached in code.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorObjectConfig {
    /// Root fields removed from `to_json` output.
    pub to_json_fields_to_omit: Vec<String>,
    /// Root fields removed from `to_json_safe` output.
    pub to_json_safe_fields_to_omit: Vec<String>,
    /// Drop `meta` from both views when it is empty.
    pub omit_empty_metadata: bool,
    /// Template appended to the message once a cause with a message is known,
    /// e.g. `" (caused by: %s)"`.
    pub append_with_error_message_format: Option<String>,
    #[serde(skip)]
    pub on_pre_to_json_data: Option<PreSerializeFn>,
    #[serde(skip)]
    pub on_pre_to_json_safe_data: Option<PreSerializeFn>,
    #[serde(skip)]
    pub on_convert: Option<ConvertFn>,
}

impl ErrorObjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_to_json_fields_to_omit<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to_json_fields_to_omit = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_to_json_safe_fields_to_omit<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to_json_safe_fields_to_omit = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_omit_empty_metadata(mut self, omit: bool) -> Self {
        self.omit_empty_metadata = omit;
        self
    }

    pub fn with_append_with_error_message_format(mut self, template: impl Into<String>) -> Self {
        self.append_with_error_message_format = Some(template.into());
        self
    }

    pub fn with_on_pre_to_json_data<F>(mut self, f: F) -> Self
    where
        F: Fn(JsonObject) -> JsonObject + Send + Sync + 'static,
    {
        self.on_pre_to_json_data = Some(Arc::new(f));
        self
    }

    pub fn with_on_pre_to_json_safe_data<F>(mut self, f: F) -> Self
    where
        F: Fn(JsonObject) -> JsonObject + Send + Sync + 'static,
    {
        self.on_pre_to_json_safe_data = Some(Arc::new(f));
        self
    }

    pub fn with_on_convert<F, T>(mut self, f: F) -> Self
    where
        F: Fn(&ErrorObject) -> T + Send + Sync + 'static,
        T: Any + Send,
    {
        self.on_convert = Some(boxed_convert(f));
        self
    }
}

impl fmt::Debug for ErrorObjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorObjectConfig")
            .field("to_json_fields_to_omit", &self.to_json_fields_to_omit)
            .field("to_json_safe_fields_to_omit", &self.to_json_safe_fields_to_omit)
            .field("omit_empty_metadata", &self.omit_empty_metadata)
            .field(
                "append_with_error_message_format",
                &self.append_with_error_message_format,
            )
            .field("on_pre_to_json_data", &self.on_pre_to_json_data.is_some())
            .field(
                "on_pre_to_json_safe_data",
                &self.on_pre_to_json_safe_data.is_some(),
            )
            .field("on_convert", &self.on_convert.is_some())
            .finish()
    }
}

/// Wrap a typed conversion closure into a [`ConvertFn`].
pub fn boxed_convert<F, T>(f: F) -> ConvertFn
where
    F: Fn(&ErrorObject) -> T + Send + Sync + 'static,
    T: Any + Send,
{
    Arc::new(move |err: &ErrorObject| Box::new(f(err)) as Box<dyn Any + Send>)
}

/// Registry-wide options.
#[derive(Clone, Default)]
pub struct RegistryConfig {
    /// Config cloned into every error the registry creates.
    pub base_error_config: Option<ErrorObjectConfig>,
    /// Called on every newly created error, before context is applied.
    pub on_create_error: Option<CreateErrorFn>,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_error_config(mut self, config: ErrorObjectConfig) -> Self {
        self.base_error_config = Some(config);
        self
    }

    pub fn with_on_create_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ErrorObject) + Send + Sync + 'static,
    {
        self.on_create_error = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("base_error_config", &self.base_error_config)
            .field("on_create_error", &self.on_create_error.is_some())
            .finish()
    }
}

/// Options for turning serialized data back into an error.
#[derive(Debug, Clone, Default)]
pub struct DeserializeOptions {
    /// Metadata keys to restore as safe metadata. Every other key is
    /// restored as unsafe metadata.
    pub safe_metadata_fields: Option<HashSet<String>>,
}

impl DeserializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_safe_metadata_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.safe_metadata_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_safe_field(&self, key: &str) -> bool {
        self.safe_metadata_fields
            .as_ref()
            .is_some_and(|fields| fields.contains(key))
    }
}
