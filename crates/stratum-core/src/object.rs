//! The error value produced by a registry.

use std::any::Any;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde_json::Value;
use stratum_error::{Error, Result};

use crate::config::{ConvertFn, DeserializeOptions, ErrorObjectConfig};
use crate::format::format;
use crate::registry::GeneratedType;
use crate::value::{Cause, Code, JsonObject, Metadata};

/// Name reported by error objects that no registry generated.
pub const BASE_TYPE_NAME: &str = "BaseError";

/// Result of [`ErrorObject::convert`].
pub enum Converted<'a> {
    /// Whatever the bound `on_convert` function returned.
    Custom(Box<dyn Any + Send>),
    /// No conversion function was bound; the error itself.
    Unchanged(&'a ErrorObject),
}

impl<'a> Converted<'a> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Converted::Unchanged(_))
    }

    /// Take the converted value if it has type `T`.
    pub fn downcast<T: Any>(self) -> Option<T> {
        match self {
            Converted::Custom(value) => value.downcast::<T>().ok().map(|boxed| *boxed),
            Converted::Unchanged(_) => None,
        }
    }

    /// The unconverted error, when no conversion happened.
    pub fn unchanged(self) -> Option<&'a ErrorObject> {
        match self {
            Converted::Unchanged(err) => Some(err),
            Converted::Custom(_) => None,
        }
    }
}

/// A single application error.
///
/// Identity (`code`, `sub_code`, `type`) is fixed by the registry at
/// construction; everything else is filled in through chainable `with_*`
/// builders or the `set_*` mutators. Two serialization views exist:
/// [`to_json`](Self::to_json) for internal use and
/// [`to_json_safe`](Self::to_json_safe) for clients.
#[derive(Clone)]
pub struct ErrorObject {
    generated: Option<Arc<GeneratedType>>,
    name: String,
    message: String,
    error_id: Option<String>,
    request_id: Option<String>,
    error_type: Option<String>,
    code: Option<Code>,
    sub_code: Option<Code>,
    status_code: Option<Code>,
    log_level: Option<Code>,
    cause: Option<Cause>,
    metadata: Metadata,
    safe_metadata: Metadata,
    stack: String,
    config: ErrorObjectConfig,
    on_convert: Option<ConvertFn>,
    appended_cause_message: bool,
}

impl ErrorObject {
    /// Create an unregistered error with the default config.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_config(message, ErrorObjectConfig::default())
    }

    /// Create an unregistered error with the given config.
    #[track_caller]
    pub fn with_config(message: impl Into<String>, config: ErrorObjectConfig) -> Self {
        Self::assemble(
            BASE_TYPE_NAME.to_string(),
            message.into(),
            config,
            None,
            Location::caller(),
        )
    }

    pub(crate) fn assemble(
        name: String,
        message: String,
        config: ErrorObjectConfig,
        generated: Option<Arc<GeneratedType>>,
        location: &Location<'_>,
    ) -> Self {
        let stack = format!(
            "{}: {}\n    at {}:{}:{}",
            name,
            message,
            location.file(),
            location.line(),
            location.column()
        );
        Self {
            on_convert: config.on_convert.clone(),
            generated,
            name,
            message,
            error_id: None,
            request_id: None,
            error_type: None,
            code: None,
            sub_code: None,
            status_code: None,
            log_level: None,
            cause: None,
            metadata: Metadata::new(),
            safe_metadata: Metadata::new(),
            stack,
            config,
            appended_cause_message: false,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// External type name (the generated type name, or [`BASE_TYPE_NAME`]).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registry type this error was built from, if any.
    pub fn generated_type(&self) -> Option<&Arc<GeneratedType>> {
        self.generated.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_id(&self) -> Option<&str> {
        self.error_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Low level definition name.
    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref()
    }

    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    pub fn sub_code(&self) -> Option<&Code> {
        self.sub_code.as_ref()
    }

    pub fn status_code(&self) -> Option<&Code> {
        self.status_code.as_ref()
    }

    pub fn log_level(&self) -> Option<&Code> {
        self.log_level.as_ref()
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Unsafe (internal only) metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Metadata that may be shown to clients.
    pub fn safe_metadata(&self) -> &Metadata {
        &self.safe_metadata
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn config(&self) -> &ErrorObjectConfig {
        &self.config
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    pub fn set_error_id(&mut self, error_id: impl Into<String>) -> &mut Self {
        self.error_id = Some(error_id.into());
        self
    }

    pub fn set_request_id(&mut self, request_id: impl Into<String>) -> &mut Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn set_error_type(&mut self, error_type: impl Into<String>) -> &mut Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn set_code(&mut self, code: impl Into<Code>) -> &mut Self {
        self.code = Some(code.into());
        self
    }

    pub fn set_sub_code(&mut self, sub_code: impl Into<Code>) -> &mut Self {
        self.sub_code = Some(sub_code.into());
        self
    }

    pub fn set_status_code(&mut self, status_code: impl Into<Code>) -> &mut Self {
        self.status_code = Some(status_code.into());
        self
    }

    pub fn set_log_level(&mut self, log_level: impl Into<Code>) -> &mut Self {
        self.log_level = Some(log_level.into());
        self
    }

    /// Replace the captured stack text (used when rehydrating).
    pub fn set_stack(&mut self, stack: impl Into<String>) -> &mut Self {
        self.stack = stack.into();
        self
    }

    pub fn set_cause(&mut self, cause: impl Into<Cause>) -> &mut Self {
        self.cause = Some(cause.into());
        self.append_caused_by_message();
        self
    }

    /// Shallow-merge into the unsafe metadata. Existing keys not present in
    /// `metadata` are kept.
    pub fn extend_metadata<I, K, V>(&mut self, metadata: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in metadata {
            self.metadata.insert(key.into(), value.into());
        }
        self
    }

    /// Shallow-merge into the safe metadata.
    pub fn extend_safe_metadata<I, K, V>(&mut self, metadata: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in metadata {
            self.safe_metadata.insert(key.into(), value.into());
        }
        self
    }

    pub fn set_config(&mut self, config: ErrorObjectConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Bind the function used by [`convert`](Self::convert).
    pub fn set_on_convert(&mut self, convert: ConvertFn) -> &mut Self {
        self.on_convert = Some(convert);
        self
    }

    /// Apply printf-style substitution to the message in place.
    pub fn format_message_mut(&mut self, args: &[Value]) -> &mut Self {
        self.message = format(&self.message, args);
        self.append_caused_by_message();
        self
    }

    /// Append the cause's message using `append_with_error_message_format`.
    /// Runs at most once per object.
    fn append_caused_by_message(&mut self) {
        if self.appended_cause_message {
            return;
        }
        let Some(template) = self.config.append_with_error_message_format.as_deref() else {
            return;
        };
        let Some(cause_message) = self.cause.as_ref().and_then(Cause::message) else {
            return;
        };
        let suffix = format(template, &[Value::String(cause_message)]);
        self.message.push_str(&suffix);
        self.appended_cause_message = true;
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    pub fn with_error_id(mut self, error_id: impl Into<String>) -> Self {
        self.set_error_id(error_id);
        self
    }

    /// Assign a random v4 UUID as the error id.
    pub fn with_generated_error_id(mut self) -> Self {
        self.set_error_id(uuid::Uuid::new_v4().to_string());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.set_request_id(request_id);
        self
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.set_error_type(error_type);
        self
    }

    pub fn with_error_code(mut self, code: impl Into<Code>) -> Self {
        self.set_code(code);
        self
    }

    pub fn with_error_sub_code(mut self, sub_code: impl Into<Code>) -> Self {
        self.set_sub_code(sub_code);
        self
    }

    pub fn with_status_code(mut self, status_code: impl Into<Code>) -> Self {
        self.set_status_code(status_code);
        self
    }

    pub fn with_log_level(mut self, log_level: impl Into<Code>) -> Self {
        self.set_log_level(log_level);
        self
    }

    /// Attach the underlying cause.
    pub fn caused_by(mut self, cause: impl Into<Cause>) -> Self {
        self.set_cause(cause);
        self
    }

    pub fn with_metadata<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.extend_metadata(metadata);
        self
    }

    pub fn with_safe_metadata<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.extend_safe_metadata(metadata);
        self
    }

    pub fn format_message(mut self, args: &[Value]) -> Self {
        self.format_message_mut(args);
        self
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Full internal representation, including the stack, the cause and
    /// all metadata (safe keys win over unsafe keys of the same name).
    pub fn to_json(&self, fields_to_omit: &[&str]) -> JsonObject {
        let mut data = JsonObject::new();
        insert_str(&mut data, "errId", self.error_id.as_deref());
        insert_str(&mut data, "reqId", self.request_id.as_deref());
        data.insert("name".into(), Value::String(self.name.clone()));
        insert_code(&mut data, "code", self.code.as_ref());
        data.insert("message".into(), Value::String(self.message.clone()));
        insert_str(&mut data, "type", self.error_type.as_deref());
        insert_code(&mut data, "subCode", self.sub_code.as_ref());
        insert_code(&mut data, "statusCode", self.status_code.as_ref());
        insert_code(&mut data, "logLevel", self.log_level.as_ref());

        let mut meta = self.metadata.clone();
        meta.extend(self.safe_metadata.clone());
        if !(meta.is_empty() && self.config.omit_empty_metadata) {
            data.insert("meta".into(), Value::Object(meta));
        }

        if let Some(cause) = &self.cause {
            data.insert("causedBy".into(), cause.to_value());
        }
        data.insert("stack".into(), Value::String(self.stack.clone()));

        if let Some(hook) = &self.config.on_pre_to_json_data {
            data = hook(data);
        }

        omit_fields(data, fields_to_omit, &self.config.to_json_fields_to_omit)
    }

    /// Client-safe representation: ids, codes, status and safe metadata only.
    pub fn to_json_safe(&self, fields_to_omit: &[&str]) -> JsonObject {
        let mut data = JsonObject::new();
        insert_str(&mut data, "errId", self.error_id.as_deref());
        insert_str(&mut data, "reqId", self.request_id.as_deref());
        insert_code(&mut data, "code", self.code.as_ref());
        insert_code(&mut data, "subCode", self.sub_code.as_ref());
        insert_code(&mut data, "statusCode", self.status_code.as_ref());

        if !(self.safe_metadata.is_empty() && self.config.omit_empty_metadata) {
            data.insert("meta".into(), Value::Object(self.safe_metadata.clone()));
        }

        if let Some(hook) = &self.config.on_pre_to_json_safe_data {
            data = hook(data);
        }

        omit_fields(data, fields_to_omit, &self.config.to_json_safe_fields_to_omit)
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Run the bound `on_convert` function, or hand back the error itself.
    pub fn convert(&self) -> Converted<'_> {
        match &self.on_convert {
            Some(convert) => Converted::Custom(convert(self)),
            None => Converted::Unchanged(self),
        }
    }

    /// Convert and downcast in one step.
    pub fn convert_to<T: Any>(&self) -> Option<T> {
        self.convert().downcast()
    }

    pub fn has_on_convert_defined(&self) -> bool {
        self.on_convert.is_some()
    }

    // =========================================================================
    // Deserialization
    // =========================================================================

    /// Copy every present field of `data` onto `target`.
    ///
    /// A restored cause does not trigger the caused-by message append: the
    /// serialized message already carries it.
    pub fn copy_deserialization_data(
        target: &mut ErrorObject,
        data: &JsonObject,
        opts: &DeserializeOptions,
    ) {
        if let Some(code) = data.get("code").and_then(Code::from_value) {
            target.set_code(code);
        }
        if let Some(sub_code) = data.get("subCode").and_then(Code::from_value) {
            target.set_sub_code(sub_code);
        }
        if let Some(error_id) = data.get("errId").and_then(Value::as_str) {
            target.set_error_id(error_id);
        }
        if let Some(request_id) = data.get("reqId").and_then(Value::as_str) {
            target.set_request_id(request_id);
        }
        if let Some(error_type) = data.get("type").and_then(Value::as_str) {
            target.set_error_type(error_type);
        }
        if let Some(status_code) = data.get("statusCode").and_then(Code::from_value) {
            target.set_status_code(status_code);
        }
        if let Some(stack) = data.get("stack").and_then(Value::as_str) {
            target.set_stack(stack);
        }
        if let Some(log_level) = data.get("logLevel").and_then(Code::from_value) {
            target.set_log_level(log_level);
        }
        if let Some(cause) = data.get("causedBy").filter(|v| !v.is_null()) {
            target.appended_cause_message = true;
            target.set_cause(cause.clone());
        }

        if let Some(Value::Object(meta)) = data.get("meta") {
            if opts.safe_metadata_fields.is_some() {
                for (key, value) in meta {
                    if opts.is_safe_field(key) {
                        target.extend_safe_metadata([(key.clone(), value.clone())]);
                    } else {
                        target.extend_metadata([(key.clone(), value.clone())]);
                    }
                }
            } else {
                target.extend_metadata(meta.clone());
            }
        }
    }

    /// Rebuild an unregistered error from serialized data.
    ///
    /// The serialized `name` is kept for display; the result is not tied to
    /// any generated type.
    #[track_caller]
    pub fn from_json(data: &Value, opts: Option<&DeserializeOptions>) -> Result<ErrorObject> {
        let location = Location::caller();
        let Value::Object(map) = data else {
            return Err(Error::invalid_input("from_json: data is not an object")
                .with_operation("ErrorObject::from_json"));
        };

        let name = map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(BASE_TYPE_NAME)
            .to_string();
        let mut err = Self::assemble(
            name,
            message_of(map),
            ErrorObjectConfig::default(),
            None,
            location,
        );
        let default_opts = DeserializeOptions::default();
        Self::copy_deserialization_data(&mut err, map, opts.unwrap_or(&default_opts));
        Ok(err)
    }
}

pub(crate) fn message_of(map: &JsonObject) -> String {
    map.get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn insert_str(data: &mut JsonObject, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        data.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn insert_code(data: &mut JsonObject, key: &str, value: Option<&Code>) {
    if let Some(value) = value {
        data.insert(key.to_string(), value.to_value());
    }
}

fn omit_fields(mut data: JsonObject, caller: &[&str], configured: &[String]) -> JsonObject {
    for field in caller {
        data.remove(*field);
    }
    for field in configured {
        data.remove(field.as_str());
    }
    data
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match (&self.code, &self.sub_code) {
            (Some(code), Some(sub_code)) => write!(f, " ({}/{})", code, sub_code)?,
            (Some(code), None) => write!(f, " ({})", code)?,
            (None, Some(sub_code)) => write!(f, " (-/{})", sub_code)?,
            (None, None) => {}
        }
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self)?;

        let ids = [
            ("errId", self.error_id.as_deref()),
            ("reqId", self.request_id.as_deref()),
            ("type", self.error_type.as_deref()),
        ];
        for (label, value) in ids {
            if let Some(value) = value {
                writeln!(f, "    {}: {}", label, value)?;
            }
        }
        if let Some(status_code) = &self.status_code {
            writeln!(f, "    statusCode: {}", status_code)?;
        }
        if let Some(log_level) = &self.log_level {
            writeln!(f, "    logLevel: {}", log_level)?;
        }

        if !self.metadata.is_empty() || !self.safe_metadata.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Metadata:")?;
            for (key, value) in &self.metadata {
                writeln!(f, "        {}: {}", key, value)?;
            }
            for (key, value) in &self.safe_metadata {
                writeln!(f, "        {} (safe): {}", key, value)?;
            }
        }

        if let Some(cause) = &self.cause {
            writeln!(f)?;
            writeln!(f, "    Caused by: {:?}", cause)?;
        }

        writeln!(f)?;
        writeln!(f, "    Stack: {}", self.stack)
    }
}

impl std::error::Error for ErrorObject {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .and_then(Cause::as_error)
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
