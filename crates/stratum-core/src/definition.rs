//! High and low level error definitions.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::config::{ConvertFn, boxed_convert};
use crate::object::ErrorObject;
use crate::value::Code;

/// High level definitions keyed by name (e.g. `AUTH_ERROR`).
pub type HighLevelTable = BTreeMap<String, HighLevelDefinition>;

/// Low level definitions keyed by name (e.g. `DATABASE_FAILURE`).
pub type LowLevelTable = BTreeMap<String, LowLevelDefinition>;

/// A category of error with a stable public code.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HighLevelDefinition {
    /// External name of the generated type. Defaults to the table key.
    #[serde(default, alias = "className")]
    pub class_name: Option<String>,
    /// Public code. Defaults to the table key.
    #[serde(default)]
    pub code: Option<Code>,
    #[serde(default, alias = "statusCode")]
    pub status_code: Option<Code>,
    #[serde(default, alias = "logLevel")]
    pub log_level: Option<Code>,
    /// Message used by bare errors when none is given.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(skip)]
    pub on_convert: Option<ConvertFn>,
}

impl HighLevelDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<Code>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status_code(mut self, status_code: impl Into<Code>) -> Self {
        self.status_code = Some(status_code.into());
        self
    }

    pub fn with_log_level(mut self, log_level: impl Into<Code>) -> Self {
        self.log_level = Some(log_level.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
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

impl fmt::Debug for HighLevelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighLevelDefinition")
            .field("class_name", &self.class_name)
            .field("code", &self.code)
            .field("status_code", &self.status_code)
            .field("log_level", &self.log_level)
            .field("message", &self.message)
            .field("on_convert", &self.on_convert.is_some())
            .finish()
    }
}

/// A specific cause, shared across every high level category.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LowLevelDefinition {
    /// printf-style message template.
    pub message: String,
    #[serde(default, alias = "subCode")]
    pub sub_code: Option<Code>,
    #[serde(default, alias = "statusCode")]
    pub status_code: Option<Code>,
    #[serde(default, alias = "logLevel")]
    pub log_level: Option<Code>,
    #[serde(skip)]
    pub on_convert: Option<ConvertFn>,
}

impl LowLevelDefinition {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sub_code: None,
            status_code: None,
            log_level: None,
            on_convert: None,
        }
    }

    pub fn with_sub_code(mut self, sub_code: impl Into<Code>) -> Self {
        self.sub_code = Some(sub_code.into());
        self
    }

    pub fn with_status_code(mut self, status_code: impl Into<Code>) -> Self {
        self.status_code = Some(status_code.into());
        self
    }

    pub fn with_log_level(mut self, log_level: impl Into<Code>) -> Self {
        self.log_level = Some(log_level.into());
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

impl fmt::Debug for LowLevelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LowLevelDefinition")
            .field("message", &self.message)
            .field("sub_code", &self.sub_code)
            .field("status_code", &self.status_code)
            .field("log_level", &self.log_level)
            .field("on_convert", &self.on_convert.is_some())
            .finish()
    }
}

/// A high level definition with its derived fields filled in.
#[derive(Clone)]
pub struct ResolvedHighLevel {
    /// Table key.
    pub name: String,
    /// External type name: `class_name`, or the table key.
    pub generated_type_name: String,
    /// Public code: the definition's code, or the table key.
    pub code: Code,
    pub status_code: Option<Code>,
    pub log_level: Option<Code>,
    pub message: Option<String>,
    pub on_convert: Option<ConvertFn>,
}

impl ResolvedHighLevel {
    pub fn resolve(name: &str, def: &HighLevelDefinition) -> Self {
        Self {
            name: name.to_string(),
            generated_type_name: def.class_name.clone().unwrap_or_else(|| name.to_string()),
            code: def.code.clone().unwrap_or_else(|| Code::from(name)),
            status_code: def.status_code.clone(),
            log_level: def.log_level.clone(),
            message: def.message.clone(),
            on_convert: def.on_convert.clone(),
        }
    }

    /// Message for a bare error: the definition's message, else the code.
    pub fn bare_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| self.code.to_string())
    }
}

impl fmt::Debug for ResolvedHighLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHighLevel")
            .field("name", &self.name)
            .field("generated_type_name", &self.generated_type_name)
            .field("code", &self.code)
            .field("status_code", &self.status_code)
            .field("log_level", &self.log_level)
            .field("message", &self.message)
            .field("on_convert", &self.on_convert.is_some())
            .finish()
    }
}

/// A low level definition tagged with its table key.
#[derive(Clone)]
pub struct ResolvedLowLevel {
    /// Table key, reported as the error's `type`.
    pub error_type: String,
    pub message: String,
    pub sub_code: Option<Code>,
    pub status_code: Option<Code>,
    pub log_level: Option<Code>,
    pub on_convert: Option<ConvertFn>,
}

impl ResolvedLowLevel {
    pub fn resolve(name: &str, def: &LowLevelDefinition) -> Self {
        Self {
            error_type: name.to_string(),
            message: def.message.clone(),
            sub_code: def.sub_code.clone(),
            status_code: def.status_code.clone(),
            log_level: def.log_level.clone(),
            on_convert: def.on_convert.clone(),
        }
    }
}

impl fmt::Debug for ResolvedLowLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedLowLevel")
            .field("error_type", &self.error_type)
            .field("message", &self.message)
            .field("sub_code", &self.sub_code)
            .field("status_code", &self.status_code)
            .field("log_level", &self.log_level)
            .field("on_convert", &self.on_convert.is_some())
            .finish()
    }
}
