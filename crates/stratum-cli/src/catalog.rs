//! Definition catalogs loaded from TOML or JSON files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use stratum_core::{
    ErrorObjectConfig, ErrorRegistry, GenerateHighLevelOptions, GenerateLowLevelOptions,
    HighLevelTable, LowLevelTable, RegistryConfig, generate_high_level_definitions,
    generate_low_level_definitions,
};
use stratum_error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Toml,
    Json,
}

impl CatalogFormat {
    /// JSON for a `.json` extension, TOML otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => CatalogFormat::Json,
            _ => CatalogFormat::Toml,
        }
    }
}

/// Which derivable fields to fill in from table keys.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateSection {
    pub class_names: bool,
    pub codes: bool,
    pub sub_codes: bool,
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self {
            class_names: true,
            codes: true,
            sub_codes: true,
        }
    }
}

/// A catalog of high and low level definitions plus the base error config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub generate: GenerateSection,
    #[serde(default)]
    pub error_config: Option<ErrorObjectConfig>,
    #[serde(default)]
    pub high_level: HighLevelTable,
    #[serde(default)]
    pub low_level: LowLevelTable,
}

impl Catalog {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(Error::from)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_str_with_format(&content, CatalogFormat::from_path(path))
            .with_context(|| format!("invalid catalog {}", path.display()))
    }

    pub fn from_str_with_format(content: &str, format: CatalogFormat) -> Result<Self> {
        let catalog: Catalog = match format {
            CatalogFormat::Toml => toml::from_str(content).context("failed to parse TOML")?,
            CatalogFormat::Json => serde_json::from_str(content)
                .map_err(Error::from)
                .context("failed to parse JSON")?,
        };
        catalog.validate()?;

        tracing::debug!(
            high_level = catalog.high_level.len(),
            low_level = catalog.low_level.len(),
            ?format,
            "catalog loaded"
        );
        Ok(catalog)
    }

    fn validate(&self) -> stratum_error::Result<()> {
        if self.high_level.is_empty() {
            return Err(Error::config_invalid("catalog defines no high level errors")
                .with_operation("catalog::validate"));
        }
        if let Some(template) = self
            .error_config
            .as_ref()
            .and_then(|config| config.append_with_error_message_format.as_deref())
            && !template.contains('%')
        {
            return Err(Error::config_invalid(format!(
                "append_with_error_message_format has no placeholder: {template:?}"
            ))
            .with_operation("catalog::validate"));
        }
        Ok(())
    }

    /// High level definitions with generated fields filled in.
    pub fn high_level_definitions(&self) -> HighLevelTable {
        let opts = GenerateHighLevelOptions {
            disable_generate_class_name: !self.generate.class_names,
            disable_generate_code: !self.generate.codes,
        };
        generate_high_level_definitions(self.high_level.clone(), &opts)
    }

    /// Low level definitions with generated fields filled in.
    pub fn low_level_definitions(&self) -> LowLevelTable {
        let opts = GenerateLowLevelOptions {
            disable_generate_sub_code: !self.generate.sub_codes,
        };
        generate_low_level_definitions(self.low_level.clone(), &opts)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        match &self.error_config {
            Some(config) => RegistryConfig::new().with_base_error_config(config.clone()),
            None => RegistryConfig::new(),
        }
    }

    pub fn build_registry(&self) -> Result<ErrorRegistry> {
        ErrorRegistry::new(
            self.high_level_definitions(),
            self.low_level_definitions(),
            self.registry_config(),
        )
        .context("failed to build error registry")
    }
}
