//! Settings-style models
//!
//! A settings model is a singleton bag of options whose fields are derived
//! from grouped setting metadata instead of being declared by hand:
//!
//! ```yaml
//! general:
//!   - General options
//!   - - name: site_title
//!       std: My site
//!       label: Site title
//!     - name: show_banner
//!       type: checkbox
//!       std: "1"
//!     - name: layout
//!       type: select
//!       options: { grid: Grid, list: List }
//! ```
//!
//! Checkbox settings are booleans persisted as `"1"` / `""`.

use crate::core::environment::Environment;
use crate::core::error::ConfigurationError;
use crate::core::field::FieldBuilder;
use crate::core::model::ModelDefinition;
use crate::core::schema::Identity;
use crate::core::types::is_empty;
use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One setting entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingField {
    pub name: String,

    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// `checkbox`, `select` or anything else
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub setting_type: Option<String>,

    /// Allowed choices: a mapping (its keys are the choices) or a list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl SettingField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_std(mut self, value: impl Into<Value>) -> Self {
        self.std = Some(value.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_type(mut self, setting_type: impl Into<String>) -> Self {
        self.setting_type = Some(setting_type.into());
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Choice keys declared by `options`
    pub fn choices(&self) -> Option<Vec<String>> {
        let choices: Vec<String> = match self.options.as_ref()? {
            Value::Object(map) => map.keys().cloned().collect(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => return None,
        };
        (!choices.is_empty()).then_some(choices)
    }
}

/// `(group description, fields)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsGroup(pub String, pub Vec<SettingField>);

/// Group name → group, in declaration order
pub type SettingsGroups = IndexMap<String, SettingsGroup>;

/// Load settings metadata from a YAML file
pub fn settings_from_yaml_file<P: AsRef<Path>>(path: P) -> Result<SettingsGroups> {
    let content = std::fs::read_to_string(path)?;
    settings_from_yaml_str(&content)
}

/// Load settings metadata from a YAML string
pub fn settings_from_yaml_str(yaml: &str) -> Result<SettingsGroups> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load settings metadata from a JSON string
pub fn settings_from_json_str(json: &str) -> Result<SettingsGroups> {
    Ok(serde_json::from_str(json)?)
}

/// Singleton model whose fields come from setting metadata
///
/// Every `SettingsModel` is a [`ModelDefinition`]; its id is its lowercased
/// name and cannot be changed.
pub trait SettingsModel: 'static {
    fn name() -> &'static str;

    fn settings() -> SettingsGroups;

    /// Fallback for an attribute a setting leaves out (only `std` is asked)
    fn default_for_attribute(_field: &SettingField, _attribute: &str) -> Option<Value> {
        None
    }

    /// Last chance to adjust a derived field builder
    fn on_field_setup(
        _name: &str,
        builder: FieldBuilder,
        _field: &SettingField,
        _env: &Environment,
    ) -> FieldBuilder {
        builder
    }
}

impl<T: SettingsModel> ModelDefinition for T {
    fn name() -> &'static str {
        <T as SettingsModel>::name()
    }

    fn declare_fields(env: &Environment) -> Result<Vec<FieldBuilder>, ConfigurationError> {
        T::settings()
            .values()
            .flat_map(|group| group.1.iter())
            .map(|setting| builder_from_setting::<T>(env, setting))
            .collect()
    }

    fn identity() -> Option<Identity> {
        Some(Identity::Singleton(<T as SettingsModel>::name().to_lowercase()))
    }
}

fn builder_from_setting<T: SettingsModel>(
    env: &Environment,
    setting: &SettingField,
) -> Result<FieldBuilder, ConfigurationError> {
    let name = setting.name.as_str();
    let mut builder = env.field(name);
    let mut default_value = setting
        .std
        .clone()
        .or_else(|| T::default_for_attribute(setting, "std"));
    let label = setting.label.as_deref().unwrap_or(name);
    let description = setting.desc.as_deref().unwrap_or(label);

    let type_name = match setting.setting_type.as_deref() {
        Some("checkbox") => {
            if let Some(value) = default_value.as_mut().filter(|v| !is_empty(v)) {
                *value = bit_to_bool(value);
            }
            builder = builder
                .with_serializer(|value| bool_to_bit(&value))
                .with_deserializer(|value| bit_to_bool(&value));
            "boolean"
        }
        Some("select") => "string",
        _ => default_value.as_ref().map_or("string", numeric_type_name),
    };

    if let Some(value) = default_value.filter(|v| !is_empty(v)) {
        builder = builder.with_default(value);
    }
    let field_type = env.type_named(type_name).map_err(|_| ConfigurationError::UnknownType {
        field: name.to_string(),
        type_name: type_name.to_string(),
    })?;
    builder = builder
        .with_description(description)
        .with_dto_name(name)
        .with_type(field_type);
    if let Some(choices) = setting.choices() {
        builder = builder.with_choices(choices);
    }

    Ok(T::on_field_setup(name, builder, setting, env))
}

/// Guess a numeric type from a default value
fn numeric_type_name(value: &Value) -> &'static str {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.parse::<i64>().is_ok() {
                "integer"
            } else if trimmed.parse::<f64>().is_ok_and(f64::is_finite) {
                "float"
            } else {
                "string"
            }
        }
        _ => "string",
    }
}

/// Persisted checkbox encoding: `"1"` when set, `""` otherwise
pub fn bool_to_bit(value: &Value) -> Value {
    let set = !is_empty(value) && value.as_str() != Some("false");
    Value::String(if set { "1" } else { "" }.to_string())
}

/// Decode a persisted checkbox value
pub fn bit_to_bool(value: &Value) -> Value {
    Value::Bool(!is_empty(value) && value.as_str() != Some("0"))
}
