//! Option descriptors a module exposes to callers, and resolved option maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use converthub_core::types::OptionId;

use crate::error::ModuleError;

/// Maximum length of a module or option label.
pub const MAX_LABEL_LEN: usize = 32;

/// Maximum length of a module or option description.
pub const MAX_DESCRIPTION_LEN: usize = 512;

/// Check a label against `[A-Za-z0-9_]{1,32}`.
pub(crate) fn check_label(label: &str) -> Result<(), String> {
    if label.is_empty() {
        return Err("label must not be empty".to_string());
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(format!(
            "label cannot be longer than {MAX_LABEL_LEN} characters"
        ));
    }
    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("label may only contain letters, digits, and underscores".to_string());
    }
    Ok(())
}

/// Check an optional description against the length limit.
pub(crate) fn check_description(description: Option<&str>) -> Result<(), String> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(format!(
            "description cannot be longer than {MAX_DESCRIPTION_LEN} characters"
        )),
        _ => Ok(()),
    }
}

/// Value type accepted by an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
}

impl OptionType {
    /// Whether a JSON value has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declarative option definition, as written by a module author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionConfig {
    /// Label, unique within the module.
    pub label: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Accepted value type.
    #[serde(rename = "type")]
    pub kind: OptionType,
    /// Value substituted when the caller supplies none.
    #[serde(default)]
    pub default: Option<Value>,
    /// Whether callers must supply a value.
    #[serde(default)]
    pub required: bool,
}

impl OptionConfig {
    /// Start an optional option definition of the given type.
    pub fn new(label: impl Into<String>, kind: OptionType) -> Self {
        Self {
            label: label.into(),
            description: None,
            kind,
            default: None,
            required: false,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A validated, immutable option descriptor owned by a module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOption {
    id: OptionId,
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type")]
    kind: OptionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    required: bool,
}

impl ModuleOption {
    /// Validate and freeze an option definition.
    pub fn new(config: OptionConfig) -> Result<Self, ModuleError> {
        let invalid = |reason: String| ModuleError::InvalidOptionConfig {
            label: config.label.clone(),
            reason,
        };

        check_label(&config.label).map_err(invalid)?;
        check_description(config.description.as_deref()).map_err(invalid)?;

        if let Some(default) = &config.default {
            if !config.kind.matches(default) {
                return Err(invalid(format!(
                    "default must be a {}, got {}",
                    config.kind,
                    json_kind(default)
                )));
            }
        }

        Ok(Self {
            id: OptionId::new(),
            label: config.label,
            description: config.description,
            kind: config.kind,
            default: config.default,
            required: config.required,
        })
    }

    /// Unique identifier.
    pub fn id(&self) -> OptionId {
        self.id
    }

    /// Label, unique within the owning module.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Accepted value type.
    pub fn kind(&self) -> OptionType {
        self.kind
    }

    /// Default value, if declared.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether callers must supply a value.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Validate a caller-supplied value.
    ///
    /// `None` means the key was absent. An absent value is only an error
    /// for required options. A present `null` is a value like any other
    /// and fails the type check.
    pub fn validate(&self, value: Option<&Value>) -> Result<(), ModuleError> {
        let invalid = |reason: String| ModuleError::InvalidOptionValue {
            label: self.label.clone(),
            reason,
        };

        let Some(value) = value else {
            return if self.required {
                Err(invalid("a value is required".to_string()))
            } else {
                Ok(())
            };
        };

        if !self.kind.matches(value) {
            return Err(invalid(format!(
                "expected a {}, got {}",
                self.kind,
                json_kind(value)
            )));
        }

        if self.required && value.as_str().is_some_and(str::is_empty) {
            return Err(invalid("a non-empty string is required".to_string()));
        }

        Ok(())
    }
}

/// Option values after module defaults were layered under caller input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedOptions(BTreeMap<String, Value>);

impl ResolvedOptions {
    /// Resolve options for a module.
    ///
    /// Starts from every declared default, then overlays each key in `raw`,
    /// including keys the module does not declare.
    pub fn resolve(options: &[ModuleOption], raw: &serde_json::Map<String, Value>) -> Self {
        let mut resolved: BTreeMap<String, Value> = options
            .iter()
            .filter_map(|o| o.default_value().map(|d| (o.label().to_string(), d.clone())))
            .collect();

        for (key, value) in raw {
            resolved.insert(key.clone(), value.clone());
        }

        Self(resolved)
    }

    /// Raw value for a label.
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.0.get(label)
    }

    /// String value for a label.
    pub fn get_str(&self, label: &str) -> Option<&str> {
        self.get(label).and_then(Value::as_str)
    }

    /// Numeric value for a label.
    pub fn get_f64(&self, label: &str) -> Option<f64> {
        self.get(label).and_then(Value::as_f64)
    }

    /// Boolean value for a label.
    pub fn get_bool(&self, label: &str) -> Option<bool> {
        self.get(label).and_then(Value::as_bool)
    }

    /// Iterate over resolved entries in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no options resolved.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn size_option() -> ModuleOption {
        ModuleOption::new(OptionConfig::new("size", OptionType::Number).default_value(10))
            .expect("valid option")
    }

    #[test]
    fn test_label_rules() {
        assert!(check_label("width_px").is_ok());
        assert!(check_label("").is_err());
        assert!(check_label("has space").is_err());
        assert!(check_label(&"a".repeat(33)).is_err());
        assert!(check_label(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn test_default_must_match_type() {
        let err = ModuleOption::new(
            OptionConfig::new("size", OptionType::Number).default_value("big"),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleError::InvalidOptionConfig { .. }));
    }

    #[test]
    fn test_absent_optional_value_skips_validation() {
        assert!(size_option().validate(None).is_ok());
    }

    #[test]
    fn test_required_value() {
        let option =
            ModuleOption::new(OptionConfig::new("name", OptionType::String).required()).unwrap();
        let err = option.validate(None).unwrap_err();
        assert!(err.to_string().contains("a value is required"));
        assert!(option.validate(Some(&json!(""))).is_err());
        assert!(option.validate(Some(&json!("x"))).is_ok());
    }

    #[test]
    fn test_type_mismatch_and_null() {
        let option = size_option();
        assert!(option.validate(Some(&json!(5))).is_ok());

        let err = option.validate(Some(&json!("5"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for option 'size': expected a number, got string"
        );

        let err = option.validate(Some(&Value::Null)).unwrap_err();
        assert!(err.to_string().contains("got null"));
    }

    #[test]
    fn test_resolve_defaults_and_overrides() {
        let options = vec![size_option()];

        let resolved = ResolvedOptions::resolve(&options, &serde_json::Map::new());
        assert_eq!(resolved.get_f64("size"), Some(10.0));

        let raw = json!({ "size": 5 });
        let resolved = ResolvedOptions::resolve(&options, raw.as_object().unwrap());
        assert_eq!(resolved.get_f64("size"), Some(5.0));

        let again = ResolvedOptions::resolve(&options, raw.as_object().unwrap());
        assert_eq!(resolved, again);
    }

    #[test]
    fn test_resolve_keeps_undeclared_keys() {
        let raw = json!({ "extra": true });
        let resolved = ResolvedOptions::resolve(&[size_option()], raw.as_object().unwrap());
        assert_eq!(resolved.get_bool("extra"), Some(true));
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_option_config_rejects_unknown_fields() {
        let parsed: Result<OptionConfig, _> =
            serde_json::from_value(json!({ "label": "w", "type": "number", "min": 1 }));
        assert!(parsed.is_err());

        let parsed: OptionConfig =
            serde_json::from_value(json!({ "label": "w", "type": "number" })).unwrap();
        assert!(!parsed.required);
    }
}
