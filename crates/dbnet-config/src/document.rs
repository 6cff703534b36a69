//! Raw document parsing and rendering.
//!
//! Every supported format is read into the same `serde_json::Value` tree so
//! inheritance and validation only deal with one representation.

use crate::error::{ConfigError, ConfigResult};
use crate::path::FieldPath;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Infer the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unsupported config format: {other}")),
        }
    }
}

/// Parse `text` into a raw document. The root must be a mapping.
pub fn parse(text: &str, format: ConfigFormat, origin: &str) -> ConfigResult<Value> {
    let parse_err = |message: String| ConfigError::Parse {
        format,
        origin: origin.to_string(),
        message,
    };

    // NaN and infinities have no JSON form and would silently become null,
    // so they are rejected on the native tree first.
    let value: Value = match format {
        ConfigFormat::Toml => {
            let table: toml::Table = toml::from_str(text).map_err(|e| parse_err(e.to_string()))?;
            for (key, item) in &table {
                finite_toml(item, &FieldPath::key(key))?;
            }
            serde_json::to_value(table).map_err(|e| parse_err(e.to_string()))?
        }
        ConfigFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string()))?,
        ConfigFormat::Yaml => {
            let native: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?;
            finite_yaml(&native, &FieldPath::root())?;
            serde_json::to_value(native).map_err(|e| parse_err(e.to_string()))?
        }
    };

    if !value.is_object() {
        return Err(ConfigError::mismatch(FieldPath::root(), "mapping", describe(&value)));
    }
    Ok(value)
}

fn non_finite(path: &FieldPath, value: f64) -> ConfigError {
    ConfigError::mismatch(path.clone(), "finite number", format!("number `{value}`"))
}

fn finite_toml(value: &toml::Value, path: &FieldPath) -> ConfigResult<()> {
    match value {
        toml::Value::Float(f) if !f.is_finite() => Err(non_finite(path, *f)),
        toml::Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                finite_toml(item, &path.index(idx))?;
            }
            Ok(())
        }
        toml::Value::Table(table) => {
            for (key, item) in table {
                finite_toml(item, &path.field(key))?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn finite_yaml(value: &serde_yaml::Value, path: &FieldPath) -> ConfigResult<()> {
    match value {
        serde_yaml::Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && !f.is_finite() => Err(non_finite(path, f)),
            _ => Ok(()),
        },
        serde_yaml::Value::Sequence(items) => {
            for (idx, item) in items.iter().enumerate() {
                finite_yaml(item, &path.index(idx))?;
            }
            Ok(())
        }
        serde_yaml::Value::Mapping(map) => {
            for (key, item) in map {
                let name = key.as_str().map_or_else(|| format!("{key:?}"), str::to_string);
                finite_yaml(item, &path.field(&name))?;
            }
            Ok(())
        }
        serde_yaml::Value::Tagged(tagged) => finite_yaml(&tagged.value, path),
        _ => Ok(()),
    }
}

/// Read and parse a document file, inferring the format from its extension.
pub fn read(path: &Path) -> ConfigResult<Value> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::Parse {
        format: ConfigFormat::Toml,
        origin: path.display().to_string(),
        message: "unrecognized file extension (expected .toml, .json, .yaml or .yml)".to_string(),
    })?;
    let text = std::fs::read_to_string(path)?;
    parse(&text, format, &path.display().to_string())
}

/// Render a raw document.
pub fn render(value: &Value, format: ConfigFormat) -> ConfigResult<String> {
    let rendered = match format {
        ConfigFormat::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
        ConfigFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
    };
    rendered.map_err(|message| ConfigError::Serialize { format, message })
}

/// Short description of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean `{b}`"),
        Value::Number(n) if n.is_f64() => format!("number `{n}`"),
        Value::Number(n) => format!("integer `{n}`"),
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(items) => format!("list of {} item(s)", items.len()),
        Value::Object(_) => "mapping".to_string(),
    }
}
