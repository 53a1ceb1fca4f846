use super::convert::FromConfig;
use super::path;
use super::value_bean::convert;
use crate::di::{read_lock, write_lock};
use crate::error::ConfigError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Encoding of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML for `.yml`/`.yaml` files, JSON otherwise.
    #[default]
    Auto,
    Json,
    Yaml,
}

/// Where the config document comes from.
#[derive(Debug, Clone, Default)]
pub enum ConfigSource {
    File {
        path: PathBuf,
        format: ConfigFormat,
    },
    Inline {
        text: String,
        format: ConfigFormat,
    },
    Document(Value),
    #[default]
    Empty,
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ConfigSource::File {
            path: path.into(),
            format: ConfigFormat::Auto,
        }
    }

    pub fn read(&self) -> Result<Value, ConfigError> {
        match self {
            ConfigSource::File { path, format } => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                parse(&text, *format, Some(path))
            }
            ConfigSource::Inline { text, format } => parse(text, *format, None),
            ConfigSource::Document(document) => Ok(document.clone()),
            ConfigSource::Empty => Ok(Value::Object(Default::default())),
        }
    }
}

/// Parse a document, normalising YAML into the JSON value model.
pub fn parse(text: &str, format: ConfigFormat, path: Option<&Path>) -> Result<Value, ConfigError> {
    let yaml = match format {
        ConfigFormat::Yaml => true,
        ConfigFormat::Json => false,
        ConfigFormat::Auto => path
            .and_then(Path::extension)
            .is_some_and(|ext| ext == "yml" || ext == "yaml"),
    };
    if yaml {
        Ok(serde_yaml::from_str(text)?)
    } else {
        Ok(serde_json::from_str(text)?)
    }
}

/// The loaded config document with dotted-path access.
#[derive(Debug)]
pub struct ConfigStore {
    source: ConfigSource,
    document: RwLock<Value>,
}

impl ConfigStore {
    pub fn load(source: ConfigSource) -> Result<Self, ConfigError> {
        let document = source.read()?;
        tracing::debug!("Loaded config document from {:?}", source_label(&source));
        Ok(Self {
            source,
            document: RwLock::new(document),
        })
    }

    pub fn from_value(document: Value) -> Self {
        Self {
            source: ConfigSource::Document(document.clone()),
            document: RwLock::new(document),
        }
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn document(&self) -> Value {
        read_lock(&self.document).clone()
    }

    /// Value at `key`, or `default` (or `Null`) when the path is absent.
    pub fn get(&self, key: &str, default: Option<&Value>) -> Value {
        resolve(&read_lock(&self.document), key, default)
    }

    /// Typed read through the same conversion path as field injection.
    pub fn get_as<T: FromConfig>(&self, key: &str, default: Option<&str>) -> T {
        let default = default.map(parse_literal);
        convert(key, &self.get(key, default.as_ref()))
    }

    /// Re-read the backing source. The current document is kept on failure.
    pub(crate) fn reload(&self) -> Result<(), ConfigError> {
        let document = self.source.read()?;
        self.replace(document);
        Ok(())
    }

    pub(crate) fn replace(&self, document: Value) {
        *write_lock(&self.document) = document;
    }
}

/// Resolve `key` inside `document`, substituting `default` for absent paths.
pub fn resolve(document: &Value, key: &str, default: Option<&Value>) -> Value {
    match path::lookup(document, key) {
        Some(value) => value.clone(),
        None => {
            let default = default.cloned().unwrap_or(Value::Null);
            tracing::info!("Key {} doesn't exist, use default value {}", key, default);
            default
        }
    }
}

/// A `default` literal: JSON when it parses as JSON, a plain string otherwise.
pub fn parse_literal(literal: &str) -> Value {
    serde_json::from_str(literal).unwrap_or_else(|_| Value::String(literal.to_string()))
}

fn source_label(source: &ConfigSource) -> String {
    match source {
        ConfigSource::File { path, .. } => path.display().to_string(),
        ConfigSource::Inline { .. } => "inline text".to_string(),
        ConfigSource::Document(_) => "document".to_string(),
        ConfigSource::Empty => "nothing".to_string(),
    }
}
