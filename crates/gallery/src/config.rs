use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::builtin::builtin_source;
use crate::registry::{RegistryError, ShaderRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse gallery: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid gallery: {0}")]
    Invalid(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Gallery file as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GalleryConfig {
    pub version: u32,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "deserialize_interval_opt")]
    pub tick_interval: Option<Duration>,
    #[serde(default)]
    pub shaders: Vec<ShaderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShaderEntry {
    pub name: String,
    #[serde(default)]
    pub builtin: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Numbers are milliseconds; strings go through `humantime` ("16ms", "1s").
fn deserialize_interval_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("an interval as milliseconds or a human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid interval '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_millis(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("interval must be non-negative"));
            }
            Ok(Some(Duration::from_millis(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("interval must be non-negative"));
            }
            Duration::try_from_secs_f64(v / 1000.0)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid interval {v}: {err}")))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl GalleryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GalleryConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            shaders = config.shaders.len(),
            "loaded gallery"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported gallery version {}; expected 1",
                self.version
            )));
        }

        if self.shaders.is_empty() {
            return Err(ConfigError::Invalid(
                "gallery must list at least one shader".into(),
            ));
        }

        if let Some(interval) = self.tick_interval {
            if interval.is_zero() {
                return Err(ConfigError::Invalid(
                    "tick_interval must be greater than zero".into(),
                ));
            }
        }

        for entry in &self.shaders {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "gallery contains a shader with an empty name".into(),
                ));
            }
            match (&entry.builtin, &entry.path) {
                (Some(key), None) => {
                    if builtin_source(key).is_none() {
                        return Err(ConfigError::Invalid(format!(
                            "shader '{}' names unknown builtin '{key}'",
                            entry.name
                        )));
                    }
                }
                (None, Some(_)) => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "shader '{}' must set exactly one of `builtin` or `path`",
                        entry.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Resolves every entry to source text and builds the registry.
    ///
    /// Relative `path` entries are resolved against `base_dir`, normally the
    /// directory holding the gallery file.
    pub fn into_registry(&self, base_dir: &Path) -> Result<ShaderRegistry, ConfigError> {
        let mut builder = ShaderRegistry::builder();
        for entry in &self.shaders {
            let source = match (&entry.builtin, &entry.path) {
                (Some(key), _) => builtin_source(key)
                    .map(str::to_owned)
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown builtin '{key}'")))?,
                (None, Some(path)) => {
                    let resolved = if path.is_absolute() {
                        path.clone()
                    } else {
                        base_dir.join(path)
                    };
                    fs::read_to_string(&resolved).map_err(|source| ConfigError::Io {
                        path: resolved.clone(),
                        source,
                    })?
                }
                (None, None) => {
                    return Err(ConfigError::Invalid(format!(
                        "shader '{}' has no source",
                        entry.name
                    )))
                }
            };
            builder = builder.register(entry.name.clone(), source);
        }
        if let Some(start) = &self.start {
            builder = builder.start_with(start.clone());
        }
        Ok(builder.build()?)
    }
}
