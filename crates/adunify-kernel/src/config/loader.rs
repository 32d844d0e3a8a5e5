use std::path::Path;

use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::schema::ServiceConfig;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid service configuration: {0}")]
    Invalid(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from file extension
///
/// `.yaml`/`.yml`, `.toml`, `.json`, `.ini`, `.ron`, `.json5`
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string
///
/// `${VAR}` is replaced first, then bare `$VAR`. Unset variables are left
/// untouched.
pub fn substitute_env_vars(content: &str) -> ConfigResult<String> {
    let braced = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    let bare = Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b")
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    let replace = |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    };
    let result = braced.replace_all(content, replace).to_string();
    Ok(bare.replace_all(&result, replace).to_string())
}

/// Load configuration from a string with explicit format
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let substituted = substitute_env_vars(content)?;
    deserialize(Cfg::builder().add_source(File::from_str(&substituted, format)))
}

/// Load configuration from a file, format chosen by extension
pub fn load_config<T>(path: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    debug!(path, "loading mediation config");
    from_str(&content, format)
}

/// Load configuration with environment variable overrides
///
/// Variables use the given prefix and `__` for nesting, e.g.
/// `ADUNIFY_SEED=42` overrides `seed`.
pub fn load_with_env<T>(path: &str, env_prefix: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let substituted = substitute_env_vars(&content)?;

    deserialize(
        Cfg::builder()
            .add_source(File::from_str(&substituted, format))
            .add_source(Environment::with_prefix(env_prefix).separator("__")),
    )
}

/// Merge several in-memory sources, later ones overriding earlier ones
pub fn merge_configs<T>(sources: &[(&str, FileFormat)]) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let mut builder = Cfg::builder();
    for (content, format) in sources {
        let substituted = substitute_env_vars(content)?;
        builder = builder.add_source(File::from_str(&substituted, *format));
    }
    deserialize(builder)
}

/// Load several files, later files overriding earlier ones
///
/// Typical use is a shipped base file plus a per-environment override.
pub fn load_merged<T>(paths: &[&str]) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let mut builder = Cfg::builder();
    for path in paths {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let substituted = substitute_env_vars(&content)?;
        builder = builder.add_source(File::from_str(&substituted, format));
    }
    debug!(files = paths.len(), "loaded merged mediation config");
    deserialize(builder)
}

/// Load and validate a [`ServiceConfig`] file.
pub fn load_service_config(path: &str) -> ConfigResult<ServiceConfig> {
    let config: ServiceConfig = load_config(path)?;
    config
        .validate()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(config)
}

fn deserialize<T>(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}
