use config::{Config, Environment, File, Map};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `BASTION__HAS_HARDWARE_SECURITY=true`.
pub const ENV_PREFIX: &str = "BASTION";
const DEFAULT_CONFIG_FILE: &str = "bastion";

/// Custom error type for config loading.
#[bastion_derive::bastion_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads `T` from a configuration file overlaid with environment variables.
///
/// 1. **Base File**: `path`, or `bastion.{toml}` in the working directory when `None`.
/// 2. **Environment Overrides**: variables prefixed with `BASTION__`; nested keys use double
///    underscores (`BASTION__PARAMETERS__PROVIDER` maps to `parameters.provider`).
///
/// # Errors
/// The file is missing, a value is malformed, or the result does not match `T`.
///
/// # Example
/// ```rust
/// use bastion_kernel::config::load_config;
/// use bastion_kernel::environment::CryptoEnvironment;
///
/// let env: CryptoEnvironment =
///     load_config(Some("config/local")).unwrap_or_else(|_| CryptoEnvironment::detect());
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path, None)
}

/// Same layering as [`load_config`] with the environment replaced by `overrides`
/// (keys written exactly as the variables would be, e.g. `BASTION__KIND`).
pub fn load_config_with<T>(
    path: Option<impl AsRef<Path>>,
    overrides: Map<String, String>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path, Some(overrides))
}

fn load_layered<T>(
    path: Option<impl AsRef<Path>>,
    env: Option<Map<String, String>>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .convert_case(config::Case::Snake)
                .source(env),
        );

    info!("Loading config from {}", effective_path.display());

    builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
