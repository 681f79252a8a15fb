//! Deployment environment handed to the provider factory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typed_builder::TypedBuilder;

/// Explicit provider override: `native`, `portable` or `baseline`.
pub const PARAM_PROVIDER: &str = "provider";
/// Whether a hardware request without a hardware boundary falls back to software keys.
pub const PARAM_ALLOW_FALLBACK: &str = "allow_fallback";
/// Raises the PBKDF2 iteration count used for new password envelopes.
pub const PARAM_PASSWORD_ITERATIONS: &str = "password_iterations";
/// Renders `Private` log values verbatim. Only honoured in development.
pub const PARAM_REVEAL_PRIVATE_LOGS: &str = "reveal_private_logs";
/// Directory for rolling log files; console only when unset.
pub const PARAM_LOG_DIR: &str = "log_dir";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeploymentType {
    #[default]
    Development,
    Staging,
    Production,
}

/// Immutable description of where the crypto core runs.
///
/// Built once (from config via [`crate::config::load_config`], or programmatically through
/// [`CryptoEnvironment::builder`]) and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct CryptoEnvironment {
    #[builder(default)]
    #[serde(default)]
    kind: DeploymentType,

    #[builder(default)]
    #[serde(default)]
    has_hardware_security: bool,

    #[builder(default = default_platform(), setter(into))]
    #[serde(default = "default_platform")]
    platform_identifier: String,

    #[builder(default)]
    #[serde(default)]
    parameters: BTreeMap<String, String>,
}

impl Default for CryptoEnvironment {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CryptoEnvironment {
    /// Development environment for the current platform without a hardware boundary.
    #[must_use]
    pub fn detect() -> Self {
        Self::default()
    }

    pub const fn kind(&self) -> DeploymentType {
        self.kind
    }

    pub const fn has_hardware_security(&self) -> bool {
        self.has_hardware_security
    }

    pub fn platform_identifier(&self) -> &str {
        &self.platform_identifier
    }

    pub const fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn is_production(&self) -> bool {
        self.kind == DeploymentType::Production
    }

    /// Returns a copy with one extra parameter; the receiver itself never changes.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

fn default_platform() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn deployment_type_string_forms() {
        for kind in DeploymentType::iter() {
            assert_eq!(DeploymentType::from_str(kind.as_ref()).unwrap(), kind);
        }
        assert_eq!(DeploymentType::from_str("PRODUCTION").unwrap(), DeploymentType::Production);
        assert!(DeploymentType::from_str("qa").is_err());
    }

    #[test]
    fn defaults_describe_local_development() {
        let env = CryptoEnvironment::detect();
        assert_eq!(env.kind(), DeploymentType::Development);
        assert!(!env.has_hardware_security());
        assert!(env.platform_identifier().contains(std::env::consts::OS));
        assert!(env.parameters().is_empty());
    }

    #[test]
    fn with_parameter_leaves_original_untouched() {
        let base = CryptoEnvironment::builder().platform_identifier("test-rig").build();
        let tuned = base.clone().with_parameter(PARAM_PASSWORD_ITERATIONS, "700000");

        assert_eq!(base.parameter(PARAM_PASSWORD_ITERATIONS), None);
        assert_eq!(tuned.parameter(PARAM_PASSWORD_ITERATIONS), Some("700000"));
        assert_eq!(tuned.platform_identifier(), "test-rig");
    }
}
