//! Environment-driven provider selection.

use crate::envelope::{DEFAULT_PASSWORD_ITERATIONS, MAX_PASSWORD_ITERATIONS};
use crate::error::CryptoError;
use crate::keys::KeyStore;
use crate::provider::{CryptoProvider, ProviderConfig, ProviderKind};
use bastion_kernel::environment::{
    CryptoEnvironment, PARAM_ALLOW_FALLBACK, PARAM_PASSWORD_ITERATIONS, PARAM_PROVIDER,
};
use bastion_logger::SecureLogger;
use bastion_storage::SecureStorage;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Builds providers from a [`CryptoEnvironment`].
///
/// | `provider` parameter | hardware security | selected   |
/// |----------------------|-------------------|------------|
/// | set                  | any               | the override |
/// | unset                | yes               | native     |
/// | unset                | no                | portable   |
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderFactory;

impl ProviderFactory {
    /// Pure selection; performs no I/O.
    ///
    /// # Errors
    /// [`CryptoError::InvalidInput`] for an unknown override name.
    pub fn select(env: &CryptoEnvironment) -> Result<ProviderKind, CryptoError> {
        if let Some(name) = env.parameter(PARAM_PROVIDER) {
            return ProviderKind::from_str(name.trim()).map_err(|_| {
                CryptoError::invalid_input(format!("unknown provider override {name:?}"))
            });
        }
        Ok(if env.has_hardware_security() { ProviderKind::Native } else { ProviderKind::Portable })
    }

    /// Full provider configuration derived from the environment parameters.
    ///
    /// # Errors
    /// [`CryptoError::InvalidInput`] for an unknown provider, a non-boolean
    /// `allow_fallback` or a `password_iterations` value outside 600 000..=10 000 000.
    pub fn config(env: &CryptoEnvironment) -> Result<ProviderConfig, CryptoError> {
        let kind = Self::select(env)?;

        let allow_fallback = match env.parameter(PARAM_ALLOW_FALLBACK) {
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                CryptoError::invalid_input(format!("{PARAM_ALLOW_FALLBACK} must be true or false"))
            })?,
            None => true,
        };

        let password_iterations = match env.parameter(PARAM_PASSWORD_ITERATIONS) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| (DEFAULT_PASSWORD_ITERATIONS..=MAX_PASSWORD_ITERATIONS).contains(n))
                .ok_or_else(|| {
                    CryptoError::invalid_input(format!(
                        "{PARAM_PASSWORD_ITERATIONS} must be within \
                         {DEFAULT_PASSWORD_ITERATIONS}..={MAX_PASSWORD_ITERATIONS}"
                    ))
                })?,
            None => DEFAULT_PASSWORD_ITERATIONS,
        };

        Ok(ProviderConfig::builder()
            .kind(kind)
            .hardware(env.has_hardware_security())
            .allow_fallback(allow_fallback)
            .password_iterations(password_iterations)
            .build())
    }

    pub fn create<S: SecureStorage + Clone>(
        env: &CryptoEnvironment,
        storage: S,
        logger: Arc<dyn SecureLogger>,
    ) -> Result<CryptoProvider<S>, CryptoError> {
        Self::create_with_key_store(env, KeyStore::new(storage), logger)
    }

    /// Like [`Self::create`] but sharing `keys` with other components.
    pub fn create_with_key_store<S: SecureStorage + Clone>(
        env: &CryptoEnvironment,
        keys: KeyStore<S>,
        logger: Arc<dyn SecureLogger>,
    ) -> Result<CryptoProvider<S>, CryptoError> {
        let config = Self::config(env)?;
        info!(
            deployment = %env.kind(),
            platform = env.platform_identifier(),
            provider = %config.kind,
            "Provider selected"
        );
        Ok(CryptoProvider::with_key_store(config, keys, logger))
    }
}
