//! Per-operation lifecycle records: `Started`, then `Succeeded` or `Failed(kind)`.
//!
//! Only the error kind reaches the log. Error messages can echo identifiers, so they stay
//! with the caller.

use crate::error::CryptoError;
use bastion_logger::{LogMetadata, SecureLogger};

pub(crate) struct Operation<'a> {
    logger: &'a dyn SecureLogger,
    name: &'static str,
    metadata: LogMetadata,
}

impl<'a> Operation<'a> {
    pub(crate) fn start(
        logger: &'a dyn SecureLogger,
        name: &'static str,
        metadata: LogMetadata,
    ) -> Self {
        logger.debug(name, "Started", &metadata);
        Self { logger, name, metadata }
    }

    pub(crate) fn finish<T>(self, result: Result<T, CryptoError>) -> Result<T, CryptoError> {
        match &result {
            Ok(_) => self.logger.info(self.name, "Succeeded", &self.metadata),
            Err(err) => {
                let kind = err.kind();
                let metadata = self.metadata.public("error_kind", kind);
                self.logger.warn(self.name, &format!("Failed({kind})"), &metadata);
            },
        }
        result
    }
}
