//! Unified error handling with Sentry integration.
//!
//! Provides a unified `StorefrontError` for callers that drive the storefront
//! end to end (the CLI, app shells). Unexpected failures are captured to
//! Sentry by [`StorefrontError::report`].

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::mutation::MutationError;

/// Top-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A read against the backend failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A mutation failed and was rolled back.
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),
}

impl StorefrontError {
    /// Whether retrying later could succeed without user intervention.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Api(err) => err.is_transient(),
            Self::Mutation(err) => match err.api_error() {
                Some(api) => api.is_transient(),
                None => false,
            },
        }
    }

    /// Log the error, capturing it to Sentry unless it is transient.
    pub fn report(&self) {
        if self.is_transient() {
            tracing::warn!(error = %self, "Transient storefront error");
            return;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Storefront error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationKind;

    #[test]
    fn test_transient_classification() {
        let rate_limited = StorefrontError::from(MutationError::Transport {
            kind: MutationKind::Add,
            source: ApiError::RateLimited(2),
        });
        assert!(rate_limited.is_transient());

        let missing = StorefrontError::from(ConfigError::MissingEnvVar("X".to_string()));
        assert!(!missing.is_transient());

        let unauthorized = StorefrontError::from(ApiError::Unauthorized("expired".to_string()));
        assert!(!unauthorized.is_transient());
    }

    #[test]
    fn test_display_wraps_source() {
        let err = StorefrontError::from(ApiError::NotFound("cart".to_string()));
        assert_eq!(err.to_string(), "API error: Not found: cart");
    }
}
