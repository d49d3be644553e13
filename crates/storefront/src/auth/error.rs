//! Auth bridge error types.

use thiserror::Error;

use super::messages::{AuthOperation, translate_for};
use super::provider::ProviderError;
use crate::validation::ValidationError;

/// Failure of an auth operation, carrying the customer-facing message.
///
/// `Display` is the Spanish message; the underlying provider error stays
/// available through `source()` for logging.
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// Input was rejected before calling the provider.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The provider rejected the operation.
    #[error("{message}")]
    Provider {
        operation: AuthOperation,
        message: String,
        #[source]
        source: ProviderError,
    },

    /// The operation needs a signed-in user.
    #[error("Inicia sesión para continuar.")]
    NotSignedIn,
}

impl AuthFailure {
    /// Wrap a provider error, translating its message.
    #[must_use]
    pub fn provider(operation: AuthOperation, source: ProviderError) -> Self {
        let message = translate_for(operation, &source.provider_message());
        Self::Provider {
            operation,
            message,
            source,
        }
    }

    /// Whether the provider was unreachable or misbehaved, as opposed to
    /// rejecting the request.
    #[must_use]
    pub fn is_upstream_failure(&self) -> bool {
        match self {
            Self::Provider { source, .. } => match source {
                ProviderError::Api { status, .. } => *status >= 500,
                _ => true,
            },
            _ => false,
        }
    }
}
