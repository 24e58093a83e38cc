//! Errors surfaced through the interception seam.

use std::sync::Arc;

use thiserror::Error;

use crate::config::ConfigError;
use crate::hooks::HookError;

/// Failure of an intercepted call or of the activation it triggered.
///
/// `E` is the transport's own error type; it is carried untouched.
/// Configuration errors are terminal and shared by every call that hits them.
#[derive(Debug, Error)]
pub enum InterceptError<E> {
    #[error(transparent)]
    Config(Arc<ConfigError>),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Transport(E),
}

impl<E> From<ConfigError> for InterceptError<E> {
    fn from(e: ConfigError) -> Self {
        InterceptError::Config(Arc::new(e))
    }
}

impl<E> InterceptError<E> {
    /// The transport's error, if that is what failed.
    pub fn into_transport(self) -> Option<E> {
        match self {
            InterceptError::Transport(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            InterceptError::Config(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
