use cuesmith_signals::RegistryError;
use thiserror::Error;

/// Errors from sketch generation.
///
/// A validated model cannot produce any of these — the validator guarantees
/// waveform resolvability and the model builder assigns every servo id —
/// but generation propagates instead of panicking.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("internal: {0}")]
    Internal(String),

    #[error("formatting failed: {0}")]
    Fmt(#[from] std::fmt::Error),
}

pub type CodegenResult<T> = Result<T, CodegenError>;
