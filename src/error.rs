//! Error taxonomy for the bridge surface
//!
//! Every failure a caller can observe is one of these variants. Foreign
//! errors from the engine are classified at the single worker call site that
//! invokes it and reduced to a message string here; the foreign error object
//! never crosses the boundary (the host serializer cannot represent it).

use serde::Serialize;
use thiserror::Error;

use crate::engine::backend::BackendError;
use crate::lifecycle::{LifecycleState, TransitionError};

/// Errors delivered to callers of the bridge.
///
/// `Clone` so a single-flight outcome can be handed to every coalesced
/// waiter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Host context not available: {0}")]
    ContextUnavailable(String),

    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    #[error("Model file exists but cannot be read: {0}")]
    ModelUnreadable(String),

    #[error("Permission denied accessing model file: {0}")]
    PermissionDenied(String),

    #[error("Invalid model or configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Native library error: {0}")]
    NativeLibraryError(String),

    #[error("Insufficient memory for model: {0}")]
    OutOfMemory(String),

    #[error("Engine runtime error: {0}")]
    EngineRuntimeError(String),

    #[error("LLM is not initialized. Call initialize() first.")]
    NotInitialized,

    #[error("Operation not allowed in state '{}'", state.name())]
    InvalidState { state: LifecycleState },

    #[error("Operation cancelled by shutdown")]
    Cancelled,

    #[error("Manager has already been destroyed")]
    AlreadyDestroyed,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LlmError {
    /// Stable machine-readable code for this error.
    ///
    /// Codes are part of the host contract and must not change between
    /// releases.
    pub fn code(&self) -> &'static str {
        match self {
            LlmError::ContextUnavailable(_) => "CONTEXT_ERROR",
            LlmError::ModelNotFound(_) => "MODEL_NOT_FOUND",
            LlmError::ModelUnreadable(_) => "MODEL_NOT_READABLE",
            LlmError::PermissionDenied(_) => "SECURITY_ERROR",
            LlmError::InvalidConfiguration(_) => "INVALID_ARGUMENT",
            LlmError::NativeLibraryError(_) => "NATIVE_ERROR",
            LlmError::OutOfMemory(_) => "MEMORY_ERROR",
            LlmError::EngineRuntimeError(_) => "RUNTIME_ERROR",
            LlmError::NotInitialized => "NOT_INITIALIZED",
            LlmError::InvalidState { .. } => "INVALID_STATE",
            LlmError::Cancelled => "CANCELLED",
            LlmError::AlreadyDestroyed => "ALREADY_DESTROYED",
            LlmError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Reduces this error to the code/message pair allowed across the
    /// boundary.
    pub fn boundary(&self) -> BoundaryError {
        BoundaryError {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// The only error shape permitted to cross to the host: a stable code plus a
/// human-readable message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BoundaryError {
    pub code: &'static str,
    pub message: String,
}

/// Classification of foreign engine failures into the taxonomy.
impl From<BackendError> for LlmError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::ContextUnavailable(msg) => LlmError::ContextUnavailable(msg),
            BackendError::InvalidOptions(msg) => LlmError::InvalidConfiguration(msg),
            BackendError::OutOfMemory(msg) => LlmError::OutOfMemory(msg),
            BackendError::NativeLibrary(msg) => LlmError::NativeLibraryError(msg),
            BackendError::Runtime(msg) => LlmError::EngineRuntimeError(msg),
        }
    }
}

impl From<TransitionError> for LlmError {
    fn from(e: TransitionError) -> Self {
        match e.state {
            LifecycleState::Destroyed => LlmError::AlreadyDestroyed,
            state => LlmError::InvalidState { state },
        }
    }
}
