//! Capability interface to the underlying inference engine
//!
//! The engine itself (model parsing, tokenization, GPU/CPU dispatch, the
//! generation loop) is an external collaborator. The manager only needs the
//! narrow contract below: build an engine from options, run a synchronous
//! long-running generation, release the resource.
//!
//! Implementations may hold non-Send resources in [`EngineBackend::Engine`];
//! engines are created, used, and dropped on the manager's dedicated worker
//! thread and never leave it.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{BackendPreference, EngineConfig};

/// Failures reported by the engine collaborator.
///
/// This is the whole foreign failure surface. The worker classifies these
/// into the caller-facing taxonomy at its single engine call site.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("host context not available: {0}")]
    ContextUnavailable(String),

    #[error("invalid engine options: {0}")]
    InvalidOptions(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("native library failure: {0}")]
    NativeLibrary(String),

    #[error("engine runtime failure: {0}")]
    Runtime(String),
}

/// Options handed to the engine when building an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub model_path: PathBuf,
    pub backend_preference: BackendPreference,
    pub max_tokens: u32,
    pub max_top_k: u32,
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            backend_preference: config.backend_preference,
            max_tokens: config.max_tokens,
            max_top_k: config.max_top_k,
        }
    }
}

/// Factory side of the engine collaborator.
pub trait EngineBackend: Send + 'static {
    /// The loaded engine resource. Need not be `Send`; it stays on the
    /// worker thread.
    type Engine: LoadedEngine;

    /// Builds a new engine instance. The expensive part.
    fn build(&mut self, options: &EngineOptions) -> Result<Self::Engine, BackendError>;
}

/// A live, loaded engine instance.
pub trait LoadedEngine {
    /// Runs one generation for `prompt`. Synchronous and long-running; the
    /// call is not interruptible.
    fn generate(&mut self, prompt: &str) -> Result<String, BackendError>;

    /// Releases the underlying resource.
    fn release(&mut self) -> Result<(), BackendError>;
}
