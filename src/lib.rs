//! llm-bridge
//!
//! Lifecycle manager for an on-device LLM inference engine exposed to a host
//! application across a serialization boundary.
//!
//! The engine itself is an external collaborator behind the
//! [`engine::EngineBackend`] traits. This crate owns everything around it:
//! a bounded lifecycle state machine, a single-lane request serializer so no
//! two operations ever race on the engine, fire-and-forget event delivery to
//! subscribers, and an error taxonomy whose values are safe to hand across
//! the boundary (stable code + message, never a foreign error object).
//!
//! ```no_run
//! use llm_bridge::{EngineConfig, EventKind, LlmManager};
//! # use llm_bridge::{BackendError, EngineBackend, EngineOptions, LoadedEngine};
//! # struct MyBackend;
//! # struct MyEngine;
//! # impl EngineBackend for MyBackend {
//! #     type Engine = MyEngine;
//! #     fn build(&mut self, _: &EngineOptions) -> Result<MyEngine, BackendError> { Ok(MyEngine) }
//! # }
//! # impl LoadedEngine for MyEngine {
//! #     fn generate(&mut self, p: &str) -> Result<String, BackendError> { Ok(p.into()) }
//! #     fn release(&mut self) -> Result<(), BackendError> { Ok(()) }
//! # }
//!
//! # async fn run() -> Result<(), llm_bridge::LlmError> {
//! let manager = LlmManager::new(EngineConfig::load(), MyBackend);
//! let mut ready = manager.subscribe(EventKind::Ready);
//!
//! manager.initialize().await?;
//! let text = manager.generate("Write a poem about a cat.").await?;
//! manager.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod manager;

// Re-export the public surface at the crate root.
pub use config::{BackendPreference, ConfigError, EngineConfig};
pub use engine::{BackendError, EngineBackend, EngineOptions, LoadedEngine};
pub use error::{BoundaryError, LlmError};
pub use events::{Event, EventKind, EventNotifier, Subscription, SubscriptionId};
pub use lifecycle::{LifecycleState, TransitionError, Trigger};
pub use manager::LlmManager;
