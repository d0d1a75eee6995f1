//! Single-lane engine worker
//!
//! All operations that touch the engine run on one dedicated thread, so "at
//! most one mutating operation at a time" is structural rather than an
//! accident of scheduling. The thread owns the engine handle outright; engine
//! types are free to be non-Send. Commands arrive in submission order and are
//! executed one at a time.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;

use crate::config::EngineConfig;
use crate::engine::artifact::validate_artifact;
use crate::engine::backend::{EngineBackend, EngineOptions};
use crate::engine::handle::EngineHandle;
use crate::error::LlmError;
use crate::events::Event;
use crate::lifecycle::Trigger;
use crate::manager::Shared;

/// Operations accepted by the worker lane.
pub(crate) enum WorkerCommand {
    /// Build a new engine, replacing any existing one. The outcome is
    /// delivered to every registered initialize waiter.
    Initialize,
    /// Run one generation against the current engine.
    Generate {
        prompt: String,
        reply: oneshot::Sender<Result<String, LlmError>>,
    },
    /// Release the engine and stop the lane.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Worker thread main loop.
///
/// Exits when a `Shutdown` command arrives or the command channel closes.
pub(crate) fn run_worker<B: EngineBackend>(
    mut backend: B,
    config: EngineConfig,
    shared: Arc<Shared>,
    mut commands: UnboundedReceiver<WorkerCommand>,
) {
    let mut handle: Option<EngineHandle<B::Engine>> = None;

    while let Some(command) = commands.blocking_recv() {
        match command {
            WorkerCommand::Initialize => {
                let outcome = run_initialize(&mut backend, &config, &mut handle);
                finish_initialize(&shared, outcome);
            }
            WorkerCommand::Generate { prompt, reply } => {
                let result = run_generate(handle.as_mut(), &prompt);
                finish_generate(&shared);
                let _ = reply.send(result);
            }
            WorkerCommand::Shutdown { reply } => {
                release_handle(&mut handle);
                finish_shutdown(&shared);
                tracing::info!("engine worker shut down");
                let _ = reply.send(());
                break;
            }
        }
    }

    // If the channel closed without an explicit shutdown, the handle drop
    // releases the engine best-effort.
}

fn run_initialize<B: EngineBackend>(
    backend: &mut B,
    config: &EngineConfig,
    handle: &mut Option<EngineHandle<B::Engine>>,
) -> Result<bool, LlmError> {
    config.validate()?;

    let size = validate_artifact(&config.model_path)?;
    tracing::debug!(
        "model artifact {} ({} bytes) ready for load",
        config.model_path.display(),
        size
    );

    release_handle(handle);

    let options = EngineOptions::from(config);
    tracing::info!("building inference engine from {}", options.model_path.display());

    let engine = backend.build(&options).map_err(LlmError::from)?;
    *handle = Some(EngineHandle::new(engine, options));

    tracing::info!("inference engine ready");
    Ok(true)
}

/// Releases the current handle, if any. Failures are downgraded to warnings
/// and never block what comes next.
fn release_handle<E: crate::engine::backend::LoadedEngine>(handle: &mut Option<EngineHandle<E>>) {
    if let Some(mut old) = handle.take() {
        if let Err(e) = old.release() {
            tracing::warn!("failed to release previous engine instance: {}", e);
        } else {
            tracing::debug!("previous engine instance released");
        }
    }
}

/// Applies the init outcome to the shared state, publishes `Ready` on
/// success, then resolves every coalesced waiter with a clone of the one
/// outcome. The event is published before any waiter resolves.
fn finish_initialize(shared: &Shared, outcome: Result<bool, LlmError>) {
    let waiters = {
        let mut inner = shared.lock_inner();
        let trigger = match &outcome {
            Ok(_) => Trigger::InitSucceeded,
            Err(e) => Trigger::InitFailed(e.to_string()),
        };
        match inner.state.transition(trigger) {
            Ok(next) => inner.state = next,
            Err(e) => tracing::error!("init completion rejected by state machine: {}", e),
        }
        std::mem::take(&mut inner.init_waiters)
    };

    if outcome.is_ok() {
        shared.notifier.publish(&Event::Ready);
    }

    for waiter in waiters {
        let _ = waiter.send(outcome.clone());
    }
}

fn run_generate<E: crate::engine::backend::LoadedEngine>(
    handle: Option<&mut EngineHandle<E>>,
    prompt: &str,
) -> Result<String, LlmError> {
    // The facade only enqueues a generate from Ready, so a missing handle
    // means the lane and the state machine disagree.
    let handle = handle.ok_or(LlmError::NotInitialized)?;
    handle.generate(prompt).map_err(LlmError::from)
}

fn finish_generate(shared: &Shared) {
    let mut inner = shared.lock_inner();
    match inner.state.transition(Trigger::GenerateFinished) {
        Ok(next) => inner.state = next,
        Err(e) => tracing::error!("generate completion rejected by state machine: {}", e),
    }
}

/// Cancels any waiters that can no longer be resolved and marks the terminal
/// state.
fn finish_shutdown(shared: &Shared) {
    let waiters = {
        let mut inner = shared.lock_inner();
        match inner.state.transition(Trigger::Shutdown) {
            Ok(next) => inner.state = next,
            Err(e) => tracing::debug!("shutdown transition skipped: {}", e),
        }
        std::mem::take(&mut inner.init_waiters)
    };

    for waiter in waiters {
        let _ = waiter.send(Err(LlmError::Cancelled));
    }
}
