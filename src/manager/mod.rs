//! Engine lifecycle manager
//!
//! [`LlmManager`] is the public async surface of the bridge. It owns the
//! engine outright (no process-wide state), serializes every mutating
//! operation through a single worker lane, and reports failures as values
//! from the boundary taxonomy rather than letting foreign errors escape.
//!
//! # Architecture
//!
//! Callers on any thread enter through the facade, which checks and updates
//! the lifecycle state under a short-lived lock and then either rejects the
//! call eagerly or enqueues it on the worker lane. The worker thread is the
//! only code that ever touches the engine. Events fan out to subscribers on
//! their own channels, decoupled from request completion.

mod worker;

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::oneshot;

use crate::config::EngineConfig;
use crate::engine::backend::EngineBackend;
use crate::error::LlmError;
use crate::events::{EventKind, EventNotifier, Subscription, SubscriptionId};
use crate::lifecycle::{LifecycleState, Trigger};

use worker::WorkerCommand;

/// State shared between the facade and the worker lane.
pub(crate) struct Shared {
    inner: Mutex<ManagerInner>,
    pub(crate) notifier: EventNotifier,
}

pub(crate) struct ManagerInner {
    pub(crate) state: LifecycleState,
    /// Set once `shutdown` has been requested; all later calls fail with
    /// `AlreadyDestroyed` even while teardown is still draining.
    pub(crate) shutting_down: bool,
    /// Completion channels of every caller waiting on the in-flight
    /// initialization. Resolved together with one shared outcome.
    pub(crate) init_waiters: Vec<oneshot::Sender<Result<bool, LlmError>>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            inner: Mutex::new(ManagerInner {
                state: LifecycleState::Uninitialized,
                shutting_down: false,
                init_waiters: Vec::new(),
            }),
            notifier: EventNotifier::new(),
        }
    }

    pub(crate) fn lock_inner(&self) -> MutexGuard<'_, ManagerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Async facade over one managed engine instance.
///
/// All methods take `&self`; the manager is safe to share behind an `Arc`
/// and call from any number of threads concurrently.
pub struct LlmManager {
    shared: Arc<Shared>,
    command_tx: UnboundedSender<WorkerCommand>,
    worker: Option<JoinHandle<()>>,
}

impl LlmManager {
    /// Creates a manager for `config`, spawning its worker lane.
    ///
    /// The engine is not built yet; call [`initialize`](Self::initialize).
    pub fn new<B: EngineBackend>(config: EngineConfig, backend: B) -> Self {
        let shared = Arc::new(Shared::new());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let worker_shared = shared.clone();
        let worker = thread::spawn(move || {
            worker::run_worker(backend, config, worker_shared, command_rx);
        });

        tracing::info!("engine worker lane started");

        Self {
            shared,
            command_tx,
            worker: Some(worker),
        }
    }

    /// Builds (or rebuilds) the engine from the configured model artifact.
    ///
    /// Resolves with `true` once the engine is ready. Concurrent callers
    /// coalesce onto the in-flight attempt: exactly one engine construction
    /// occurs and every caller receives the same outcome. Re-initialization
    /// from `Ready` or `Failed` replaces the previous engine; calling while a
    /// generation is running is rejected.
    pub async fn initialize(&self) -> Result<bool, LlmError> {
        let waiter = {
            let mut inner = self.shared.lock_inner();
            if inner.shutting_down {
                return Err(LlmError::AlreadyDestroyed);
            }

            if inner.state == LifecycleState::Initializing {
                // Single-flight: share the in-flight attempt's outcome.
                tracing::debug!("initialize coalesced onto in-flight attempt");
                let (tx, rx) = oneshot::channel();
                inner.init_waiters.push(tx);
                rx
            } else {
                let next = inner.state.transition(Trigger::Initialize)?;
                inner.state = next;

                if self.command_tx.send(WorkerCommand::Initialize).is_err() {
                    inner.state = LifecycleState::Destroyed;
                    return Err(LlmError::AlreadyDestroyed);
                }

                let (tx, rx) = oneshot::channel();
                inner.init_waiters.push(tx);
                rx
            }
        };

        waiter.await.unwrap_or(Err(LlmError::Cancelled))
    }

    /// Runs one generation for `prompt`.
    ///
    /// The prompt is forwarded as-is, blank or not. Fails immediately when
    /// the engine is not `Ready`; calls are never queued behind an
    /// initialization the caller did not know about.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let reply = {
            let mut inner = self.shared.lock_inner();
            if inner.shutting_down {
                return Err(LlmError::AlreadyDestroyed);
            }

            match &inner.state {
                LifecycleState::Ready => {}
                LifecycleState::Destroyed => return Err(LlmError::AlreadyDestroyed),
                LifecycleState::Generating => {
                    return Err(LlmError::InvalidState {
                        state: inner.state.clone(),
                    })
                }
                LifecycleState::Uninitialized
                | LifecycleState::Initializing
                | LifecycleState::Failed(_) => return Err(LlmError::NotInitialized),
            }

            let next = inner.state.transition(Trigger::Generate)?;
            inner.state = next;

            let (tx, rx) = oneshot::channel();
            let command = WorkerCommand::Generate {
                prompt: prompt.to_string(),
                reply: tx,
            };
            if self.command_tx.send(command).is_err() {
                inner.state = LifecycleState::Destroyed;
                return Err(LlmError::AlreadyDestroyed);
            }
            rx
        };

        reply.await.unwrap_or(Err(LlmError::Cancelled))
    }

    /// True when the engine is loaded and idle.
    pub fn is_ready(&self) -> bool {
        self.shared.lock_inner().state.is_ready()
    }

    /// Alias for [`is_ready`](Self::is_ready); both names exist on the host
    /// side.
    pub fn is_initialized(&self) -> bool {
        self.is_ready()
    }

    /// Snapshot of the current lifecycle state.
    pub fn current_state(&self) -> LifecycleState {
        self.shared.lock_inner().state.clone()
    }

    /// Registers a subscriber for `kind` events. Only events published after
    /// this call are delivered.
    pub fn subscribe(&self, kind: EventKind) -> Subscription {
        self.shared.notifier.subscribe(kind)
    }

    /// Removes an event subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.notifier.unsubscribe(id)
    }

    /// Releases the engine and retires the manager.
    ///
    /// Waits for an in-flight operation to finish first; the engine call is
    /// not interruptible, so teardown happens after it returns and the
    /// in-flight caller still receives its real result. Idempotent: repeated
    /// calls succeed without doing anything.
    pub async fn shutdown(&self) -> Result<(), LlmError> {
        let reply = {
            let mut inner = self.shared.lock_inner();
            if inner.shutting_down || inner.state == LifecycleState::Destroyed {
                return Ok(());
            }
            inner.shutting_down = true;

            let (tx, rx) = oneshot::channel();
            if self.command_tx.send(WorkerCommand::Shutdown { reply: tx }).is_err() {
                inner.state = LifecycleState::Destroyed;
                return Ok(());
            }
            rx
        };

        let _ = reply.await;
        Ok(())
    }
}

impl Drop for LlmManager {
    fn drop(&mut self) {
        {
            let mut inner = self.shared.lock_inner();
            if !inner.shutting_down && inner.state != LifecycleState::Destroyed {
                inner.shutting_down = true;
                let (tx, _rx) = oneshot::channel();
                let _ = self.command_tx.send(WorkerCommand::Shutdown { reply: tx });
            }
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
