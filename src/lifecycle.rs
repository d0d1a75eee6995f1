//! Engine lifecycle state machine
//!
//! Tracks which phase the managed engine is in and enforces legal
//! transitions. Callers never mutate the state directly; the manager applies
//! triggers under its lock and the worker applies completion triggers when an
//! operation finishes.

use thiserror::Error;

/// Current phase of the managed engine.
///
/// Exactly one state holds at any instant. `Destroyed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// No engine has been built yet.
    Uninitialized,
    /// An initialization is in flight on the worker lane.
    Initializing,
    /// An engine is loaded and idle.
    Ready,
    /// A generation is in flight on the worker lane.
    Generating,
    /// The last initialization failed; carries the failure message.
    Failed(String),
    /// The manager has been shut down. No further transitions are accepted.
    Destroyed,
}

impl LifecycleState {
    /// Short name used in log lines and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Ready => "ready",
            LifecycleState::Generating => "generating",
            LifecycleState::Failed(_) => "failed",
            LifecycleState::Destroyed => "destroyed",
        }
    }

    /// Returns true if the engine is loaded and idle.
    pub fn is_ready(&self) -> bool {
        matches!(self, LifecycleState::Ready)
    }
}

/// Events that drive the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A caller requested (re-)initialization.
    Initialize,
    /// The worker finished building the engine.
    InitSucceeded,
    /// The worker failed to build the engine; carries the failure message.
    InitFailed(String),
    /// A caller requested a generation.
    Generate,
    /// The worker finished a generation, successfully or not.
    GenerateFinished,
    /// The manager is tearing down.
    Shutdown,
}

/// A trigger was applied in a state that does not accept it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot apply {:?} in state '{}'", trigger, state.name())]
pub struct TransitionError {
    pub state: LifecycleState,
    pub trigger: Trigger,
}

impl LifecycleState {
    /// Computes the successor state for `trigger`.
    ///
    /// Illegal combinations return a [`TransitionError`] carrying the current
    /// state; they are never coerced.
    pub fn transition(&self, trigger: Trigger) -> Result<LifecycleState, TransitionError> {
        use LifecycleState::*;

        let next = match (self, &trigger) {
            // Re-initialization from Ready or Failed is always permitted.
            (Uninitialized | Ready | Failed(_), Trigger::Initialize) => Initializing,
            (Initializing, Trigger::InitSucceeded) => Ready,
            (Initializing, Trigger::InitFailed(reason)) => Failed(reason.clone()),
            (Ready, Trigger::Generate) => Generating,
            // A failed generation does not invalidate the engine.
            (Generating, Trigger::GenerateFinished) => Ready,
            // Destroyed is terminal, even for a repeated Shutdown.
            (Destroyed, _) => {
                return Err(TransitionError {
                    state: self.clone(),
                    trigger: trigger.clone(),
                })
            }
            (_, Trigger::Shutdown) => Destroyed,
            _ => {
                return Err(TransitionError {
                    state: self.clone(),
                    trigger: trigger.clone(),
                })
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    #[test]
    fn test_initialize_paths() {
        assert_eq!(
            Uninitialized.transition(Trigger::Initialize).unwrap(),
            Initializing
        );
        assert_eq!(Ready.transition(Trigger::Initialize).unwrap(), Initializing);
        assert_eq!(
            Failed("boom".into()).transition(Trigger::Initialize).unwrap(),
            Initializing
        );
    }

    #[test]
    fn test_init_completion() {
        assert_eq!(
            Initializing.transition(Trigger::InitSucceeded).unwrap(),
            Ready
        );
        assert_eq!(
            Initializing
                .transition(Trigger::InitFailed("no memory".into()))
                .unwrap(),
            Failed("no memory".into())
        );
    }

    #[test]
    fn test_generate_round_trip() {
        assert_eq!(Ready.transition(Trigger::Generate).unwrap(), Generating);
        assert_eq!(
            Generating.transition(Trigger::GenerateFinished).unwrap(),
            Ready
        );
    }

    #[test]
    fn test_shutdown_from_anywhere() {
        for state in [
            Uninitialized,
            Initializing,
            Ready,
            Generating,
            Failed("x".into()),
        ] {
            assert_eq!(state.transition(Trigger::Shutdown).unwrap(), Destroyed);
        }
    }

    #[test]
    fn test_destroyed_is_terminal() {
        for trigger in [
            Trigger::Initialize,
            Trigger::InitSucceeded,
            Trigger::InitFailed("x".into()),
            Trigger::Generate,
            Trigger::GenerateFinished,
            Trigger::Shutdown,
        ] {
            let err = Destroyed.transition(trigger).unwrap_err();
            assert_eq!(err.state, Destroyed);
        }
    }

    #[test]
    fn test_illegal_transitions_carry_state() {
        let err = Initializing.transition(Trigger::Generate).unwrap_err();
        assert_eq!(err.state, Initializing);
        assert_eq!(err.trigger, Trigger::Generate);

        let err = Generating.transition(Trigger::Initialize).unwrap_err();
        assert_eq!(err.state, Generating);

        let err = Uninitialized.transition(Trigger::Generate).unwrap_err();
        assert_eq!(err.state, Uninitialized);

        assert!(Ready.transition(Trigger::InitSucceeded).is_err());
        assert!(Uninitialized.transition(Trigger::GenerateFinished).is_err());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(Ready.name(), "ready");
        assert_eq!(Failed("x".into()).name(), "failed");
        assert!(Ready.is_ready());
        assert!(!Initializing.is_ready());
    }
}
