//! Ownership wrapper around one loaded engine instance
//!
//! At most one handle exists per manager at any time; it lives on the worker
//! thread and is never exposed to callers. A new handle is only created after
//! the previous one has been released.

use crate::engine::backend::{BackendError, EngineOptions, LoadedEngine};

pub(crate) struct EngineHandle<E: LoadedEngine> {
    engine: E,
    options: EngineOptions,
    released: bool,
}

impl<E: LoadedEngine> EngineHandle<E> {
    pub(crate) fn new(engine: E, options: EngineOptions) -> Self {
        Self {
            engine,
            options,
            released: false,
        }
    }

    pub(crate) fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Runs one generation against the owned engine.
    ///
    /// A failed generation does not invalidate the handle.
    pub(crate) fn generate(&mut self, prompt: &str) -> Result<String, BackendError> {
        self.engine.generate(prompt)
    }

    /// Releases the underlying resource. Idempotent.
    pub(crate) fn release(&mut self) -> Result<(), BackendError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.engine.release()
    }
}

impl<E: LoadedEngine> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.engine.release() {
            tracing::warn!("failed to release engine on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendPreference;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingEngine {
        releases: Arc<AtomicUsize>,
    }

    impl LoadedEngine for CountingEngine {
        fn generate(&mut self, prompt: &str) -> Result<String, BackendError> {
            Ok(format!("echo: {prompt}"))
        }

        fn release(&mut self) -> Result<(), BackendError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn options() -> EngineOptions {
        EngineOptions {
            model_path: PathBuf::from("/tmp/model.task"),
            backend_preference: BackendPreference::Gpu,
            max_tokens: 512,
            max_top_k: 64,
        }
    }

    #[test]
    fn test_generate_delegates() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut handle = EngineHandle::new(
            CountingEngine {
                releases: releases.clone(),
            },
            options(),
        );
        assert_eq!(handle.generate("hi").unwrap(), "echo: hi");
        assert_eq!(handle.options().max_tokens, 512);
    }

    #[test]
    fn test_release_is_idempotent() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut handle = EngineHandle::new(
            CountingEngine {
                releases: releases.clone(),
            },
            options(),
        );

        handle.release().unwrap();
        handle.release().unwrap();
        drop(handle);

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let handle = EngineHandle::new(
            CountingEngine {
                releases: releases.clone(),
            },
            options(),
        );

        drop(handle);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
