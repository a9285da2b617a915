//! Application state shared across handlers

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identity strings the health document reports for this deployment.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub system_code: String,
    pub description: String,
}

/// Shared application state, generic over the backing service.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

// Manual impl: handlers only need the Arc cloned, not S itself.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<S> {
    service: S,
    system: SystemInfo,
    started: Instant,
}

impl<S> AppState<S> {
    pub fn new(service: S, system: SystemInfo) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                service,
                system,
                started: Instant::now(),
            }),
        }
    }

    pub fn service(&self) -> &S {
        &self.inner.service
    }

    pub fn system(&self) -> &SystemInfo {
        &self.inner.system
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }
}
