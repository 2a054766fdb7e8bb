//! Native analytics bridge — trait for mirroring data-layer events into the
//! wrapped shell's analytics SDK.
//!
//! The pipeline talks to the bridge through an `Arc<dyn AnalyticsBridge>`.
//! Every call is fire-and-forget: implementations handle their own failures
//! and nothing ever surfaces back into the event queue.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Trait for the native analytics SDK consumed when running inside a
/// wrapped shell.
pub trait AnalyticsBridge: Send + Sync {
    /// Activate the bridge. Called once before the analytics script loads;
    /// repeated calls must be harmless.
    fn enable(&self);

    /// Mirror a named event with its params.
    fn log_event(&self, name: &str, params: &Map<String, Value>);
}

/// No-op bridge for pure-web hosts and modules that don't mirror events.
pub struct NoopBridge;

impl AnalyticsBridge for NoopBridge {
    fn enable(&self) {}
    fn log_event(&self, _name: &str, _params: &Map<String, Value>) {}
}

/// In-memory bridge that records calls for testing.
#[derive(Default)]
pub struct CaptureBridge {
    enabled: Mutex<bool>,
    events: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl CaptureBridge {
    pub fn new() -> Self {
        Self {
            enabled: Mutex::new(false),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        *self.enabled.lock()
    }

    pub fn events(&self) -> Vec<(String, Map<String, Value>)> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|(n, _)| n == name).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AnalyticsBridge for CaptureBridge {
    fn enable(&self) {
        *self.enabled.lock() = true;
    }

    fn log_event(&self, name: &str, params: &Map<String, Value>) {
        self.events.lock().push((name.to_string(), params.clone()));
    }
}

/// Convenience: a no-op bridge for hosts that never mirror.
pub fn noop_bridge() -> Arc<dyn AnalyticsBridge> {
    Arc::new(NoopBridge)
}

/// Convenience: create a capture bridge for tests.
pub fn capture_bridge() -> Arc<CaptureBridge> {
    Arc::new(CaptureBridge::new())
}
