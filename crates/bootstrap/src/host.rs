//! Script-host boundary — evaluation of externally authored code.

use parking_lot::Mutex;

/// Executes fetched script text in the host environment.
///
/// The evaluated code is an opaque collaborator: it is expected to interact
/// with the pipeline only through the event-command handle / data layer the
/// embedder exposed to it, and its internals are not modeled here.
pub trait ScriptHost: Send + Sync {
    fn evaluate(&self, source: &str) -> anyhow::Result<()>;
}

/// Host that discards scripts — headless hosts without a script engine.
pub struct NoopHost;

impl ScriptHost for NoopHost {
    fn evaluate(&self, _source: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Records evaluated sources for assertions.
#[derive(Default)]
pub struct CaptureHost {
    sources: Mutex<Vec<String>>,
}

impl CaptureHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.sources.lock().len()
    }
}

impl ScriptHost for CaptureHost {
    fn evaluate(&self, source: &str) -> anyhow::Result<()> {
        self.sources.lock().push(source.to_string());
        Ok(())
    }
}
