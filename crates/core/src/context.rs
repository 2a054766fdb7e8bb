//! Host context — immutable platform facts plus the live page state read at
//! event time.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Facts about the host, fixed for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformContext {
    pub is_native: bool,
    /// Identifier reported by the shell's platform detector (e.g. "ios",
    /// "android"); `"web"` outside a wrapped shell.
    pub platform_id: String,
    /// Tag synthesized events as internal traffic.
    pub debug: bool,
}

impl PlatformContext {
    pub fn web(debug: bool) -> Self {
        Self {
            is_native: false,
            platform_id: "web".into(),
            debug,
        }
    }

    pub fn native(platform_id: impl Into<String>, debug: bool) -> Self {
        Self {
            is_native: true,
            platform_id: platform_id.into(),
            debug,
        }
    }
}

/// Platform-detection facility of the wrapped shell. Consulted only on
/// native hosts.
pub trait PlatformDetector: Send + Sync {
    /// Platform identifier string, e.g. "ios" or "android".
    fn platform(&self) -> String;
}

/// Detector returning a fixed identifier.
pub struct StaticPlatform(pub String);

impl PlatformDetector for StaticPlatform {
    fn platform(&self) -> String {
        self.0.clone()
    }
}

/// Live page state.
///
/// Reads happen at the moment a deferred task runs, not when the triggering
/// event was pushed — the title may have changed in between.
pub trait PageContext: Send + Sync {
    /// Current document title.
    fn title(&self) -> String;
    /// Full current page URL.
    fn location(&self) -> String;
}

/// Page state for headless hosts and tests; mutable so tests can change the
/// title or location between trigger and drain.
pub struct FixedPage {
    location: Mutex<String>,
    title: Mutex<String>,
}

impl FixedPage {
    pub fn new(location: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(location.into()),
            title: Mutex::new(title.into()),
        }
    }

    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.lock() = location.into();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.lock() = title.into();
    }
}

impl PageContext for FixedPage {
    fn title(&self) -> String {
        self.title.lock().clone()
    }

    fn location(&self) -> String {
        self.location.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_context_constructors() {
        let web = PlatformContext::web(true);
        assert!(!web.is_native);
        assert_eq!(web.platform_id, "web");
        assert!(web.debug);

        let native = PlatformContext::native("ios", false);
        assert!(native.is_native);
        assert_eq!(native.platform_id, "ios");
    }

    #[test]
    fn test_fixed_page_reads_current_state() {
        let page = FixedPage::new("https://a.com/x", "Start");
        page.set_title("Changed");
        assert_eq!(page.title(), "Changed");
        assert_eq!(page.location(), "https://a.com/x");
    }
}
