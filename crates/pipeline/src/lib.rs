//! Data-layer interception pipeline — the ordered event queue third-party
//! tag-manager code appends to, transparently proxied so every record is
//! inspected, normalized, optionally rewritten, and optionally mirrored to
//! a native analytics channel.
//!
//! # Modules
//!
//! - [`queue`] — Base event queue, proxy installer, and the event-command handle
//! - [`history`] — SPA navigation signal → normalized `page_view` events
//! - [`platform`] — Mirroring named events into the native analytics bridge
//! - [`url`] — Virtual-path normalization (scheme/host stripping)

pub mod history;
pub mod platform;
pub mod queue;
pub mod url;

pub use history::HistoryChangeInterceptor;
pub use platform::PlatformBridgeInterceptor;
pub use queue::{AppendFn, DataLayer, EventCommand, EventQueue, Interceptor};
pub use url::virtual_path;
