//! Analytics bootstrap — sequences the two remote script loads and stands
//! up the intercepted data layer before the application starts.
//!
//! # Modules
//!
//! - [`fetch`] — Script fetching over HTTP (transport errors only)
//! - [`host`] — The opaque script-evaluation boundary
//! - [`sequencer`] — The strictly linear bootstrap state machine

pub mod fetch;
pub mod host;
pub mod sequencer;

pub use fetch::{HttpScriptFetcher, ScriptFetcher};
pub use host::{NoopHost, ScriptHost};
pub use sequencer::{AnalyticsHandle, AnalyticsLoader};
