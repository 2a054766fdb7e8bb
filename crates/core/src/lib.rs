pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod record;
pub mod scheduler;

pub use bridge::AnalyticsBridge;
pub use config::{AnalyticsConfig, AppConfig};
pub use context::{PageContext, PlatformContext, PlatformDetector};
pub use error::{BridgeError, BridgeResult, ScriptStage};
pub use record::EventRecord;
pub use scheduler::Scheduler;
