//! Platform bridging — mirrors named web events into the native analytics
//! SDK when running inside a wrapped shell.
//!
//! Installed only on native hosts; on pure web no bridge calls happen and
//! no `os` rewriting occurs at this layer.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use tagbridge_core::bridge::AnalyticsBridge;
use tagbridge_core::record::EventRecord;
use tagbridge_core::scheduler::Scheduler;

use crate::queue::{AppendFn, Interceptor};

pub struct PlatformBridgeInterceptor {
    scheduler: Scheduler,
    bridge: Arc<dyn AnalyticsBridge>,
    platform_id: String,
}

impl PlatformBridgeInterceptor {
    pub fn new(
        scheduler: Scheduler,
        bridge: Arc<dyn AnalyticsBridge>,
        platform_id: impl Into<String>,
    ) -> Self {
        Self {
            scheduler,
            bridge,
            platform_id: platform_id.into(),
        }
    }

    /// An absent `os`, or the default web tag, gets overwritten with the
    /// detected platform; a params object already declaring a non-web OS is
    /// left untouched so an event that flowed through bridging once is not
    /// tagged twice.
    fn needs_os_tag(record: &EventRecord) -> bool {
        match record.params() {
            None => true,
            Some(params) => match params.get("os") {
                None => true,
                Some(os) => os.as_str() == Some("web"),
            },
        }
    }
}

impl Interceptor for PlatformBridgeInterceptor {
    fn name(&self) -> &'static str {
        "platform-bridge"
    }

    fn intercept(&self, mut record: EventRecord, next: &AppendFn) {
        let is_named_event = record.command() == Some("event")
            && record.event_name().is_some_and(|name| !name.is_empty());

        if is_named_event {
            if Self::needs_os_tag(&record) {
                // Fresh map: the rewritten params share nothing with the
                // original value, so downstream mutation cannot reach it.
                let mut params = record.params().cloned().unwrap_or_default();
                params.insert("os".into(), Value::from(self.platform_id.as_str()));
                record.set_params(params);
            }

            let name = record.event_name().unwrap_or_default().to_string();
            let params: Map<String, Value> = record.params().cloned().unwrap_or_default();
            let bridge = Arc::clone(&self.bridge);
            self.scheduler.defer(move || {
                debug!(event = %name, "mirroring event to native bridge");
                bridge.log_event(&name, &params);
            });
        }

        next(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::DataLayer;
    use serde_json::json;
    use tagbridge_core::bridge::capture_bridge;

    fn install() -> (DataLayer, Scheduler, Arc<tagbridge_core::bridge::CaptureBridge>) {
        let scheduler = Scheduler::new();
        let bridge = capture_bridge();
        let layer = DataLayer::new().with_layer(Arc::new(PlatformBridgeInterceptor::new(
            scheduler.clone(),
            Arc::clone(&bridge) as Arc<dyn AnalyticsBridge>,
            "ios",
        )));
        (layer, scheduler, bridge)
    }

    fn params_with_os(os: &str) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("os".into(), json!(os));
        params
    }

    #[test]
    fn test_non_web_os_left_untouched() {
        let (layer, scheduler, bridge) = install();
        layer.push(EventRecord::named_event("purchase", params_with_os("android")));
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        assert_eq!(
            snapshot[0].params().unwrap().get("os"),
            Some(&json!("android"))
        );
        assert_eq!(bridge.events()[0].1.get("os"), Some(&json!("android")));
    }

    #[test]
    fn test_missing_os_gets_platform_id() {
        let (layer, scheduler, bridge) = install();
        layer.push(EventRecord::named_event("purchase", Map::new()));
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        assert_eq!(snapshot[0].params().unwrap().get("os"), Some(&json!("ios")));
        assert_eq!(bridge.events()[0].1.get("os"), Some(&json!("ios")));
    }

    #[test]
    fn test_web_os_overwritten() {
        let (layer, scheduler, _bridge) = install();
        layer.push(EventRecord::named_event("purchase", params_with_os("web")));
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        assert_eq!(snapshot[0].params().unwrap().get("os"), Some(&json!("ios")));
    }

    #[test]
    fn test_absent_params_created_for_tagging() {
        let (layer, scheduler, bridge) = install();
        layer.push(EventRecord::Tuple(vec![json!("event"), json!("purchase")]));
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        assert_eq!(snapshot[0].params().unwrap().get("os"), Some(&json!("ios")));
        assert_eq!(bridge.count_named("purchase"), 1);
    }

    #[test]
    fn test_mirror_is_deferred() {
        let (layer, scheduler, bridge) = install();
        layer.push(EventRecord::named_event("purchase", Map::new()));

        // Queued immediately, mirrored only on drain.
        assert_eq!(layer.len(), 1);
        assert_eq!(bridge.count(), 0);
        scheduler.run_until_idle();
        assert_eq!(bridge.count(), 1);
    }

    #[test]
    fn test_non_event_records_not_mirrored() {
        let (layer, scheduler, bridge) = install();
        layer.push(EventRecord::Tuple(vec![json!("config"), json!("G-1")]));
        let mut signal = Map::new();
        signal.insert("event".into(), json!("gtm.js"));
        layer.push(EventRecord::Object(signal));
        layer.push(EventRecord::Tuple(vec![json!("event"), json!("")]));
        scheduler.run_until_idle();

        assert_eq!(layer.len(), 3);
        assert_eq!(bridge.count(), 0);
        // None of the forwarded records were rewritten.
        assert!(layer.snapshot()[0].params().is_none());
    }

    #[test]
    fn test_forwarding_is_synchronous_and_exactly_once() {
        let (layer, scheduler, _bridge) = install();
        for n in 0..3 {
            layer.push(EventRecord::named_event(format!("e{n}"), Map::new()));
        }
        assert_eq!(layer.len(), 3);
        scheduler.run_until_idle();
        assert_eq!(layer.len(), 3);
    }
}
