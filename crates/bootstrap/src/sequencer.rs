//! Bootstrap sequencer — stands up the intercepted data layer, loads the
//! two remote analytics scripts in order, and emits the configuration and
//! open events that start the stream.
//!
//! The sequence is strictly linear: init, install interceptors, tag-manager
//! load, analytics load, done. A load failure halts forward progress; what
//! happens to application bootstrap then is the embedder's call, expressed
//! through [`AnalyticsConfig::fail_open`].

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use tagbridge_core::bridge::{noop_bridge, AnalyticsBridge};
use tagbridge_core::config::AnalyticsConfig;
use tagbridge_core::context::{PageContext, PlatformContext, PlatformDetector, StaticPlatform};
use tagbridge_core::error::{BridgeError, BridgeResult, ScriptStage};
use tagbridge_core::record::EventRecord;
use tagbridge_core::scheduler::Scheduler;
use tagbridge_pipeline::{
    virtual_path, DataLayer, EventCommand, HistoryChangeInterceptor, PlatformBridgeInterceptor,
};

use crate::fetch::ScriptFetcher;
use crate::host::{NoopHost, ScriptHost};

/// Handles returned to the embedder once the sequence resolves. The data
/// layer and command handle stay alive for the process lifetime.
pub struct AnalyticsHandle {
    pub data_layer: DataLayer,
    pub command: EventCommand,
    pub scheduler: Scheduler,
    pub platform: PlatformContext,
    /// False when a script stage failed and `fail_open` let bootstrap
    /// proceed without analytics.
    pub loaded: bool,
}

impl std::fmt::Debug for AnalyticsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsHandle")
            .field("data_layer_len", &self.data_layer.len())
            .field("platform", &self.platform)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

/// Runs the analytics bootstrap sequence.
pub struct AnalyticsLoader<F: ScriptFetcher> {
    config: AnalyticsConfig,
    fetcher: F,
    page: Arc<dyn PageContext>,
    bridge: Arc<dyn AnalyticsBridge>,
    host: Arc<dyn ScriptHost>,
    detector: Arc<dyn PlatformDetector>,
    scheduler: Scheduler,
}

impl<F: ScriptFetcher> AnalyticsLoader<F> {
    pub fn new(config: AnalyticsConfig, fetcher: F, page: Arc<dyn PageContext>) -> Self {
        Self {
            config,
            fetcher,
            page,
            bridge: noop_bridge(),
            host: Arc::new(NoopHost),
            detector: Arc::new(StaticPlatform("web".into())),
            scheduler: Scheduler::new(),
        }
    }

    /// Attach the native analytics bridge SDK.
    pub fn with_bridge(mut self, bridge: Arc<dyn AnalyticsBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    /// Attach the host-environment script evaluator.
    pub fn with_host(mut self, host: Arc<dyn ScriptHost>) -> Self {
        self.host = host;
        self
    }

    /// Attach the shell's platform detector (consulted on native hosts).
    pub fn with_platform_detector(mut self, detector: Arc<dyn PlatformDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Share a scheduler with the embedder instead of creating one.
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Run the full sequence. `pre_existing` holds records queued before
    /// interception was installed; they replay through the proxy chain in
    /// their original order.
    pub async fn load(&self, pre_existing: Vec<EventRecord>) -> BridgeResult<AnalyticsHandle> {
        // Stage 1: host mode via origin inspection, base queue install.
        let location = self.page.location();
        let is_native = !self.config.native_host.is_empty()
            && location.contains(&format!("://{}", self.config.native_host));
        let platform = if is_native {
            PlatformContext::native(self.detector.platform(), self.config.debug)
        } else {
            PlatformContext::web(self.config.debug)
        };
        info!(
            is_native,
            platform = %platform.platform_id,
            "initializing data layer"
        );

        let mut layer = DataLayer::new();

        // Stage 2: platform-bridge sits inner (native only) so the derived
        // events of the outer history-change layer still reach it.
        if is_native {
            info!("connecting native analytics bridge");
            layer = layer.with_layer(Arc::new(PlatformBridgeInterceptor::new(
                self.scheduler.clone(),
                Arc::clone(&self.bridge),
                platform.platform_id.clone(),
            )));
        }
        layer = layer.with_layer(Arc::new(HistoryChangeInterceptor::new(
            self.scheduler.clone(),
            Arc::clone(&self.page),
            self.config.debug,
        )));

        for record in pre_existing {
            layer.push(record);
        }

        let command = EventCommand::new(layer.clone());

        let loaded = match self.run_load_stages(&layer, &command, is_native).await {
            Ok(()) => true,
            Err(err) if self.config.fail_open => {
                warn!(error = %err, "analytics bootstrap failed, continuing without analytics");
                false
            }
            Err(err) => return Err(err),
        };

        Ok(AnalyticsHandle {
            data_layer: layer,
            command,
            scheduler: self.scheduler.clone(),
            platform,
            loaded,
        })
    }

    /// Stages 3 and 4: the two script loads and the events they trigger.
    async fn run_load_stages(
        &self,
        layer: &DataLayer,
        command: &EventCommand,
        is_native: bool,
    ) -> BridgeResult<()> {
        let origin = if is_native {
            format!("//{}", self.config.native_host)
        } else {
            String::new()
        };

        // Stage 3: tag-manager script.
        let gtm_url = format!(
            "{}{}?id={}",
            origin, self.config.gtm_script_path, self.config.gtm_id
        );
        let source = self.fetcher.fetch(&gtm_url).await.map_err(|err| {
            error!(error = %err, "could not load tag-manager script");
            BridgeError::ScriptLoad {
                stage: ScriptStage::TagManager,
                reason: err.to_string(),
            }
        })?;

        // The start marker must be queued before the script runs.
        let mut start = Map::new();
        start.insert("gtm.start".into(), Value::from(Utc::now().timestamp_millis()));
        start.insert("event".into(), Value::from("gtm.js"));
        layer.push(EventRecord::Object(start));

        self.host.evaluate(&source).map_err(BridgeError::Eval)?;
        info!(url = %gtm_url, "tag-manager script loaded");

        // Stage 4: analytics script.
        if is_native {
            self.bridge.enable();
        }
        let tracking_url = format!(
            "{}{}?id={}",
            origin, self.config.tracking_script_path, self.config.analytics_id
        );
        let source = self.fetcher.fetch(&tracking_url).await.map_err(|err| {
            error!(error = %err, "could not load analytics script");
            BridgeError::ScriptLoad {
                stage: ScriptStage::Analytics,
                reason: err.to_string(),
            }
        })?;
        self.host.evaluate(&source).map_err(BridgeError::Eval)?;

        if is_native {
            // Protocol checks don't apply inside the shell; hand the remote
            // script a no-op slot to install.
            command.emit(vec![json!("set"), json!({ "checkProtocolTask": null })]);
        }
        command.emit(vec![json!("js"), json!(Utc::now().to_rfc3339())]);
        command.emit(vec![
            json!("config"),
            json!(self.config.analytics_id),
            json!({ "send_page_view": true }),
        ]);

        let page = Arc::clone(&self.page);
        let debug = self.config.debug;
        let command = command.clone();
        self.scheduler.defer(move || {
            let location = page.location();
            let mut params = Map::new();
            params.insert("page_location".into(), Value::from(location.as_str()));
            params.insert("page_title".into(), Value::from(page.title()));
            params.insert(
                "virtual_page_location".into(),
                Value::from(virtual_path(&location)),
            );
            params.insert("os".into(), Value::from("web"));
            if debug {
                params.insert("traffic_type".into(), Value::from("internal"));
            }
            command.event("application_opened", params);
        });

        info!("analytics pipeline loaded");
        Ok(())
    }
}
