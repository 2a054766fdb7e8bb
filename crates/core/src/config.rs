use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `TAGBRIDGE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Remote analytics property id (`G-…`).
    #[serde(default)]
    pub analytics_id: String,
    /// Tag-manager container id (`GTM-…`).
    #[serde(default)]
    pub gtm_id: String,
    /// Tag synthesized events as internal traffic.
    #[serde(default)]
    pub debug: bool,
    /// Host name of the wrapped shell's asset origin. A page whose location
    /// contains `://<native_host>` is treated as running natively; empty
    /// disables native detection entirely.
    #[serde(default = "default_native_host")]
    pub native_host: String,
    /// Path of the tag-manager script on the asset host.
    #[serde(default = "default_gtm_script_path")]
    pub gtm_script_path: String,
    /// Path of the analytics script on the asset host.
    #[serde(default = "default_tracking_script_path")]
    pub tracking_script_path: String,
    /// Proceed with application bootstrap when a script load fails. When
    /// false, the failure propagates to the caller instead.
    #[serde(default = "default_fail_open")]
    pub fail_open: bool,
}

fn default_native_host() -> String {
    "app-shell".to_string()
}
fn default_gtm_script_path() -> String {
    "/assets/gtm.js".to_string()
}
fn default_tracking_script_path() -> String {
    "/assets/tracking.js".to_string()
}
fn default_fail_open() -> bool {
    true
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            analytics_id: String::new(),
            gtm_id: String::new(),
            debug: false,
            native_host: default_native_host(),
            gtm_script_path: default_gtm_script_path(),
            tracking_script_path: default_tracking_script_path(),
            fail_open: default_fail_open(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("TAGBRIDGE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
