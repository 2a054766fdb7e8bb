//! Script fetching — the two remote GETs the bootstrap sequence performs.
//!
//! Failures are transport-level only; bodies are opaque executable text
//! with no contract beyond eventually calling the event-command handle.

use std::future::Future;

use tracing::debug;

/// Fetches script bodies. URLs may be origin-relative (`/assets/…`) or
/// protocol-relative (`//host/assets/…`) exactly as the sequencer builds
/// them; implementations resolve those against their own base.
pub trait ScriptFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// HTTP fetcher. Relative URLs resolve against `base_origin`
/// (e.g. `https://example.com`); protocol-relative URLs borrow its scheme.
pub struct HttpScriptFetcher {
    client: reqwest::Client,
    base_origin: String,
}

impl HttpScriptFetcher {
    pub fn new(base_origin: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_origin: base_origin.into(),
        }
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        if let Some(rest) = url.strip_prefix("//") {
            let scheme = if self.base_origin.starts_with("http://") {
                "http"
            } else {
                "https"
            };
            return format!("{scheme}://{rest}");
        }
        format!("{}{}", self.base_origin.trim_end_matches('/'), url)
    }
}

impl ScriptFetcher for HttpScriptFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let absolute = self.resolve(url);
        debug!(url = %absolute, "fetching script");
        let response = self
            .client
            .get(&absolute)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}
