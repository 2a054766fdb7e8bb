//! History-change interception — translates the tag manager's SPA
//! navigation signal into a normalized `page_view` event.
//!
//! The upstream signal carries raw URLs in a vendor-specific shape that is
//! unsuitable for direct forwarding; the derived `page_view` is pushed
//! through the append path captured at install time, so layers installed
//! earlier (closer to the base queue) still see it.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use tagbridge_core::context::PageContext;
use tagbridge_core::record::EventRecord;
use tagbridge_core::scheduler::Scheduler;

use crate::queue::{AppendFn, Interceptor};
use crate::url::virtual_path;

/// Navigation-change marker the tag manager pushes on in-app navigation.
pub const HISTORY_CHANGE_EVENT: &str = "gtm.historyChange-v2";

const NEW_URL_KEY: &str = "gtm.newUrl";
const OLD_URL_KEY: &str = "gtm.oldUrl";

pub struct HistoryChangeInterceptor {
    scheduler: Scheduler,
    page: Arc<dyn PageContext>,
    debug_traffic: bool,
}

impl HistoryChangeInterceptor {
    pub fn new(scheduler: Scheduler, page: Arc<dyn PageContext>, debug_traffic: bool) -> Self {
        Self {
            scheduler,
            page,
            debug_traffic,
        }
    }
}

fn page_view_params(
    page: &dyn PageContext,
    debug_traffic: bool,
    new_url: &str,
    old_url: &str,
) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("page_location".into(), Value::from(new_url));
    params.insert("page_referrer".into(), Value::from(old_url));
    // Title is read now, at derivation time — it may have changed since the
    // navigation signal was pushed.
    params.insert("page_title".into(), Value::from(page.title()));
    params.insert(
        "virtual_page_location".into(),
        Value::from(virtual_path(new_url)),
    );
    params.insert(
        "virtual_page_referrer".into(),
        Value::from(virtual_path(old_url)),
    );
    params.insert("os".into(), Value::from("web"));
    if debug_traffic {
        params.insert("traffic_type".into(), Value::from("internal"));
    }
    params
}

impl Interceptor for HistoryChangeInterceptor {
    fn name(&self) -> &'static str {
        "history-change"
    }

    fn intercept(&self, record: EventRecord, next: &AppendFn) {
        if record.signal_name() == Some(HISTORY_CHANGE_EVENT) {
            // Missing or non-string URLs degrade to empty strings; a matched
            // signal always derives a page_view and never panics.
            let signal = record.signal_map();
            let url_of = |key: &str| {
                signal
                    .and_then(|m| m.get(key))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let new_url = url_of(NEW_URL_KEY);
            let old_url = url_of(OLD_URL_KEY);

            debug!(%new_url, %old_url, "history change observed, page_view deferred");

            let page = Arc::clone(&self.page);
            let debug_traffic = self.debug_traffic;
            let chain = Arc::clone(next);
            self.scheduler.defer(move || {
                let params = page_view_params(page.as_ref(), debug_traffic, &new_url, &old_url);
                chain(EventRecord::named_event("page_view", params));
            });
        }

        // The trigger itself is forwarded unmodified, unconditionally, and
        // immediately — derivation is additive.
        next(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::DataLayer;
    use serde_json::json;
    use tagbridge_core::context::FixedPage;

    fn navigation(new_url: &str, old_url: &str) -> EventRecord {
        let mut map = Map::new();
        map.insert("event".into(), json!(HISTORY_CHANGE_EVENT));
        map.insert(NEW_URL_KEY.into(), json!(new_url));
        map.insert(OLD_URL_KEY.into(), json!(old_url));
        EventRecord::Object(map)
    }

    fn install(
        debug_traffic: bool,
    ) -> (DataLayer, Scheduler, Arc<FixedPage>) {
        let scheduler = Scheduler::new();
        let page = Arc::new(FixedPage::new("https://a.com/x", "Landing"));
        let layer = DataLayer::new().with_layer(Arc::new(HistoryChangeInterceptor::new(
            scheduler.clone(),
            Arc::clone(&page) as Arc<dyn PageContext>,
            debug_traffic,
        )));
        (layer, scheduler, page)
    }

    #[test]
    fn test_navigation_signal_derives_page_view() {
        let (layer, scheduler, _page) = install(false);
        layer.push(navigation("https://a.com/x", "https://a.com/y"));

        // The derived record lands only after the deferred queue drains.
        assert_eq!(layer.len(), 1);
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].signal_name(), Some(HISTORY_CHANGE_EVENT));
        assert_eq!(snapshot[1].event_name(), Some("page_view"));

        let params = snapshot[1].params().unwrap();
        assert_eq!(params.get("page_location"), Some(&json!("https://a.com/x")));
        assert_eq!(params.get("page_referrer"), Some(&json!("https://a.com/y")));
        assert_eq!(params.get("page_title"), Some(&json!("Landing")));
        assert_eq!(params.get("virtual_page_location"), Some(&json!("/x")));
        assert_eq!(params.get("virtual_page_referrer"), Some(&json!("/y")));
        assert_eq!(params.get("os"), Some(&json!("web")));
        assert!(params.get("traffic_type").is_none());
    }

    #[test]
    fn test_title_read_at_derivation_time() {
        let (layer, scheduler, page) = install(false);
        layer.push(navigation("https://a.com/x", "https://a.com/y"));
        page.set_title("Changed After Push");
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        let params = snapshot[1].params().unwrap();
        assert_eq!(params.get("page_title"), Some(&json!("Changed After Push")));
    }

    #[test]
    fn test_debug_tags_internal_traffic() {
        let (layer, scheduler, _page) = install(true);
        layer.push(navigation("https://a.com/x", "https://a.com/y"));
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        let params = snapshot[1].params().unwrap();
        assert_eq!(params.get("traffic_type"), Some(&json!("internal")));
    }

    #[test]
    fn test_signal_carried_in_tuple_params_matches() {
        let (layer, scheduler, _page) = install(false);
        let mut signal = Map::new();
        signal.insert("event".into(), json!(HISTORY_CHANGE_EVENT));
        signal.insert(NEW_URL_KEY.into(), json!("https://a.com/n"));
        signal.insert(OLD_URL_KEY.into(), json!("https://a.com/o"));
        layer.push(EventRecord::named_event("nav", signal));
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].event_name(), Some("page_view"));
    }

    #[test]
    fn test_other_records_pass_through_untouched() {
        let (layer, scheduler, _page) = install(false);
        let record = EventRecord::named_event("purchase", Map::new());
        layer.push(record.clone());
        scheduler.run_until_idle();

        assert_eq!(layer.snapshot(), vec![record]);
    }

    #[test]
    fn test_missing_urls_degrade_to_empty_strings() {
        let (layer, scheduler, _page) = install(false);
        let mut map = Map::new();
        map.insert("event".into(), json!(HISTORY_CHANGE_EVENT));
        layer.push(EventRecord::Object(map));
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        assert_eq!(snapshot.len(), 2);
        let params = snapshot[1].params().unwrap();
        assert_eq!(params.get("page_location"), Some(&json!("")));
        assert_eq!(params.get("virtual_page_location"), Some(&json!("")));
    }

    #[test]
    fn test_derived_records_land_after_all_synchronous_appends() {
        let (layer, scheduler, _page) = install(false);
        layer.push(navigation("https://a.com/1", "https://a.com/0"));
        layer.push(EventRecord::named_event("mid", Map::new()));
        layer.push(navigation("https://a.com/2", "https://a.com/1"));
        scheduler.run_until_idle();

        let snapshot = layer.snapshot();
        assert_eq!(snapshot.len(), 5);
        // Synchronous appends first, then derived page_views in defer order.
        assert_eq!(snapshot[1].event_name(), Some("mid"));
        assert_eq!(snapshot[3].event_name(), Some("page_view"));
        assert_eq!(snapshot[4].event_name(), Some("page_view"));
        let first = snapshot[3].params().unwrap();
        let second = snapshot[4].params().unwrap();
        assert_eq!(first.get("page_location"), Some(&json!("https://a.com/1")));
        assert_eq!(second.get("page_location"), Some(&json!("https://a.com/2")));
    }
}
