//! Event record shapes — the two forms third-party tag-manager code pushes
//! onto the data layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single data-layer record.
///
/// Named analytics events arrive as an ordered argument list
/// `(command, name, params)`; structural signals (navigation changes,
/// tag-manager lifecycle markers) arrive as a mapping carrying at least an
/// `event` key. Both shapes are preserved verbatim so externally authored
/// scripts iterating the queue see exactly what was pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventRecord {
    Tuple(Vec<Value>),
    Object(Map<String, Value>),
}

impl EventRecord {
    /// The common `("event", name, params)` tuple.
    pub fn named_event(name: impl Into<String>, params: Map<String, Value>) -> Self {
        EventRecord::Tuple(vec![
            Value::from("event"),
            Value::from(name.into()),
            Value::Object(params),
        ])
    }

    /// Command string — the first tuple element.
    pub fn command(&self) -> Option<&str> {
        match self {
            EventRecord::Tuple(args) => args.first().and_then(Value::as_str),
            EventRecord::Object(_) => None,
        }
    }

    /// Event name — the second tuple element.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            EventRecord::Tuple(args) => args.get(1).and_then(Value::as_str),
            EventRecord::Object(_) => None,
        }
    }

    /// Params mapping — the third tuple element, when it is an object.
    pub fn params(&self) -> Option<&Map<String, Value>> {
        match self {
            EventRecord::Tuple(args) => args.get(2).and_then(Value::as_object),
            EventRecord::Object(_) => None,
        }
    }

    /// Replace the params mapping. Params occupy tuple position 3; callers
    /// only rewrite records already matched as named events (length >= 2).
    pub fn set_params(&mut self, params: Map<String, Value>) {
        if let EventRecord::Tuple(args) = self {
            let value = Value::Object(params);
            if args.len() >= 3 {
                args[2] = value;
            } else {
                args.push(value);
            }
        }
    }

    /// The mapping a structural signal lives in: the params object for a
    /// tuple whose element 3 is a non-empty mapping, the record itself for
    /// an object record.
    pub fn signal_map(&self) -> Option<&Map<String, Value>> {
        match self {
            EventRecord::Tuple(args) => args
                .get(2)
                .and_then(Value::as_object)
                .filter(|m| !m.is_empty()),
            EventRecord::Object(map) => Some(map),
        }
    }

    /// Normalized signal name — the `event` key of [`signal_map`].
    ///
    /// [`signal_map`]: EventRecord::signal_map
    pub fn signal_name(&self) -> Option<&str> {
        self.signal_map()?.get("event").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history_signal() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("event".into(), json!("gtm.historyChange-v2"));
        map.insert("gtm.newUrl".into(), json!("https://a.com/x"));
        map.insert("gtm.oldUrl".into(), json!("https://a.com/y"));
        map
    }

    #[test]
    fn test_tuple_accessors() {
        let record = EventRecord::named_event("purchase", Map::new());
        assert_eq!(record.command(), Some("event"));
        assert_eq!(record.event_name(), Some("purchase"));
        assert_eq!(record.params(), Some(&Map::new()));
    }

    #[test]
    fn test_signal_name_from_object() {
        let record = EventRecord::Object(history_signal());
        assert_eq!(record.signal_name(), Some("gtm.historyChange-v2"));
        assert!(record.command().is_none());
    }

    #[test]
    fn test_signal_name_from_tuple_params() {
        let record = EventRecord::named_event("nav", history_signal());
        assert_eq!(record.signal_name(), Some("gtm.historyChange-v2"));
    }

    #[test]
    fn test_empty_params_carry_no_signal() {
        let record = EventRecord::named_event("purchase", Map::new());
        assert!(record.signal_name().is_none());
    }

    #[test]
    fn test_set_params_replaces_and_appends() {
        let mut with_params = EventRecord::named_event("purchase", Map::new());
        let mut params = Map::new();
        params.insert("os".into(), json!("ios"));
        with_params.set_params(params.clone());
        assert_eq!(with_params.params().unwrap().get("os"), Some(&json!("ios")));

        let mut without_params =
            EventRecord::Tuple(vec![json!("event"), json!("purchase")]);
        without_params.set_params(params);
        assert_eq!(
            without_params.params().unwrap().get("os"),
            Some(&json!("ios"))
        );
    }

    #[test]
    fn test_untagged_serde_round_trip() {
        let tuple = EventRecord::Tuple(vec![json!("js"), json!("2024-01-01T00:00:00Z")]);
        let object = EventRecord::Object(history_signal());

        let tuple_json = serde_json::to_string(&tuple).unwrap();
        assert!(tuple_json.starts_with('['));
        assert_eq!(serde_json::from_str::<EventRecord>(&tuple_json).unwrap(), tuple);

        let object_json = serde_json::to_string(&object).unwrap();
        assert!(object_json.starts_with('{'));
        assert_eq!(
            serde_json::from_str::<EventRecord>(&object_json).unwrap(),
            object
        );
    }
}
