use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const URL_KEY: &str = "url";
pub const MAP_ID_KEY: &str = "mapId";
pub const IGNORE_STALE_RESPONSES_KEY: &str = "ignoreStaleResponses";

/// Loosely typed controller settings.
///
/// Keys are never validated: unknown keys are kept through every merge so
/// that page scripts can stash their own values next to the ones the
/// controllers read.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single key, overriding any previous value.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    /// Merge `other` into these options. Overlapping keys take the value from `other`.
    pub fn merge(&mut self, other: Options) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Base URL of the pickup list endpoint.
    pub fn url(&self) -> Option<&str> {
        self.get_str(URL_KEY)
    }

    /// Id of the element hosting the map, if the page has one.
    pub fn map_id(&self) -> Option<&str> {
        self.get_str(MAP_ID_KEY).filter(|id| !id.is_empty())
    }

    pub fn ignore_stale_responses(&self) -> bool {
        self.get(IGNORE_STALE_RESPONSES_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overrides_overlapping_keys() {
        // Arrange
        let mut options = Options::new().with(URL_KEY, "https://shop.test/pickup");

        // Act
        options.merge(Options::new().with(URL_KEY, "https://other.test/pickup"));

        // Assert
        assert_eq!(options.url(), Some("https://other.test/pickup"));
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn merge_keeps_unknown_keys() {
        // Arrange
        let mut options = Options::new().with("theme", "dark");

        // Act
        options.merge(Options::new().with(MAP_ID_KEY, "pickup-map"));

        // Assert
        assert_eq!(options.get("theme"), Some(&json!("dark")));
        assert_eq!(options.map_id(), Some("pickup-map"));
    }

    #[test]
    fn deserializes_from_plain_object() {
        // Arrange
        let raw = json!({"url": "/pickup", "ignoreStaleResponses": true, "extra": 3});

        // Act
        let options: Options = serde_json::from_value(raw).unwrap();

        // Assert
        assert_eq!(options.url(), Some("/pickup"));
        assert!(options.ignore_stale_responses());
        assert_eq!(options.get("extra"), Some(&json!(3)));
    }

    #[test]
    fn empty_map_id_counts_as_unset() {
        let options = Options::new().with(MAP_ID_KEY, "");
        assert_eq!(options.map_id(), None);
    }

    #[test]
    fn non_string_url_is_ignored() {
        let options = Options::new().with(URL_KEY, 42);
        assert_eq!(options.url(), None);
    }
}
