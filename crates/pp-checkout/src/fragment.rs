use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{constants::LOCATIONS_ATTRIBUTE, location::PickupLocation};

static LOCATIONS_ATTRIBUTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"{LOCATIONS_ATTRIBUTE}\s*=\s*(?:'([^']*)'|"([^"]*)")"#
    ))
    .expect("Invalid regex pattern")
});

/// Extract the sparse location array the list fragment ships for the map.
///
/// A fragment without the attribute, or with an attribute that is not a
/// JSON array, yields no locations. Entries that are `null` or malformed
/// come back as `None` so that positions line up with the rendered rows.
pub fn extract_locations(markup: &str) -> Vec<Option<PickupLocation>> {
    let Some(encoded) = LOCATIONS_ATTRIBUTE_REGEX.captures(markup).and_then(|captures| {
        captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str())
    }) else {
        tracing::debug!("list fragment carries no location data");
        return Vec::new();
    };

    let entries = match serde_json::from_str::<Value>(&decode_entities(encoded)) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            tracing::warn!("list fragment location data is not an array");
            return Vec::new();
        }
        Err(error) => {
            tracing::warn!(%error, "list fragment location data was invalid JSON");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            if entry.is_null() {
                return None;
            }
            serde_json::from_value(entry)
                .map_err(|error| {
                    tracing::warn!(position, %error, "skipping malformed pickup location");
                })
                .ok()
        })
        .collect()
}

fn decode_entities(encoded: &str) -> String {
    encoded
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
