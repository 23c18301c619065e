//! Payload shape detection.
//!
//! Runs before any field mapping and reduces every recognized payload to a
//! flat list of candidate items.

use serde_json::Value;

use super::aliases::NormalizerConfig;

/// The top-level layout of a fetched payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadShape {
    /// The payload is itself the item list.
    Sequence,
    /// The item list sits under the named envelope key.
    Enveloped(String),
    /// The payload is one item with no envelope.
    Single,
    /// Nothing recognizable; yields no items.
    Empty,
}

impl PayloadShape {
    /// Classifies a payload.
    ///
    /// Envelope keys are checked before single-item detection, so a mapping
    /// carrying both `events: [...]` and a top-level `name` is a collection.
    /// An envelope key only counts when its value is a list.
    pub fn detect(raw: &Value, config: &NormalizerConfig) -> Self {
        match raw {
            Value::Array(_) => PayloadShape::Sequence,
            Value::Object(map) => {
                if let Some(key) = config
                    .envelope_keys()
                    .iter()
                    .find(|key| map.get(key.as_str()).is_some_and(Value::is_array))
                {
                    return PayloadShape::Enveloped(key.clone());
                }

                let looks_like_item = config
                    .single_item_keys()
                    .iter()
                    .any(|alias| map.contains_key(alias));

                if looks_like_item {
                    PayloadShape::Single
                } else {
                    PayloadShape::Empty
                }
            }
            _ => PayloadShape::Empty,
        }
    }
}

/// Extracts the candidate items of a payload, in payload order.
///
/// Items are returned as-is; entries that are not mappings are filtered
/// later by [`is_valid_item`](super::is_valid_item).
pub fn extract_items<'v>(raw: &'v Value, config: &NormalizerConfig) -> Vec<&'v Value> {
    let list = match PayloadShape::detect(raw, config) {
        PayloadShape::Sequence => raw.as_array(),
        PayloadShape::Enveloped(key) => raw.get(key.as_str()).and_then(Value::as_array),
        PayloadShape::Single => return vec![raw],
        PayloadShape::Empty => None,
    };

    list.map(|items| items.iter().collect()).unwrap_or_default()
}
