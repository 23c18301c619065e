//! Validation and field mapping of a single payload item.

use serde_json::{Map, Value};

use super::aliases::{CanonicalField, NormalizerConfig};
use crate::utils::clean_value;
use crate::{Provenance, RaceRecord};

/// Returns the first alias whose value is present and non-blank, stringified.
pub(crate) fn first_value(item: &Map<String, Value>, aliases: &[String]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| item.get(alias))
        .find_map(clean_value)
}

/// Returns `true` if the item is a mapping with a usable race name.
///
/// # Examples
///
/// ```
/// use racereg::NormalizerConfig;
/// use racereg::normalize::is_valid_item;
/// use serde_json::json;
///
/// let config = NormalizerConfig::new();
/// assert!(is_valid_item(&json!({"eventName": "Jaipur Marathon"}), &config));
/// assert!(!is_valid_item(&json!({"name": "   ", "date": "2024-01-01"}), &config));
/// assert!(!is_valid_item(&json!("Jaipur Marathon"), &config));
/// ```
pub fn is_valid_item(item: &Value, config: &NormalizerConfig) -> bool {
    item.as_object().is_some_and(|map| {
        first_value(map, config.aliases(CanonicalField::RaceName)).is_some()
    })
}

/// Maps a validated item onto the canonical schema.
pub(crate) fn map_item(
    item: &Map<String, Value>,
    config: &NormalizerConfig,
    provenance: &Provenance,
) -> RaceRecord {
    let field = |target: CanonicalField| {
        first_value(item, config.aliases(target)).unwrap_or_default()
    };

    RaceRecord {
        race_name: field(CanonicalField::RaceName),
        race_date: field(CanonicalField::RaceDate),
        city: field(CanonicalField::City),
        distances: field(CanonicalField::Distances),
        participant_count: field(CanonicalField::ParticipantCount),
        event_id: field(CanonicalField::EventId),
        timing_company: provenance.timing_company.clone(),
        source_url: provenance.source_url.clone(),
        year: None,
    }
}
