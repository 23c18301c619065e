//! Canonical fields and the alias lists used to fill them.

use std::collections::HashMap;
use std::fmt;

/// Envelope keys checked, in order, for a wrapped item list.
pub const DEFAULT_ENVELOPE_KEYS: &[&str] = &[
    "events",
    "data",
    "results",
    "races",
    "items",
    "list",
    "eventList",
    "Events",
    "Data",
];

/// Keys that mark a top-level mapping as one item when no envelope matched.
///
/// Narrower than the race-name aliases: a bare `event` key usually wraps a
/// nested object rather than naming a race.
pub const DEFAULT_SINGLE_ITEM_KEYS: &[&str] = &[
    "name",
    "event_name",
    "race_name",
    "title",
    "EventName",
    "eventName",
    "RaceName",
];

/// Default alias lists for each content field, highest priority first.
const DEFAULT_ALIASES: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::RaceName,
        &[
            "event_name",
            "name",
            "race_name",
            "title",
            "EventName",
            "eventName",
            "RaceName",
            "event",
        ],
    ),
    (
        CanonicalField::RaceDate,
        &[
            "race_date",
            "date",
            "event_date",
            "start_date",
            "EventDate",
            "eventDate",
            "RaceDate",
            "scheduled_date",
        ],
    ),
    (
        CanonicalField::City,
        &[
            "city", "location", "venue", "place", "City", "Location", "Venue", "Place",
        ],
    ),
    (
        CanonicalField::Distances,
        &[
            "categories",
            "distances",
            "race_types",
            "Categories",
            "Distances",
            "race_categories",
        ],
    ),
    (
        CanonicalField::ParticipantCount,
        &[
            "participant_count",
            "participants",
            "total_participants",
            "count",
            "total_runners",
            "finishers",
            "ParticipantCount",
        ],
    ),
    (
        CanonicalField::EventId,
        &["id", "event_id", "race_id", "EventId", "Id"],
    ),
];

/// The content fields of a [`RaceRecord`](crate::RaceRecord).
///
/// Provenance fields are not listed: they come from the caller, never from
/// the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    RaceName,
    RaceDate,
    City,
    Distances,
    ParticipantCount,
    EventId,
}

impl CanonicalField {
    /// All content fields in record order.
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::RaceName,
        CanonicalField::RaceDate,
        CanonicalField::City,
        CanonicalField::Distances,
        CanonicalField::ParticipantCount,
        CanonicalField::EventId,
    ];

    /// The column name of this field in the registry schema.
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::RaceName => "race_name",
            CanonicalField::RaceDate => "race_date",
            CanonicalField::City => "city",
            CanonicalField::Distances => "distances",
            CanonicalField::ParticipantCount => "participant_count",
            CanonicalField::EventId => "event_id",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for payload normalization.
///
/// Holds the alias list of every canonical field and the ordered envelope
/// keys. Providers with unusual spellings can be handled by replacing the
/// relevant list instead of pre-processing their payloads.
///
/// # Examples
///
/// ```
/// use racereg::NormalizerConfig;
/// use racereg::normalize::CanonicalField;
///
/// let mut config = NormalizerConfig::new();
/// config
///     .set_aliases(CanonicalField::City, vec!["town".to_string(), "city".to_string()])
///     .set_envelope_keys(vec!["payload".to_string()]);
///
/// assert_eq!(config.aliases(CanonicalField::City)[0], "town");
/// ```
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Alias lists per canonical field, highest priority first
    aliases: HashMap<CanonicalField, Vec<String>>,
    /// Envelope keys checked in order for a wrapped item list
    envelope_keys: Vec<String>,
    /// Keys that make an unwrapped mapping a single item
    single_item_keys: Vec<String>,
    /// Whether batches of pages are normalized on the rayon pool
    run_in_parallel: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizerConfig {
    /// Creates a configuration with the default alias and envelope lists.
    #[must_use]
    pub fn new() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(field, keys)| (*field, keys.iter().map(|k| k.to_string()).collect()))
            .collect();

        Self {
            aliases,
            envelope_keys: DEFAULT_ENVELOPE_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            single_item_keys: DEFAULT_SINGLE_ITEM_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            run_in_parallel: false,
        }
    }

    /// Replaces the alias list of a field.
    pub fn set_aliases(&mut self, field: CanonicalField, aliases: Vec<String>) -> &mut Self {
        self.aliases.insert(field, aliases);
        self
    }

    /// Replaces the ordered envelope key list.
    pub fn set_envelope_keys(&mut self, keys: Vec<String>) -> &mut Self {
        self.envelope_keys = keys;
        self
    }

    /// Replaces the keys used for single-item detection.
    pub fn set_single_item_keys(&mut self, keys: Vec<String>) -> &mut Self {
        self.single_item_keys = keys;
        self
    }

    /// Normalize page batches in parallel.
    ///
    /// Ignored unless the crate is built with the `parallel` feature.
    pub fn set_run_in_parallel(&mut self, run_in_parallel: bool) -> &mut Self {
        self.run_in_parallel = run_in_parallel;
        self
    }

    /// The alias list of a field, highest priority first.
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.aliases
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The envelope keys in preference order.
    pub fn envelope_keys(&self) -> &[String] {
        &self.envelope_keys
    }

    /// The keys that make an unwrapped mapping a single item.
    pub fn single_item_keys(&self) -> &[String] {
        &self.single_item_keys
    }

    /// Whether page batches run on the rayon pool.
    pub fn run_in_parallel(&self) -> bool {
        self.run_in_parallel
    }
}
