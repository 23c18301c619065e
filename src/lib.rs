//! Normalization and deduplication of race-event listings.
//!
//! `racereg` takes event listings fetched from independent timing-platform
//! backends, whose payloads share no schema, and turns them into one canonical
//! record type that can be deduplicated across providers and years.
//!
//! # Key Features
//!
//! - **Shape-tolerant normalization**: payloads may be a bare list of items,
//!   a list wrapped under an envelope key (`events`, `data`, `results`, ...),
//!   or a single item at the top level.
//! - **Alias-based field mapping**: each canonical field is filled from the
//!   first matching key of a priority-ordered alias list covering snake_case,
//!   camelCase and PascalCase spellings.
//! - **Auditable deduplication**: records are partitioned into unique and
//!   duplicate sets on a normalized (name, year) key, first occurrence wins.
//! - **Rendered DOM fallback** (feature `dom`): `<option>` elements of a
//!   results page become records when no API payload is available.
//! - **Tabular I/O** (feature `csv`): the fixed eight-column registry table.
//!
//! # Basic Usage
//!
//! ```rust
//! use racereg::normalize;
//! use serde_json::json;
//!
//! let payload = json!({
//!     "events": [
//!         {"EventName": "Goa River Marathon", "EventDate": "2024-09-01", "total_runners": 1500}
//!     ]
//! });
//!
//! let records = normalize(&payload, "STS", "https://x/y");
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].race_name, "Goa River Marathon");
//! assert_eq!(records[0].participant_count, "1500");
//! assert_eq!(records[0].city, "");
//! ```
//!
//! # Deduplication
//!
//! ```rust
//! use racereg::{dedup, normalize};
//! use serde_json::json;
//!
//! let mut records = normalize(&json!([{"name": "Pune Half Marathon", "date": "2024-02-18"}]), "STS", "");
//! records.extend(normalize(&json!([{"title": "pune half marathon", "start_date": "2024-02-18"}]), "iFinish", ""));
//!
//! let (unique, duplicates) = dedup(records);
//! assert_eq!(unique[0].timing_company, "STS");
//! assert_eq!(duplicates[0].timing_company, "iFinish");
//! ```
//!
//! # Error Handling
//!
//! Normalization and deduplication never fail: malformed items are skipped
//! and unknown payload shapes produce no records. Only the outer operations
//! (parsing JSON text, reading and writing tables) return the crate's
//! [`Result`] type wrapping [`RegistryError`].
//!
//! # Thread Safety
//!
//! All normalizers and the deduplicator are plain data and can be shared
//! between threads. With the `parallel` feature, [`Normalizer::normalize_pages`]
//! can spread a batch of pages over the rayon thread pool.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[cfg(feature = "csv")]
extern crate csv as csv_crate;

#[cfg(feature = "csv")]
pub mod csv;
pub mod dedupe;
#[cfg(feature = "dom")]
pub mod dom;
pub mod normalize;
mod utils;

// Reexports
pub use dedupe::{DedupOutcome, Deduplicator, DeduplicatorConfig, dedup};
#[cfg(feature = "dom")]
pub use dom::OptionNormalizer;
pub use normalize::{Normalizer, NormalizerConfig, Page, normalize};

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised by the fallible edges of the crate.
///
/// Payload shape problems are never errors; see the crate docs.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),
}

#[cfg(feature = "csv")]
impl From<csv_crate::Error> for RegistryError {
    fn from(err: csv_crate::Error) -> Self {
        RegistryError::Csv(err.to_string())
    }
}

/// One race event in the canonical registry schema.
///
/// Every content field is a string; an empty string means the source did not
/// provide the value. Records emitted by a normalizer always carry a
/// non-empty `race_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceRecord {
    /// Official race name
    pub race_name: String,
    /// Race date as published, ISO `YYYY-MM-DD` when the source uses it
    pub race_date: String,
    /// City or venue
    pub city: String,
    /// Distance categories (5K, 10K, 21K, FM, ...)
    pub distances: String,
    /// Finisher or registration count
    pub participant_count: String,
    /// The platform's own identifier for the event
    pub event_id: String,
    /// Timing company the record was fetched from
    pub timing_company: String,
    /// URL of the response the record came from
    pub source_url: String,
    /// Year attached by the caller, used when `race_date` carries no year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl RaceRecord {
    /// Attaches the year the listing was fetched for.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// Where a batch of records came from.
///
/// Both values are copied verbatim onto every record a normalizer emits and
/// are never inferred from item content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub timing_company: String,
    pub source_url: String,
}

impl Provenance {
    /// Builds a provenance from any displayable label and URL.
    pub fn new(timing_company: impl fmt::Display, source_url: impl fmt::Display) -> Self {
        Self {
            timing_company: timing_company.to_string(),
            source_url: source_url.to_string(),
        }
    }
}

/// A unique record together with the records folded into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The first record seen for the key
    pub unique: RaceRecord,
    /// Later records sharing the key, in input order
    pub duplicates: Vec<RaceRecord>,
}

/// Trait for turning one fetched payload into canonical records.
pub trait PayloadNormalizer {
    /// The raw input this normalizer understands.
    type Payload: ?Sized;

    /// Normalize a payload into records.
    ///
    /// # Arguments
    ///
    /// * `payload` - The fetched response body
    /// * `provenance` - Timing company and URL stamped on every record
    ///
    /// Items that cannot be mapped are skipped, so the result may be empty.
    fn normalize_payload(&self, payload: &Self::Payload, provenance: &Provenance)
    -> Vec<RaceRecord>;
}
