//! Race record deduplicator implementation.
//!
//! Partitions canonical records into unique and duplicate sets on a coarse,
//! deterministic key: the normalized race name plus the race year. Records
//! fetched from several timing companies, or from overlapping year queries of
//! one company, collapse onto the first record seen for each key.
//!
//! ## Usage
//!
//! ### Basic Deduplication
//!
//! ```rust
//! use racereg::{RaceRecord, dedup};
//!
//! let records = vec![
//!     RaceRecord {
//!         race_name: "Bengaluru Marathon".to_string(),
//!         race_date: "2024-10-20".to_string(),
//!         timing_company: "STS".to_string(),
//!         ..Default::default()
//!     },
//!     RaceRecord {
//!         race_name: "BENGALURU MARATHON ".to_string(),
//!         race_date: "2024-10-20".to_string(),
//!         timing_company: "iFinish".to_string(),
//!         ..Default::default()
//!     },
//! ];
//!
//! let (unique, duplicates) = dedup(records);
//! assert_eq!(unique.len(), 1);
//! assert_eq!(duplicates[0].timing_company, "iFinish");
//! ```
//!
//! ### Preferring a source
//!
//! The first record always wins. To prefer one provider's records, order the
//! input accordingly before deduplicating:
//!
//! ```rust
//! use racereg::{RaceRecord, dedup};
//!
//! let mut records = vec![
//!     RaceRecord { race_name: "Goa Marathon".into(), timing_company: "iFinish".into(), ..Default::default() },
//!     RaceRecord { race_name: "Goa Marathon".into(), timing_company: "STS".into(), ..Default::default() },
//! ];
//! records.sort_by_key(|r| r.timing_company != "STS");
//!
//! let (unique, _) = dedup(records);
//! assert_eq!(unique[0].timing_company, "STS");
//! ```
//!
//! ## Matching Criteria
//!
//! Two records are the same event when both key components are equal:
//!
//! 1. Name: lower-cased, trimmed, internal whitespace collapsed.
//! 2. Year: the leading four digits of `race_date`, else the record's `year`
//!    field, else empty.
//!
//! Records whose year cannot be determined share the empty year, so two
//! undated races with the same name are treated as one event.

use crate::utils::{collapse_whitespace, year_prefix};
use crate::{DuplicateGroup, RaceRecord};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, info};

static PUNCTUATION_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());

/// The identity of a race for deduplication purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    /// Normalized race name
    pub name: String,
    /// Four-digit year, or empty when unknown or not grouping by year
    pub year: String,
}

/// Configuration options for the deduplicator.
///
/// # Examples
///
/// ```
/// use racereg::dedupe::DeduplicatorConfig;
///
/// // combined registry pass: punctuation differences are ignored
/// let config = DeduplicatorConfig {
///     strip_punctuation: true,
///     ..Default::default()
/// };
/// assert!(config.group_by_year);
/// ```
#[derive(Debug, Clone)]
pub struct DeduplicatorConfig {
    /// Whether the year is part of the key. Without it, one listing page of
    /// a single provider can be deduplicated on name alone.
    pub group_by_year: bool,
    /// Whether characters other than letters, digits and whitespace are
    /// dropped from the name before comparing.
    pub strip_punctuation: bool,
}

impl Default for DeduplicatorConfig {
    fn default() -> Self {
        Self {
            group_by_year: true,
            strip_punctuation: false,
        }
    }
}

/// Unique and duplicate partitions of a record list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    /// First record seen for every key, in input order
    pub unique: Vec<RaceRecord>,
    /// Every later record sharing a key, in input order
    pub duplicates: Vec<RaceRecord>,
}

impl DedupOutcome {
    pub fn into_parts(self) -> (Vec<RaceRecord>, Vec<RaceRecord>) {
        (self.unique, self.duplicates)
    }
}

/// First-occurrence-wins deduplicator.
///
/// Runs a single left-to-right pass keeping the set of keys seen so far, so
/// it is linear in the number of records. It never compares record quality
/// and never modifies a record.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    config: DeduplicatorConfig,
}

impl Deduplicator {
    /// Creates a deduplicator keyed on normalized name and year.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a deduplicator with custom configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use racereg::dedupe::{Deduplicator, DeduplicatorConfig};
    ///
    /// let config = DeduplicatorConfig {
    ///     group_by_year: false,
    ///     strip_punctuation: false,
    /// };
    /// let deduplicator = Deduplicator::new().with_config(config);
    /// ```
    #[must_use]
    pub fn with_config(mut self, config: DeduplicatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Derives the dedup key of a record under this configuration.
    pub fn key_for(&self, record: &RaceRecord) -> DedupKey {
        let year = if self.config.group_by_year {
            record_year(record)
        } else {
            String::new()
        };

        DedupKey {
            name: self.normalize_name(&record.race_name),
            year,
        }
    }

    /// Splits records into unique and duplicate partitions.
    ///
    /// Every input record lands in exactly one partition and both keep the
    /// input order.
    pub fn partition<I>(&self, records: I) -> DedupOutcome
    where
        I: IntoIterator<Item = RaceRecord>,
    {
        let mut seen = HashSet::new();
        let mut outcome = DedupOutcome::default();

        for record in records {
            let key = self.key_for(&record);
            if seen.contains(&key) {
                debug!(
                    race_name = %record.race_name,
                    year = %key.year,
                    timing_company = %record.timing_company,
                    "duplicate record"
                );
                outcome.duplicates.push(record);
            } else {
                seen.insert(key);
                outcome.unique.push(record);
            }
        }

        info!(
            total = outcome.unique.len() + outcome.duplicates.len(),
            unique = outcome.unique.len(),
            duplicates = outcome.duplicates.len(),
            "deduplicated records"
        );
        outcome
    }

    /// Groups each unique record with the records folded into it.
    ///
    /// Groups follow the order in which their first record appears. Records
    /// without duplicates form groups with an empty `duplicates` list.
    pub fn find_duplicates(&self, records: &[RaceRecord]) -> Vec<DuplicateGroup> {
        let mut group_index: HashMap<DedupKey, usize> = HashMap::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();

        for record in records {
            let key = self.key_for(record);
            match group_index.get(&key) {
                Some(&idx) => groups[idx].duplicates.push(record.clone()),
                None => {
                    group_index.insert(key, groups.len());
                    groups.push(DuplicateGroup {
                        unique: record.clone(),
                        duplicates: Vec::new(),
                    });
                }
            }
        }

        groups
    }

    fn normalize_name(&self, name: &str) -> String {
        let lowered = name.to_lowercase();
        if self.config.strip_punctuation {
            collapse_whitespace(&PUNCTUATION_REGEX.replace_all(&lowered, ""))
        } else {
            collapse_whitespace(&lowered)
        }
    }
}

/// The year component of a record's dedup key.
///
/// Taken from the leading four digits of `race_date`, falling back to the
/// caller-attached `year`, else empty.
pub fn record_year(record: &RaceRecord) -> String {
    match year_prefix(&record.race_date) {
        Some(year) => year.to_string(),
        None => record.year.map(|y| y.to_string()).unwrap_or_default(),
    }
}

/// The dedup key of a record under the default configuration.
pub fn dedup_key(record: &RaceRecord) -> DedupKey {
    Deduplicator::new().key_for(record)
}

/// Splits records into `(unique, duplicates)` with the default configuration.
pub fn dedup<I>(records: I) -> (Vec<RaceRecord>, Vec<RaceRecord>)
where
    I: IntoIterator<Item = RaceRecord>,
{
    Deduplicator::new().partition(records).into_parts()
}
