//! Payload normalization.
//!
//! Turns a fetched payload of unknown shape into canonical [`RaceRecord`]s in
//! two independent stages: shape detection reduces the payload to a flat item
//! list, then every valid item is mapped field by field through ordered alias
//! lists.
//!
//! # Example
//!
//! ```
//! use racereg::{Normalizer, Provenance};
//! use serde_json::json;
//!
//! let payload = json!({
//!     "status": "ok",
//!     "events": [
//!         {"event_name": "Hyderabad 10K 2023", "event_date": "2023-12-03"},
//!         {"date": "2023-12-10"}
//!     ]
//! });
//!
//! let normalizer = Normalizer::new();
//! let records = normalizer.normalize(&payload, "iFinish", "https://ifinish.in/api");
//!
//! // the second item has no name and is dropped
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].race_date, "2023-12-03");
//! ```

mod aliases;
mod item;
mod shape;

use serde_json::Value;
use std::fmt;
use tracing::{debug, trace};

use crate::{PayloadNormalizer, Provenance, RaceRecord, Result};
use item::map_item;

pub use aliases::{CanonicalField, DEFAULT_ENVELOPE_KEYS, DEFAULT_SINGLE_ITEM_KEYS, NormalizerConfig};
pub use item::is_valid_item;
pub use shape::{PayloadShape, extract_items};

/// One fetched response together with where it came from.
///
/// Pages fetched by per-year queries can carry the queried year, which is
/// attached to every record of the page so undated races from different
/// years stay apart during deduplication.
#[derive(Debug, Clone)]
pub struct Page {
    pub payload: Value,
    pub provenance: Provenance,
    pub year: Option<i32>,
}

impl Page {
    pub fn new(payload: Value, provenance: Provenance) -> Self {
        Self {
            payload,
            provenance,
            year: None,
        }
    }

    /// Sets the year the page was queried for.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    fn stamp(&self, record: RaceRecord) -> RaceRecord {
        match (self.year, record.year) {
            (Some(year), None) => record.with_year(year),
            _ => record,
        }
    }
}

/// Normalizer for JSON payloads of any recognized shape.
///
/// Uses [`NormalizerConfig::new`] unless configured otherwise.
///
/// # Examples
///
/// With custom aliases:
/// ```
/// use racereg::{Normalizer, NormalizerConfig};
/// use racereg::normalize::CanonicalField;
/// use serde_json::json;
///
/// let mut config = NormalizerConfig::new();
/// config.set_aliases(CanonicalField::City, vec!["host_city".to_string()]);
///
/// let normalizer = Normalizer::new().with_config(config);
/// let records = normalizer.normalize(&json!([{"name": "Run", "host_city": "Pune"}]), "STS", "");
/// assert_eq!(records[0].city, "Pune");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Creates a normalizer with the default alias and envelope lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: NormalizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Lazily yields one record per valid item, in payload order.
    ///
    /// Non-mapping entries and items without a usable name are skipped.
    pub fn normalize_iter<'a>(
        &'a self,
        raw: &'a Value,
        provenance: &'a Provenance,
    ) -> impl Iterator<Item = RaceRecord> + 'a {
        let items = extract_items(raw, &self.config);
        debug!(
            timing_company = %provenance.timing_company,
            source_url = %provenance.source_url,
            items = items.len(),
            "extracted payload items"
        );

        items
            .into_iter()
            .filter(move |item| {
                let valid = is_valid_item(item, &self.config);
                if !valid {
                    trace!(
                        timing_company = %provenance.timing_company,
                        "skipping item without a usable name"
                    );
                }
                valid
            })
            .filter_map(Value::as_object)
            .map(move |item| map_item(item, &self.config, provenance))
    }

    /// Normalizes a payload into records.
    ///
    /// # Arguments
    ///
    /// * `raw` - Parsed payload: a list, an enveloped list, a single item, or anything else
    /// * `source` - Timing company label stamped on every record
    /// * `source_url` - URL stamped on every record
    ///
    /// Never fails: an unrecognized payload yields an empty list.
    pub fn normalize(
        &self,
        raw: &Value,
        source: impl fmt::Display,
        source_url: impl fmt::Display,
    ) -> Vec<RaceRecord> {
        let provenance = Provenance::new(source, source_url);
        self.normalize_payload(raw, &provenance)
    }

    /// Parses JSON text and normalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Json`](crate::RegistryError::Json) if the text
    /// is not JSON. A JSON document of unexpected shape is not an error.
    pub fn normalize_json(
        &self,
        text: &str,
        source: impl fmt::Display,
        source_url: impl fmt::Display,
    ) -> Result<Vec<RaceRecord>> {
        let raw: Value = serde_json::from_str(text)?;
        Ok(self.normalize(&raw, source, source_url))
    }

    /// Normalizes a batch of pages, concatenating records in page order.
    ///
    /// With the `parallel` feature and
    /// [`NormalizerConfig::set_run_in_parallel`], pages are processed on the
    /// rayon pool; the output order is the same either way.
    pub fn normalize_pages(&self, pages: &[Page]) -> Vec<RaceRecord> {
        #[cfg(feature = "parallel")]
        {
            if self.config.run_in_parallel() {
                use rayon::prelude::*;

                let per_page: Vec<Vec<RaceRecord>> = pages
                    .par_iter()
                    .map(|page| {
                        self.normalize_iter(&page.payload, &page.provenance)
                            .map(|record| page.stamp(record))
                            .collect()
                    })
                    .collect();

                return per_page.into_iter().flatten().collect();
            }
        }

        pages
            .iter()
            .flat_map(|page| {
                self.normalize_iter(&page.payload, &page.provenance)
                    .map(move |record| page.stamp(record))
            })
            .collect()
    }
}

impl PayloadNormalizer for Normalizer {
    type Payload = Value;

    fn normalize_payload(&self, payload: &Value, provenance: &Provenance) -> Vec<RaceRecord> {
        let records: Vec<RaceRecord> = self.normalize_iter(payload, provenance).collect();
        debug!(
            timing_company = %provenance.timing_company,
            records = records.len(),
            "normalized payload"
        );
        records
    }
}

/// Normalizes a payload with the default configuration.
///
/// Shorthand for `Normalizer::new().normalize(raw, source, source_url)`.
pub fn normalize(
    raw: &Value,
    source: impl fmt::Display,
    source_url: impl fmt::Display,
) -> Vec<RaceRecord> {
    Normalizer::new().normalize(raw, source, source_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_list_at_root() {
        let raw = json!([
            {"name": "Bengaluru Marathon 2024", "date": "2024-10-20", "city": "Bengaluru"},
            {"name": "Mumbai Half Marathon 2024", "date": "2024-01-15", "city": "Mumbai"}
        ]);
        let records = normalize(&raw, "STS", "https://example.com/api");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].race_name, "Bengaluru Marathon 2024");
        assert_eq!(records[0].race_date, "2024-10-20");
        assert_eq!(records[0].timing_company, "STS");
        assert_eq!(records[1].city, "Mumbai");
    }

    #[test]
    fn test_nested_under_data_key() {
        let raw = json!({
            "data": [{"title": "Pune Half Marathon", "start_date": "2024-02-18", "location": "Pune"}]
        });
        let records = normalize(&raw, "STS", "https://example.com");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].race_name, "Pune Half Marathon");
        assert_eq!(records[0].city, "Pune");
    }

    #[test]
    fn test_single_event_dict() {
        let raw = json!({"event_name": "Chennai Trail Run", "race_date": "2024-03-10"});
        let records = normalize(&raw, "MySamay", "https://example.com");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].race_name, "Chennai Trail Run");
    }

    #[test]
    fn test_single_dict_with_blank_name_is_dropped() {
        let raw = json!({"name": "", "date": "2024-03-10"});
        assert!(normalize(&raw, "STS", "").is_empty());
    }

    #[test]
    fn test_nested_event_object_is_not_a_single_item() {
        let raw = json!({"status": "ok", "event": {"name": "Goa Marathon", "date": "2024-09-01"}});
        assert!(normalize(&raw, "STS", "").is_empty());
    }

    #[test]
    fn test_empty_payloads() {
        assert!(normalize(&json!({}), "STS", "").is_empty());
        assert!(normalize(&json!([]), "STS", "").is_empty());
        assert!(normalize(&Value::Null, "STS", "").is_empty());
        assert!(normalize(&json!("not a payload"), "STS", "").is_empty());
    }

    #[test]
    fn test_skips_items_without_name_and_non_mappings() {
        let raw = json!([
            {"date": "2024-01-01", "city": "Delhi"},
            "Delhi Half",
            null,
            {"name": "Delhi Marathon", "date": "2024-01-01"},
            [{"name": "nested list"}],
            {"name": "Noida 10K"}
        ]);
        let names: Vec<String> = normalize(&raw, "STS", "")
            .into_iter()
            .map(|r| r.race_name)
            .collect();
        assert_eq!(names, vec!["Delhi Marathon", "Noida 10K"]);
    }

    #[test]
    fn test_key_fallbacks() {
        let camel = normalize(
            &json!([{"eventName": "Jaipur Marathon", "eventDate": "2024-11-24"}]),
            "iFinish",
            "",
        );
        assert_eq!(camel[0].race_name, "Jaipur Marathon");
        assert_eq!(camel[0].race_date, "2024-11-24");

        let pascal = normalize(
            &json!([{"EventName": "Kolkata Run", "EventDate": "2024-06-02", "City": "Kolkata", "Id": "k-7"}]),
            "STS",
            "",
        );
        assert_eq!(pascal[0].race_name, "Kolkata Run");
        assert_eq!(pascal[0].city, "Kolkata");
        assert_eq!(pascal[0].event_id, "k-7");
    }

    #[test]
    fn test_numeric_values_are_stringified() {
        let records = normalize(
            &json!([{"name": "Goa Marathon", "total_runners": 3200, "id": 17}]),
            "STS",
            "",
        );
        assert_eq!(records[0].participant_count, "3200");
        assert_eq!(records[0].event_id, "17");
    }

    #[test]
    fn test_distances_extracted() {
        let records = normalize(
            &json!([{"name": "Ahmedabad Marathon", "categories": "5K, 10K, 21K, FM"}]),
            "STS",
            "",
        );
        assert_eq!(records[0].distances, "5K, 10K, 21K, FM");
    }

    #[test]
    fn test_source_url_preserved() {
        let url = "https://sportstimingsolutions.in/api/events?year=2024";
        let records = normalize(&json!([{"name": "Test Race"}]), "STS", url);
        assert_eq!(records[0].source_url, url);
    }

    #[test]
    fn test_end_to_end_enveloped_payload() {
        let raw = json!({
            "events": [{"EventName": "Goa River Marathon", "EventDate": "2024-09-01", "total_runners": 1500}]
        });
        let records = normalize(&raw, "STS", "https://x/y");
        assert_eq!(
            records,
            vec![RaceRecord {
                race_name: "Goa River Marathon".to_string(),
                race_date: "2024-09-01".to_string(),
                city: String::new(),
                distances: String::new(),
                participant_count: "1500".to_string(),
                event_id: String::new(),
                timing_company: "STS".to_string(),
                source_url: "https://x/y".to_string(),
                year: None,
            }]
        );
    }

    #[test]
    fn test_shape_invariance() {
        let item = json!({"race_name": "Chennai Trail Run", "date": "2024-03-10", "venue": "Guindy"});

        let from_list = normalize(&json!([item.clone()]), "STS", "u");
        let from_envelope = normalize(&json!({"races": [item.clone()]}), "STS", "u");
        let from_single = normalize(&item, "STS", "u");

        assert_eq!(from_list.len(), 1);
        assert_eq!(from_list, from_envelope);
        assert_eq!(from_list, from_single);
    }

    #[test]
    fn test_renormalizing_canonical_records_is_stable() {
        let raw = json!([
            {"EventName": "Kolkata Run", "EventDate": "2024-06-02", "City": "Kolkata", "count": 800},
            {"title": "Pune Half", "race_categories": ["HM", "10K"], "EventId": "p-1"}
        ]);
        let first = normalize(&raw, "STS", "https://x/y");

        let as_list = serde_json::to_value(&first).unwrap();
        assert_eq!(normalize(&as_list, "STS", "https://x/y"), first);

        for record in &first {
            let single = serde_json::to_value(record).unwrap();
            assert_eq!(normalize(&single, "STS", "https://x/y"), vec![record.clone()]);
        }
    }

    #[test]
    fn test_normalize_json() {
        let normalizer = Normalizer::new();
        let records = normalizer
            .normalize_json(r#"{"results": [{"name": "Surat Night Run"}]}"#, "STS", "")
            .unwrap();
        assert_eq!(records[0].race_name, "Surat Night Run");

        let err = normalizer.normalize_json("<html>", "STS", "").unwrap_err();
        assert!(matches!(err, crate::RegistryError::Json(_)));
    }

    #[test]
    fn test_normalize_iter_is_lazy_and_ordered() {
        let raw = json!([{"name": "A"}, {"name": "B"}, {"name": "C"}]);
        let provenance = Provenance::new("STS", "");
        let normalizer = Normalizer::new();

        let mut iter = normalizer.normalize_iter(&raw, &provenance);
        assert_eq!(iter.next().unwrap().race_name, "A");
        assert_eq!(iter.next().unwrap().race_name, "B");
        assert_eq!(iter.next().unwrap().race_name, "C");
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_normalize_pages_keeps_page_order() {
        let pages = vec![
            Page::new(
                json!({"events": [{"name": "A"}, {"name": "B"}]}),
                Provenance::new("STS", "https://sts/api?year=2023"),
            ),
            Page::new(json!({"status": "empty"}), Provenance::new("STS", "https://sts/api?year=2024")),
            Page::new(
                json!([{"eventName": "C"}]),
                Provenance::new("iFinish", "https://ifinish/api?year=2024"),
            ),
        ];

        let mut config = NormalizerConfig::new();
        config.set_run_in_parallel(true);

        for normalizer in [Normalizer::new(), Normalizer::new().with_config(config)] {
            let records = normalizer.normalize_pages(&pages);
            let summary: Vec<(&str, &str)> = records
                .iter()
                .map(|r| (r.race_name.as_str(), r.timing_company.as_str()))
                .collect();
            assert_eq!(summary, vec![("A", "STS"), ("B", "STS"), ("C", "iFinish")]);
            assert_eq!(records[1].source_url, "https://sts/api?year=2023");
        }
    }

    #[test]
    fn test_normalize_pages_attaches_queried_year() {
        let pages = vec![
            Page::new(
                json!([{"name": "Monsoon Trail"}]),
                Provenance::new("STS", "https://sts/api?year=2022"),
            )
            .with_year(2022),
            Page::new(
                json!([{"name": "Monsoon Trail"}]),
                Provenance::new("STS", "https://sts/api?year=2023"),
            )
            .with_year(2023),
            Page::new(json!([{"name": "Monsoon Trail"}]), Provenance::new("STS", "")),
        ];

        let mut config = NormalizerConfig::new();
        config.set_run_in_parallel(true);

        for normalizer in [Normalizer::new(), Normalizer::new().with_config(config)] {
            let records = normalizer.normalize_pages(&pages);
            let years: Vec<Option<i32>> = records.iter().map(|r| r.year).collect();
            assert_eq!(years, vec![Some(2022), Some(2023), None]);

            let (unique, duplicates) = crate::dedup(records);
            assert_eq!(unique.len(), 3);
            assert!(duplicates.is_empty());
        }
    }
}
