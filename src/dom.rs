//! Records from rendered results pages.
//!
//! Some providers only expose their race list through `<select>` pickers on a
//! rendered page. Each `<option>` whose text looks like a race name becomes a
//! record: the text is the race name and the option's `value` attribute, which
//! these pages use for the event date or slug, goes into `race_date`. Options
//! that are too short or purely numeric (year pickers) are skipped.
//!
//! # Example
//!
//! ```
//! use racereg::Provenance;
//! use racereg::dom::normalize_options;
//!
//! let html = r#"
//!     <select id="year"><option value="2024">2024</option></select>
//!     <select id="race">
//!         <option value="">All</option>
//!         <option value="2024-10-20">Bengaluru Marathon</option>
//!     </select>
//! "#;
//!
//! let records = normalize_options(html, &Provenance::new("STS", "https://example.com/results"));
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].race_name, "Bengaluru Marathon");
//! assert_eq!(records[0].race_date, "2024-10-20");
//! ```

use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::utils::collapse_whitespace;
use crate::{PayloadNormalizer, Provenance, RaceRecord};

/// Option texts shorter than this are placeholders ("All", "--") rather than races.
const MIN_RACE_NAME_LEN: usize = 6;

static OPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("option").unwrap());

/// Normalizer for rendered HTML pages.
#[derive(Debug, Clone, Default)]
pub struct OptionNormalizer;

impl OptionNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PayloadNormalizer for OptionNormalizer {
    type Payload = str;

    fn normalize_payload(&self, html: &str, provenance: &Provenance) -> Vec<RaceRecord> {
        let document = Html::parse_document(html);

        let records: Vec<RaceRecord> = document
            .select(&OPTION_SELECTOR)
            .filter_map(|option| {
                let text = collapse_whitespace(&option.text().collect::<String>());
                if !is_race_option(&text) {
                    return None;
                }

                Some(RaceRecord {
                    race_name: text,
                    race_date: option.value().attr("value").unwrap_or_default().trim().to_string(),
                    timing_company: provenance.timing_company.clone(),
                    source_url: provenance.source_url.clone(),
                    ..Default::default()
                })
            })
            .collect();

        debug!(
            timing_company = %provenance.timing_company,
            records = records.len(),
            "normalized page options"
        );
        records
    }
}

fn is_race_option(text: &str) -> bool {
    text.chars().count() >= MIN_RACE_NAME_LEN && !text.chars().all(char::is_numeric)
}

/// Extracts records from the `<option>` elements of a rendered page.
pub fn normalize_options(html: &str, provenance: &Provenance) -> Vec<RaceRecord> {
    OptionNormalizer::new().normalize_payload(html, provenance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedupe::{Deduplicator, DeduplicatorConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_race_option() {
        assert!(is_race_option("Goa River Marathon"));
        assert!(is_race_option("Run 10"));
        assert!(!is_race_option("All"));
        assert!(!is_race_option("Run 5"));
        assert!(!is_race_option("2024"));
        assert!(!is_race_option("20242025"));
        assert!(!is_race_option(""));
    }

    #[test]
    fn test_options_become_records() {
        let html = r#"
            <html><body>
            <select name="event">
                <option>  Hyderabad   10K 2023 </option>
                <option value="chennai-trail">Chennai Trail Run</option>
                <option value="2019">2019</option>
            </select>
            </body></html>
        "#;
        let provenance = Provenance::new("iFinish", "https://ifinish.in/eventresult");

        let records = normalize_options(html, &provenance);
        assert_eq!(
            records,
            vec![
                RaceRecord {
                    race_name: "Hyderabad 10K 2023".to_string(),
                    timing_company: "iFinish".to_string(),
                    source_url: "https://ifinish.in/eventresult".to_string(),
                    ..Default::default()
                },
                RaceRecord {
                    race_name: "Chennai Trail Run".to_string(),
                    race_date: "chennai-trail".to_string(),
                    timing_company: "iFinish".to_string(),
                    source_url: "https://ifinish.in/eventresult".to_string(),
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn test_page_without_options() {
        let provenance = Provenance::new("STS", "");
        assert!(normalize_options("<p>No results</p>", &provenance).is_empty());
        assert!(normalize_options("", &provenance).is_empty());
    }

    #[test]
    fn test_repeated_options_fold_by_name() {
        // the same race listed under two year pickers
        let html = r#"
            <select><option value="2023">Delhi Half Marathon</option></select>
            <select><option value="2024">delhi half marathon</option></select>
        "#;
        let records = normalize_options(html, &Provenance::new("STS", ""));

        let config = DeduplicatorConfig {
            group_by_year: false,
            ..Default::default()
        };
        let outcome = Deduplicator::new().with_config(config).partition(records);
        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.unique[0].race_date, "2023");
    }
}
