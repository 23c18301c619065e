//! Registry table reading and writing.
//!
//! The registry is exchanged as a fixed eight-column table. Writing always
//! produces the columns in [`COLUMNS`] order; reading matches columns by
//! header name, so tables with extra or reordered columns load as well.
//!
//! # Example
//!
//! ```
//! use racereg::csv::{read_records, write_records};
//! use racereg::RaceRecord;
//!
//! let records = vec![RaceRecord {
//!     race_name: "Pune Half Marathon".to_string(),
//!     race_date: "2024-02-18".to_string(),
//!     timing_company: "STS".to_string(),
//!     ..Default::default()
//! }];
//!
//! let mut buffer = Vec::new();
//! write_records(&mut buffer, &records).unwrap();
//!
//! let table = String::from_utf8(buffer.clone()).unwrap();
//! assert!(table.starts_with("race_name,race_date,city,distances,participant_count,timing_company,source_url,event_id"));
//!
//! let loaded = read_records(buffer.as_slice()).unwrap();
//! assert_eq!(loaded, records);
//! ```

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::io::{Read, Write};
use tracing::debug;

use crate::{RaceRecord, Result};

/// Column order of the registry table.
pub const COLUMNS: [&str; 8] = [
    "race_name",
    "race_date",
    "city",
    "distances",
    "participant_count",
    "timing_company",
    "source_url",
    "event_id",
];

/// Configuration for reading and writing registry tables.
///
/// # Examples
///
/// ```
/// use racereg::csv::CsvConfig;
///
/// let mut config = CsvConfig::new();
/// config.set_delimiter(b'\t').set_has_header(false);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Delimiter to use for the table
    delimiter: u8,
    /// Whether the table has a header row
    has_header: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvConfig {
    /// Creates a comma-delimited configuration with a header row.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }

    /// Sets the delimiter character
    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether the table has a header row.
    ///
    /// Headerless tables are read and written in [`COLUMNS`] order.
    pub fn set_has_header(&mut self, has_header: bool) -> &mut Self {
        self.has_header = has_header;
        self
    }
}

/// Reader and writer for the registry table.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    config: CsvConfig,
}

impl CsvTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table handler with custom configuration
    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Writes records in [`COLUMNS`] order.
    ///
    /// The `year` convenience field is not part of the table and is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_records<W: Write>(&self, writer: W, records: &[RaceRecord]) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.config.delimiter)
            .from_writer(writer);

        if self.config.has_header {
            writer.write_record(COLUMNS)?;
        }
        for record in records {
            writer.write_record(row(record))?;
        }
        writer.flush()?;

        debug!(records = records.len(), "wrote registry table");
        Ok(())
    }

    /// Reads records from a registry table.
    ///
    /// Columns are matched by header name; unknown columns are ignored and
    /// missing ones stay empty. A `year` column fills the convenience field.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a readable table or a `year`
    /// value is not an integer.
    pub fn read_records<R: Read>(&self, reader: R) -> Result<Vec<RaceRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(self.config.has_header)
            .flexible(true)
            .from_reader(reader);

        let headers = if self.config.has_header {
            reader.headers()?.clone()
        } else {
            StringRecord::from(COLUMNS.to_vec())
        };

        let mut records = Vec::new();
        for result in reader.records() {
            let raw = result?;
            records.push(raw.deserialize::<RaceRecord>(Some(&headers))?);
        }

        debug!(records = records.len(), "read registry table");
        Ok(records)
    }
}

fn row(record: &RaceRecord) -> [&str; 8] {
    [
        record.race_name.as_str(),
        record.race_date.as_str(),
        record.city.as_str(),
        record.distances.as_str(),
        record.participant_count.as_str(),
        record.timing_company.as_str(),
        record.source_url.as_str(),
        record.event_id.as_str(),
    ]
}

/// Writes records with the default configuration.
pub fn write_records<W: Write>(writer: W, records: &[RaceRecord]) -> Result<()> {
    CsvTable::new().write_records(writer, records)
}

/// Reads records with the default configuration.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RaceRecord>> {
    CsvTable::new().read_records(reader)
}
