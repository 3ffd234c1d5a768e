use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use getset::{CopyGetters, Getters};
use log::debug;

use super::schema::{infer_schema, parse_number, Schema};
use super::PipelineError;
use crate::data::RawTable;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// Month-first before day-first for slashed dates.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y", "%d/%m/%Y"];

/// Coerces a cell to a timestamp. Offsets are dropped and the wall time kept.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .or_else(|| parse_year_month(value))
}

fn parse_year_month(value: &str) -> Option<NaiveDateTime> {
    let (year, month) = value.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1).map(|date| date.and_time(NaiveTime::MIN))
}

/// Date-only output when every timestamp sits at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    Date,
    DateTime,
}

impl TimestampStyle {
    pub fn for_timestamps(timestamps: &[NaiveDateTime]) -> TimestampStyle {
        if timestamps.iter().all(|timestamp| timestamp.time() == NaiveTime::MIN) {
            TimestampStyle::Date
        } else {
            TimestampStyle::DateTime
        }
    }

    pub fn format(&self, timestamp: &NaiveDateTime) -> String {
        match self {
            TimestampStyle::Date => timestamp.format(DATE_FORMAT).to_string(),
            TimestampStyle::DateTime => timestamp.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Rows with a valid timestamp, sorted ascending by it.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct OrderedTable {
    #[getset(get = "pub")]
    time_column: String,
    #[getset(get = "pub")]
    headers: Vec<String>,
    #[getset(get = "pub")]
    schema: Schema,
    #[getset(get = "pub")]
    timestamps: Vec<NaiveDateTime>,
    #[getset(get = "pub")]
    rows: Vec<Vec<String>>,
    #[getset(get_copy = "pub")]
    dropped: usize,
}

impl OrderedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&NaiveDateTime> {
        self.timestamps.first()
    }

    pub fn last(&self) -> Option<&NaiveDateTime> {
        self.timestamps.last()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn timestamp_style(&self) -> TimestampStyle {
        TimestampStyle::for_timestamps(&self.timestamps)
    }

    /// Resolves a selection to column positions. Every selected column must be numeric.
    pub fn selected_indices(&self, columns: &[String]) -> Result<Vec<usize>, PipelineError> {
        if columns.is_empty() {
            return Err(PipelineError::EmptySelection);
        }

        columns
            .iter()
            .map(|name| {
                if name == &self.time_column || !self.schema.is_numeric(name) {
                    return Err(PipelineError::NotNumeric(name.clone()));
                }

                self.headers
                    .iter()
                    .position(|header| header == name)
                    .ok_or_else(|| PipelineError::NotNumeric(name.clone()))
            })
            .collect()
    }

    pub fn numeric_values(&self, index: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.rows.iter().map(move |row| parse_number(&row[index]))
    }
}

pub fn coerce_and_sort(table: &RawTable, time_column: &str) -> OrderedTable {
    let mut timed: Vec<(NaiveDateTime, Vec<String>)> = match table.column_index(time_column) {
        Some(index) => table
            .rows()
            .iter()
            .filter_map(|row| match parse_timestamp(&row[index]) {
                Some(timestamp) => Some((timestamp, row.clone())),
                None => {
                    debug!("dropping row with invalid timestamp, value={:?}", row[index]);
                    None
                },
            })
            .collect(),
        None => {
            debug!("time column {} not found, dropping all rows", time_column);
            Vec::new()
        },
    };

    // Stable, so rows sharing a timestamp keep their input order.
    timed.sort_by_key(|(timestamp, _)| *timestamp);

    let dropped = table.row_count() - timed.len();
    let (timestamps, rows): (Vec<_>, Vec<_>) = timed.into_iter().unzip();

    OrderedTable {
        time_column: time_column.to_string(),
        headers: table.headers().clone(),
        schema: infer_schema(table),
        timestamps,
        rows,
        dropped,
    }
}
