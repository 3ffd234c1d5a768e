use std::io::{Cursor, Write};

use chrono::NaiveDateTime;
use getset::{CopyGetters, Getters};
use log::info;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use super::aggregate::{aggregate_monthly, MonthlyAggregate};
use super::chart::{build_line_series, monthly_chart, ChartSpec};
use super::columns::{detect_time_column, select_numeric_columns, NumericFilter};
use super::timeline::{coerce_and_sort, OrderedTable, TIMESTAMP_FORMAT};
use super::PipelineError;
use crate::data::{export_csv, RawTable};

pub const DEFAULT_SELECTION_LEN: usize = 5;
pub const CSV_FILE_NAME: &str = "date.csv";
pub const BUNDLE_FILE_NAME: &str = "grafice.zip";
pub const TIME_SERIES_PAGE: &str = "serii_temporale.html";
pub const MONTHLY_PAGE: &str = "agregare_lunara.html";

/// A downloadable output.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Artifact {
    file_name: String,
    bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Artifact {
        Artifact {
            file_name: file_name.to_string(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct Metadata {
    #[getset(get = "pub")]
    time_column: String,
    #[getset(get_copy = "pub")]
    row_count: usize,
    #[getset(get_copy = "pub")]
    column_count: usize,
    #[getset(get_copy = "pub")]
    first: NaiveDateTime,
    #[getset(get_copy = "pub")]
    last: NaiveDateTime,
    #[getset(get = "pub")]
    numeric_columns: Vec<String>,
    #[getset(get = "pub")]
    default_selection: Vec<String>,
}

impl Metadata {
    pub fn summary(&self) -> String {
        format!(
            "Rânduri: {} | Coloane: {} | Timp: {} | Interval: {} → {}",
            self.row_count,
            self.column_count,
            self.time_column,
            self.first.format(TIMESTAMP_FORMAT),
            self.last.format(TIMESTAMP_FORMAT)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Plots {
    time_series: ChartSpec,
    monthly: MonthlyAggregate,
    monthly_chart: ChartSpec,
    csv: Artifact,
    bundle: Artifact,
}

fn prepare(table: &RawTable) -> Result<OrderedTable, PipelineError> {
    let time_column = detect_time_column(table).ok_or(PipelineError::NoTimeColumn)?;
    let ordered = coerce_and_sort(table, &time_column);
    if ordered.is_empty() {
        return Err(PipelineError::NoValidRows);
    }

    info!(
        "time column {}, kept {} rows, dropped {}",
        time_column,
        ordered.len(),
        ordered.dropped()
    );

    Ok(ordered)
}

/// Table overview and the columns offered for selection.
pub fn describe(table: &RawTable, filter: NumericFilter) -> Result<Metadata, PipelineError> {
    let ordered = prepare(table)?;
    let numeric_columns = select_numeric_columns(ordered.schema(), ordered.time_column(), filter);
    if numeric_columns.is_empty() {
        return Err(PipelineError::NoNumericColumns);
    }

    let (first, last) = match (ordered.first(), ordered.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(PipelineError::NoValidRows),
    };

    Ok(Metadata {
        time_column: ordered.time_column().clone(),
        row_count: ordered.len(),
        column_count: ordered.column_count(),
        first,
        last,
        default_selection: numeric_columns.iter().take(DEFAULT_SELECTION_LEN).cloned().collect(),
        numeric_columns,
    })
}

/// Charts and downloads for the selected columns.
pub fn make_plots(table: &RawTable, selection: &[String]) -> Result<Plots, PipelineError> {
    let ordered = prepare(table)?;

    let time_series = build_line_series(&ordered, selection)?;
    let monthly = aggregate_monthly(&ordered, selection)?;
    let monthly_chart = monthly_chart(&monthly);

    let csv = Artifact::new(CSV_FILE_NAME, export_csv(&ordered, selection)?);
    let bundle = Artifact::new(
        BUNDLE_FILE_NAME,
        bundle_charts(&[(TIME_SERIES_PAGE, &time_series), (MONTHLY_PAGE, &monthly_chart)])?,
    );

    Ok(Plots {
        time_series,
        monthly,
        monthly_chart,
        csv,
        bundle,
    })
}

/// Deflated zip with one HTML page per chart.
pub fn bundle_charts(charts: &[(&str, &ChartSpec)]) -> Result<Vec<u8>, PipelineError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (file_name, chart) in charts {
        zip.start_file(*file_name, options)?;
        zip.write_all(chart.render_html()?.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}
