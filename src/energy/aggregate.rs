use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use getset::{CopyGetters, Getters};

use super::timeline::OrderedTable;
use super::PipelineError;

/// Calendar month; orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> YearMonth {
        YearMonth { year, month }
    }

    pub fn of(timestamp: &NaiveDateTime) -> YearMonth {
        YearMonth::new(timestamp.year(), timestamp.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct MonthlyRow {
    #[getset(get_copy = "pub")]
    month: YearMonth,
    #[getset(get = "pub")]
    sums: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct MonthlyAggregate {
    time_column: String,
    columns: Vec<String>,
    rows: Vec<MonthlyRow>,
}

impl MonthlyAggregate {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.rows.iter().map(|row| row.month)
    }

    pub fn sum(&self, month: YearMonth, column: &str) -> Option<f64> {
        let index = self.columns.iter().position(|name| name == column)?;
        self.rows
            .iter()
            .find(|row| row.month == month)
            .map(|row| row.sums[index])
    }

    /// Sums of one column, one entry per month.
    pub fn column_sums(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row.sums[index])
    }
}

/// Missing cells add nothing. Months without rows do not appear.
pub fn aggregate_monthly(table: &OrderedTable, columns: &[String]) -> Result<MonthlyAggregate, PipelineError> {
    let indices = table.selected_indices(columns)?;

    let mut groups: BTreeMap<YearMonth, Vec<f64>> = BTreeMap::new();
    for (position, timestamp) in table.timestamps().iter().enumerate() {
        let sums = groups
            .entry(YearMonth::of(timestamp))
            .or_insert_with(|| vec![0.0; indices.len()]);

        for (sum, &index) in sums.iter_mut().zip(&indices) {
            if let Some(value) = super::schema::parse_number(&table.rows()[position][index]) {
                *sum += value;
            }
        }
    }

    Ok(MonthlyAggregate {
        time_column: table.time_column().clone(),
        columns: columns.to_vec(),
        rows: groups
            .into_iter()
            .map(|(month, sums)| MonthlyRow { month, sums })
            .collect(),
    })
}
