use enum_dispatch::enum_dispatch;
use log::debug;

use super::schema::Schema;
use super::ColumnMatcher;
use crate::data::RawTable;

pub const TIME_COLUMN_NAMES: &[&str] = &["datetime", "date", "timestamp", "time", "ora", "data"];
pub const TIME_COLUMN_TOKENS: &[&str] = &["date", "time", "ora", "data"];

/// English and Romanian spellings of the generation sources.
pub const ENERGY_SOURCE_TOKENS: &[&str] = &[
    "solar", "fotovolt", "wind", "eolian", "hydro", "hidro", "nuclear", "coal", "carbune", "cărbune", "gas",
    "gaz",
];

#[enum_dispatch(ColumnMatcher)]
#[derive(Debug, Clone)]
pub enum ColumnRule {
    ExactName,
    ContainsToken,
}

/// Case-insensitive equality with one of `names`.
#[derive(Debug, Clone)]
pub struct ExactName {
    names: &'static [&'static str],
}

impl ExactName {
    pub const fn new(names: &'static [&'static str]) -> ExactName {
        ExactName { names }
    }
}

impl ColumnMatcher for ExactName {
    fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.names.iter().any(|candidate| *candidate == name)
    }
}

/// Case-insensitive substring search for any of `tokens`.
#[derive(Debug, Clone)]
pub struct ContainsToken {
    tokens: &'static [&'static str],
}

impl ContainsToken {
    pub const fn new(tokens: &'static [&'static str]) -> ContainsToken {
        ContainsToken { tokens }
    }
}

impl ColumnMatcher for ContainsToken {
    fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.tokens.iter().any(|token| name.contains(token))
    }
}

/// Tried in order; the first rule with any hit decides.
pub fn time_column_rules() -> [ColumnRule; 2] {
    [
        ColumnRule::ExactName(ExactName::new(TIME_COLUMN_NAMES)),
        ColumnRule::ContainsToken(ContainsToken::new(TIME_COLUMN_TOKENS)),
    ]
}

/// Applies `rules` in order and returns the first column, in original order,
/// that the first matching rule accepts.
pub fn first_match<'a>(rules: &[ColumnRule], names: &'a [String]) -> Option<&'a String> {
    rules
        .iter()
        .find_map(|rule| names.iter().find(|name| rule.matches(name)))
}

pub fn detect_time_column(table: &RawTable) -> Option<String> {
    let column = first_match(&time_column_rules(), table.headers()).cloned();
    debug!("time column detection, headers={:?}, found={:?}", table.headers(), column);

    column
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumericFilter {
    #[default]
    AllNumeric,
    /// Numeric columns whose name names a generation source.
    EnergySources,
}

impl NumericFilter {
    pub fn admits(&self, name: &str) -> bool {
        match self {
            NumericFilter::AllNumeric => true,
            NumericFilter::EnergySources => ContainsToken::new(ENERGY_SOURCE_TOKENS).matches(name),
        }
    }
}

pub fn select_numeric_columns(schema: &Schema, time_column: &str, filter: NumericFilter) -> Vec<String> {
    schema
        .columns()
        .iter()
        .filter(|column| column.kind().is_numeric())
        .filter(|column| column.name() != time_column)
        .filter(|column| filter.admits(column.name()))
        .map(|column| column.name().clone())
        .collect()
}
