use enum_dispatch::enum_dispatch;
use thiserror::Error;

pub mod aggregate;
pub mod chart;
pub mod columns;
pub mod dashboard;
pub mod schema;
pub mod timeline;

use columns::{ColumnRule, ContainsToken, ExactName};


/// Conditions reported back to the caller instead of a result.
#[derive(Debug, PartialEq, Error)]
pub enum PipelineError {
    #[error("no time column found")]
    NoTimeColumn,
    #[error("no rows with a valid timestamp")]
    NoValidRows,
    #[error("no numeric columns found")]
    NoNumericColumns,
    #[error("select at least one numeric column")]
    EmptySelection,
    #[error("column `{0}` is not numeric")]
    NotNumeric(String),
    #[error("export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Export(err.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Export(err.to_string())
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Export(err.to_string())
    }
}

#[enum_dispatch]
pub trait ColumnMatcher {
    fn matches(&self, name: &str) -> bool;
}
