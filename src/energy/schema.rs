use getset::{CopyGetters, Getters};

use crate::data::RawTable;

/// Cell values treated as absent, whatever the column type.
pub const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "-"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Empty,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct ColumnSpec {
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: &str, kind: ColumnKind) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.kind)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.kind_of(name).is_some_and(|kind| kind.is_numeric())
    }
}

pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.trim())
}

/// Plain or scientific notation, finite values only; missing markers yield `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if is_missing(value) {
        return None;
    }

    value.parse::<f64>().ok().filter(|number| number.is_finite())
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Empty;
    for value in values.filter(|value| !is_missing(value)) {
        if value.trim().parse::<i64>().is_ok() {
            if kind == ColumnKind::Empty {
                kind = ColumnKind::Integer;
            }
        } else if parse_number(value).is_some() {
            kind = ColumnKind::Float;
        } else {
            return ColumnKind::Text;
        }
    }

    kind
}

pub fn infer_schema(table: &RawTable) -> Schema {
    let columns = table
        .headers()
        .iter()
        .enumerate()
        .map(|(index, name)| ColumnSpec::new(name, infer_kind(table.column(index))))
        .collect();

    Schema { columns }
}
