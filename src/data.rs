use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Reader};
use enum_dispatch::enum_dispatch;
use getset::Getters;
use log::{debug, info};
use thiserror::Error;

use crate::energy::timeline::{OrderedTable, TIMESTAMP_FORMAT};
use crate::energy::PipelineError;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("workbook has no worksheet with a header row")]
    EmptyWorkbook,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Spreadsheet(#[from] calamine::Error),
}

/// Cells exactly as loaded, one `Vec` per row, aligned with `headers`.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Short rows are padded with empty cells, long rows are cut to the header width.
    /// Repeated header names get `.1`, `.2`, ... suffixes.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> RawTable {
        let headers = dedupe_headers(headers);
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() > width {
                    debug!("truncating row with {} cells to {} columns", row.len(), width);
                }
                row.resize(width, String::new());
                row
            })
            .collect();

        RawTable { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .map(|header| {
            if seen.insert(header.clone()) {
                return header;
            }

            let suffix = suffixes.entry(header.clone()).or_insert(0);
            loop {
                *suffix += 1;
                let renamed = format!("{}.{}", header, suffix);
                if seen.insert(renamed.clone()) {
                    debug!("renaming duplicate column {} to {}", header, renamed);
                    return renamed;
                }
            }
        })
        .collect()
}

#[enum_dispatch]
pub trait TableSource {
    fn read(&self) -> Result<RawTable, DataError>;
}

#[enum_dispatch(TableSource)]
pub enum Source {
    CsvSource,
    SpreadsheetSource,
}

impl Source {
    /// Picks the reader from the file extension.
    pub fn from_path(path: &Path) -> Result<Source, DataError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Source::CsvSource(CsvSource::new(path))),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(Source::SpreadsheetSource(SpreadsheetSource::new(path))),
            _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: &Path) -> CsvSource {
        CsvSource { path: path.to_path_buf() }
    }
}

impl TableSource for CsvSource {
    fn read(&self) -> Result<RawTable, DataError> {
        let file = File::open(&self.path)?;
        read_csv(file)
    }
}

pub struct SpreadsheetSource {
    path: PathBuf,
}

impl SpreadsheetSource {
    pub fn new(path: &Path) -> SpreadsheetSource {
        SpreadsheetSource { path: path.to_path_buf() }
    }
}

impl TableSource for SpreadsheetSource {
    /// Only the first worksheet is read; its first row is the header.
    fn read(&self) -> Result<RawTable, DataError> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let range = workbook.worksheet_range_at(0).ok_or(DataError::EmptyWorkbook)??;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or(DataError::EmptyWorkbook)?
            .iter()
            .map(cell_text)
            .collect();
        let rows = rows.map(|row| row.iter().map(cell_text).collect()).collect();

        Ok(RawTable::new(headers, rows))
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Int(value) => value.to_string(),
        Data::Float(value) => value.to_string(),
        Data::String(value) => value.trim().to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|timestamp| timestamp.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, DataError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for record in csv_reader.records() {
        match record {
            Ok(record) => rows.push(record.iter().map(String::from).collect()),
            Err(err) => debug!("failed to read record, err={}", err),
        }
    }

    Ok(RawTable::new(headers, rows))
}

pub fn load_table<P: AsRef<Path>>(path: P) -> Result<RawTable, DataError> {
    let path = path.as_ref();
    let table = Source::from_path(path)?.read()?;
    info!(
        "loaded {} rows and {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );

    Ok(table)
}

/// Writes the time column followed by `columns`, in the table's current order.
pub fn export_csv(table: &OrderedTable, columns: &[String]) -> Result<Vec<u8>, PipelineError> {
    let indices = table.selected_indices(columns)?;
    let style = table.timestamp_style();

    let mut csv_writer = csv::WriterBuilder::new().from_writer(Vec::new());
    csv_writer.write_record(std::iter::once(table.time_column()).chain(columns.iter()))?;

    for (timestamp, row) in table.timestamps().iter().zip(table.rows()) {
        let mut record = vec![style.format(timestamp)];
        record.extend(indices.iter().map(|&index| {
            crate::energy::schema::parse_number(&row[index])
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;

    csv_writer
        .into_inner()
        .map_err(|err| PipelineError::Export(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::{bail, Result};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_read_csv_trims_and_pads() -> Result<()> {
        let input = "date , solar,wind\n2024-01-05, 10 ,5\n2024-01-06,20\n";
        let table = read_csv(input.as_bytes())?;

        assert_eq!(table.headers(), &vec!["date".to_string(), "solar".to_string(), "wind".to_string()]);
        assert_eq!(table.rows()[0], vec!["2024-01-05", "10", "5"]);
        assert_eq!(table.rows()[1], vec!["2024-01-06", "20", ""]);

        Ok(())
    }

    #[test]
    fn test_read_csv_truncates_long_rows() -> Result<()> {
        let table = read_csv("date,solar\n2024-01-05,10,99\n".as_bytes())?;

        assert_eq!(table.rows()[0], vec!["2024-01-05", "10"]);

        Ok(())
    }

    #[test]
    fn test_load_table_by_extension() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".CSV").tempfile()?;
        file.write_all(b"Data,Solar_MW\n2024-01-05,10\n")?;

        let table = load_table(file.path())?;
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column_index("Solar_MW"), Some(1));

        Ok(())
    }

    #[test]
    fn test_load_table_unsupported_format() -> Result<()> {
        let file = tempfile::Builder::new().suffix(".json").tempfile()?;

        if let Err(err) = load_table(file.path()) {
            assert!(matches!(err, DataError::UnsupportedFormat(_)));
        } else {
            bail!("json files should not be accepted");
        }

        Ok(())
    }

    #[test]
    fn test_spreadsheet_cells_as_text() {
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Float(1234.0)), "1234");
        assert_eq!(cell_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_text(&Data::String(" Solar ".to_string())), "Solar");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_duplicate_headers_get_suffixes() {
        let table = RawTable::new(
            vec!["date".to_string(), "solar".to_string(), "solar".to_string(), "solar".to_string()],
            vec![vec!["2024-01-05".to_string(), "1".to_string(), "2".to_string(), "3".to_string()]],
        );

        assert_eq!(table.headers(), &vec!["date", "solar", "solar.1", "solar.2"]);
        assert_eq!(table.column_index("solar.1"), Some(2));
    }

    #[test]
    fn test_duplicate_headers_skip_taken_names() {
        let table = RawTable::new(vec!["a".to_string(), "a.1".to_string(), "a".to_string()], vec![]);

        assert_eq!(table.headers(), &vec!["a", "a.1", "a.2"]);
    }

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

    const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

    // Style 1 is the built-in "m/d/yy h:mm" date-time format.
    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

    fn write_xlsx(sheet_data: &str) -> Result<tempfile::NamedTempFile> {
        let sheet = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{}</worksheet>"#,
            sheet_data
        );

        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in [
                ("[Content_Types].xml", CONTENT_TYPES),
                ("_rels/.rels", PACKAGE_RELS),
                ("xl/workbook.xml", WORKBOOK),
                ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
                ("xl/styles.xml", STYLES),
                ("xl/worksheets/sheet1.xml", sheet.as_str()),
            ] {
                zip.start_file(name, options)?;
                zip.write_all(content.as_bytes())?;
            }
            zip.finish()?;
        }

        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile()?;
        file.write_all(&buf)?;

        Ok(file)
    }

    #[test]
    fn test_load_xlsx() -> Result<()> {
        let file = write_xlsx(
            r#"<sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Data</t></is></c><c r="B1" t="inlineStr"><is><t>Solar_MW</t></is></c><c r="C1" t="inlineStr"><is><t>Eolian_MW</t></is></c></row><row r="2"><c r="A2" s="1"><v>45296.5</v></c><c r="B2"><v>12.5</v></c><c r="C2"><v>7</v></c></row><row r="3"><c r="A3" s="1"><v>45292</v></c><c r="B3"><v>3</v></c></row></sheetData>"#,
        )?;

        let table = load_table(file.path())?;

        assert_eq!(table.headers(), &vec!["Data", "Solar_MW", "Eolian_MW"]);
        assert_eq!(table.rows()[0], vec!["2024-01-05 12:00:00", "12.5", "7"]);
        assert_eq!(table.rows()[1], vec!["2024-01-01 00:00:00", "3", ""]);
        assert_eq!(
            crate::energy::columns::detect_time_column(&table),
            Some("Data".to_string())
        );

        Ok(())
    }

    #[test]
    fn test_load_xlsx_without_rows() -> Result<()> {
        let file = write_xlsx("<sheetData/>")?;

        if let Err(err) = load_table(file.path()) {
            assert!(matches!(err, DataError::EmptyWorkbook));
        } else {
            bail!("a sheet without a header row should not load");
        }

        Ok(())
    }
}
