use crate::coerce::{normalize_header, parse_amount};
use crate::error::{LedgerError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Header of the single cell stored in the configuration worksheet
pub const BASE_BALANCE_HEADER: &str = "SaldoBase";

/// A worksheet: one header row followed by rows of string cells
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, comparing normalised header text
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| normalize_header(h) == name)
    }

    /// Cell of `row` under column `col`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.as_str())
            .unwrap_or("")
    }
}

/// Backing store of named worksheets
///
/// `update` replaces the whole worksheet, mirroring how the spreadsheet
/// connector overwrites a tab on save.
pub trait SheetStore: Send + Sync {
    fn read(&self, worksheet: &str) -> Result<Table>;
    fn update(&self, worksheet: &str, table: &Table) -> Result<()>;
}

/// Directory of CSV files, one `<worksheet>.csv` per worksheet
#[derive(Clone, Debug)]
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    /// Opens (creating if needed) the workbook directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(CsvWorkbook { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn worksheet_path(&self, worksheet: &str) -> Result<PathBuf> {
        let valid = !worksheet.is_empty()
            && worksheet
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ');
        if !valid {
            return Err(LedgerError::InvalidWorksheetName {
                name: worksheet.to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.csv", worksheet)))
    }
}

impl SheetStore for CsvWorkbook {
    fn read(&self, worksheet: &str) -> Result<Table> {
        let path = self.worksheet_path(worksheet)?;
        if !path.exists() {
            return Err(LedgerError::MissingWorksheet {
                name: worksheet.to_string(),
            });
        }

        let file = File::open(&path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
        let width = headers.len();
        let mut table = Table::new(headers);

        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            // Ragged rows are padded so every column can be indexed
            if row.len() < width {
                row.resize(width, String::new());
            }
            table.push_row(row);
        }

        debug!(
            "Read worksheet '{}' ({} rows) from {}",
            worksheet,
            table.rows.len(),
            path.display()
        );
        Ok(table)
    }

    fn update(&self, worksheet: &str, table: &Table) -> Result<()> {
        let path = self.worksheet_path(worksheet)?;

        // Written next to the target and renamed over it once complete
        let temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = csv::WriterBuilder::new().from_writer(temp.as_file());
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| LedgerError::Io(e.error))?;

        info!(
            "Wrote worksheet '{}' ({} rows) to {}",
            worksheet,
            table.rows.len(),
            path.display()
        );
        Ok(())
    }
}

/// Reads the base balance from the first cell of the configuration worksheet.
///
/// A missing or empty worksheet, or a value that is not a number, falls back
/// to `default`.
pub fn read_base_balance(store: &dyn SheetStore, worksheet: &str, default: f64) -> f64 {
    match store.read(worksheet) {
        Ok(table) if !table.is_empty() => match parse_amount(table.cell(0, 0)) {
            Some(value) => value,
            None => {
                warn!(
                    "Base balance '{}' in worksheet '{}' is not a number, using {}",
                    table.cell(0, 0),
                    worksheet,
                    default
                );
                default
            }
        },
        Ok(_) => {
            warn!("Worksheet '{}' is empty, using base balance {}", worksheet, default);
            default
        }
        Err(e) => {
            warn!("Could not read worksheet '{}' ({}), using base balance {}", worksheet, e, default);
            default
        }
    }
}

/// Overwrites the configuration worksheet with a single base balance cell.
pub fn write_base_balance(store: &dyn SheetStore, worksheet: &str, value: i64) -> Result<()> {
    let mut table = Table::new(vec![BASE_BALANCE_HEADER.to_string()]);
    table.push_row(vec![value.to_string()]);
    store.update(worksheet, &table)
}
