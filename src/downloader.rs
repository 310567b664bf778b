use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// Convert the ledger to CSV format
///
/// Produces the same shape the movements worksheet is saved in: the fixed
/// column headers followed by one line per entry, dates as `YYYY-MM-DD`.
/// Quoting of commas, quotes and newlines is left to the `csv` writer.
///
/// # Arguments
/// * `ledger` - Reference to the ledger to convert
///
/// # Returns
/// * `Result<String>` - CSV content as a string or an error
///
/// # Examples
/// ```
/// use bitacora::ledger::Ledger;
/// use bitacora::downloader::to_csv;
///
/// let ledger = Ledger::default();
/// let csv = to_csv(&ledger).unwrap();
/// assert!(csv.starts_with("ID,Fecha,Concepto"));
/// ```
pub fn to_csv(ledger: &Ledger) -> Result<String> {
    let table = ledger.to_table();
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LedgerError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| LedgerError::Export(e.to_string()))
}

/// Convert the ledger to XLSX format
///
/// Dates are written as `YYYY-MM-DD` text and amounts as numbers so totals
/// can be recomputed in any spreadsheet application.
///
/// # Arguments
/// * `ledger` - Reference to the ledger to convert
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn to_xlsx(ledger: &Ledger) -> Result<Vec<u8>> {
    use crate::entry::COLUMNS;
    use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

    fn export_error(e: XlsxError) -> LedgerError {
        LedgerError::Export(e.to_string())
    }

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Movimientos").map_err(export_error)?;

    for (c, header) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, c as u16, *header)
            .map_err(export_error)?;
    }

    for (i, entry) in ledger.entries.iter().enumerate() {
        let r = (i + 1) as u32;
        if let Some(id) = entry.id {
            worksheet.write_number(r, 0, id as f64).map_err(export_error)?;
        }
        if let Some(date) = entry.date {
            let date = date.format("%Y-%m-%d").to_string();
            worksheet
                .write_string(r, 1, &date)
                .map_err(export_error)?;
        }
        worksheet
            .write_string(r, 2, &entry.concept)
            .map_err(export_error)?;
        worksheet
            .write_number(r, 3, entry.amount)
            .map_err(export_error)?;

        let text_cells = [
            (4u16, entry.kind.map(|k| k.label().to_string())),
            (5, entry.category.clone()),
            (6, entry.payment_method.clone()),
            (7, entry.responsible.clone()),
        ];
        for (c, value) in text_cells {
            if let Some(value) = value {
                worksheet.write_string(r, c, &value).map_err(export_error)?;
            }
        }
    }

    workbook.push_worksheet(worksheet);

    workbook.save_to_buffer().map_err(export_error)
}
