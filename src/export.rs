use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::record::{COLUMNS, MatchRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    Xlsx,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Format::Csv),
            "json" => Some(Format::Json),
            "xlsx" => Some(Format::Xlsx),
            _ => None,
        }
    }
}

pub fn write_csv<W: Write>(out: W, records: &[MatchRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer
            .serialize(record.canonical_row())
            .with_context(|| format!("write csv row for game {}", record.id))?;
    }
    // serde writes headers with the first row; an empty table still gets them.
    if records.is_empty() {
        writer.write_record(COLUMNS).context("write csv header")?;
    }
    writer.flush().context("flush csv")?;
    Ok(())
}

pub fn write_json<W: Write>(out: W, records: &[MatchRecord]) -> Result<()> {
    let rows: Vec<_> = records.iter().map(MatchRecord::canonical_row).collect();
    serde_json::to_writer_pretty(out, &rows).context("write json table")?;
    Ok(())
}

pub fn write_xlsx(path: &Path, sheet_name: &str, records: &[MatchRecord]) -> Result<()> {
    let mut rows = vec![COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>()];
    rows.extend(records.iter().map(|r| r.canonical_row().into_fields()));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;
        write_rows(sheet, &rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

pub fn write_file(path: &Path, format: Format, sheet_name: &str, records: &[MatchRecord]) -> Result<()> {
    match format {
        Format::Xlsx => write_xlsx(path, sheet_name, records),
        Format::Csv | Format::Json => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("create {}", path.display()))?;
            let out = std::io::BufWriter::new(file);
            if format == Format::Csv {
                write_csv(out, records)
            } else {
                write_json(out, records)
            }
        }
    }
}
