//! Persist the result table.

use crate::error::Result;
use crate::record::{Column, NormalizedRow};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write rows as comma-delimited UTF-8 CSV with a header row.
///
/// The header is written even when there are no rows.
pub fn write_csv(path: &Path, rows: &[NormalizedRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;

    wtr.write_record(Column::ALL.iter().map(|c| c.name()))?;
    for row in rows {
        wtr.write_record(Column::ALL.iter().map(|&column| row.get(column)))?;
    }
    wtr.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Saved CSV");
    Ok(())
}

/// Write rows as a pretty-printed JSON array of objects keyed by column name.
pub fn write_json(path: &Path, rows: &[NormalizedRow]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, rows)?;
    out.write_all(b"\n")?;
    out.flush()?;

    info!(path = %path.display(), rows = rows.len(), "Saved JSON");
    Ok(())
}
