//! CLI command for exporting the journal

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::error::{LedgerError, LedgerResult};
use crate::export::{export_journal, ExportFormat};
use crate::storage::Storage;

use super::report::parse_period;

/// Handle `export <format> [-o file] [--month YYYY-MM]`
pub fn handle_export(
    storage: &Storage,
    format: ExportFormat,
    output: Option<PathBuf>,
    month: Option<String>,
) -> LedgerResult<()> {
    let period = parse_period(month.as_deref())?;

    match output {
        Some(path) => {
            let file = File::create(&path).map_err(|e| {
                LedgerError::Export(format!("Failed to create file {}: {}", path.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            export_journal(storage, format, period, &mut writer)?;
            writer.flush()?;
            println!("Journal exported to: {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            export_journal(storage, format, period, &mut writer)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
