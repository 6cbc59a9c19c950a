//! Export, import and clear command implementations

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use subtrack_core::{
    exchange::{default_export_filename, parse_import, write_file_atomic},
    tracker::ImportOutcome,
    RecordStore, Tracker,
};

use super::confirm;
use crate::cli::ExportFormat;

/// Export destination: `--output`, or the dated default name
pub fn export_path(output: Option<&Path>, format: ExportFormat, today: NaiveDate) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathBuf::from(default_export_filename(today));
            match format {
                ExportFormat::Json => path,
                ExportFormat::Csv => path.with_extension("csv"),
            }
        }
    }
}

pub fn cmd_export<S: RecordStore>(
    tracker: &Tracker<S>,
    format: ExportFormat,
    output: Option<&Path>,
    today: NaiveDate,
) -> Result<PathBuf> {
    let contents = match format {
        ExportFormat::Json => tracker.export_json()?,
        ExportFormat::Csv => tracker.export_csv()?,
    };

    let path = export_path(output, format, today);
    write_file_atomic(&path, &contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "✅ Exported {} subscription(s) to {}",
        tracker.snapshot().len(),
        path.display()
    );
    Ok(path)
}

/// Replace all records with an export file's contents
///
/// Returns `None` when the user declines the confirmation.
pub async fn cmd_import<S: RecordStore>(
    tracker: &mut Tracker<S>,
    file: &Path,
    yes: bool,
) -> Result<Option<ImportOutcome>> {
    println!("📥 Importing from {}...", file.display());

    let json = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let batch = parse_import(&json)?;

    for skipped in &batch.skipped {
        println!("   ⚠️  Skipping entry {}: {}", skipped.index, skipped.reason);
    }

    if !yes {
        let prompt = format!(
            "This will replace your current data with {} subscription(s). Continue?",
            batch.records.len()
        );
        if !confirm(&prompt)? {
            println!("Cancelled.");
            return Ok(None);
        }
    }

    let outcome = tracker.import_batch(batch).await?;

    println!("✅ Import complete!");
    println!("   Imported: {}", outcome.imported);
    if !outcome.skipped.is_empty() {
        println!("   Skipped:  {}", outcome.skipped.len());
    }
    Ok(Some(outcome))
}

pub async fn cmd_clear<S: RecordStore>(tracker: &mut Tracker<S>, yes: bool) -> Result<usize> {
    let count = tracker.snapshot().len();
    if count == 0 {
        println!("Nothing to clear.");
        return Ok(0);
    }

    if !yes {
        println!("⚠️  This will delete all {} subscription(s).", count);
        println!("   Export first if you want a copy: subtrack export");
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(0);
        }
    }

    let removed = tracker
        .clear()
        .await
        .context("Failed to clear subscriptions")?;

    println!("✅ Cleared {} subscription(s)", removed);
    Ok(removed)
}
