use crate::error::{ParkStatsError, Result};
use polars::prelude::*;
use std::path::Path;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Reads a source table exactly as stored.
///
/// CSV columns are all read as text so that nothing is coerced before the
/// cleaner decides how to treat it.
///
/// # Errors
///
/// Returns `Load` for a missing file, an unsupported extension or an
/// empty table, and a polars error when the reader fails.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(ParkStatsError::Load(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }

    let ext = extension(path);
    let load_err = |e: PolarsError| {
        ParkStatsError::Load(format!("Failed to read {}: {e}", path.display()))
    };
    let open = || {
        std::fs::File::open(path)
            .map_err(|e| ParkStatsError::Load(format!("Failed to open {}: {e}", path.display())))
    };

    let df = match ext.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(LazyFrame::collect)
            .map_err(load_err)?,
        "parquet" => ParquetReader::new(open()?).finish().map_err(load_err)?,
        "json" => JsonReader::new(open()?).finish().map_err(load_err)?,
        _ => {
            return Err(ParkStatsError::Load(format!(
                "Unsupported file extension '{ext}' for {}",
                path.display()
            )));
        }
    };

    if df.height() == 0 {
        return Err(ParkStatsError::Load(format!(
            "{} contains zero rows",
            path.display()
        )));
    }

    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// The two raw inputs of a pipeline run.
#[derive(Clone, Debug)]
pub struct SourceTables {
    pub parks: DataFrame,
    pub species: DataFrame,
}

/// # Errors
///
/// Propagates [`load_table`] errors for either path.
pub fn load_sources(parks: &Path, species: &Path) -> Result<SourceTables> {
    Ok(SourceTables {
        parks: load_table(parks)?,
        species: load_table(species)?,
    })
}

/// # Errors
///
/// Fails when the file cannot be created or the writer fails.
pub fn save_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;

    if extension(path) == "parquet" {
        ParquetWriter::new(file).finish(df)?;
    } else {
        CsvWriter::new(file).include_header(true).finish(df)?;
    }

    tracing::info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
