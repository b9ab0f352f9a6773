use crate::analyser::logic::io::{load_sources, load_table, save_table};
use crate::error::ParkStatsError;
use anyhow::Result;
use polars::prelude::*;

#[test]
fn test_csv_columns_load_as_text() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("parks.csv");
    std::fs::write(
        &path,
        "Park Code,Park Name,Acres,Latitude\nACAD,Acadia National Park,47390,44.35\n",
    )?;

    let df = load_table(&path)?;
    assert_eq!(df.shape(), (1, 4));
    for column in df.get_columns() {
        assert_eq!(column.dtype(), &DataType::String, "'{}'", column.name());
    }
    Ok(())
}

#[test]
fn test_missing_file_is_load_error() {
    let result = load_table(std::path::Path::new("does/not/exist.csv"));
    assert!(matches!(result, Err(ParkStatsError::Load(_))));
}

#[test]
fn test_header_only_csv_is_load_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("species.csv");
    std::fs::write(&path, "Species ID,Park Name,Category\n")?;

    assert!(matches!(load_table(&path), Err(ParkStatsError::Load(_))));
    Ok(())
}

#[test]
fn test_unsupported_extension_is_load_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("parks.xlsx");
    std::fs::write(&path, "not a table")?;

    assert!(matches!(load_table(&path), Err(ParkStatsError::Load(_))));
    Ok(())
}

#[test]
fn test_load_sources_fails_on_either_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let parks = dir.path().join("parks.csv");
    std::fs::write(&parks, "Park Name\nAcadia\n")?;

    let result = load_sources(&parks, &dir.path().join("species.csv"));
    assert!(matches!(result, Err(ParkStatsError::Load(_))));
    Ok(())
}

#[test]
fn test_save_table_formats() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut df = df!(
        "Park Name" => ["Acadia", "Arches"],
        "Species Count" => [3u32, 5]
    )?;

    let csv_path = dir.path().join("summary.csv");
    save_table(&mut df, &csv_path)?;
    let reloaded = load_table(&csv_path)?;
    assert_eq!(reloaded.shape(), (2, 2));

    let parquet_path = dir.path().join("summary.parquet");
    save_table(&mut df, &parquet_path)?;
    let reloaded = load_table(&parquet_path)?;
    assert_eq!(reloaded.column("Species Count")?.dtype(), &DataType::UInt32);
    Ok(())
}
