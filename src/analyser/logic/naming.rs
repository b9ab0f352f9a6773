use polars::prelude::*;

/// Characters that act as word separators in exported headers.
const SEPARATORS: [char; 3] = ['.', '_', '-'];

/// Maps `Park.Name`, `Park_Name` or ` Park  Name ` to `Park Name`.
pub fn normalise_header(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalise_headers(names: &[String]) -> Vec<String> {
    names.iter().map(|name| normalise_header(name)).collect()
}

/// Renames every column of `df` to its normalized header and drops the
/// columns whose header normalizes to nothing.
///
/// Returns the new frame and the number of unnamed columns dropped.
///
/// # Errors
///
/// Fails when two columns normalise to the same header.
pub fn normalise_frame_headers(df: DataFrame) -> PolarsResult<(DataFrame, usize)> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let normalised = normalise_headers(&names);

    let mut exprs = Vec::with_capacity(names.len());
    let mut dropped = 0;
    for (old, new) in names.iter().zip(&normalised) {
        if new.is_empty() {
            dropped += 1;
            continue;
        }
        exprs.push(col(old.as_str()).alias(new.as_str()));
    }

    let df = df.lazy().select(exprs).collect()?;
    Ok((df, dropped))
}
