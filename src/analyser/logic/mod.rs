pub mod aggregation;
pub mod cleaning;
pub mod flows;
pub mod io;
pub mod naming;
pub mod types;

pub use aggregation::aggregate;
pub use cleaning::clean_and_merge;
pub use flows::{AnalysisRun, CleanRun, PipelineRun, analyze_flow, clean_flow, pipeline_flow};
pub use io::{SourceTables, load_sources, load_table, save_table};
pub use naming::normalise_header;
pub use types::{
    CleaningReport, GroupSummary, GroupSummaryTable, MergedRecord, MergedTable, columns,
};

#[cfg(test)]
mod tests;
