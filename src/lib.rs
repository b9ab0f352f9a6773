//! # parkstats - national park biodiversity statistics
//!
//! Joins U.S. national park metadata with per-park species records and
//! runs a fixed set of statistical procedures on the result.
//!
//! ## Quick Start
//!
//! ```no_run
//! use parkstats::analyser::logic::analyze_flow;
//! use parkstats::config::AnalysisConfig;
//! use std::path::Path;
//!
//! # fn example() -> parkstats::error::Result<()> {
//! let run = analyze_flow(
//!     Path::new("parks.csv"),
//!     Path::new("species.csv"),
//!     &AnalysisConfig::default(),
//! )?;
//! println!("{} merged rows", run.cleaning.merged_rows);
//! for (routine, kind) in run.inference.failures() {
//!     println!("{routine} failed: {kind:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`analyser::logic`]: loading, cleaning, merging and aggregation
//! - [`analyser::inference`]: resampling, regression and ANOVA routines
//! - [`config`]: analysis settings loaded from JSON
//! - [`error`]: error types and handling utilities
//! - [`logging`]: tracing subscriber setup for the binary
//!
//! ## Pipeline
//!
//! ```text
//! parks.csv ─┐
//!            ├─> clean_and_merge ─> MergedTable ─> aggregate ─> GroupSummaryTable
//! species.csv┘        │                  │                          │
//!                     └─> CleaningReport └────────> run_inference <─┘
//! ```
//!
//! Data only moves downstream; every stage hands an immutable value to the
//! next.

pub mod analyser;
pub mod config;
pub mod error;
pub mod logging;
