use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use parkstats::analyser::logic::{analyze_flow, clean_flow, pipeline_flow, save_table};
use parkstats::analyser::inference::PermutationMode;
use parkstats::config::AnalysisConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "parkstats",
    version,
    about = "Clean, merge and analyse national park biodiversity data"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "parkstats=trace")
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Only log to stderr, skip the rolling log files
    #[arg(long, global = true)]
    pub no_log_files: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Park metadata table (CSV, Parquet or JSON)
    #[arg(long, default_value = "parks.csv")]
    parks: PathBuf,

    /// Species observation table (CSV, Parquet or JSON)
    #[arg(long, default_value = "species.csv")]
    species: PathBuf,
}

/// Command-line overrides for the resampling section of the config.
#[derive(Args, Default)]
pub struct ResamplingArgs {
    /// Resamples for the bootstrap and permutation test
    #[arg(long)]
    n_samp: Option<usize>,

    /// Seed for the resampling routines
    #[arg(long)]
    seed: Option<u64>,

    /// Run resampling iterations on all cores
    #[arg(long)]
    parallel: bool,

    /// Keep every permuted correlation in the report's permutation test
    #[arg(long)]
    permutation_display: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean and merge the sources, save the merged table and print the cleaning report
    Clean {
        #[command(flatten)]
        sources: SourceArgs,

        /// Where to write the merged table (.csv or .parquet)
        #[arg(short, long, default_value = "merged.csv")]
        output: PathBuf,
    },
    /// Clean, merge and aggregate per park, category and conservation status
    Summarise {
        #[command(flatten)]
        sources: SourceArgs,

        /// Where to write the group summaries (.csv or .parquet)
        #[arg(short, long, default_value = "summary.csv")]
        output: PathBuf,
    },
    /// Run the full pipeline and every inference routine
    Analyse {
        #[command(flatten)]
        sources: SourceArgs,

        /// JSON analysis configuration
        #[arg(long, env = "PARKSTATS_CONFIG")]
        config: Option<PathBuf>,

        #[command(flatten)]
        resampling: ResamplingArgs,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// # Errors
///
/// Propagates pipeline, config and output errors.
pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Clean { sources, output } => handle_clean(&sources, &output),
        Commands::Summarise { sources, output } => handle_summarise(&sources, &output),
        Commands::Analyse {
            sources,
            config,
            resampling,
            output,
        } => {
            let config = resolve_config(config.as_deref(), &resampling)?;
            handle_analyse(&sources, &config, output.as_deref())
        }
    }
}

fn handle_clean(sources: &SourceArgs, output: &Path) -> Result<()> {
    let run = clean_flow(&sources.parks, &sources.species)?;
    let mut merged = run.merged.into_df();
    save_table(&mut merged, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{}", serde_json::to_string_pretty(&run.cleaning)?);
    Ok(())
}

#[derive(Serialize)]
struct SummariseOutput<'a> {
    groups: usize,
    species_total: u64,
    output: &'a Path,
    cleaning: &'a parkstats::analyser::logic::CleaningReport,
}

fn handle_summarise(sources: &SourceArgs, output: &Path) -> Result<()> {
    let run = pipeline_flow(&sources.parks, &sources.species)?;
    let summary = SummariseOutput {
        groups: run.groups.height(),
        species_total: run.groups.total_count()?,
        output,
        cleaning: &run.cleaning,
    };
    let json = serde_json::to_string_pretty(&summary)?;

    let mut groups = run.groups.into_df();
    save_table(&mut groups, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{json}");
    Ok(())
}

fn handle_analyse(sources: &SourceArgs, config: &AnalysisConfig, output: Option<&Path>) -> Result<()> {
    let run = analyze_flow(&sources.parks, &sources.species, config)?;
    let json = serde_json::to_string_pretty(&run)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Config file (or defaults) with the command-line overrides applied.
fn resolve_config(path: Option<&Path>, overrides: &ResamplingArgs) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(n_samp) = overrides.n_samp {
        config.resampling.n_samp = n_samp;
    }
    if overrides.seed.is_some() {
        config.resampling.seed = overrides.seed;
    }
    if overrides.parallel {
        config.resampling.parallel = true;
    }
    if overrides.permutation_display {
        config.resampling.permutation_mode = PermutationMode::Display;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() -> Result<()> {
        let overrides = ResamplingArgs {
            n_samp: Some(500),
            seed: Some(7),
            parallel: true,
            permutation_display: true,
        };
        let config = resolve_config(None, &overrides)?;
        assert_eq!(config.resampling.n_samp, 500);
        assert_eq!(config.resampling.seed, Some(7));
        assert!(config.resampling.parallel);
        assert_eq!(config.resampling.permutation_mode, PermutationMode::Display);
        Ok(())
    }

    #[test]
    fn test_permutation_mode_defaults_to_pure() -> Result<()> {
        let config = resolve_config(None, &ResamplingArgs::default())?;
        assert_eq!(config.resampling.permutation_mode, PermutationMode::Pure);
        Ok(())
    }

    #[test]
    fn test_zero_resamples_rejected() {
        let overrides = ResamplingArgs {
            n_samp: Some(0),
            ..ResamplingArgs::default()
        };
        assert!(resolve_config(None, &overrides).is_err());
    }

    #[test]
    fn test_parse_analyse_command() {
        let cli = Cli::parse_from([
            "parkstats",
            "analyse",
            "--parks",
            "p.csv",
            "--species",
            "s.csv",
            "--seed",
            "42",
        ]);
        let Commands::Analyse { resampling, .. } = cli.command else {
            panic!("expected the analyse subcommand");
        };
        assert_eq!(resampling.seed, Some(42));
        assert!(!resampling.parallel);
        assert!(!resampling.permutation_display);
    }

    #[test]
    fn test_parse_permutation_display_flag() {
        let cli = Cli::parse_from(["parkstats", "analyse", "--permutation-display"]);
        let Commands::Analyse { resampling, .. } = cli.command else {
            panic!("expected the analyse subcommand");
        };
        assert!(resampling.permutation_display);
    }
}
