//! isofit CLI

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use iso_fit::study::{StudyConfig, ToyStudy};
use iso_fit::{ErrorModel, OptimizerConfig};
use iso_prob::pvalue::correct_pvalue;

#[derive(Parser)]
#[command(name = "isofit")]
#[command(about = "isofit - two-isotope decay toy Monte Carlo fits")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorModelArg {
    /// Model-predicted variances.
    Pearson,
    /// Observed-count variances.
    Neyman,
}

impl From<ErrorModelArg> for ErrorModel {
    fn from(arg: ErrorModelArg) -> Self {
        match arg {
            ErrorModelArg::Pearson => ErrorModel::Pearson,
            ErrorModelArg::Neyman => ErrorModel::Neyman,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the repeated-experiment toy study and write the results table
    Run {
        /// Number of fake experiments
        #[arg(short = 'n', long, default_value = "1000")]
        experiments: usize,

        /// True event count of population 0
        #[arg(long, default_value = "1000")]
        n0: u64,

        /// True event count of population 1
        #[arg(long, default_value = "100")]
        n1: u64,

        /// Parabolic energy endpoint of population 0 [MeV]
        #[arg(long, default_value = "12.0")]
        endpoint0: f64,

        /// Parabolic energy endpoint of population 1 [MeV]
        #[arg(long, default_value = "8.0")]
        endpoint1: f64,

        /// Decay lifetime of population 0
        #[arg(long, default_value = "260.0")]
        lifetime0: f64,

        /// Decay lifetime of population 1
        #[arg(long, default_value = "170.0")]
        lifetime1: f64,

        /// Number of energy bins
        #[arg(long, default_value = "4")]
        energy_bins: usize,

        /// Number of time bins
        #[arg(long, default_value = "4")]
        time_bins: usize,

        /// Minimum expected events per bin for the chi-square treatment
        #[arg(long, default_value = "20.0")]
        min_events_per_bin: f64,

        /// Variance treatment for the chi-square fits
        #[arg(long, value_enum, default_value = "pearson")]
        error_model: ErrorModelArg,

        /// Base random seed; experiment i draws from seed + i
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output CSV path. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Threads (0 = auto)
        #[arg(long, default_value = "0")]
        threads: usize,
    },

    /// Re-evaluate a p-value column of a results CSV at the correct
    /// degrees of freedom
    CorrectPvals {
        /// Input results CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Degrees of freedom the p-values were (wrongly) evaluated at
        #[arg(long, default_value = "6.0")]
        bad_dof: f64,

        /// Correct degrees of freedom
        #[arg(long, default_value = "5.0")]
        good_dof: f64,

        /// Name of the p-value column to correct
        #[arg(long, default_value = "pval_1D")]
        column: String,

        /// Output CSV path (input table plus a corrected column).
        /// Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Run {
            experiments,
            n0,
            n1,
            endpoint0,
            endpoint1,
            lifetime0,
            lifetime1,
            energy_bins,
            time_bins,
            min_events_per_bin,
            error_model,
            seed,
            output,
            threads,
        } => {
            if threads > 0 {
                // Best-effort; if a global pool already exists, keep going.
                let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
            }

            let config = StudyConfig {
                n_experiments: experiments,
                n_events: [n0, n1],
                endpoints: [endpoint0, endpoint1],
                lifetimes: [lifetime0, lifetime1],
                n_energy_bins: energy_bins,
                n_time_bins: time_bins,
                min_events_per_bin,
                error_model: error_model.into(),
                seed,
                optimizer: OptimizerConfig::default(),
            };

            let study = ToyStudy::new(config).context("study validation failed")?;
            tracing::info!(experiments, seed, "study validated, starting loop");
            let rows = study.run().context("toy loop failed")?;
            let n_failed = rows.iter().filter(|r| r.status != "ok").count();
            if n_failed > 0 {
                tracing::warn!(n_failed, "some experiments recorded failed fits");
            }

            let mut wtr = csv::Writer::from_writer(open_output(output.as_ref())?);
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
            tracing::info!(rows = rows.len(), "results table written");
            Ok(())
        }

        Commands::CorrectPvals { input, bad_dof, good_dof, column, output } => {
            let mut rdr = csv::Reader::from_path(&input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            let headers = rdr.headers()?.clone();
            let Some(col_idx) = headers.iter().position(|h| h == column) else {
                bail!("column '{column}' not found in {}", input.display());
            };

            let mut wtr = csv::Writer::from_writer(open_output(output.as_ref())?);
            let mut out_headers = headers.clone();
            out_headers.push_field(&format!("corrected_{column}"));
            wtr.write_record(&out_headers)?;

            let mut n_rows = 0usize;
            for record in rdr.records() {
                let mut record = record?;
                let pval: f64 = record[col_idx]
                    .parse()
                    .with_context(|| format!("row {n_rows}: bad p-value '{}'", &record[col_idx]))?;
                // NaN sentinels from failed fits stay NaN.
                let corrected = if pval.is_nan() {
                    f64::NAN
                } else {
                    correct_pvalue(pval, bad_dof, good_dof)?
                };
                record.push_field(&corrected.to_string());
                wtr.write_record(&record)?;
                n_rows += 1;
            }
            wtr.flush()?;
            tracing::info!(rows = n_rows, bad_dof, good_dof, "corrected p-values written");
            Ok(())
        }
    }
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(
            std::fs::File::create(p).with_context(|| format!("cannot create {}", p.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}
