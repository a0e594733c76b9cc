use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a job over an input directory and commit the result.
    Submit {
        /// Directory whose files are read as input
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory, recreated on every run
        #[arg(short, long)]
        output: PathBuf,

        /// Name of the workload
        #[arg(short, long, default_value = "wc", value_parser = workloads())]
        workload: String,

        /// Number of map threads
        #[arg(short = 'n', long, default_value_t = 1)]
        workers: usize,

        /// Auxiliary arguments to pass to the MapReduce application.
        #[clap(value_parser, last = true)]
        args: Vec<String>,
    },
    /// Fill the input directory with copies of the raw files, run a job and
    /// report how long it took.
    Experiment {
        /// Directory holding the sample files to copy
        #[arg(short, long, default_value = "files/raw")]
        raw: PathBuf,

        #[arg(short, long, default_value = "files/input")]
        input: PathBuf,

        #[arg(short, long, default_value = "files/output")]
        output: PathBuf,

        /// Copies of each raw file
        #[arg(short, long, default_value_t = 500)]
        copies: usize,

        #[arg(short, long, default_value = "wc", value_parser = workloads())]
        workload: String,

        #[arg(short = 'n', long, default_value_t = 1)]
        workers: usize,
    },
    /// Print a committed job output.
    Show {
        #[arg(short, long, default_value = "files/output")]
        output: PathBuf,
    },
}

/// Accepts only registered workload names.
fn workloads() -> PossibleValuesParser {
    PossibleValuesParser::new(workload::NAMES.iter().copied())
}
