use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::job::Job;
use mrl_local::{driver, fixtures, read_committed};

mod args;
use args::{Args, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Submit {
            input,
            output,
            workload,
            workers,
            args,
        } => {
            let mut job = Job::new(input, output, &workload)
                .with_args(args)
                .with_workers(workers);
            let result = driver::run_named(&mut job).context("job failed")?;
            info!("{} distinct keys", result.len());
        }
        Commands::Experiment {
            raw,
            input,
            output,
            copies,
            workload,
            workers,
        } => {
            fixtures::clear_input_directory(&input).context("preparing input directory")?;
            fixtures::generate_file_copies(copies, &input, &raw)
                .context("generating input files")?;

            let mut job = Job::new(input, output, &workload).with_workers(workers);
            let start = Instant::now();
            driver::run_named(&mut job).context("job failed")?;
            println!("Elapsed time: {:.2} seconds", start.elapsed().as_secs_f64());
        }
        Commands::Show { output } => {
            for kv in read_committed(&output)? {
                println!("{kv}");
            }
        }
    }

    Ok(())
}
