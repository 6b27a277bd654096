use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use copysmith::core::config::{load_config, SAMPLE_CONFIG};
use copysmith::core::fill::fill_batch;
use copysmith::core::pools::Lexicon;

#[derive(Parser)]
#[command(name = "copysmith", about = "Fills marketplace listing templates with unique copy")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill a template, or several copies of it
    Fill {
        #[arg(long, default_value = "config.toml")]
        config: PathBuf,
        /// Template to fill, overrides `batch.input`
        #[arg(long)]
        input: Option<PathBuf>,
        /// Number of output files
        #[arg(long)]
        files: Option<usize>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Pin the random sequence
        #[arg(long)]
        seed: Option<u64>,
        /// Forget openers used by earlier batches
        #[arg(long)]
        reset_lock: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Fill {
            config,
            input,
            files,
            output_dir,
            seed,
            reset_lock,
        } => {
            // Write a sample config on first run
            if !Path::new(&config).exists() {
                std::fs::write(&config, SAMPLE_CONFIG)
                    .with_context(|| format!("Failed to write sample config {}", config.display()))?;
                log::info!("Wrote sample config to {}", config.display());
            }

            let mut config = load_config(&config)?;
            if input.is_some() {
                config.batch.input = input;
            }
            if let Some(files) = files {
                config.batch.files = files;
            }
            if output_dir.is_some() {
                config.batch.output_dir = output_dir;
            }
            if seed.is_some() {
                config.request.seed = seed;
            }
            config.batch.reset_lock |= reset_lock;

            let lexicon = Lexicon::load(&config.data_dir());
            log::info!(
                "Starting fill: {} file(s), {} rows each",
                config.batch.files.max(1),
                config.request.rows
            );

            let mut last = None;
            let reports = fill_batch(&config, &lexicon, &mut |p: u8| {
                if last != Some(p) {
                    log::info!("Progress: {}%", p);
                    last = Some(p);
                }
            })?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}
