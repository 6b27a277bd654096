use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use copysmith::core::config::load_config;
use copysmith::core::fill::generate_preview;
use copysmith::core::pools::Lexicon;
use copysmith::core::text::has_forbidden_label;

#[derive(Parser)]
#[command(name = "copysmith-preview", about = "Prints sample titles and descriptions")]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    #[arg(long, default_value_t = 3)]
    count: usize,
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    if !args.config.exists() {
        log::error!("Config file not found at {}", args.config.display());
        return Ok(());
    }

    let config = load_config(&args.config)?;
    let mut request = config.request.clone();
    if args.seed.is_some() {
        request.seed = args.seed;
    }
    log::info!("Previewing {} item(s) for {}", args.count, request.brand);

    let lexicon = Lexicon::load(&config.data_dir());
    for (i, (title, description)) in generate_preview(&request, &lexicon, args.count).iter().enumerate() {
        println!("#{} {} ({} chars)", i + 1, title, title.chars().count());
        println!("{}", description);
        println!("({} chars)", description.chars().count());
        if has_forbidden_label(description) {
            log::warn!("Preview #{} still contains a structural label", i + 1);
        }
        println!();
    }

    Ok(())
}
