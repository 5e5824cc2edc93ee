use std::path::PathBuf;

use clap::Parser;
use dispatchgen::{generate_to_path, parse_max_arity, GeneratorConfig, Variant, DEFAULT_OUTPUT_PATH};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Generate the server dispatch helper header
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Largest number of functions one registration macro can take (default: 20)
    #[arg(value_parser = parse_max_arity)]
    max_arity: Option<usize>,

    /// Where to write the header (default: include/rpc_dispatch_helper.hpp)
    output_path: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so the header path can be piped from stdout
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let variant = Variant::default();
    let config = GeneratorConfig::for_variant(variant)
        .with_max_arity(args.max_arity.unwrap_or_else(|| variant.default_max_arity()));
    let output_path = args
        .output_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

    let summary = generate_to_path(&config, &output_path)?;
    info!("Generation summary: {}", serde_json::to_string(&summary)?);
    println!("{}", output_path.display());
    Ok(())
}
