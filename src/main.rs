use clap::Parser;
use std::path::PathBuf;
use transit_density::Configuration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Average daily transit departures per census area",
    long_about = None
)]
struct Args {
    /// JSON configuration listing the census areas and the GTFS feeds
    #[arg(short, long)]
    config: PathBuf,
    /// Write the GeoJSON result here instead of the configured output path
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Process feeds concurrently
    #[arg(long)]
    parallel: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Configuration::from_path(&args.config)?;
    if let Some(output) = args.output {
        config.output_path = output;
    }
    config.parallel |= args.parallel;

    transit_density::run(&config)?;
    Ok(())
}
