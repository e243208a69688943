use anyhow::Result;
use filemerge::{cli::parse_args, run_filemerge};
use log::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = parse_args()?;
    setup_logging(config.quiet, config.verbosity);
    run_filemerge(config).await
}

fn setup_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
