use clap::Parser;
use std::path::MAIN_SEPARATOR;
use tracing_subscriber::EnvFilter;

mod cli;

const DEFAULT_LOG_FILTER: &str = "libcloudac=debug,cloudac_dl=debug";

#[tokio::main]
async fn main() {
    let f_appender =
        tracing_appender::rolling::hourly(format!(".{}", MAIN_SEPARATOR), "cloudac-dl.log");
    let (non_blk, guard) = tracing_appender::non_blocking(f_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .event_format(tracing_subscriber::fmt::format().pretty())
        .with_writer(non_blk)
        .init();
    let cli = cli::Cli::parse();
    if let Err(e) = cli.download().await {
        eprintln!("{}", e);
        // exit skips destructors, flush the log writer first.
        drop(guard);
        std::process::exit(1);
    }
}
