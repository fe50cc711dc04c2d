use clap::Parser;
use issuesum::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Env var for the log filter; falls back to RUST_LOG, then `warn`
const LOG_ENV: &str = "ISSUESUM_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    cli.run()
}
