//! chainstream CLI binary entry point.

use chainstream::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries only the event stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chainstream=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    if let Err(e) = chainstream::cli::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
