use std::path::PathBuf;

use clap::Parser;

use revlens_core::config::RevlensConfig;

#[derive(Parser, Debug)]
#[command(
    name = "revlens",
    version,
    about = "Classify and aggregate product review sentiment over HTTP"
)]
struct Cli {
    /// Path to the configuration file (defaults apply when absent)
    #[arg(short, long, default_value = "revlens.toml")]
    config: PathBuf,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error
///   2 — configuration error
///   3 — classifier/model error
///   4 — storage error
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let lower = format!("{err:#}").to_lowercase();

    if lower.contains("config") {
        2
    } else if lower.contains("classifier") || lower.contains("model") {
        3
    } else if lower.contains("store") || lower.contains("persist") {
        4
    } else {
        1
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = RevlensConfig::load_or_default(&cli.config)
        .map_err(revlens_core::error::RevlensError::Config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    revlens_server::serve(&config).await
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "info",
        (_, 1) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
