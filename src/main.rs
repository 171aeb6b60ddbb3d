use anyhow::Result;
use clap::Parser;
use relay_shortener::config::{self, Role};
use relay_shortener::server;
use tracing_subscriber::EnvFilter;

/// URL shortener with queue-propagated redirect and analytics stores.
#[derive(Parser)]
#[command(name = "relay-shortener")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Services to run (overrides SERVICE_ROLE)
    #[arg(short, long, value_enum)]
    role: Option<Role>,

    /// Bind address (overrides LISTEN)
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = config::Config::from_env()?;
    if let Some(role) = cli.role {
        config.role = role;
    }
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    config.validate()?;

    init_tracing(&config.log_level, &config.log_format);
    config.print_summary();

    server::run(config).await
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
