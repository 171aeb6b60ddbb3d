//! CLI administration tool for relay-shortener.
//!
//! Inspects the stores and queues and repairs stranded messages without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Most accessed short codes
//! cargo run --bin admin -- stats --limit 20
//!
//! # One short code across all three stores
//! cargo run --bin admin -- stats show 1
//!
//! # Queue depths
//! cargo run --bin admin -- queue status
//!
//! # Return messages stranded by a crashed worker
//! cargo run --bin admin -- queue recover redirect
//!
//! # Short code <-> ordinal
//! cargo run --bin admin -- encode 62
//! cargo run --bin admin -- decode 10
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*`: PostgreSQL connection (stats and db commands)
//! - `BUS_URL` or `REDIS_URL`: message bus (queue commands)
//! - `REDIRECT_QUEUE` / `ANALYTIC_QUEUE`: queue names

use relay_shortener::config::{Config, mask_connection_string};
use relay_shortener::domain::bus::MessageBus;
use relay_shortener::domain::repositories::{
    AnalyticsRepository, MappingRepository, RedirectRepository,
};
use relay_shortener::infrastructure::bus::RedisBus;
use relay_shortener::infrastructure::persistence::{
    PgAnalyticsRepository, PgMappingRepository, PgRedirectRepository,
};
use relay_shortener::utils::code_generator::{decode, encode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing relay-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Show access statistics
    Stats {
        /// Number of records to list
        #[arg(short, long, default_value_t = 10)]
        limit: i64,

        #[command(subcommand)]
        action: Option<StatsAction>,
    },

    /// Inspect and repair bus queues
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },

    /// Print the short code for an ordinal
    Encode { ordinal: u64 },

    /// Print the ordinal behind a short code
    Decode { code: String },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum StatsAction {
    /// Show one short code in every store
    Show { code: String },
}

#[derive(Subcommand)]
enum QueueAction {
    /// Show ready and in-flight counts
    Status,

    /// Move in-flight messages back to the ready list
    Recover {
        /// Queue name
        queue: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Stats { limit, action } => {
            let pool = connect_database(&config).await?;
            match action {
                None => handle_stats(&pool, limit).await?,
                Some(StatsAction::Show { code }) => handle_stats_show(&pool, &code).await?,
            }
        }
        Commands::Queue { action } => {
            let bus = connect_bus(&config).await?;
            handle_queue_action(action, &bus, &config).await?;
        }
        Commands::Encode { ordinal } => println!("{}", encode(ordinal).bright_green().bold()),
        Commands::Decode { code } => match decode(&code) {
            Some(ordinal) => println!("{}", ordinal.to_string().bright_green().bold()),
            None => anyhow::bail!("'{}' is not a base62 short code", code),
        },
        Commands::Db { action } => {
            let pool = connect_database(&config).await?;
            handle_db_action(action, &pool, &config).await?;
        }
    }

    Ok(())
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;

    PgPool::connect(url)
        .await
        .context("Failed to connect to database")
}

async fn connect_bus(config: &Config) -> Result<RedisBus> {
    let url = config
        .bus_url
        .as_deref()
        .context("BUS_URL or REDIS_URL must be set")?;

    RedisBus::connect(url)
        .await
        .context("Failed to connect to message bus")
}

/// Displays store totals and the most accessed short codes.
///
/// # Output Format
///
/// ```text
/// 📊 Statistics
///
///   Mappings:         42
///   Analytic records: 41
///
///   Code         Accesses   Last access        URL
///   ────────────────────────────────────────────────────────────────
///   1            17         2026-01-15 10:30   https://example.com/a
/// ```
async fn handle_stats(pool: &PgPool, limit: i64) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let shared = Arc::new(pool.clone());
    let mappings = PgMappingRepository::new(shared.clone());
    let analytics = PgAnalyticsRepository::new(shared);

    let mapping_count = mappings
        .count()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count mappings: {}", e))?;
    let analytic_count = analytics
        .count()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count analytic records: {}", e))?;

    println!(
        "  Mappings:         {}",
        mapping_count.to_string().bright_green().bold()
    );
    println!(
        "  Analytic records: {}",
        analytic_count.to_string().bright_green().bold()
    );
    if analytic_count < mapping_count {
        println!(
            "  {}",
            format!(
                "⚠️  {} mapping(s) not yet seen by analytics",
                mapping_count - analytic_count
            )
            .yellow()
        );
    }
    println!();

    let records = analytics
        .list(0, limit.max(1))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list analytic records: {}", e))?;

    if records.is_empty() {
        println!("{}", "  No analytic records found".yellow());
        return Ok(());
    }

    println!(
        "  {:<12} {:<10} {:<18} {}",
        "Code".bright_white().bold(),
        "Accesses".bright_white().bold(),
        "Last access".bright_white().bold(),
        "URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for record in &records {
        println!(
            "  {:<12} {:<10} {:<18} {}",
            record.short_code.cyan(),
            record.access_count.to_string().bright_green(),
            record
                .last_accessed_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            record.long_url
        );
    }
    println!();

    Ok(())
}

/// Shows one short code in each store, exposing propagation gaps.
async fn handle_stats_show(pool: &PgPool, code: &str) -> Result<()> {
    println!("{} {}", "🔍 Short code".bright_blue().bold(), code.cyan());
    println!();

    let shared = Arc::new(pool.clone());
    let mappings = PgMappingRepository::new(shared.clone());
    let redirects = PgRedirectRepository::new(shared.clone());
    let analytics = PgAnalyticsRepository::new(shared);

    match mappings
        .find_by_short_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
    {
        Some(mapping) => println!(
            "  Mapping:   {} (ordinal {}, created {})",
            mapping.long_url.bright_white(),
            mapping.id,
            mapping.created_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("  Mapping:   {}", "missing".red()),
    }

    let redirect_rows = redirects
        .count_by_short_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;
    let redirect_status = match redirect_rows {
        0 => "missing".red(),
        1 => "1 row".green(),
        n => format!("{} rows (duplicate propagation)", n).yellow(),
    };
    println!("  Redirect:  {}", redirect_status);

    match analytics
        .find_by_short_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
    {
        Some(record) => println!(
            "  Analytics: {} access(es), last {}",
            record.access_count.to_string().bright_green(),
            record.last_accessed_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("  Analytics: {}", "missing".red()),
    }
    println!();

    Ok(())
}

/// Handles queue inspection and recovery commands.
async fn handle_queue_action(action: QueueAction, bus: &RedisBus, config: &Config) -> Result<()> {
    match action {
        QueueAction::Status => {
            println!("{}", "📬 Queues".bright_blue().bold());
            println!();
            println!(
                "  {:<16} {:<10} {}",
                "Queue".bright_white().bold(),
                "Ready".bright_white().bold(),
                "In flight".bright_white().bold()
            );
            println!("  {}", "─".repeat(40).bright_black());

            for queue in [&config.redirect_queue, &config.analytic_queue] {
                let depth = bus.depth(queue).await?;
                println!(
                    "  {:<16} {:<10} {}",
                    queue.cyan(),
                    depth.ready.to_string().bright_green(),
                    depth.in_flight.to_string().yellow()
                );
            }
            println!();
        }
        QueueAction::Recover { queue, yes } => {
            println!("{}", "♻️  Recover in-flight messages".bright_blue().bold());
            println!();

            let depth = bus.depth(&queue).await?;
            if depth.in_flight == 0 {
                println!("{}", "  Nothing in flight".green());
                return Ok(());
            }

            println!(
                "  {} message(s) in flight on {}",
                depth.in_flight.to_string().yellow().bold(),
                queue.cyan()
            );
            println!(
                "{}",
                "  Messages still being handled by a live worker will be delivered twice."
                    .yellow()
            );
            println!();

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Requeue them?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            let moved = bus.recover_in_flight(&queue).await?;
            println!();
            println!(
                "{}",
                format!("✅ Requeued {} message(s)", moved).green().bold()
            );
            println!();
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let next_ordinal: i64 = sqlx::query_scalar(
                "SELECT last_value + CASE WHEN is_called THEN 1 ELSE 0 END FROM url_mappings_id_seq",
            )
            .fetch_one(pool)
            .await?;

            if let Some(ref url) = config.database_url {
                println!("  URL:          {}", mask_connection_string(url).bright_white());
            }
            println!("  PostgreSQL:   {}", version.bright_white());
            println!(
                "  Next code:    {} (ordinal {})",
                encode(next_ordinal.max(0) as u64).bright_green(),
                next_ordinal
            );
            println!();
        }
    }

    Ok(())
}
