use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use momo_core::{Category, Config, DatePolicy, DateRange, ValidationPolicy, DEFAULT_CONFIG_FILE};
use momo_storage::TransactionFilter;

mod commands;

/// Turn mobile-money SMS exports into a queryable transaction database.
#[derive(Parser, Debug)]
#[command(name = "momo", version)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// SQLite database file (overrides the configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import an SMS backup export (XML)
    Import(ImportArgs),
    /// List stored transactions, newest first
    List(FilterArgs),
    /// Totals, per-type and per-month aggregates
    Summary(FilterArgs),
    /// Distinct stored transaction types
    Types,
    /// Print the active rule table
    Rules {
        /// Rule file (TOML) to print instead of the configured one
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Path to the XML export
    input: PathBuf,

    /// Append rejected messages here
    #[arg(long)]
    rejection_log: Option<PathBuf>,

    /// Rule file (TOML) replacing the built-in rule table
    #[arg(long)]
    rules: Option<PathBuf>,

    /// `lenient` or `strict`
    #[arg(long)]
    validation: Option<ValidationPolicy>,

    /// Shorthand for `--validation strict`
    #[arg(long, conflicts_with = "validation")]
    strict: bool,

    /// `synthesize` or `reject`
    #[arg(long)]
    date_policy: Option<DatePolicy>,

    /// Process without touching the database or the rejection log
    #[arg(long, short = 'n')]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Category label, e.g. "Incoming Money"
    #[arg(long = "type", value_name = "CATEGORY")]
    transaction_type: Option<Category>,

    /// First day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl FilterArgs {
    fn filter(&self) -> TransactionFilter {
        TransactionFilter::new(self.transaction_type, DateRange::new(self.start, self.end))
    }
}

/// Command-line values win over the configuration file.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(db) = &cli.db {
        config.database = db.clone();
    }
    match &cli.command {
        Command::Import(args) => {
            if let Some(path) = &args.rejection_log {
                config.rejection_log = path.clone();
            }
            if let Some(path) = &args.rules {
                config.rules = Some(path.clone());
            }
            if let Some(policy) = args.validation {
                config.validation = policy;
            }
            if args.strict {
                config.validation = ValidationPolicy::Strict;
            }
            if let Some(policy) = args.date_policy {
                config.date_policy = policy;
            }
        }
        Command::Rules { rules: Some(path) } => config.rules = Some(path.clone()),
        _ => {}
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let config = apply_overrides(config, &cli);
    tracing::debug!(?config, "resolved configuration");

    match &cli.command {
        Command::Import(args) => {
            let summary = commands::import(&config, &args.input, args.dry_run).await?;
            commands::print_json(&summary)
        }
        Command::List(args) => {
            let rows = commands::list(&config, &args.filter()).await?;
            commands::print_json(&rows)
        }
        Command::Summary(args) => {
            let summary = commands::summary(&config, &args.filter()).await?;
            commands::print_json(&summary)
        }
        Command::Types => {
            let types = commands::types(&config).await?;
            commands::print_json(&types)
        }
        Command::Rules { .. } => {
            let rules = commands::load_rules(&config)?;
            commands::print_json(&rules.rules().collect::<Vec<_>>())
        }
    }
}
