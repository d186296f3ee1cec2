//! FraudGuard CLI - Main entry point

use fraudguard_rpc::{commands, AppContext};
use fraudguard_rules::RuleId;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fraudguard")]
#[command(about = "FraudGuard - transaction risk evaluation", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a transaction
    Evaluate {
        /// User ID
        #[arg(long, required_unless_present = "json")]
        user: Option<String>,
        /// Amount, unsigned; outflow types are recorded as negative
        #[arg(long, required_unless_present = "json")]
        amount: Option<Decimal>,
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true, required_unless_present = "json")]
        lat: Option<f64>,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true, required_unless_present = "json")]
        lon: Option<f64>,
        /// Transaction type (transfer, payment, recharge, deposit, ...)
        #[arg(long = "type", default_value = "transfer")]
        kind: String,
        /// Device fingerprint
        #[arg(long)]
        device: Option<String>,
        /// RFC 3339 timestamp, defaults to now
        #[arg(long)]
        timestamp: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Optional transaction ID
        #[arg(long)]
        id: Option<String>,
        /// Raw JSON payload instead of the flags above
        #[arg(long, conflicts_with_all = ["user", "amount", "lat", "lon"])]
        json: Option<String>,
    },

    /// Record an analyst decision
    Review {
        /// Transaction ID
        transaction_id: String,
        /// APPROVED or REJECTED
        decision: String,
        /// Analyst ID
        #[arg(long)]
        analyst: String,
    },

    /// Record whether the user confirmed a pending transaction
    Authenticate {
        /// Transaction ID
        transaction_id: String,
        /// The user denied the transaction
        #[arg(long)]
        denied: bool,
    },

    /// Show one evaluation
    Show {
        /// Transaction ID
        transaction_id: String,
    },

    /// List evaluations, newest first
    List {
        /// Filter by user ID
        #[arg(long)]
        user: Option<String>,
        /// Maximum number of evaluations to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show or override the runtime thresholds
    Thresholds {
        #[command(subcommand)]
        action: Option<ThresholdAction>,
    },

    /// Show or toggle rules
    Rules {
        #[command(subcommand)]
        action: Option<RuleAction>,
    },

    /// Show the manual review queue
    Queue {
        /// Maximum number of entries to show, newest first
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ThresholdAction {
    /// Override one or both thresholds
    Set {
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        radius_km: Option<f64>,
    },
}

#[derive(Subcommand)]
enum RuleAction {
    Enable { rule: RuleId },
    Disable { rule: RuleId },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = AppContext::load_config(cli.config.as_deref())?;
    let ctx = AppContext::new(&cli.data, config).await?;

    match cli.command {
        Commands::Evaluate {
            json: Some(json), ..
        } => {
            commands::evaluate_json(&ctx, &json).await?;
        }

        Commands::Evaluate {
            user,
            amount,
            lat,
            lon,
            kind,
            device,
            timestamp,
            description,
            id,
            json: None,
        } => {
            let (Some(user), Some(amount), Some(latitude), Some(longitude)) = (user, amount, lat, lon)
            else {
                anyhow::bail!("--user, --amount, --lat and --lon are required without --json");
            };
            let args = commands::TransactionArgs {
                id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                user,
                amount,
                latitude,
                longitude,
                kind,
                device,
                timestamp,
                description,
            };
            commands::evaluate(&ctx, &args).await?;
        }

        Commands::Review {
            transaction_id,
            decision,
            analyst,
        } => {
            commands::review(&ctx, &transaction_id, &decision, &analyst).await?;
        }

        Commands::Authenticate {
            transaction_id,
            denied,
        } => {
            commands::authenticate(&ctx, &transaction_id, !denied).await?;
        }

        Commands::Show { transaction_id } => {
            commands::show(&ctx, &transaction_id).await?;
        }

        Commands::List { user, limit } => {
            commands::list(&ctx, user.as_deref(), limit).await?;
        }

        Commands::Thresholds { action } => match action {
            None => commands::thresholds_show(&ctx).await?,
            Some(ThresholdAction::Set { amount, radius_km }) => {
                commands::thresholds_set(&ctx, amount, radius_km).await?;
            }
        },

        Commands::Rules { action } => match action {
            None => commands::rules_list(&ctx).await?,
            Some(RuleAction::Enable { rule }) => commands::rules_set(&ctx, rule, true).await?,
            Some(RuleAction::Disable { rule }) => commands::rules_set(&ctx, rule, false).await?,
        },

        Commands::Queue { limit } => {
            commands::queue(&ctx, limit)?;
        }
    }

    Ok(())
}
