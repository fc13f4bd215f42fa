//! PerkPocket CLI - Main entry point

mod commands;
mod state;

use clap::{Parser, Subcommand, ValueEnum};
use commands::offers::ListArgs;
use perkpocket_catalog::SortKey;
use perkpocket_core::Result;
use state::AppServices;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "perkpocket")]
#[command(about = "PerkPocket affiliate offer marketplace", version)]
struct Cli {
    /// Base URL the offers and networks documents are fetched from
    #[arg(long, default_value = "https://perkpocket.app/")]
    catalog_url: String,

    /// Read the offers and networks documents from a local directory
    /// instead of fetching them
    #[arg(long)]
    catalog_dir: Option<PathBuf>,

    /// Directory holding local state; defaults to the platform data dir
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Referral id this visit arrived through
    #[arg(long)]
    referred_by: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse offers with optional filters
    Offers {
        /// Market code (AU, UK)
        #[arg(long)]
        market: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        /// Free-text search over title, description, category, and region
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_enum, default_value_t = SortKeyCli::Featured)]
        sort: SortKeyCli,
    },
    /// Print the tracked outbound URL for an offer
    Open { offer_id: String },
    /// Record a completion of an offer
    Complete { offer_id: String },
    /// Mark a pending completion as paid
    MarkPaid { offer_id: String },
    /// Show earnings, completions, and today's allowance
    Dashboard,
    /// Export the full analytics report as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete all recorded analytics for this installation
    ClearData,
    /// Curate a local offers document
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortKeyCli {
    Featured,
    Alphabetical,
    Category,
    Region,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// List the records in an offers document
    List {
        #[arg(long, default_value = "offers.json")]
        file: PathBuf,
    },
    /// Add an offer
    Add {
        #[arg(long, default_value = "offers.json")]
        file: PathBuf,
        /// Id to store the offer under; derived from the title if omitted
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Market code (AU, UK)
        #[arg(long)]
        market: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        payout: f64,
        /// Key into the networks document
        #[arg(long)]
        network: Option<String>,
        #[arg(long)]
        url: String,
        #[arg(long)]
        sub_id: Option<String>,
    },
    /// Update fields of an existing offer
    Update {
        id: String,
        #[arg(long, default_value = "offers.json")]
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Market code (AU, UK)
        #[arg(long)]
        market: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        #[arg(long)]
        payout: Option<f64>,
        /// Key into the networks document
        #[arg(long)]
        network: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        sub_id: Option<String>,
    },
    /// Remove an offer
    Remove {
        id: String,
        #[arg(long, default_value = "offers.json")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        // Admin editing is local-only; it needs neither the catalog nor the
        // store
        Commands::Admin { command } => commands::admin::run(command),
        command => {
            run_session(
                &cli.catalog_url,
                cli.catalog_dir,
                cli.data_dir,
                cli.referred_by,
                command,
            )
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run_session(
    catalog_url: &str,
    catalog_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    referred_by: Option<String>,
    command: Commands,
) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| {
        dirs_next::data_local_dir()
            .map(|p| p.join("PerkPocket"))
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let mut services = AppServices::new(catalog_url, catalog_dir.as_deref(), &data_dir).await;

    services.begin_session(referred_by.as_deref());

    let result = match command {
        Commands::Offers {
            market,
            category,
            subcategory,
            query,
            sort,
        } => {
            let sort = match sort {
                SortKeyCli::Featured => SortKey::Featured,
                SortKeyCli::Alphabetical => SortKey::Alphabetical,
                SortKeyCli::Category => SortKey::Category,
                SortKeyCli::Region => SortKey::Region,
            };
            commands::offers::list(
                &mut services,
                ListArgs {
                    market,
                    category,
                    subcategory,
                    query,
                    sort,
                },
            )
        }
        Commands::Open { offer_id } => commands::offers::open(&mut services, &offer_id),
        Commands::Complete { offer_id } => {
            commands::completions::complete(&mut services, &offer_id)
        }
        Commands::MarkPaid { offer_id } => {
            commands::completions::mark_paid(&mut services, &offer_id)
        }
        Commands::Dashboard => commands::completions::dashboard(&mut services),
        Commands::Export { out } => commands::report::export(&mut services, out.as_deref()),
        Commands::ClearData => commands::report::clear(&mut services),
        // Dispatched before services are built
        Commands::Admin { .. } => Ok(()),
    };

    services.end_session();
    result
}
