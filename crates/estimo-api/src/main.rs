use std::sync::Arc;

use clap::{Parser, Subcommand};
use estimo_api::config::EstimoConfig;
use estimo_api::{AppState, create_app, load_catalog, tracing_setup};
use estimo_calculator::CalculatorRegistry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "estimo", version, about = "Calculator pipeline pricing engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// List registered calculators
    Calculators {
        /// Include host-injected system calculators
        #[arg(long)]
        include_system: bool,
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what the engine does
    Explain,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => start_server().await,
        Command::Calculators { include_system, json } => list_calculators(include_system, json),
        Command::Explain => {
            explain_command();
            Ok(())
        }
    }
}

fn explain_command() {
    println!("Estimo - calculator pipeline pricing engine");
    println!("Runs an ordered sequence of pricing calculators over catalog items.");
    println!("\nFeatures:");
    println!("  - Position constraints validated before any stage runs");
    println!("  - Per-stage failure isolation with accumulated price components");
    println!("  - Tiered markup with rounding and marketing prices on the final stage");
    println!("  - Parallel batch runs with dry-run and commit modes");
}

fn list_calculators(include_system: bool, json: bool) -> anyhow::Result<()> {
    let registry = CalculatorRegistry::with_built_ins();
    let calculators = registry.list_calculators(include_system);

    if json {
        println!("{}", serde_json::to_string_pretty(&calculators)?);
        return Ok(());
    }

    for descriptor in calculators {
        let requires = if descriptor.requires_before.is_empty() {
            String::new()
        } else {
            format!(" (after {})", descriptor.requires_before.join(", "))
        };
        let first = if descriptor.can_be_first { " [first]" } else { "" };
        println!(
            "{:<16} {:<10} {}{}{}",
            descriptor.code, descriptor.group, descriptor.title, first, requires
        );
    }
    Ok(())
}

async fn start_server() -> anyhow::Result<()> {
    let config = tracing::subscriber::with_default(tracing_setup::bootstrap_subscriber(), || {
        EstimoConfig::load().map(EstimoConfig::apply_profile)
    })?;
    tracing_setup::init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment.env_type,
        "Starting Estimo pricing engine"
    );

    let catalog = Arc::new(load_catalog(&config)?);
    let addr = config.bind_address();
    let app = create_app(AppState::new(config, catalog));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Web server started successfully");

    axum::serve(listener, app).await?;
    Ok(())
}
