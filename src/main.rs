use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};

use finanzas::{
    cli::{self, Cli, Commands},
    configuration::{AppState, State},
    error::Error,
    provider::{Api, Mock},
    server,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let result = app_main().await;

    if let Err(err) = &result {
        error!("{}", err);
    }

    result
}

async fn app_main() -> Result<(), Error> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level({
            #[cfg(debug_assertions)]
            {
                Level::DEBUG
            }

            #[cfg(not(debug_assertions))]
            {
                Level::INFO
            }
        })
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::Dashboard { month } => cli::run_dashboard(month).await,
        Commands::Transactions {
            month,
            category,
            account,
        } => cli::run_transactions(month, category, account).await,
        Commands::Update {
            id,
            description,
            amount,
            date,
        } => cli::run_update(id, description, amount, date).await,
        Commands::Month { url, action } => cli::run_month(url, action),
        Commands::Health => cli::run_health().await,
        Commands::Palette { query } => cli::run_palette(query),
    }
}

async fn serve() -> Result<(), Error> {
    let config = cli::init_config()?;
    let api = Api::new(Arc::new(Mock::new()));
    let app_state = AppState::new(State::new(config, api));

    info!("Starting fixture server");
    tokio::try_join!(server::server_task(&app_state), shutdown())?;

    Ok(())
}

async fn shutdown() -> Result<(), Error> {
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    std::process::exit(0)
}
