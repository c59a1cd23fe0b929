//! CLI module for the finance data layer
//!
//! Runs the fixture API server or queries the configured data source
//! from the terminal.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::{
    configuration::{get_configuration, set_configuration, Config},
    error::Error,
    helpers::{format_currency, format_percent, month_label},
    model::{Transaction, TransactionFilters, TransactionPatch},
    month::{Month, MonthState, UrlNavigator},
    palette::CommandPalette,
    provider::Api,
    query::QueryClient,
};

pub const DEFAULT_URL: &str = "http://localhost/dashboard";

/// Finanzas data layer
#[derive(Parser)]
#[command(name = "finanzas")]
#[command(about = "Month-scoped personal finance data layer", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the fixture API server (default if no command specified)
    Serve,

    /// Show the dashboard summary of a month
    Dashboard {
        /// Month as YYYY-MM, current month when omitted
        #[arg(long)]
        month: Option<String>,
    },

    /// List the transactions of a month
    Transactions {
        #[arg(long)]
        month: Option<String>,

        /// Category id
        #[arg(long)]
        category: Option<String>,

        /// Account id
        #[arg(long)]
        account: Option<String>,
    },

    /// Update fields of a transaction
    Update {
        id: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        amount: Option<i64>,

        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },

    /// Derive or move the selected month of a dashboard URL
    Month {
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,

        #[command(subcommand)]
        action: Option<MonthAction>,
    },

    /// Check the backend health
    Health,

    /// Search the command palette entries
    Palette {
        query: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MonthAction {
    Next,
    Prev,
    /// Select the month of a date (YYYY-MM or YYYY-MM-DD)
    Set { date: String },
}

/// Initialize configuration and return Config
pub fn init_config() -> Result<Config, Error> {
    set_configuration()?;
    get_configuration()
}

fn query_client(config: &Config) -> Result<QueryClient, Error> {
    let api = Api::from_config(config)?;
    Ok(QueryClient::new(api, config.query_options()))
}

fn resolve_month(month: Option<String>) -> Result<Month, Error> {
    match month {
        Some(month) => month.parse::<Month>(),
        None => Ok(Month::current()),
    }
}

pub async fn run_dashboard(month: Option<String>) -> Result<(), Error> {
    let config = init_config()?;
    let client = query_client(&config)?;
    let month = resolve_month(month)?;

    info!("Fetching dashboard for {}", month);
    let summary = client.fetch_dashboard(&month.to_string()).await?;

    println!("{} · {}", config.app_name, month_label(month));
    println!("Gasto total      {}", format_currency(Some(summary.total_spent)));
    println!("Balance          {}", format_currency(Some(summary.balance)));
    println!(
        "Uso presupuesto  {} de {}",
        format_percent(summary.budget_usage_percent),
        format_currency(summary.budget_total())
    );
    println!();
    for item in &summary.spending_by_category {
        println!("  {:<14} {:>12}", item.category, format_currency(Some(item.amount)));
    }
    println!();
    for item in &summary.top_categories {
        println!(
            "  #{} {:<11} {:>12} {:>5}",
            item.id,
            item.name,
            format_currency(Some(item.amount)),
            format_percent(item.percent_of_total)
        );
    }

    Ok(())
}

pub async fn run_transactions(
    month: Option<String>,
    category: Option<String>,
    account: Option<String>,
) -> Result<(), Error> {
    let config = init_config()?;
    let client = query_client(&config)?;
    let month = resolve_month(month)?;

    let filters = TransactionFilters {
        month: month.to_string(),
        category,
        account,
    };
    info!("Fetching transactions {:?}", filters);
    let items = client.fetch_transactions(&filters).await?;

    if items.is_empty() {
        println!("Sin transacciones para {}", month_label(month));
    }
    for item in &items {
        print_transaction(item);
    }

    Ok(())
}

pub async fn run_update(
    id: String,
    description: Option<String>,
    amount: Option<i64>,
    date: Option<String>,
) -> Result<(), Error> {
    let patch = TransactionPatch {
        date: date.as_deref().map(parse_date).transpose()?,
        description,
        amount,
        ..Default::default()
    };
    if patch.is_empty() {
        return Err(Error::InvalidOption {
            option: String::from("update needs --description, --amount or --date"),
        });
    }

    let config = init_config()?;
    let client = query_client(&config)?;
    let updated = client.update_transaction(&id, &patch).await?;
    print_transaction(&updated);

    Ok(())
}

pub fn run_month(url: String, action: Option<MonthAction>) -> Result<(), Error> {
    let mut state = MonthState::new(UrlNavigator::parse(&url)?);

    let month = match action {
        None => state.current_month(),
        Some(MonthAction::Next) => state.next_month(),
        Some(MonthAction::Prev) => state.prev_month(),
        Some(MonthAction::Set { date }) => {
            let date = match date.parse::<Month>() {
                Ok(month) => month.anchor_date(),
                Err(_) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|_| Error::InvalidMonth(date.to_owned()))?,
            };
            state.set_month(&date)
        },
    };

    println!("{} ({})", month_label(month), month);
    println!("{}", state.navigator().current());

    Ok(())
}

pub async fn run_health() -> Result<(), Error> {
    let config = init_config()?;
    let client = query_client(&config)?;
    let status = client.fetch_health().await?;

    println!("{} ({})", status.status, client.api().source_name());
    Ok(())
}

pub fn run_palette(query: Option<String>) -> Result<(), Error> {
    let palette = CommandPalette::new();
    let entries = palette.search(query.as_deref().unwrap_or_default());

    if entries.is_empty() {
        println!("{}", crate::palette::EMPTY_MESSAGE);
        return Ok(());
    }

    let mut heading = None;
    for entry in entries {
        if heading != Some(entry.group) {
            heading = Some(entry.group);
            println!("{}", entry.group.heading());
        }
        println!("  {:<20} {}", entry.id, entry.label);
    }

    Ok(())
}

fn print_transaction(item: &Transaction) {
    println!(
        "{} {} {:<24} {:>12} {} · {} · {}",
        item.id,
        item.date.format("%Y-%m-%d"),
        item.description,
        format_currency(Some(item.amount)),
        item.category.name,
        item.account.name,
        item.payment_method.name
    );
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|date| date.and_utc())
        .ok_or_else(|| Error::InvalidOption {
            option: format!("--date {}", value),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-05-14").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 14, 12, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("2024-05-14T23:30:00-04:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 15, 3, 30, 0).unwrap()
        );
        assert!(matches!(
            parse_date("14/05/2024"),
            Err(Error::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_commands_parse() {
        let cli = Cli::try_parse_from([
            "finanzas",
            "transactions",
            "--month",
            "2024-05",
            "--category",
            "c1",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Transactions { month: Some(_), category: Some(_), account: None })
        ));

        let cli =
            Cli::try_parse_from(["finanzas", "month", "set", "2024-02"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Month { action: Some(MonthAction::Set { .. }), .. })
        ));
    }

    #[tokio::test]
    async fn test_update_without_fields_is_rejected() {
        let result = run_update(String::from("t1"), None, None, None).await;
        assert!(matches!(result, Err(Error::InvalidOption { .. })));
    }
}
