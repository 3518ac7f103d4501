use std::error::Error;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use ledger::{ChartImportRow, Ledger, MoneyCents};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

/// Starter farm chart seeded by `chart seed`. Codes follow the usual
/// 1xxx-asset .. 5xxx+-expense convention; type hints run through the same
/// mapping table as an external chart import.
const DEFAULT_CHART: &[(&str, &str, &str)] = &[
    ("1010", "Farm Checking", "bank"),
    ("1020", "Farm Savings", "bank"),
    ("1100", "Accounts Receivable", "accounts_receivable"),
    ("1200", "Crop Inventory", "other_current_asset"),
    ("1500", "Machinery & Equipment", "fixed_asset"),
    ("2010", "Accounts Payable", "accounts_payable"),
    ("2100", "Farm Credit Card", "credit_card"),
    ("2500", "Equipment Loan", "loan"),
    ("3000", "Owner's Equity", "equity"),
    ("4010", "Produce Sales", "income"),
    ("4020", "Livestock Sales", "income"),
    ("4900", "Other Farm Income", "other_income"),
    ("5010", "Seed & Supplies", "cost_of_goods_sold"),
    ("5020", "Feed", "cost_of_goods_sold"),
    ("6010", "Fuel & Oil", "expense"),
    ("6020", "Repairs & Maintenance", "expense"),
    ("6100", "Utilities", "expense"),
    ("6200", "Insurance", "expense"),
    ("6900", "Miscellaneous Expense", "other_expense"),
];

#[derive(Parser, Debug)]
#[command(name = "barnledger_admin")]
#[command(about = "Admin utilities for Barnledger (bootstrap businesses/charts/bank links)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./barnledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Business(Business),
    Chart(Chart),
    Bank(Bank),
}

#[derive(Args, Debug)]
struct Business {
    #[command(subcommand)]
    command: BusinessCommand,
}

#[derive(Subcommand, Debug)]
enum BusinessCommand {
    Create(BusinessCreateArgs),
}

#[derive(Args, Debug)]
struct BusinessCreateArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Chart {
    #[command(subcommand)]
    command: ChartCommand,
}

#[derive(Subcommand, Debug)]
enum ChartCommand {
    /// Seed the default farm chart of accounts for a business.
    Seed(ChartSeedArgs),
}

#[derive(Args, Debug)]
struct ChartSeedArgs {
    #[arg(long)]
    business: String,
}

#[derive(Args, Debug)]
struct Bank {
    #[command(subcommand)]
    command: BankCommand,
}

#[derive(Subcommand, Debug)]
enum BankCommand {
    /// Link a bank-feed source reference to a GL account.
    Link(BankLinkArgs),
    /// Remove a bank-feed source link.
    Unlink(BankUnlinkArgs),
}

#[derive(Args, Debug)]
struct BankLinkArgs {
    #[arg(long)]
    business: String,
    /// External bank-account reference (or "manual").
    #[arg(long)]
    source: String,
    /// Display code of the GL account taking the automatic counter-leg.
    #[arg(long)]
    account_code: String,
}

#[derive(Args, Debug)]
struct BankUnlinkArgs {
    #[arg(long)]
    business: String,
    #[arg(long)]
    source: String,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ledger=info".to_string()),
        )
        .init();

    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let ledger = Ledger::builder().database(db.clone()).build().await?;

    match cli.command {
        Command::Business(Business {
            command: BusinessCommand::Create(args),
        }) => {
            let business_id = ledger.create_business(&args.name, Utc::now()).await?;
            println!("created business: {} ({business_id})", args.name);
        }
        Command::Chart(Chart {
            command: ChartCommand::Seed(args),
        }) => {
            let rows: Vec<ChartImportRow> = DEFAULT_CHART
                .iter()
                .map(|(code, name, type_hint)| ChartImportRow {
                    code: (*code).to_string(),
                    name: (*name).to_string(),
                    type_hint: (*type_hint).to_string(),
                    opening_balance: MoneyCents::ZERO,
                })
                .collect();
            let today = Utc::now().date_naive();
            let summary = ledger
                .bootstrap_chart(&args.business, &rows, today, Utc::now())
                .await?;
            println!("seeded {} accounts", summary.imported);
            for skipped in &summary.skipped {
                eprintln!("skipped {}: {}", skipped.label, skipped.error);
            }
            for warning in &summary.warnings {
                eprintln!("warning: {warning}");
            }
        }
        Command::Bank(Bank {
            command: BankCommand::Link(args),
        }) => {
            let accounts = ledger.list_accounts(&args.business, false).await?;
            let Some(account) = accounts.iter().find(|a| a.code == args.account_code) else {
                eprintln!("account code not found: {}", args.account_code);
                std::process::exit(1);
            };
            ledger
                .link_bank_account(&args.business, &args.source, account.id)
                .await?;
            println!(
                "linked source {} -> {} {}",
                args.source, account.code, account.name
            );
        }
        Command::Bank(Bank {
            command: BankCommand::Unlink(args),
        }) => {
            ledger.unlink_bank_account(&args.business, &args.source).await?;
            println!("unlinked source {}", args.source);
        }
    }

    Ok(())
}
