//! Ledgerdesk main entry point

mod console;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use ledgerdesk_config::{Config, TableConfig};
use ledgerdesk_core::{Fixtures, InMemorySource, Ledger, PagedTableController, Record, Seed, Transaction};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::console::Console;

/// Table to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TableName {
    Categories,
    PaymentModes,
    BankAccounts,
    Transactions,
}

#[derive(Parser, Debug)]
#[command(name = "ledgerdesk")]
#[command(version = "0.1.0")]
#[command(about = "Browse and edit personal finance records from the terminal", long_about = None)]
struct Args {
    /// Configuration file path; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Table to open
    #[arg(short, long, value_enum, default_value = "transactions")]
    table: TableName,

    /// JSON fixtures file, overrides `data.fixtures`
    #[arg(short, long)]
    fixtures: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::load(path.clone()).map_err(|e| anyhow::anyhow!("{}", e.to_details()))?,
        None => Config::default(),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str()))
        .init();
    log::info!("Opening table {:?}", args.table);

    let fixtures = match args.fixtures.as_ref().or(config.data.fixtures.as_ref()) {
        Some(path) => Fixtures::load(path)?,
        None => {
            log::info!("No fixtures configured, using demo data");
            Fixtures::demo()
        }
    };

    let ledger = Arc::new(Ledger::new(fixtures, &config.tables, &config.data));

    let rt = Runtime::new().context("Failed to start the async runtime")?;
    rt.block_on(async {
        let tables = &config.tables;
        match args.table {
            TableName::Categories => open(ledger.categories.clone(), &tables.categories, ledger, None).await,
            TableName::PaymentModes => open(ledger.payment_modes.clone(), &tables.payment_modes, ledger, None).await,
            TableName::BankAccounts => open(ledger.bank_accounts.clone(), &tables.bank_accounts, ledger, None).await,
            TableName::Transactions => {
                // The report view opens on the transactions list with its first page prefetched
                let first = Seed::<Transaction>::first_page(&*ledger.transactions, &tables.transactions).await;
                let seed = match first {
                    Ok(seed) => Some(seed),
                    Err(e) => {
                        log::warn!("Prefetching the first transactions page failed: {}", e);
                        None
                    }
                };
                println!("{}", console::render_summary(&ledger.this_month()));
                open(ledger.transactions.clone(), &tables.transactions, ledger, seed).await
            }
        }
    })
}

/// Drive the table served by `source` from stdin
async fn open<R: Record>(
    source: Arc<InMemorySource<R>>,
    table: &TableConfig,
    ledger: Arc<Ledger>,
    seed: Option<Seed<R>>,
) -> anyhow::Result<()> {
    let controller = Arc::new(PagedTableController::new(source, table.clone())?);
    Console::new(controller, ledger).with_seed(seed).run().await
}
