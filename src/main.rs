use clap::Parser;
use colored::*;
use tracing::{error, info};

use ram_reclaim::{
    auth::OwnerAuth,
    chain::{AccountName, SnapshotLedger},
    cli::{commands::parse_queue_filter, Cli, Commands},
    config::Config,
    error::{self, ReclaimError},
    reclaim::{AccountOutcome, BatchProcessor},
    storage::{Database, Queue},
    utils, RamReclaimContract,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ram_reclaim=debug,info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let actor = cli.actor.clone();
    let result = match cli.command {
        Commands::Init { force } => {
            info!("Initializing...");
            initialize(&config, &cli.config, force)
        }

        Commands::Add { accounts } => add_accounts(&config, actor, &accounts),

        Commands::Remove { accounts, yes } => remove_accounts(&config, actor, &accounts, yes),

        Commands::Sellram { count } => {
            let n = count.unwrap_or(config.reclaim.batch_size);
            info!("Selling RAM from up to {} accounts", n);
            sell_ram(&config, actor, n)
        }

        Commands::Retry { count } => {
            let n = count.unwrap_or(config.reclaim.batch_size);
            retry_skipped(&config, actor, n)
        }

        Commands::Quote { account } => quote_account(&config, &account),

        Commands::List { queue, format } => list_accounts(&config, &queue, &format),

        Commands::Stats { format } => {
            info!("Generating statistics...");
            show_stats(&config, &format)
        }

        Commands::History { limit } => show_history(&config, limit),

        Commands::Auto { count, delay_ms } => {
            let n = count.unwrap_or(config.reclaim.batch_size);
            let delay = delay_ms.unwrap_or(config.reclaim.batch_delay_ms);
            info!("Starting automated reclaim (batch size: {}, delay: {}ms)", n, delay);
            run_auto(&config, actor, n, delay).await
        }
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn open_contract(config: &Config) -> error::Result<RamReclaimContract<SnapshotLedger>> {
    let settings = config.settings()?;
    let db = Database::new(&config.database_path())?;
    let ledger = SnapshotLedger::open(
        &config.snapshot_path(),
        settings.calculator,
        settings.market_symbol.clone(),
    )?;
    Ok(RamReclaimContract::new(db, ledger, settings))
}

/// Authenticate `actor` (or the contract account itself) at the boundary
fn authorize(
    contract: &RamReclaimContract<SnapshotLedger>,
    actor: Option<String>,
) -> error::Result<OwnerAuth> {
    let actor = match actor {
        Some(name) => name.parse::<AccountName>()?,
        None => contract.settings().contract.clone(),
    };
    contract.require_auth(&actor)
}

fn parse_accounts(accounts: &[String]) -> error::Result<Vec<AccountName>> {
    accounts.iter().map(|a| a.parse::<AccountName>()).collect()
}

fn initialize(config: &Config, path: &std::path::Path, force: bool) -> error::Result<()> {
    println!("{}", "Initializing RAM reclaim...".green());

    if path.exists() && !force {
        println!("Configuration {} already exists (use --force to overwrite)", path.display());
    } else {
        std::fs::write(path, config.to_toml()?)?;
        println!("{}", format!("✓ Configuration written to {}", path.display()).green());
    }

    let _db = Database::new(&config.database_path())?;
    println!("{}", "✓ Database initialized".green());

    println!("\n{}", "Configuration:".cyan());
    println!("  Contract:       {}", config.contract.account);
    println!("  RAM market:     {}", config.chain.ram_market_symbol);
    println!("  Core symbol:    {}", config.chain.core_symbol);
    println!("  Reserved bytes: {}", config.reclaim.reserved_bytes);
    println!("  Fee:            1/{}", config.reclaim.fee_denominator);
    println!("  Batch size:     {}", config.reclaim.batch_size);
    println!("  Ledger:         {}", config.ledger.snapshot_path);

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to queue accounts", "ram-reclaim add <account>...".yellow());
    println!("  {} to reclaim a batch", "ram-reclaim sellram -n 10".yellow());
    Ok(())
}

fn add_accounts(config: &Config, actor: Option<String>, accounts: &[String]) -> error::Result<()> {
    let mut contract = open_contract(config)?;
    let auth = authorize(&contract, actor)?;
    let accounts = parse_accounts(accounts)?;

    let added = contract.add(&auth, &accounts)?;
    println!(
        "{}",
        format!("✓ Queued {} of {} accounts", added, accounts.len()).green()
    );
    Ok(())
}

fn remove_accounts(
    config: &Config,
    actor: Option<String>,
    accounts: &[String],
    yes: bool,
) -> error::Result<()> {
    let mut contract = open_contract(config)?;
    let auth = authorize(&contract, actor)?;
    let accounts = parse_accounts(accounts)?;

    if !yes && !utils::confirm_action(&format!("Remove {} accounts from both lists?", accounts.len()))? {
        println!("Cancelled");
        return Ok(());
    }

    let removed = contract.remove(&auth, &accounts)?;
    println!("{}", format!("✓ Removed {} accounts", removed).green());
    Ok(())
}

fn sell_ram(config: &Config, actor: Option<String>, n: u8) -> error::Result<()> {
    let mut contract = open_contract(config)?;
    let auth = authorize(&contract, actor)?;

    let summary = contract.sellram(&auth, n)?;
    let symbol = &contract.settings().core_symbol;

    for (account, outcome) in &summary.results {
        match outcome {
            AccountOutcome::Reclaimed { bytes_sold, recovered, .. } => println!(
                "  {} {:<12} sold {:>12}  recovered {}",
                "✓".green(),
                account.to_string(),
                utils::format_bytes(*bytes_sold),
                utils::format_asset(*recovered, symbol)
            ),
            AccountOutcome::Skipped(reason) => println!(
                "  {} {:<12} {}",
                "✗".red(),
                account.to_string(),
                reason.to_string().yellow()
            ),
        }
    }
    summary.print_summary(symbol);
    Ok(())
}

fn retry_skipped(config: &Config, actor: Option<String>, n: u8) -> error::Result<()> {
    let mut contract = open_contract(config)?;
    let auth = authorize(&contract, actor)?;

    let moved = contract.retry(&auth, n)?;
    println!("{}", format!("✓ Requeued {} skipped accounts", moved.len()).green());
    for account in moved {
        println!("  {}", account);
    }
    Ok(())
}

fn quote_account(config: &Config, account: &str) -> error::Result<()> {
    let contract = open_contract(config)?;
    let account: AccountName = account.parse()?;
    let quote = contract.quote(&account)?;
    let settings = contract.settings();
    let symbol = &settings.core_symbol;

    let listed = if contract.database().contains(Queue::Pending, &account)? {
        "pending"
    } else if contract.database().contains(Queue::Skipped, &account)? {
        "skipped"
    } else {
        "not queued"
    };

    println!("{}", format!("=== RAM quote for {} ===", account).cyan().bold());
    println!("  Status:       {}", listed);
    println!("  Owned:        {}", utils::format_bytes(quote.owned_bytes));
    println!(
        "  Reserved:     {}",
        utils::format_bytes(settings.calculator.reserved_bytes())
    );
    println!("  Reclaimable:  {}", utils::format_bytes(quote.reclaimable_bytes.max(0)));
    println!("  Proceeds:     {}", utils::format_asset(quote.proceeds, symbol));
    println!("  Fee:          {}", utils::format_asset(quote.fee, symbol));
    println!("  Recoverable:  {}", utils::format_asset(quote.recoverable, symbol));
    if !quote.is_viable() {
        println!("{}", "  This account would be skipped".yellow());
    }
    Ok(())
}

fn list_accounts(config: &Config, filter: &str, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database_path())?;
    let queues = match parse_queue_filter(filter).map_err(ReclaimError::Config)? {
        Some(queue) => vec![queue],
        None => vec![Queue::Pending, Queue::Skipped],
    };

    if format == "json" {
        let mut lists = serde_json::Map::new();
        for queue in queues {
            lists.insert(queue.to_string(), serde_json::to_value(db.accounts(queue)?)?);
        }
        println!("{}", serde_json::to_string_pretty(&lists)?);
        return Ok(());
    }

    for queue in queues {
        let records = db.accounts(queue)?;
        println!("\n{}", format!("{} accounts ({})", queue, records.len()).cyan().bold());
        utils::print_table_border(30);
        utils::print_table_row(&["#", "Account"], &[8, 14]);
        utils::print_table_border(30);
        for (position, record) in records.iter().enumerate() {
            utils::print_table_row(
                &[&(position + 1).to_string(), record.account_name.as_str()],
                &[8, 14],
            );
        }
    }
    Ok(())
}

fn show_stats(config: &Config, format: &str) -> error::Result<()> {
    let db = Database::new(&config.database_path())?;
    let stats = db.get_stats()?;
    let symbol = config.core_symbol()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== RAM Reclaim Statistics ===".cyan().bold());
    println!("\nAccounts:");
    println!("  Pending:    {}", stats.pending_accounts.to_string().green());
    println!("  Skipped:    {}", stats.skipped_accounts.to_string().yellow());

    println!("\nOperations:");
    println!("  Reclaimed:  {}", stats.reclaimed_operations);
    println!("  Skipped:    {}", stats.skipped_operations);
    println!("  Bytes sold: {}", utils::format_bytes(stats.total_bytes_sold));
    println!("  Recovered:  {}", utils::format_asset(stats.total_recovered, &symbol));
    Ok(())
}

fn show_history(config: &Config, limit: usize) -> error::Result<()> {
    let db = Database::new(&config.database_path())?;
    let history = db.get_reclaim_history(Some(limit))?;
    let symbol = config.core_symbol()?;

    if history.is_empty() {
        println!("No reclaim operations recorded yet");
        return Ok(());
    }

    println!("{}", "Recent Reclaim Operations:".yellow());
    utils::print_table_border(100);
    utils::print_table_row(
        &["Timestamp", "Account", "Outcome", "Recovered", "Reason"],
        &[24, 14, 10, 20, 26],
    );
    utils::print_table_border(100);

    for op in history {
        utils::print_table_row(
            &[
                &utils::format_timestamp(&op.timestamp),
                op.account_name.as_str(),
                &op.outcome.to_string(),
                &utils::format_asset(op.recovered, &symbol),
                op.reason.as_deref().unwrap_or(""),
            ],
            &[24, 14, 10, 20, 26],
        );
    }
    utils::print_table_border(100);
    Ok(())
}

async fn run_auto(config: &Config, actor: Option<String>, n: u8, delay_ms: u64) -> error::Result<()> {
    let mut contract = open_contract(config)?;
    let auth = authorize(&contract, actor)?;

    let processor = BatchProcessor::new(n, delay_ms)?;
    let summary = processor.drain(&mut contract, &auth).await?;

    summary.print_summary(&contract.settings().core_symbol);
    let skipped = contract.database().count(Queue::Skipped)?;
    if skipped > 0 {
        println!(
            "\n{} accounts skipped; run {} once reviewed",
            skipped,
            "ram-reclaim retry".yellow()
        );
    }
    Ok(())
}
