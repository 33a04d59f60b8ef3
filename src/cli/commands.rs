use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::storage::Queue;

#[derive(Parser)]
#[command(name = "ram-reclaim")]
#[command(about = "Batch RAM reclaim for queued ledger accounts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Account invoking the operation (defaults to the contract account)
    #[arg(short, long, global = true)]
    pub actor: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file and initialize the database
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Queue accounts for RAM reclamation
    Add {
        /// Account names
        #[arg(required = true)]
        accounts: Vec<String>,
    },

    /// Remove accounts from both the pending and skipped lists
    Remove {
        /// Account names
        #[arg(required = true)]
        accounts: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Sell RAM from up to N pending accounts
    Sellram {
        /// Batch size (defaults to reclaim.batch_size)
        #[arg(short = 'n', long)]
        count: Option<u8>,
    },

    /// Move up to N skipped accounts back to pending (pending must be empty)
    Retry {
        /// Batch size (defaults to reclaim.batch_size)
        #[arg(short = 'n', long)]
        count: Option<u8>,
    },

    /// Preview what selling an account's RAM would yield
    Quote {
        /// Account name
        account: String,
    },

    /// List queued accounts
    List {
        /// Which list: pending, skipped, or all
        #[arg(short, long, default_value = "all")]
        queue: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show statistics
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show recent reclaim operations
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Drain the pending list in batches
    Auto {
        /// Batch size (defaults to reclaim.batch_size)
        #[arg(short = 'n', long)]
        count: Option<u8>,

        /// Delay between batches in milliseconds (defaults to reclaim.batch_delay_ms)
        #[arg(short, long)]
        delay_ms: Option<u64>,
    },
}

/// Resolve the `--queue` filter; `None` means both lists
pub fn parse_queue_filter(filter: &str) -> Result<Option<Queue>, String> {
    match filter.to_lowercase().as_str() {
        "all" => Ok(None),
        other => other.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sellram() {
        let cli = Cli::try_parse_from(["ram-reclaim", "sellram", "-n", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Sellram { count: Some(5) }));
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(cli.actor.is_none());
    }

    #[test]
    fn test_batch_size_is_bounded() {
        assert!(Cli::try_parse_from(["ram-reclaim", "retry", "-n", "300"]).is_err());
    }

    #[test]
    fn test_add_requires_accounts() {
        assert!(Cli::try_parse_from(["ram-reclaim", "add"]).is_err());

        let cli =
            Cli::try_parse_from(["ram-reclaim", "--actor", "owner", "add", "alice", "bob"]).unwrap();
        assert_eq!(cli.actor.as_deref(), Some("owner"));
        match cli.command {
            Commands::Add { accounts } => assert_eq!(accounts, vec!["alice", "bob"]),
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_queue_filter() {
        assert_eq!(parse_queue_filter("all").unwrap(), None);
        assert_eq!(parse_queue_filter("Skipped").unwrap(), Some(Queue::Skipped));
        assert!(parse_queue_filter("archive").is_err());
    }
}
