//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use permit_registry::AccountId;

/// Permit - permissioned token ledger.
#[derive(Parser, Debug, Clone)]
#[command(name = "permit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the persisted ledger state.
    #[arg(short, long, env = "PERMIT_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Host configuration file (JSON).
    #[arg(long, env = "PERMIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Account issuing the call: `admin`, `@label` or a base58 id.
    #[arg(short, long, env = "PERMIT_CALLER", default_value = "admin", value_parser = parse_account)]
    pub caller: AccountId,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the account id derived from a label.
    Address {
        /// Label to derive from.
        label: String,
    },

    /// Create the caller's permission record and balance.
    Init,

    /// Grant minter status (administrator only).
    GrantMinter {
        /// Account to grant.
        #[arg(value_parser = parse_account)]
        target: AccountId,
    },

    /// Revoke minter status (administrator only).
    RevokeMinter {
        /// Account to revoke.
        #[arg(value_parser = parse_account)]
        target: AccountId,
    },

    /// Blacklist an account (administrator only).
    GrantBlacklist {
        /// Account to blacklist.
        #[arg(value_parser = parse_account)]
        target: AccountId,
    },

    /// Remove an account from the blacklist (administrator only).
    RevokeBlacklist {
        /// Account to clear.
        #[arg(value_parser = parse_account)]
        target: AccountId,
    },

    /// Mint new tokens and deposit them.
    Mint {
        /// Amount to mint.
        amount: u64,

        /// Payee; defaults to the caller.
        #[arg(long, value_parser = parse_account)]
        to: Option<AccountId>,
    },

    /// Withdraw from the caller and deposit to another account.
    Transfer {
        /// Payee.
        #[arg(value_parser = parse_account)]
        to: AccountId,

        /// Amount to move.
        amount: u64,
    },

    /// Withdraw from the caller and destroy the tokens (minters only).
    Burn {
        /// Amount to destroy.
        amount: u64,
    },

    /// Show the caller's balance.
    Balance,

    /// Show the caller's permission record.
    Capability,

    /// Show supply totals.
    Supply,

    /// Show recent calls.
    History {
        /// Maximum number of calls to show.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

/// Parses an account argument.
///
/// Accepts `admin` for the administrator, `@label` for a derived account,
/// or a base58 account id.
///
/// # Errors
///
/// Returns a message if the value is none of the above.
pub fn parse_account(value: &str) -> Result<AccountId, String> {
    if value == "admin" {
        return Ok(AccountId::ADMINISTRATOR);
    }
    if let Some(label) = value.strip_prefix('@') {
        if label.is_empty() {
            return Err("label after '@' must not be empty".to_string());
        }
        return Ok(AccountId::derive(label));
    }
    value.parse().map_err(|e| format!("{e}"))
}
