//! Command implementations.
//!
//! Each mutating command is one host call, so a failure anywhere in it
//! rolls back everything it did.

use std::io::Write;

use permit_registry::AccountId;

use crate::cli::Commands;
use crate::error::Result;
use crate::host::Host;
use crate::output::{
    AddressView, BalanceView, CapabilityView, HistoryView, OutputFormat, Receipt, SupplyView,
};

/// Executes CLI commands against a host on behalf of one caller.
#[derive(Debug)]
pub struct LedgerCommand<'h> {
    host: &'h mut Host,
    caller: AccountId,
}

impl<'h> LedgerCommand<'h> {
    /// Create a command runner.
    pub fn new(host: &'h mut Host, caller: AccountId) -> Self {
        Self { host, caller }
    }

    /// Execute a command and write its result.
    ///
    /// # Errors
    ///
    /// Returns the call's abort, or an output error.
    pub fn execute<W: Write>(
        &mut self,
        writer: &mut W,
        format: &OutputFormat,
        command: &Commands,
    ) -> Result<()> {
        let caller = self.caller;
        match command {
            Commands::Address { label } => {
                let view = AddressView {
                    label: label.clone(),
                    account: AccountId::derive(label),
                };
                return format.write(writer, &view);
            }
            Commands::Init => {
                self.host.execute(caller, "init", |call| {
                    call.initialize_registry()?;
                    call.initialize_ledger()
                })?;
            }
            Commands::GrantMinter { target } => {
                self.host
                    .execute(caller, "grant-minter", |call| call.grant_minter(target))?;
            }
            Commands::RevokeMinter { target } => {
                self.host
                    .execute(caller, "revoke-minter", |call| call.revoke_minter(target))?;
            }
            Commands::GrantBlacklist { target } => {
                self.host.execute(caller, "grant-blacklist", |call| {
                    call.grant_blacklist(target)
                })?;
            }
            Commands::RevokeBlacklist { target } => {
                self.host.execute(caller, "revoke-blacklist", |call| {
                    call.revoke_blacklist(target)
                })?;
            }
            Commands::Mint { amount, to } => {
                let payee = to.unwrap_or(caller);
                self.host.execute(caller, &format!("mint {amount}"), |call| {
                    let proof = call.borrow_capability()?;
                    let token = call.mint(*amount, &proof)?;
                    call.deposit(&payee, token, &proof)
                })?;
            }
            Commands::Transfer { to, amount } => {
                self.host
                    .execute(caller, &format!("transfer {amount}"), |call| {
                        let proof = call.borrow_capability()?;
                        let token = call.withdraw(*amount, &proof)?;
                        call.deposit(to, token, &proof)
                    })?;
            }
            Commands::Burn { amount } => {
                self.host.execute(caller, &format!("burn {amount}"), |call| {
                    let proof = call.borrow_capability()?;
                    let token = call.withdraw(*amount, &proof)?;
                    call.burn(token, &proof)
                })?;
            }
            Commands::Balance => {
                let balance = self.host.execute(caller, "balance", |call| call.balance())?;
                let view = BalanceView {
                    account: caller,
                    balance,
                };
                return format.write(writer, &view);
            }
            Commands::Capability => {
                let record = self
                    .host
                    .execute(caller, "capability", |call| call.capability())?;
                return format.write(writer, &CapabilityView::new(caller, &record));
            }
            Commands::Supply => {
                let ledger = self.host.world().ledger();
                let view = SupplyView::new(ledger.supply(), ledger.balances().count());
                return format.write(writer, &view);
            }
            Commands::History { limit } => {
                let history = self.host.history();
                let skip = history.len().saturating_sub(*limit);
                let view = HistoryView {
                    calls: history[skip..].to_vec(),
                };
                return format.write(writer, &view);
            }
        }

        let receipt = Receipt {
            action: describe(command),
            caller,
        };
        format.write(writer, &receipt)
    }
}

fn describe(command: &Commands) -> String {
    match command {
        Commands::Init => "initialized".to_string(),
        Commands::GrantMinter { target } => format!("granted minter to {target}"),
        Commands::RevokeMinter { target } => format!("revoked minter from {target}"),
        Commands::GrantBlacklist { target } => format!("blacklisted {target}"),
        Commands::RevokeBlacklist { target } => format!("removed {target} from blacklist"),
        Commands::Mint { amount, to: Some(to) } => format!("minted {amount} to {to}"),
        Commands::Mint { amount, to: None } => format!("minted {amount}"),
        Commands::Transfer { to, amount } => format!("transferred {amount} to {to}"),
        Commands::Burn { amount } => format!("burned {amount}"),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::error::HostError;
    use permit_registry::AbortCode;

    fn run(host: &mut Host, caller: AccountId, command: Commands) -> Result<String> {
        let mut buf = Vec::new();
        LedgerCommand::new(host, caller).execute(&mut buf, &OutputFormat::new(Format::Json), &command)?;
        Ok(String::from_utf8(buf).expect("utf8"))
    }

    fn json(output: &str) -> serde_json::Value {
        serde_json::from_str(output).expect("json")
    }

    #[test]
    fn mint_and_transfer() {
        let mut host = Host::in_memory();
        let admin = AccountId::ADMINISTRATOR;
        let bob = AccountId::derive("bob");

        run(&mut host, admin, Commands::Init).expect("init admin");
        run(&mut host, bob, Commands::Init).expect("init bob");
        run(&mut host, admin, Commands::GrantMinter { target: admin }).expect("grant");
        run(&mut host, admin, Commands::Mint { amount: 100, to: None }).expect("mint");
        run(&mut host, admin, Commands::Transfer { to: bob, amount: 40 }).expect("transfer");

        let out = run(&mut host, bob, Commands::Balance).expect("balance");
        assert_eq!(json(&out)["balance"], 40);
        let out = run(&mut host, admin, Commands::Balance).expect("balance");
        assert_eq!(json(&out)["balance"], 60);
    }

    #[test]
    fn overdrawn_transfer_reports_code() {
        let mut host = Host::in_memory();
        let admin = AccountId::ADMINISTRATOR;
        run(&mut host, admin, Commands::Init).expect("init");

        let err = run(&mut host, admin, Commands::Transfer { to: admin, amount: 1 })
            .expect_err("overdrawn");
        assert_eq!(err.abort_code(), Some(AbortCode::InsufficientBalance));
        assert!(matches!(err, HostError::Aborted(_)));
    }

    #[test]
    fn burn_reduces_supply() {
        let mut host = Host::in_memory();
        let admin = AccountId::ADMINISTRATOR;
        run(&mut host, admin, Commands::Init).expect("init");
        run(&mut host, admin, Commands::GrantMinter { target: admin }).expect("grant");
        run(&mut host, admin, Commands::Mint { amount: 50, to: None }).expect("mint");
        run(&mut host, admin, Commands::Burn { amount: 20 }).expect("burn");

        let out = json(&run(&mut host, admin, Commands::Supply).expect("supply"));
        assert_eq!(out["minted"], 50);
        assert_eq!(out["burned"], 20);
        assert_eq!(out["circulating"], 30);
        assert_eq!(out["in_flight"], 0);
    }

    #[test]
    fn capability_shows_allowance() {
        let mut host = Host::in_memory();
        let admin = AccountId::ADMINISTRATOR;
        run(&mut host, admin, Commands::Init).expect("init");
        run(&mut host, admin, Commands::GrantMinter { target: admin }).expect("grant");
        run(&mut host, admin, Commands::Mint { amount: 250, to: None }).expect("mint");

        let out = json(&run(&mut host, admin, Commands::Capability).expect("capability"));
        assert_eq!(out["is_minter"], true);
        assert_eq!(out["remaining_mint_allowance"], 750);
    }

    #[test]
    fn history_is_limited() {
        let mut host = Host::in_memory();
        let admin = AccountId::ADMINISTRATOR;
        run(&mut host, admin, Commands::Init).expect("init");
        let _ = run(&mut host, admin, Commands::Init);
        run(&mut host, admin, Commands::Balance).expect("balance");

        let out = json(&run(&mut host, admin, Commands::History { limit: 2 }).expect("history"));
        let calls = out["calls"].as_array().expect("array");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0]["outcome"]["status"], "aborted");
        assert_eq!(calls[1]["label"], "balance");
    }

    #[test]
    fn address_needs_no_state() {
        let mut host = Host::in_memory();
        let out = run(
            &mut host,
            AccountId::ADMINISTRATOR,
            Commands::Address {
                label: "carol".to_string(),
            },
        )
        .expect("address");
        assert_eq!(json(&out)["account"], AccountId::derive("carol").to_string());
        assert!(host.history().is_empty());
    }
}
