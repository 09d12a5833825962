//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use permit_ledger::Supply;
use permit_registry::{AccountId, PermissionRecord};
use serde::Serialize;

use crate::cli::Format;
use crate::error::Result;
use crate::host::{CallRecord, Outcome};

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a value in the selected format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<()>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()>;
}

/// A label and the account derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct AddressView {
    /// The label.
    pub label: String,
    /// The derived account.
    pub account: AccountId,
}

impl TableDisplay for AddressView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "@{}  {}", self.label, self.account)?;
        Ok(())
    }
}

/// Confirmation of a committed call.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    /// What was done.
    pub action: String,
    /// Who did it.
    pub caller: AccountId,
}

impl TableDisplay for Receipt {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "ok: {} (caller {})", self.action, self.caller)?;
        Ok(())
    }
}

/// An account balance.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    /// The account.
    pub account: AccountId,
    /// Its balance.
    pub balance: u64,
}

impl TableDisplay for BalanceView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "Account:  {}", self.account)?;
        writeln!(writer, "Balance:  {}", self.balance)?;
        Ok(())
    }
}

/// A permission record.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityView {
    /// The account.
    pub account: AccountId,
    /// Minter status.
    pub is_minter: bool,
    /// Blacklist status.
    pub is_blacklisted: bool,
    /// Remaining mint allowance.
    pub remaining_mint_allowance: u64,
}

impl CapabilityView {
    /// Builds the view of `record`.
    #[must_use]
    pub const fn new(account: AccountId, record: &PermissionRecord) -> Self {
        Self {
            account,
            is_minter: record.is_minter(),
            is_blacklisted: record.is_blacklisted(),
            remaining_mint_allowance: record.remaining_mint_allowance(),
        }
    }
}

impl TableDisplay for CapabilityView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "Capability")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Account:          {}", self.account)?;
        writeln!(writer, "Minter:           {}", yes_no(self.is_minter))?;
        writeln!(writer, "Blacklisted:      {}", yes_no(self.is_blacklisted))?;
        writeln!(writer, "Mint allowance:   {}", self.remaining_mint_allowance)?;
        Ok(())
    }
}

/// Supply totals.
#[derive(Debug, Clone, Serialize)]
pub struct SupplyView {
    /// Total minted.
    pub minted: u64,
    /// Total burned.
    pub burned: u64,
    /// Value held in detached tokens.
    pub in_flight: u64,
    /// Minted minus burned.
    pub circulating: u64,
    /// Number of accounts with a balance.
    pub accounts: usize,
}

impl SupplyView {
    /// Builds the view of `supply`.
    #[must_use]
    pub const fn new(supply: Supply, accounts: usize) -> Self {
        Self {
            minted: supply.minted,
            burned: supply.burned,
            in_flight: supply.in_flight,
            circulating: supply.circulating(),
            accounts,
        }
    }
}

impl TableDisplay for SupplyView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "Supply")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Minted:           {}", self.minted)?;
        writeln!(writer, "Burned:           {}", self.burned)?;
        writeln!(writer, "Circulating:      {}", self.circulating)?;
        writeln!(writer, "In flight:        {}", self.in_flight)?;
        writeln!(writer, "Accounts:         {}", self.accounts)?;
        Ok(())
    }
}

/// Recent calls.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    /// Calls, oldest first.
    pub calls: Vec<CallRecord>,
}

impl TableDisplay for HistoryView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.calls.is_empty() {
            writeln!(writer, "No calls recorded")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<20}  {:<44}  {:<18}  {}",
            "TIME", "CALLER", "CALL", "OUTCOME"
        )?;
        writeln!(writer, "{}", "─".repeat(104))?;
        for call in &self.calls {
            let outcome = match &call.outcome {
                Outcome::Committed => "committed".to_string(),
                Outcome::Aborted { code, .. } => format!("aborted: {code}"),
                Outcome::Failed { .. } => "failed: not saved".to_string(),
            };
            writeln!(
                writer,
                "{:<20}  {:<44}  {:<18}  {}",
                call.at.format("%Y-%m-%d %H:%M:%S"),
                call.caller.to_string(),
                truncate(&call.label, 18),
                outcome
            )?;
        }
        Ok(())
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use permit_registry::AbortCode;

    fn render<T: Serialize + TableDisplay>(format: Format, value: &T) -> String {
        let mut buf = Vec::new();
        OutputFormat::new(format).write(&mut buf, value).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn balance_renders_as_table() {
        let view = BalanceView {
            account: AccountId::ADMINISTRATOR,
            balance: 200,
        };
        let out = render(Format::Table, &view);
        assert!(out.contains("Balance:  200"));
        assert!(out.contains(&AccountId::ADMINISTRATOR.to_string()));
    }

    #[test]
    fn balance_renders_as_json() {
        let view = BalanceView {
            account: AccountId::ADMINISTRATOR,
            balance: 200,
        };
        let out = render(Format::Json, &view);
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["balance"], 200);
        assert_eq!(value["account"], AccountId::ADMINISTRATOR.to_string());
    }

    #[test]
    fn supply_view_computes_circulating() {
        let supply = Supply {
            minted: 300,
            burned: 50,
            in_flight: 10,
        };
        let view = SupplyView::new(supply, 2);
        assert_eq!(view.circulating, 250);
        assert!(render(Format::Table, &view).contains("Circulating:      250"));
    }

    #[test]
    fn history_shows_abort_codes() {
        let view = HistoryView {
            calls: vec![CallRecord {
                at: Utc::now(),
                caller: AccountId::derive("y"),
                label: "mint 5".to_string(),
                outcome: Outcome::Aborted {
                    code: AbortCode::NotMinter,
                    message: "not a minter".to_string(),
                },
            }],
        };
        let out = render(Format::Table, &view);
        assert!(out.contains("aborted: not_minter"));

        let json = render(Format::Json, &view);
        assert!(json.contains("\"status\": \"aborted\""));
    }

    #[test]
    fn history_shows_failed_saves() {
        let view = HistoryView {
            calls: vec![CallRecord {
                at: Utc::now(),
                caller: AccountId::ADMINISTRATOR,
                label: "init".to_string(),
                outcome: Outcome::Failed {
                    message: "disk full".to_string(),
                },
            }],
        };
        assert!(render(Format::Table, &view).contains("failed: not saved"));
        assert!(render(Format::Json, &view).contains("\"status\": \"failed\""));
    }

    #[test]
    fn empty_history() {
        let out = render(Format::Table, &HistoryView { calls: Vec::new() });
        assert_eq!(out, "No calls recorded\n");
    }

    #[test]
    fn truncate_long_labels() {
        assert_eq!(truncate("short", 18), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
