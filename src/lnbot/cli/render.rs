//! Text and JSON presentation of command results.
//!
//! `render_*` functions are pure and return strings; `print_*` functions
//! decide which stream a piece goes to. In JSON mode stdout carries only
//! the JSON document.

use colored::Colorize;
use lnbot::api::{CmdMessage, MessageLevel, Output};
use lnbot::commands::{Identity, PaymentReport, RestoreReport, StatusReport, WalletSummary};
use lnbot::error::{LnbotError, Result};
use lnbot::format::{sats, sats_plain, time_ago, truncate, truncate_key};
use lnbot::model::*;
use lnbot::update::UpdateCheck;
use serde_json::{json, Value};
use std::fmt::Write as _;

const INSTALL_SH: &str = "curl -fsSL https://ln.bot/install.sh | bash";
const INSTALL_PS1: &str = "iwr -useb https://ln.bot/install.ps1 | iex";
const INSTALL_CMD: &str =
    "curl -fsSL https://ln.bot/install.cmd -o install.cmd && install.cmd && del install.cmd";

/// One message line with its marker and color.
pub fn render_message(message: &CmdMessage) -> String {
    match message.level {
        MessageLevel::Info => message.content.dimmed().to_string(),
        MessageLevel::Success => format!("✓ {}", message.content).green().to_string(),
        MessageLevel::Warning => format!("⚠ {}", message.content).yellow().to_string(),
        MessageLevel::Error => format!("✗ {}", message.content).red().to_string(),
    }
}

/// Info and success go to stdout, warnings and errors to stderr. With
/// `json` set only the stderr half is printed.
pub fn print_messages(messages: &[CmdMessage], json: bool) {
    for message in messages {
        match message.level {
            MessageLevel::Info | MessageLevel::Success => {
                if !json {
                    println!("{}", render_message(message));
                }
            }
            MessageLevel::Warning | MessageLevel::Error => {
                eprintln!("{}", render_message(message));
            }
        }
    }
}

pub fn print_output(output: &Output, json: bool) -> Result<()> {
    if json {
        if let Some(document) = render_json(output)? {
            println!("{}", document);
        }
    } else {
        print!("{}", render_text(output));
    }
    Ok(())
}

pub fn render_json(output: &Output) -> Result<Option<String>> {
    let value = match output {
        Output::None => return Ok(None),
        Output::Wallets(wallets) => serde_json::to_value(wallets)?,
        Output::CreatedWallet(created) => serde_json::to_value(created)?,
        Output::Balance(wallet) => serde_json::to_value(wallet)?,
        Output::Status(report) => serde_json::to_value(report)?,
        Output::Identity(identity) => json!({
            "wallet": identity.wallet_id,
            "name": identity.name,
            "api_key": identity.api_key,
        }),
        Output::Invoice(invoice) => serde_json::to_value(invoice)?,
        Output::Invoices { items, .. } => serde_json::to_value(items)?,
        Output::Watch(outcome) => json!({
            "state": outcome.state,
            "resource": outcome.snapshot,
            "error": outcome.error,
        }),
        Output::Payment(report) => serde_json::to_value(&report.payment)?,
        Output::Payments { items, .. } => serde_json::to_value(items)?,
        Output::Transactions { items, .. } => serde_json::to_value(items)?,
        Output::Keys { primary, secondary } => json!({
            "primary_key": primary,
            "secondary_key": secondary.clone().unwrap_or_default(),
        }),
        Output::RotatedKey { slot, key } => json!({
            "slot": slot.label(),
            "key": key,
        }),
        Output::Recovery(backup) => serde_json::to_value(backup)?,
        Output::Restored(report) => serde_json::to_value(&report.restored)?,
        Output::Addresses(addresses) => serde_json::to_value(addresses)?,
        Output::Address(address) => serde_json::to_value(address)?,
        Output::Transfer(transfer) => serde_json::to_value(transfer)?,
        Output::Webhook(webhook) => serde_json::to_value(webhook)?,
        Output::Webhooks(webhooks) => serde_json::to_value(webhooks)?,
        Output::McpConfig(config) => config.clone(),
    };
    Ok(Some(pretty(&value)?))
}

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_text(output: &Output) -> String {
    match output {
        Output::None | Output::Watch(_) | Output::Address(_) | Output::Transfer(_) => {
            String::new()
        }
        Output::Wallets(wallets) => render_wallets(wallets),
        Output::CreatedWallet(created) => render_created_wallet(created),
        Output::Balance(wallet) => format!(
            "  balance:   {}\n  available: {}\n  on hold:   {}\n",
            sats(wallet.balance),
            sats(wallet.available),
            sats(wallet.on_hold)
        ),
        Output::Status(report) => render_status(report),
        Output::Identity(identity) => render_identity(identity),
        Output::Invoice(invoice) => format!(
            "  amount:  {}\n  status:  {}\n  bolt11:\n  {}\n",
            sats(invoice.amount),
            invoice.status,
            invoice.bolt11
        ),
        Output::Invoices { items, limit } => render_invoices(items, *limit),
        Output::Payment(report) => render_payment(report),
        Output::Payments { items, limit } => render_payments(items, *limit),
        Output::Transactions { items, limit } => render_transactions(items, *limit),
        Output::Keys { primary, secondary } => {
            let mut out = format!("  primary:   {}\n", primary);
            if let Some(secondary) = secondary {
                let _ = writeln!(out, "  secondary: {}", secondary);
            }
            out
        }
        Output::RotatedKey { key, .. } => {
            format!("  key: {}\n\n  Save this, it won't be shown again.\n", key)
        }
        Output::Recovery(backup) => format!(
            "{}\n  {}\n\n  Any previous recovery passphrase is now invalid.\n",
            "⚠ Recovery passphrase (save this, shown only once):".yellow(),
            backup.passphrase
        ),
        Output::Restored(report) => render_restored(report),
        Output::Addresses(addresses) => render_addresses(addresses),
        Output::Webhook(webhook) => format!(
            "  id:     {}\n  url:    {}\n  secret: {}\n\n  Save the secret, it won't be shown again.\n",
            webhook.id,
            webhook.url,
            webhook.secret.as_deref().unwrap_or_default()
        ),
        Output::Webhooks(webhooks) => render_webhooks(webhooks),
        Output::McpConfig(config) => match serde_json::to_string_pretty(config) {
            Ok(document) => format!("Add to your MCP client config:\n\n{}\n", document),
            Err(_) => String::new(),
        },
    }
}

fn render_wallets(wallets: &[WalletSummary]) -> String {
    let mut out = String::new();
    for wallet in wallets {
        let marker = if wallet.active { "●" } else { " " };
        let _ = writeln!(out, "{} {}  {}", marker, wallet.name, wallet.id);
    }
    out
}

fn render_created_wallet(created: &CreatedWallet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  id:       {}", created.wallet_id);
    let _ = writeln!(out, "  name:     {}", created.name);
    let _ = writeln!(out, "  address:  {}", created.address);
    let _ = writeln!(out, "  api_key:  {}", truncate_key(&created.primary_key));
    if !created.recovery_passphrase.is_empty() {
        out.push('\n');
        let _ = writeln!(
            out,
            "{}",
            "⚠ Recovery passphrase (save this, shown only once):".yellow()
        );
        let _ = writeln!(out, "  {}", created.recovery_passphrase);
    }
    out
}

fn render_status(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  name:      {}", report.wallet);
    let _ = writeln!(out, "  id:        {}", report.wallet_id);
    if !report.address.is_empty() {
        let _ = writeln!(out, "  address:   {}", report.address);
    }
    let _ = writeln!(out, "  balance:   {}", sats(report.balance));
    let _ = writeln!(out, "  available: {}", sats(report.available));
    let _ = writeln!(out, "  on hold:   {}", sats(report.on_hold));
    let _ = writeln!(out, "  api:       ✓ connected ({}ms)", report.latency_ms);
    out
}

fn render_identity(identity: &Identity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  wallet:  {}", identity.wallet_id);
    let _ = writeln!(out, "  name:    {}", identity.name);
    if let Some(address) = &identity.address {
        let _ = writeln!(out, "  address: {}", address);
    }
    let _ = writeln!(out, "  api_key: {}", truncate_key(&identity.api_key));
    out
}

fn render_invoices(invoices: &[Invoice], limit: u32) -> String {
    let mut out = String::new();
    for invoice in invoices {
        let _ = writeln!(
            out,
            "  #{:>4}  {:<8}  {:>10} sats  {}",
            invoice.number,
            invoice.status.as_str(),
            sats_plain(invoice.amount),
            time_ago(invoice.created_at)
        );
    }
    if !invoices.is_empty() && invoices.len() == limit as usize {
        let _ = writeln!(out, "\n  {} shown, use --limit to see more", limit);
    }
    out
}

fn render_payment(report: &PaymentReport) -> String {
    let payment = &report.payment;
    let mut out = String::new();
    match payment.status {
        ResourceStatus::Settled => {
            let _ = writeln!(out, "  amount:  {}", sats(payment.amount));
            if let Some(fee) = payment.actual_fee.filter(|fee| *fee > 0) {
                let _ = writeln!(out, "  fee:     {}", sats(fee));
            }
            if let Some(balance) = report.balance {
                let _ = writeln!(out, "  balance: {}", sats(balance));
            }
        }
        ResourceStatus::Failed => {}
        status => {
            let _ = writeln!(out, "  status: {}", status);
        }
    }
    out
}

fn render_payments(payments: &[Payment], limit: u32) -> String {
    let mut out = String::new();
    for payment in payments {
        let address = if payment.address.is_empty() {
            "--"
        } else {
            payment.address.as_str()
        };
        let _ = writeln!(
            out,
            "  #{:>4}  {:<8}  {:>10} sats  {:>8}  {}",
            payment.number,
            payment.status.as_str(),
            sats_plain(payment.amount),
            time_ago(payment.created_at),
            truncate(address, 40)
        );
    }
    if let Some(last) = payments.last() {
        if payments.len() == limit as usize {
            let _ = writeln!(
                out,
                "\n  {} shown, next page: --after {}",
                limit, last.number
            );
        }
    }
    out
}

fn render_transactions(transactions: &[Transaction], limit: u32) -> String {
    let mut out = String::new();
    for tx in transactions {
        let sign = match tx.kind {
            TransactionKind::Debit => "-",
            TransactionKind::Credit => "+",
        };
        let _ = writeln!(
            out,
            "  {:<6}  {}{:>10} sats  bal: {:>10}  {}",
            tx.kind.as_str(),
            sign,
            sats_plain(tx.amount),
            sats_plain(tx.balance_after),
            time_ago(tx.created_at)
        );
    }
    if !transactions.is_empty() && transactions.len() == limit as usize {
        let _ = writeln!(out, "\n  {} shown, use --limit to see more", limit);
    }
    out
}

fn render_restored(report: &RestoreReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  id:   {}", report.restored.wallet_id);
    let _ = writeln!(out, "  name: {}", report.name);
    if let Some(address) = &report.address {
        let _ = writeln!(out, "  address: {}", address);
    }
    out
}

fn render_addresses(addresses: &[Address]) -> String {
    let mut out = String::new();
    for address in addresses {
        let tag = if address.generated {
            "generated".to_string()
        } else if address.cost > 0 {
            format!("vanity, {}", sats(address.cost))
        } else {
            "vanity".to_string()
        };
        let _ = writeln!(out, "  {}  ({})", address.address, tag);
    }
    out
}

fn render_webhooks(webhooks: &[Webhook]) -> String {
    let mut out = String::new();
    for webhook in webhooks {
        let status = if webhook.active { "active" } else { "inactive" };
        let _ = writeln!(
            out,
            "  {}  {:<8}  {}  {}",
            webhook.id,
            status,
            webhook.url,
            time_ago(webhook.created_at)
        );
    }
    out
}

/// Output of `lnbot update`.
pub fn render_update(current: &str, check: &UpdateCheck, windows: bool) -> String {
    let mut out = format!("Current version: {}\n", current);
    let Some(latest) = check.latest.as_deref().filter(|_| check.available) else {
        out.push_str("You're up to date.\n");
        return out;
    };
    let _ = writeln!(out, "Latest version:  {}", latest);
    out.push_str("\nTo update:\n");
    if windows {
        let _ = writeln!(out, "  PowerShell: {}", INSTALL_PS1);
        let _ = writeln!(out, "  CMD:        {}", INSTALL_CMD);
    } else {
        let _ = writeln!(out, "  {}", INSTALL_SH);
    }
    out
}

/// The one-line notice printed after other commands.
pub fn render_update_notice(current: &str, latest: &str) -> String {
    format!(
        "Update available: {} → {}, run 'lnbot update'",
        current, latest
    )
    .yellow()
    .to_string()
}

/// The failure report printed to stderr before exiting. Retryable
/// failures get a hint.
pub fn render_error(err: &LnbotError) -> String {
    let mut out = format!("Error: {}\n", err);
    if err.is_retryable() {
        out.push_str("Check your connection and try again.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lnbot::watch::WatchState;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn messages_carry_markers() {
        plain();
        assert_eq!(render_message(&CmdMessage::success("Wallet created")), "✓ Wallet created");
        assert_eq!(render_message(&CmdMessage::warning("careful")), "⚠ careful");
        assert_eq!(render_message(&CmdMessage::error("Payment failed: x")), "✗ Payment failed: x");
        assert_eq!(render_message(&CmdMessage::info("No invoices yet.")), "No invoices yet.");
    }

    #[test]
    fn wallet_list_marks_active() {
        let text = render_text(&Output::Wallets(vec![
            WalletSummary {
                name: "main".into(),
                id: "wal_1".into(),
                active: true,
            },
            WalletSummary {
                name: "spare".into(),
                id: "wal_2".into(),
                active: false,
            },
        ]));
        assert_eq!(text, "● main  wal_1\n  spare  wal_2\n");
    }

    #[test]
    fn invoice_list_hints_when_page_is_full() {
        let invoice = Invoice {
            number: 12,
            amount: 2100,
            status: ResourceStatus::Settled,
            ..Invoice::default()
        };
        let text = render_text(&Output::Invoices {
            items: vec![invoice.clone()],
            limit: 1,
        });
        assert!(text.starts_with("  #  12  settled        2,100 sats  --\n"));
        assert!(text.contains("1 shown, use --limit to see more"));

        let text = render_text(&Output::Invoices {
            items: vec![invoice],
            limit: 20,
        });
        assert!(!text.contains("shown"));
    }

    #[test]
    fn payment_list_hints_next_page() {
        let payments = vec![
            Payment {
                number: 9,
                address: "alice@ln.bot".into(),
                ..Payment::default()
            },
            Payment {
                number: 8,
                ..Payment::default()
            },
        ];
        let text = render_text(&Output::Payments {
            items: payments,
            limit: 2,
        });
        assert!(text.contains("alice@ln.bot"));
        assert!(text.contains("  --\n"));
        assert!(text.contains("next page: --after 8"));
    }

    #[test]
    fn transactions_sign_debits() {
        let text = render_text(&Output::Transactions {
            items: vec![Transaction {
                kind: TransactionKind::Debit,
                amount: 500,
                balance_after: 1500,
                created_at: None,
            }],
            limit: 20,
        });
        assert_eq!(text, "  debit   -       500 sats  bal:      1,500  --\n");
    }

    #[test]
    fn settled_payment_shows_fee_and_balance() {
        let report = PaymentReport {
            payment: Payment {
                status: ResourceStatus::Settled,
                amount: 500,
                actual_fee: Some(2),
                ..Payment::default()
            },
            elapsed_ms: 40,
            balance: Some(9500),
        };
        let text = render_text(&Output::Payment(report.clone()));
        assert_eq!(
            text,
            "  amount:  500 sats\n  fee:     2 sats\n  balance: 9,500 sats\n"
        );

        let mut pending = report;
        pending.payment.status = ResourceStatus::Processing;
        assert_eq!(render_text(&Output::Payment(pending)), "  status: processing\n");
    }

    #[test]
    fn status_json_is_camel_case() {
        let report = StatusReport {
            wallet: "main".into(),
            wallet_id: "wal_1".into(),
            balance: 10,
            available: 8,
            on_hold: 2,
            address: String::new(),
            latency_ms: 42,
        };
        let json = render_json(&Output::Status(report)).unwrap().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["walletId"], "wal_1");
        assert_eq!(value["onHold"], 2);
        assert_eq!(value["latencyMs"], 42);
    }

    #[test]
    fn key_json_uses_snake_case_names() {
        let json = render_json(&Output::Keys {
            primary: "key_a".into(),
            secondary: None,
        })
        .unwrap()
        .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["primary_key"], "key_a");
        assert_eq!(value["secondary_key"], "");
    }

    #[test]
    fn empty_output_has_no_json() {
        assert_eq!(render_json(&Output::None).unwrap(), None);
    }

    #[test]
    fn watch_json_names_state() {
        let outcome = lnbot::watch::WatchOutcome {
            target: lnbot::client::WatchTarget::Invoice(3),
            state: WatchState::Expired,
            snapshot: Snapshot::Invoice(Invoice {
                number: 3,
                status: ResourceStatus::Expired,
                ..Invoice::default()
            }),
            error: None,
        };
        let json = render_json(&Output::Watch(outcome)).unwrap().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["state"], "expired");
        assert_eq!(value["resource"]["number"], 3);
    }

    #[test]
    fn address_tags() {
        let text = render_text(&Output::Addresses(vec![
            Address {
                address: "abc@ln.bot".into(),
                generated: true,
                ..Address::default()
            },
            Address {
                address: "satoshi@ln.bot".into(),
                cost: 1000,
                ..Address::default()
            },
        ]));
        assert!(text.contains("abc@ln.bot  (generated)"));
        assert!(text.contains("satoshi@ln.bot  (vanity, 1,000 sats)"));
    }

    #[test]
    fn update_instructions() {
        let none = UpdateCheck::default();
        assert_eq!(
            render_update("0.3.0", &none, false),
            "Current version: 0.3.0\nYou're up to date.\n"
        );

        let newer = UpdateCheck {
            latest: Some("0.4.0".into()),
            available: true,
        };
        let text = render_update("0.3.0", &newer, false);
        assert!(text.contains("Latest version:  0.4.0"));
        assert!(text.contains(INSTALL_SH));
        let text = render_update("0.3.0", &newer, true);
        assert!(text.contains("PowerShell: "));
        assert!(!text.contains(INSTALL_SH));
    }

    #[test]
    fn retryable_errors_get_a_hint() {
        let err = LnbotError::Transport("connection refused".into()).context("fetching balance");
        assert_eq!(
            render_error(&err),
            "Error: fetching balance: connection refused\nCheck your connection and try again.\n"
        );
        let err = LnbotError::Remote {
            status: 401,
            message: "invalid api key".into(),
        };
        assert_eq!(render_error(&err), "Error: invalid api key\n");
    }
}
