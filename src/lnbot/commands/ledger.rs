//! Read-only views of wallet history: outgoing payments and the
//! credit/debit ledger.

use crate::client::WalletApi;
use crate::commands::{CmdMessage, CmdResult, Output};
use crate::error::Result;
use crate::model::ListParams;

pub fn payments<C: WalletApi>(client: &C, limit: u32, after: Option<u64>) -> Result<CmdResult> {
    let payments = client
        .list_payments(ListParams::limit(limit).after(after))
        .map_err(|e| e.context("listing payments"))?;
    let mut result = CmdResult::default();
    if payments.is_empty() {
        result.add_message(CmdMessage::info("No payments yet."));
    }
    result.output = Output::Payments {
        items: payments,
        limit,
    };
    Ok(result)
}

pub fn transactions<C: WalletApi>(client: &C, limit: u32) -> Result<CmdResult> {
    let transactions = client
        .list_transactions(ListParams::limit(limit))
        .map_err(|e| e.context("listing transactions"))?;
    let mut result = CmdResult::default();
    if transactions.is_empty() {
        result.add_message(CmdMessage::info("No transactions yet."));
    }
    result.output = Output::Transactions {
        items: transactions,
        limit,
    };
    Ok(result)
}
