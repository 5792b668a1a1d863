use crate::client::WalletApi;
use crate::commands::{CmdMessage, CmdResult, Output};
use crate::error::{LnbotError, Result};
use crate::format::sats;
use crate::model::{CreateInvoiceParams, Invoice, ListParams, Snapshot};
use crate::watch::{watch, CancelSignal, WatchState};

pub fn validate_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(LnbotError::Invalid(
            "--amount must be a positive integer".into(),
        ));
    }
    Ok(())
}

pub fn create<C: WalletApi>(client: &C, amount: i64, memo: Option<&str>) -> Result<CmdResult> {
    validate_amount(amount)?;
    let params = CreateInvoiceParams {
        amount,
        memo: memo.filter(|m| !m.is_empty()).map(str::to_string),
    };
    let invoice = client
        .create_invoice(&params)
        .map_err(|e| e.context("creating invoice"))?;
    Ok(CmdResult::new(Output::Invoice(invoice)))
}

/// Waits for `invoice` to be paid. Only an unexpected failure to start
/// watching is an error; every other ending is reported as a message.
pub fn wait<C: WalletApi>(
    client: &C,
    invoice: Invoice,
    cancel: &CancelSignal,
) -> Result<CmdResult> {
    let amount = invoice.amount;
    let number = invoice.number;
    let outcome = match watch(client, Snapshot::Invoice(invoice), cancel) {
        Ok(outcome) => outcome,
        Err(e) => {
            return Ok(CmdResult::default().with_message(CmdMessage::warning(format!(
                "{}; check 'lnbot invoice list' later",
                e
            ))))
        }
    };

    let message = match outcome.state {
        WatchState::Settled => CmdMessage::success(format!("Payment received! +{}", sats(amount))),
        WatchState::Expired => CmdMessage::info("Invoice expired."),
        WatchState::Failed => CmdMessage::warning("Invoice failed."),
        WatchState::Cancelled => {
            CmdMessage::info("Stopped waiting. The invoice stays valid until it expires.")
        }
        WatchState::StreamClosed | WatchState::Pending => CmdMessage::info(format!(
            "Stopped waiting. Invoice #{} is {}.",
            number,
            outcome.snapshot.status()
        )),
        WatchState::TransportError => CmdMessage::warning(
            outcome
                .error
                .clone()
                .unwrap_or_else(|| "watch failed".to_string()),
        ),
    };
    Ok(CmdResult::new(Output::Watch(outcome)).with_message(message))
}

pub fn list<C: WalletApi>(client: &C, limit: u32) -> Result<CmdResult> {
    let invoices = client
        .list_invoices(ListParams::limit(limit))
        .map_err(|e| e.context("listing invoices"))?;
    let mut result = CmdResult::default();
    if invoices.is_empty() {
        result.add_message(CmdMessage::info("No invoices yet."));
    }
    result.output = Output::Invoices {
        items: invoices,
        limit,
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StreamEvent;
    use crate::commands::MessageLevel;
    use crate::model::ResourceStatus;
    use crate::test_utils::{MockClient, ScriptedStream};

    fn pending(number: u64) -> Invoice {
        Invoice {
            number,
            amount: 2100,
            status: ResourceStatus::Pending,
            bolt11: "lnbc21u1ptest".into(),
            ..Invoice::default()
        }
    }

    #[test]
    fn rejects_non_positive_amount_before_calling() {
        let client = MockClient::new();
        for amount in [0, -5] {
            let err = create(&client, amount, None).unwrap_err();
            assert_eq!(err.to_string(), "--amount must be a positive integer");
        }
        assert!(client.calls().is_empty());
    }

    #[test]
    fn create_passes_memo() {
        let client = MockClient::new();
        client.state().invoice = pending(1);
        create(&client, 2100, Some("coffee")).unwrap();
        let params = client.state().last_invoice.clone().unwrap();
        assert_eq!(params.amount, 2100);
        assert_eq!(params.memo.as_deref(), Some("coffee"));
    }

    #[test]
    fn wait_reports_settlement() {
        let client = MockClient::new();
        client.script_stream(ScriptedStream::events(vec![StreamEvent::Settled(None)]));
        let result = wait(&client, pending(7), &CancelSignal::never()).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert_eq!(result.messages[0].content, "Payment received! +2,100 sats");
        assert_eq!(client.close_count(), 1);
    }

    #[test]
    fn wait_reports_expiry_as_info() {
        let client = MockClient::new();
        client.script_stream(ScriptedStream::events(vec![StreamEvent::Expired]));
        let result = wait(&client, pending(7), &CancelSignal::never()).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Info);
        assert_eq!(result.messages[0].content, "Invoice expired.");
    }

    #[test]
    fn wait_survives_subscribe_failure() {
        let client = MockClient::new();
        client.fail_subscribe(LnbotError::Transport("refused".into()));
        let result = wait(&client, pending(7), &CancelSignal::never()).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Warning);
        assert!(result.messages[0].content.contains("watch failed"));
    }

    #[test]
    fn list_sends_limit() {
        let client = MockClient::new();
        let result = list(&client, 5).unwrap();
        assert_eq!(client.state().last_list, Some(ListParams::limit(5)));
        assert_eq!(result.messages[0].content, "No invoices yet.");
    }
}
