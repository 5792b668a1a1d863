use crate::client::WalletApi;
use crate::commands::{CmdMessage, CmdResult, Output, PaymentReport};
use crate::error::{LnbotError, Result};
use crate::format::{sats, truncate};
use crate::model::{CreatePaymentParams, ResourceStatus, Snapshot};
use crate::watch::{watch, CancelSignal, WatchState};
use std::time::Instant;

const BOLT11_PREFIXES: [&str; 3] = ["lnbc", "lntb", "lnbs"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayTarget {
    Bolt11,
    Lnurl,
    Address,
}

impl PayTarget {
    pub fn classify(target: &str) -> Option<Self> {
        let lower = target.trim().to_lowercase();
        if BOLT11_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            Some(PayTarget::Bolt11)
        } else if lower.starts_with("lnurl") {
            Some(PayTarget::Lnurl)
        } else if lower.contains('@') {
            Some(PayTarget::Address)
        } else {
            None
        }
    }

    fn needs_amount(self) -> bool {
        !matches!(self, PayTarget::Bolt11)
    }

    fn describe(self) -> &'static str {
        match self {
            PayTarget::Bolt11 => "a BOLT11 invoice",
            PayTarget::Lnurl => "an LNURL",
            PayTarget::Address => "a Lightning address",
        }
    }
}

/// A validated payment, ready for confirmation and sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub target: String,
    pub kind: PayTarget,
    pub amount: Option<i64>,
    pub max_fee: Option<i64>,
}

impl PaymentRequest {
    /// Checks the target and amount without touching the network.
    /// Non-positive amounts and fees count as not given.
    pub fn parse(target: &str, amount: Option<i64>, max_fee: Option<i64>) -> Result<Self> {
        let target = target.trim();
        let amount = amount.filter(|a| *a > 0);
        let kind = PayTarget::classify(target).ok_or_else(|| {
            LnbotError::Invalid(format!(
                "unrecognized target: {}\n\nTarget must be a Lightning address (user@domain), an LNURL or a BOLT11 invoice (lnbc...)",
                truncate(target, 40)
            ))
        })?;
        if amount.is_none() && kind.needs_amount() {
            return Err(LnbotError::Invalid(format!(
                "--amount is required when paying {}\n\n  lnbot pay {} --amount <sats>",
                kind.describe(),
                target
            )));
        }
        Ok(Self {
            target: target.to_string(),
            kind,
            amount,
            max_fee: max_fee.filter(|f| *f > 0),
        })
    }

    pub fn confirmation_prompt(&self) -> String {
        let target = truncate(&self.target, 50);
        match self.amount {
            Some(amount) => format!("Send {} to {}?", sats(amount), target),
            None => format!("Pay {}?", target),
        }
    }
}

/// Sends the payment and, when it is still in flight, waits for it to
/// resolve. A payment that cannot be watched is still reported.
pub fn run<C: WalletApi>(
    client: &C,
    request: &PaymentRequest,
    cancel: &CancelSignal,
) -> Result<CmdResult> {
    let started = Instant::now();
    let created = client
        .create_payment(&CreatePaymentParams {
            target: request.target.clone(),
            amount: request.amount,
            max_fee: request.max_fee,
        })
        .map_err(|e| e.context("sending payment"))?;

    let mut result = CmdResult::default();
    let mut payment = created.clone();
    if !created.status.is_terminal() {
        match watch(client, Snapshot::Payment(created), cancel) {
            Ok(outcome) => {
                if let Snapshot::Payment(latest) = outcome.snapshot {
                    payment = latest;
                }
                match outcome.state {
                    WatchState::TransportError => result.add_message(CmdMessage::warning(
                        outcome.error.unwrap_or_else(|| "watch failed".into()),
                    )),
                    WatchState::Cancelled | WatchState::StreamClosed => {
                        result.add_message(CmdMessage::info(format!(
                            "Stopped waiting. Payment #{} is {}; check 'lnbot payment list'.",
                            payment.number, payment.status
                        )))
                    }
                    _ => {}
                }
            }
            Err(e) => result.add_message(CmdMessage::warning(e.to_string())),
        }
    }
    let elapsed_ms = started.elapsed().as_millis();

    let mut balance = None;
    match payment.status {
        ResourceStatus::Settled => {
            result.add_message(CmdMessage::success(if elapsed_ms < 100 {
                "Sent! Settled instantly".to_string()
            } else {
                format!("Sent! Settled in {}ms", elapsed_ms)
            }));
            balance = client.current_wallet().ok().map(|w| w.available);
        }
        ResourceStatus::Failed => {
            result.add_message(CmdMessage::error(format!(
                "Payment failed: {}",
                payment.failure_reason.as_deref().unwrap_or("unknown")
            )));
            result.add_message(CmdMessage::info("No sats were deducted."));
        }
        _ => {}
    }

    result.output = Output::Payment(PaymentReport {
        payment,
        elapsed_ms,
        balance,
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StreamEvent;
    use crate::commands::MessageLevel;
    use crate::model::{Payment, Wallet};
    use crate::test_utils::{MockClient, ScriptedStream};

    fn payment(status: ResourceStatus) -> Payment {
        Payment {
            number: 12,
            status,
            amount: 500,
            address: "alice@ln.bot".into(),
            ..Payment::default()
        }
    }

    #[test]
    fn classifies_targets() {
        assert_eq!(PayTarget::classify("lnbc10u1pj9x"), Some(PayTarget::Bolt11));
        assert_eq!(PayTarget::classify("LNTB1500n1p"), Some(PayTarget::Bolt11));
        assert_eq!(PayTarget::classify("lnbs1p"), Some(PayTarget::Bolt11));
        assert_eq!(PayTarget::classify("LNURL1DP68GURN8"), Some(PayTarget::Lnurl));
        assert_eq!(PayTarget::classify("alice@ln.bot"), Some(PayTarget::Address));
        assert_eq!(PayTarget::classify("bitcoin:bc1q"), None);
    }

    #[test]
    fn address_requires_amount() {
        let err = PaymentRequest::parse("alice@ln.bot", None, None).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("--amount is required when paying a Lightning address"));
        let err = PaymentRequest::parse("lnurl1dp68", Some(0), None).unwrap_err();
        assert!(err.to_string().contains("paying an LNURL"));
    }

    #[test]
    fn bolt11_amount_is_optional() {
        let request = PaymentRequest::parse("lnbc10u1pj9x", None, Some(0)).unwrap();
        assert_eq!(request.amount, None);
        assert_eq!(request.max_fee, None);
        assert_eq!(request.confirmation_prompt(), "Pay lnbc10u1pj9x?");
    }

    #[test]
    fn unrecognized_target() {
        let err = PaymentRequest::parse("not-a-target", Some(10), None).unwrap_err();
        assert!(err.to_string().starts_with("unrecognized target: not-a-target"));
    }

    #[test]
    fn confirmation_prompt_with_amount() {
        let request = PaymentRequest::parse("alice@ln.bot", Some(1500), None).unwrap();
        assert_eq!(request.confirmation_prompt(), "Send 1,500 sats to alice@ln.bot?");
    }

    #[test]
    fn settled_immediately_skips_watch() {
        let client = MockClient::new();
        client.state().payment = payment(ResourceStatus::Settled);
        client.state().wallet = Wallet {
            available: 9000,
            ..Wallet::default()
        };
        let request = PaymentRequest::parse("alice@ln.bot", Some(500), Some(5)).unwrap();

        let result = run(&client, &request, &CancelSignal::never()).unwrap();
        assert_eq!(client.subscribe_count(), 0);
        let sent = client.state().last_payment.clone().unwrap();
        assert_eq!(sent.amount, Some(500));
        assert_eq!(sent.max_fee, Some(5));
        let Output::Payment(report) = result.output else {
            panic!("expected payment");
        };
        assert_eq!(report.balance, Some(9000));
        assert_eq!(result.messages[0].level, MessageLevel::Success);
    }

    #[test]
    fn pending_payment_is_watched_to_failure() {
        let client = MockClient::new();
        client.state().payment = payment(ResourceStatus::Pending);
        let mut failed = payment(ResourceStatus::Failed);
        failed.failure_reason = Some("no route".into());
        client.script_stream(ScriptedStream::events(vec![StreamEvent::Failed(Some(
            Snapshot::Payment(failed),
        ))]));
        let request = PaymentRequest::parse("alice@ln.bot", Some(500), None).unwrap();

        let result = run(&client, &request, &CancelSignal::never()).unwrap();
        assert_eq!(client.subscribe_count(), 1);
        assert_eq!(client.close_count(), 1);
        assert_eq!(result.messages[0].content, "Payment failed: no route");
        assert_eq!(result.messages[0].level, MessageLevel::Error);
        assert!(!client.calls().contains(&"current_wallet".to_string()));
    }

    #[test]
    fn create_failure_is_an_error() {
        let client = MockClient::new();
        client.fail("create_payment", 400, "insufficient balance");
        let request = PaymentRequest::parse("alice@ln.bot", Some(500), None).unwrap();
        let err = run(&client, &request, &CancelSignal::never()).unwrap_err();
        assert_eq!(err.to_string(), "sending payment: insufficient balance");
    }
}
