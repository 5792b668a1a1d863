//! # Settlement Watcher
//!
//! After a mutating call returns an invoice or payment that has not reached
//! a terminal status, [`watch`] follows the resource's event stream until
//! one of these happens:
//!
//! | Trigger                               | State            | Error? |
//! |---------------------------------------|------------------|--------|
//! | `settled` event or settled payload    | `Settled`        | no     |
//! | `expired` event or expired payload    | `Expired`        | no     |
//! | `failed` event or failed payload      | `Failed`         | no     |
//! | event stream ends                     | `StreamClosed`   | no     |
//! | message on the error channel          | `TransportError` | warned |
//! | cancellation signal                   | `Cancelled`      | no     |
//!
//! Every outcome carries the most recent known snapshot, so callers always
//! have something to report.
//!
//! ## Subscription lifetime
//!
//! At most one subscription is opened per call, and none at all when the
//! initial status is already terminal. The subscription lives inside a
//! guard whose `Drop` closes it, so it is torn down exactly once whichever
//! branch of the wait fires, including on panic. There is no resubscribe
//! and no client-side timeout; the server ends the wait by expiring the
//! resource.

use crate::client::{EventSource, StreamEvent, Subscription, WatchTarget};
use crate::error::{LnbotError, Result};
use crate::model::{ResourceStatus, Snapshot};
use crossbeam_channel::{select, Receiver, Sender};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    Pending,
    Settled,
    Expired,
    Failed,
    StreamClosed,
    Cancelled,
    TransportError,
}

impl WatchState {
    pub fn is_terminal(self) -> bool {
        self != WatchState::Pending
    }

    fn from_status(status: ResourceStatus) -> Self {
        match status {
            ResourceStatus::Settled => WatchState::Settled,
            ResourceStatus::Expired => WatchState::Expired,
            ResourceStatus::Failed => WatchState::Failed,
            _ => WatchState::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOutcome {
    pub target: WatchTarget,
    pub state: WatchState,
    pub snapshot: Snapshot,
    /// Set for `TransportError`: the stream broke before a terminal event.
    pub error: Option<String>,
}

/// External cancellation for a running watch.
///
/// A signal whose handle has been dropped never fires.
pub struct CancelSignal {
    rx: Receiver<()>,
}

#[derive(Clone)]
pub struct CancelHandle {
    tx: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Bounded to one; repeated cancels are no-ops.
        let _ = self.tx.try_send(());
    }
}

impl CancelSignal {
    pub fn new() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (CancelHandle { tx }, CancelSignal { rx })
    }

    pub fn never() -> CancelSignal {
        CancelSignal {
            rx: crossbeam_channel::never(),
        }
    }

    /// Routes Ctrl+C into a new signal. The handler can be installed once
    /// per process.
    pub fn on_interrupt() -> Result<CancelSignal> {
        let (handle, signal) = CancelSignal::new();
        ctrlc::set_handler(move || handle.cancel())
            .map_err(|e| LnbotError::Invalid(format!("installing interrupt handler: {}", e)))?;
        Ok(signal)
    }

    fn receiver(&self) -> Receiver<()> {
        self.rx.clone()
    }
}

/// Closes the subscription when dropped.
struct SubscriptionGuard {
    inner: Box<dyn Subscription>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// In-flight state of one watch.
struct WatchSession {
    target: WatchTarget,
    state: WatchState,
    last: Snapshot,
}

impl WatchSession {
    fn new(initial: Snapshot) -> Self {
        Self {
            target: WatchTarget::of(&initial),
            state: WatchState::from_status(initial.status()),
            last: initial,
        }
    }

    fn apply(&mut self, event: StreamEvent) {
        let (state, snapshot) = match event {
            StreamEvent::Settled(payload) => (
                WatchState::Settled,
                payload.unwrap_or_else(|| self.last.clone().with_status(ResourceStatus::Settled)),
            ),
            StreamEvent::Expired => (
                WatchState::Expired,
                self.last.clone().with_status(ResourceStatus::Expired),
            ),
            StreamEvent::Failed(payload) => (
                WatchState::Failed,
                payload.unwrap_or_else(|| self.last.clone().with_status(ResourceStatus::Failed)),
            ),
            StreamEvent::Status(snapshot) => {
                (WatchState::from_status(snapshot.status()), snapshot)
            }
        };
        log::debug!("{}: {} -> {:?}", self.target, snapshot.status(), state);
        self.state = state;
        self.last = snapshot;
    }

    fn finish(self, state: WatchState, error: Option<String>) -> WatchOutcome {
        WatchOutcome {
            target: self.target,
            state,
            snapshot: self.last,
            error,
        }
    }

    fn done(self) -> WatchOutcome {
        let state = self.state;
        self.finish(state, None)
    }
}

enum Wake {
    Event(Option<StreamEvent>),
    Error(Option<LnbotError>),
    Cancel(bool),
}

/// Blocks until the resource behind `initial` reaches a terminal state, the
/// stream ends or `cancel` fires.
///
/// Only a synchronous `subscribe` failure is an `Err`; everything that
/// happens afterwards is reported through [`WatchOutcome`]. The HTTP source
/// opens its stream asynchronously, so its open failures arrive on the
/// error channel like any other transport error.
pub fn watch<E: EventSource + ?Sized>(
    source: &E,
    initial: Snapshot,
    cancel: &CancelSignal,
) -> Result<WatchOutcome> {
    let mut session = WatchSession::new(initial);
    if session.state.is_terminal() {
        log::debug!("{} already {}, not watching", session.target, session.last.status());
        return Ok(session.done());
    }

    let subscription = source
        .subscribe(session.target)
        .map_err(|e| LnbotError::WatchFailed(e.to_string()))?;
    let guard = SubscriptionGuard {
        inner: subscription,
    };
    let events = guard.inner.events().clone();
    let mut errors = guard.inner.errors().clone();
    let mut cancelled = cancel.receiver();

    loop {
        let wake = select! {
            recv(events) -> msg => Wake::Event(msg.ok()),
            recv(errors) -> msg => Wake::Error(msg.ok()),
            recv(cancelled) -> msg => Wake::Cancel(msg.is_ok()),
        };

        match wake {
            Wake::Event(Some(event)) => {
                session.apply(event);
                if session.state.is_terminal() {
                    return Ok(session.done());
                }
            }
            Wake::Event(None) => {
                // An error racing the end of the stream wins over a clean close.
                if let Ok(err) = errors.try_recv() {
                    return Ok(transport_error(session, err));
                }
                log::debug!("stream for {} closed before a terminal event", session.target);
                return Ok(session.finish(WatchState::StreamClosed, None));
            }
            Wake::Error(Some(err)) => return Ok(transport_error(session, err)),
            Wake::Error(None) => errors = crossbeam_channel::never(),
            Wake::Cancel(true) => {
                log::debug!("watch of {} cancelled", session.target);
                return Ok(session.finish(WatchState::Cancelled, None));
            }
            Wake::Cancel(false) => cancelled = crossbeam_channel::never(),
        }
    }
}

fn transport_error(session: WatchSession, err: LnbotError) -> WatchOutcome {
    let message = LnbotError::WatchFailed(err.to_string()).to_string();
    log::warn!("{}: {}", session.target, message);
    session.finish(WatchState::TransportError, Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Invoice, Payment};
    use crate::test_utils::{MockClient, ScriptedStream};
    use std::thread;
    use std::time::Duration;

    fn pending_invoice(number: u64) -> Snapshot {
        Snapshot::Invoice(Invoice {
            number,
            amount: 1000,
            status: ResourceStatus::Pending,
            ..Invoice::default()
        })
    }

    fn invoice_with(number: u64, status: ResourceStatus, bolt11: &str) -> Snapshot {
        Snapshot::Invoice(Invoice {
            number,
            amount: 1000,
            status,
            bolt11: bolt11.to_string(),
            ..Invoice::default()
        })
    }

    #[test]
    fn terminal_initial_status_never_subscribes() {
        let client = MockClient::new();
        let settled = Snapshot::Payment(Payment {
            number: 3,
            status: ResourceStatus::Settled,
            ..Payment::default()
        });
        let outcome = watch(&client, settled.clone(), &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::Settled);
        assert_eq!(outcome.snapshot, settled);
        assert_eq!(client.subscribe_count(), 0);

        let failed = settled.with_status(ResourceStatus::Failed);
        let outcome = watch(&client, failed, &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::Failed);
        assert_eq!(client.subscribe_count(), 0);
    }

    #[test]
    fn pending_then_settled_uses_last_payload() {
        let client = MockClient::new();
        let final_payload = invoice_with(1, ResourceStatus::Settled, "lnbc_final");
        client.script_stream(ScriptedStream::events(vec![
            StreamEvent::Status(invoice_with(1, ResourceStatus::Pending, "lnbc_ack")),
            StreamEvent::Settled(Some(final_payload.clone())),
        ]));

        let outcome = watch(&client, pending_invoice(1), &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::Settled);
        assert_eq!(outcome.snapshot, final_payload);
        assert_eq!(outcome.error, None);
        assert_eq!(client.subscribe_count(), 1);
        assert_eq!(client.close_count(), 1);
    }

    #[test]
    fn settled_without_payload_marks_last_snapshot() {
        let client = MockClient::new();
        client.script_stream(ScriptedStream::events(vec![
            StreamEvent::Status(invoice_with(1, ResourceStatus::Processing, "lnbc_x")),
            StreamEvent::Settled(None),
        ]));
        let outcome = watch(&client, pending_invoice(1), &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::Settled);
        assert_eq!(outcome.snapshot, invoice_with(1, ResourceStatus::Settled, "lnbc_x"));
    }

    #[test]
    fn expired_is_not_an_error() {
        let client = MockClient::new();
        client.script_stream(ScriptedStream::events(vec![StreamEvent::Expired]));
        let outcome = watch(&client, pending_invoice(5), &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::Expired);
        assert_eq!(outcome.snapshot.status(), ResourceStatus::Expired);
        assert_eq!(outcome.error, None);
        assert_eq!(client.close_count(), 1);
    }

    #[test]
    fn generic_event_with_terminal_payment_status() {
        let client = MockClient::new();
        let failed = Snapshot::Payment(Payment {
            number: 8,
            status: ResourceStatus::Failed,
            failure_reason: Some("no route".into()),
            ..Payment::default()
        });
        client.script_stream(ScriptedStream::events(vec![StreamEvent::Status(failed.clone())]));
        let initial = failed.clone().with_status(ResourceStatus::Processing);
        let outcome = watch(&client, initial, &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::Failed);
        assert_eq!(outcome.snapshot, failed);
    }

    #[test]
    fn stream_closed_returns_last_known() {
        let client = MockClient::new();
        let processing = invoice_with(2, ResourceStatus::Processing, "lnbc_p");
        client.script_stream(ScriptedStream::events(vec![StreamEvent::Status(
            processing.clone(),
        )]));
        let outcome = watch(&client, pending_invoice(2), &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::StreamClosed);
        assert_eq!(outcome.snapshot, processing);

        client.script_stream(ScriptedStream::events(vec![]));
        let outcome = watch(&client, pending_invoice(2), &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::StreamClosed);
        assert_eq!(outcome.snapshot, pending_invoice(2));
        assert_eq!(client.close_count(), 2);
    }

    #[test]
    fn transport_error_is_reported_not_raised() {
        let client = MockClient::new();
        client.script_stream(ScriptedStream::error(
            vec![],
            LnbotError::Transport("connection reset".into()),
        ));
        let outcome = watch(&client, pending_invoice(3), &CancelSignal::never()).unwrap();
        assert_eq!(outcome.state, WatchState::TransportError);
        let message = outcome.error.unwrap();
        assert!(message.starts_with("watch failed"));
        assert!(message.contains("connection reset"));
        assert_eq!(outcome.snapshot, pending_invoice(3));
        assert_eq!(client.close_count(), 1);
    }

    #[test]
    fn subscribe_failure_is_watch_failed() {
        let client = MockClient::new();
        client.fail_subscribe(LnbotError::Transport("refused".into()));
        let err = watch(&client, pending_invoice(1), &CancelSignal::never()).unwrap_err();
        assert!(matches!(err, LnbotError::WatchFailed(_)));
        assert_eq!(client.close_count(), 0);
    }

    #[test]
    fn cancel_while_pending_closes_once() {
        let client = MockClient::new();
        let _feeder = client.script_stream(ScriptedStream::open());
        let (handle, signal) = CancelSignal::new();
        handle.cancel();
        let outcome = watch(&client, pending_invoice(4), &signal).unwrap();
        assert_eq!(outcome.state, WatchState::Cancelled);
        assert_eq!(outcome.snapshot, pending_invoice(4));
        assert_eq!(client.subscribe_count(), 1);
        assert_eq!(client.close_count(), 1);
    }

    #[test]
    fn cancel_from_another_thread_during_event_traffic() {
        for _ in 0..20 {
            let client = MockClient::new();
            let feeder = client.script_stream(ScriptedStream::open());
            let (handle, signal) = CancelSignal::new();

            let traffic = thread::spawn(move || {
                for _ in 0..50 {
                    let event = StreamEvent::Status(pending_invoice(6));
                    if feeder.send(event).is_err() {
                        break;
                    }
                }
                handle.cancel();
                // Keep the stream open until the watcher has gone.
                thread::sleep(Duration::from_millis(20));
                drop(feeder);
            });

            let outcome = watch(&client, pending_invoice(6), &signal).unwrap();
            traffic.join().unwrap();
            assert!(matches!(
                outcome.state,
                WatchState::Cancelled | WatchState::StreamClosed
            ));
            assert_eq!(client.close_count(), 1);
        }
    }

    #[test]
    fn dropped_cancel_handle_never_fires() {
        let client = MockClient::new();
        client.script_stream(ScriptedStream::events(vec![StreamEvent::Expired]));
        let (handle, signal) = CancelSignal::new();
        drop(handle);
        let outcome = watch(&client, pending_invoice(9), &signal).unwrap();
        assert_eq!(outcome.state, WatchState::Expired);
    }
}
