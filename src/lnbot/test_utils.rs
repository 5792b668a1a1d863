//! Scripted in-process stand-in for the wallet service.
//!
//! A [`MockConnector`] and every [`MockClient`] it hands out share one
//! [`MockState`]: canned responses go in, recorded calls come out. Event
//! streams are scripted with [`ScriptedStream`] and consumed one per
//! `subscribe` call, in order.

use crate::client::{Connect, EventSource, StreamEvent, Subscription, WalletApi, WatchTarget};
use crate::error::{LnbotError, Result};
use crate::model::*;
use crossbeam_channel::{Receiver, Sender};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Canned responses and call records.
#[derive(Default)]
pub struct MockState {
    pub wallet: Wallet,
    pub created_wallet: CreatedWallet,
    pub invoice: Invoice,
    pub invoices: Vec<Invoice>,
    pub payment: Payment,
    pub payments: Vec<Payment>,
    pub transactions: Vec<Transaction>,
    pub addresses: Vec<Address>,
    pub rotated_key: String,
    pub recovery: RecoveryBackup,
    pub restored: RestoredWallet,
    pub webhooks: Vec<Webhook>,

    pub calls: Vec<String>,
    pub connected_keys: Vec<Option<String>>,
    pub last_payment: Option<CreatePaymentParams>,
    pub last_invoice: Option<CreateInvoiceParams>,
    pub last_list: Option<ListParams>,
    pub last_transfer: Option<(String, TransferAddressParams)>,
    pub last_rename: Option<String>,
    pub last_rotate: Option<KeySlot>,

    failures: HashMap<&'static str, (u16, String)>,
    streams: VecDeque<PendingStream>,
    subscribe_error: Option<LnbotError>,
    subscribes: usize,
    closes: Rc<Cell<usize>>,
}

impl MockState {
    fn call(&mut self, name: &'static str) -> Result<()> {
        self.calls.push(name.to_string());
        match self.failures.get(name) {
            Some((status, message)) => Err(LnbotError::Remote {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Events to replay on the next subscription.
pub struct ScriptedStream {
    events: Vec<StreamEvent>,
    error: Option<LnbotError>,
}

impl ScriptedStream {
    /// Replays `events`, then ends once the returned feeder is dropped.
    pub fn events(events: Vec<StreamEvent>) -> Self {
        Self {
            events,
            error: None,
        }
    }

    /// Replays `events`, then reports `error` on the error channel.
    pub fn error(events: Vec<StreamEvent>, error: LnbotError) -> Self {
        Self {
            events,
            error: Some(error),
        }
    }

    /// Nothing queued; the stream stays open while the feeder lives.
    pub fn open() -> Self {
        Self::events(Vec::new())
    }
}

struct PendingStream {
    events: Receiver<StreamEvent>,
    errors: Receiver<LnbotError>,
    errors_tx: Option<Sender<LnbotError>>,
}

pub struct MockSubscription {
    events: Receiver<StreamEvent>,
    errors: Receiver<LnbotError>,
    _errors_tx: Option<Sender<LnbotError>>,
    closes: Rc<Cell<usize>>,
}

impl Subscription for MockSubscription {
    fn events(&self) -> &Receiver<StreamEvent> {
        &self.events
    }

    fn errors(&self) -> &Receiver<LnbotError> {
        &self.errors
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

#[derive(Clone, Default)]
pub struct MockClient {
    state: Rc<RefCell<MockState>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::cell::RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    /// Makes the named `WalletApi` method fail with a remote error.
    pub fn fail(&self, method: &'static str, status: u16, message: &str) {
        self.state
            .borrow_mut()
            .failures
            .insert(method, (status, message.to_string()));
    }

    pub fn fail_subscribe(&self, error: LnbotError) {
        self.state.borrow_mut().subscribe_error = Some(error);
    }

    /// Queues a stream for the next `subscribe`. Events sent on the
    /// returned feeder are delivered too; dropping it ends the stream.
    pub fn script_stream(&self, script: ScriptedStream) -> Sender<StreamEvent> {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (errors_tx, errors_rx) = crossbeam_channel::unbounded();
        for event in script.events {
            let _ = events_tx.send(event);
        }
        let errors_tx = match script.error {
            Some(error) => {
                let _ = errors_tx.send(error);
                None
            }
            None => Some(errors_tx),
        };
        self.state.borrow_mut().streams.push_back(PendingStream {
            events: events_rx,
            errors: errors_rx,
            errors_tx,
        });
        events_tx
    }

    pub fn subscribe_count(&self) -> usize {
        self.state.borrow().subscribes
    }

    pub fn close_count(&self) -> usize {
        self.state.borrow().closes.get()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }
}

impl EventSource for MockClient {
    fn subscribe(&self, target: WatchTarget) -> Result<Box<dyn Subscription>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("subscribe {}", target));
        if let Some(error) = state.subscribe_error.take() {
            return Err(error);
        }
        state.subscribes += 1;
        let pending = state.streams.pop_front().unwrap_or_else(|| {
            // Unscripted: a stream that ends immediately.
            let (_, events) = crossbeam_channel::unbounded();
            let (_, errors) = crossbeam_channel::unbounded();
            PendingStream {
                events,
                errors,
                errors_tx: None,
            }
        });
        Ok(Box::new(MockSubscription {
            events: pending.events,
            errors: pending.errors,
            _errors_tx: pending.errors_tx,
            closes: Rc::clone(&state.closes),
        }))
    }
}

impl WalletApi for MockClient {
    fn create_wallet(&self, _params: &CreateWalletParams) -> Result<CreatedWallet> {
        let mut state = self.state.borrow_mut();
        state.call("create_wallet")?;
        Ok(state.created_wallet.clone())
    }

    fn current_wallet(&self) -> Result<Wallet> {
        let mut state = self.state.borrow_mut();
        state.call("current_wallet")?;
        Ok(state.wallet.clone())
    }

    fn update_wallet(&self, params: &UpdateWalletParams) -> Result<Wallet> {
        let mut state = self.state.borrow_mut();
        state.call("update_wallet")?;
        state.last_rename = Some(params.name.clone());
        state.wallet.name = params.name.clone();
        Ok(state.wallet.clone())
    }

    fn create_invoice(&self, params: &CreateInvoiceParams) -> Result<Invoice> {
        let mut state = self.state.borrow_mut();
        state.call("create_invoice")?;
        state.last_invoice = Some(params.clone());
        Ok(state.invoice.clone())
    }

    fn list_invoices(&self, params: ListParams) -> Result<Vec<Invoice>> {
        let mut state = self.state.borrow_mut();
        state.call("list_invoices")?;
        state.last_list = Some(params);
        Ok(state.invoices.clone())
    }

    fn create_payment(&self, params: &CreatePaymentParams) -> Result<Payment> {
        let mut state = self.state.borrow_mut();
        state.call("create_payment")?;
        state.last_payment = Some(params.clone());
        Ok(state.payment.clone())
    }

    fn list_payments(&self, params: ListParams) -> Result<Vec<Payment>> {
        let mut state = self.state.borrow_mut();
        state.call("list_payments")?;
        state.last_list = Some(params);
        Ok(state.payments.clone())
    }

    fn list_transactions(&self, params: ListParams) -> Result<Vec<Transaction>> {
        let mut state = self.state.borrow_mut();
        state.call("list_transactions")?;
        state.last_list = Some(params);
        Ok(state.transactions.clone())
    }

    fn list_addresses(&self) -> Result<Vec<Address>> {
        let mut state = self.state.borrow_mut();
        state.call("list_addresses")?;
        Ok(state.addresses.clone())
    }

    fn create_address(&self, params: &CreateAddressParams) -> Result<Address> {
        let mut state = self.state.borrow_mut();
        state.call("create_address")?;
        let name = params.address.clone().unwrap_or_else(|| "generated".into());
        Ok(Address {
            address: format!("{}@ln.bot", name),
            ..Address::default()
        })
    }

    fn transfer_address(
        &self,
        address: &str,
        params: &TransferAddressParams,
    ) -> Result<AddressTransfer> {
        let mut state = self.state.borrow_mut();
        state.call("transfer_address")?;
        state.last_transfer = Some((address.to_string(), params.clone()));
        Ok(AddressTransfer {
            address: address.to_string(),
            transferred_to: "wal_target".into(),
        })
    }

    fn delete_address(&self, _address: &str) -> Result<()> {
        self.state.borrow_mut().call("delete_address")
    }

    fn rotate_key(&self, slot: KeySlot) -> Result<RotatedKey> {
        let mut state = self.state.borrow_mut();
        state.call("rotate_key")?;
        state.last_rotate = Some(slot);
        Ok(RotatedKey {
            key: state.rotated_key.clone(),
        })
    }

    fn backup_recovery(&self) -> Result<RecoveryBackup> {
        let mut state = self.state.borrow_mut();
        state.call("backup_recovery")?;
        Ok(state.recovery.clone())
    }

    fn restore_recovery(&self, _params: &RestoreParams) -> Result<RestoredWallet> {
        let mut state = self.state.borrow_mut();
        state.call("restore_recovery")?;
        Ok(state.restored.clone())
    }

    fn create_webhook(&self, params: &CreateWebhookParams) -> Result<Webhook> {
        let mut state = self.state.borrow_mut();
        state.call("create_webhook")?;
        Ok(Webhook {
            id: "whk_1".into(),
            url: params.url.clone(),
            active: true,
            secret: Some("whsec_test".into()),
            created_at: None,
        })
    }

    fn list_webhooks(&self) -> Result<Vec<Webhook>> {
        let mut state = self.state.borrow_mut();
        state.call("list_webhooks")?;
        Ok(state.webhooks.clone())
    }

    fn delete_webhook(&self, _id: &str) -> Result<()> {
        self.state.borrow_mut().call("delete_webhook")
    }
}

/// Hands out [`MockClient`]s that share its state.
#[derive(Clone, Default)]
pub struct MockConnector {
    client: MockClient,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle onto the shared state, for scripting and inspection.
    pub fn client(&self) -> MockClient {
        self.client.clone()
    }

    pub fn connected_keys(&self) -> Vec<Option<String>> {
        self.client.state.borrow().connected_keys.clone()
    }
}

impl Connect for MockConnector {
    type Client = MockClient;

    fn connect(&self, api_key: Option<&str>) -> Result<MockClient> {
        self.client
            .state
            .borrow_mut()
            .connected_keys
            .push(api_key.map(str::to_string));
        Ok(self.client.clone())
    }
}
