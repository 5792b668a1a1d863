//! HTTP implementation of the client traits.
//!
//! Requests are async reqwest calls driven to completion on a small tokio
//! runtime owned by the connector, so the rest of the crate stays
//! synchronous. Event streams run as tasks on the same runtime and forward
//! decoded events over crossbeam channels; closing a subscription aborts
//! its task, which drops the connection.

use super::events::StreamEvent;
use super::sse::SseDecoder;
use super::{Connect, EventSource, Subscription, WalletApi, WatchTarget};
use crate::error::{LnbotError, Result};
use crate::model::*;
use crossbeam_channel::{Receiver, Sender};
use futures_util::StreamExt;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpConnector {
    base_url: String,
    runtime: Arc<Runtime>,
    http: reqwest::Client,
}

impl HttpConnector {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("lnbot-http")
            .enable_all()
            .build()?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("lnbot-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            runtime: Arc::new(runtime),
            http,
        })
    }
}

impl Connect for HttpConnector {
    type Client = HttpClient;

    fn connect(&self, api_key: Option<&str>) -> Result<HttpClient> {
        Ok(HttpClient {
            base_url: self.base_url.clone(),
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
            runtime: Arc::clone(&self.runtime),
            http: self.http.clone(),
        })
    }
}

pub struct HttpClient {
    base_url: String,
    api_key: Option<String>,
    runtime: Arc<Runtime>,
    http: reqwest::Client,
}

impl HttpClient {
    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method.clone(), self.url(path));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        log::debug!("{} {}", method, self.url(path));
        builder
    }

    fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        self.runtime.block_on(fetch_json(builder))
    }

    fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.runtime.block_on(fetch_empty(builder))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path))
    }

    fn list<T: DeserializeOwned>(&self, path: &str, params: ListParams) -> Result<Vec<T>> {
        self.send(self.request(Method::GET, path).query(&params.to_query()))
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(self.request(Method::POST, path).json(body))
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, path))
    }
}

async fn fetch_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
    let response = builder.timeout(REQUEST_TIMEOUT).send().await?;
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn fetch_empty(builder: RequestBuilder) -> Result<()> {
    let response = builder.timeout(REQUEST_TIMEOUT).send().await?;
    check_status(response).await?;
    Ok(())
}

async fn open_stream(builder: RequestBuilder) -> Result<reqwest::Response> {
    let response = builder.send().await?;
    check_status(response).await
}

/// Maps a non-success response to a structured remote error, preferring
/// the server's own message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LnbotError::Remote {
        status: status.as_u16(),
        message: remote_message(status, &body),
    })
}

fn remote_message(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|field| {
                value
                    .get(*field)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        });
    from_body.unwrap_or_else(|| match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    })
}

fn stream_path(target: WatchTarget) -> String {
    match target {
        WatchTarget::Invoice(n) => format!("invoices/{}/events", n),
        WatchTarget::Payment(n) => format!("payments/{}/events", n),
    }
}

impl EventSource for HttpClient {
    /// Returns at once. The request is sent from the stream task, so a
    /// server that never answers cannot hold the caller; closing the
    /// subscription aborts the task wherever it is. A failed open arrives
    /// on the errors channel.
    fn subscribe(&self, target: WatchTarget) -> Result<Box<dyn Subscription>> {
        let builder = self
            .request(Method::GET, &stream_path(target))
            .header(reqwest::header::ACCEPT, "text/event-stream");

        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (errors_tx, errors_rx) = crossbeam_channel::unbounded();
        let task = self
            .runtime
            .spawn(pump(target, builder, events_tx, errors_tx));
        log::debug!("subscribing to {}", target);

        Ok(Box::new(HttpSubscription {
            events: events_rx,
            errors: errors_rx,
            task: Some(task),
        }))
    }
}

/// Opens the stream, then reads the body until it ends, the receiver goes
/// away or the task is aborted. The senders drop on return, which
/// disconnects both channels.
async fn pump(
    target: WatchTarget,
    builder: RequestBuilder,
    events: Sender<StreamEvent>,
    errors: Sender<LnbotError>,
) {
    let response = match open_stream(builder).await {
        Ok(response) => response,
        Err(e) => {
            log::debug!("opening stream for {} failed: {}", target, e);
            let _ = errors.send(e);
            return;
        }
    };
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = errors.send(LnbotError::Transport(e.to_string()));
                return;
            }
        };
        for frame in decoder.push(&chunk) {
            match StreamEvent::decode(target, &frame) {
                Ok(Some(event)) => {
                    if events.send(event).is_err() {
                        return;
                    }
                }
                Ok(None) => log::trace!("skipping {} frame on {}", frame.event, target),
                Err(e) => {
                    let _ = errors.send(e);
                    return;
                }
            }
        }
    }
    log::debug!("stream for {} ended", target);
}

pub struct HttpSubscription {
    events: Receiver<StreamEvent>,
    errors: Receiver<LnbotError>,
    task: Option<JoinHandle<()>>,
}

impl Subscription for HttpSubscription {
    fn events(&self) -> &Receiver<StreamEvent> {
        &self.events
    }

    fn errors(&self) -> &Receiver<LnbotError> {
        &self.errors
    }

    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for HttpSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl WalletApi for HttpClient {
    fn create_wallet(&self, params: &CreateWalletParams) -> Result<CreatedWallet> {
        self.post("wallets", params)
    }

    fn current_wallet(&self) -> Result<Wallet> {
        self.get("wallets/current")
    }

    fn update_wallet(&self, params: &UpdateWalletParams) -> Result<Wallet> {
        self.send(self.request(Method::PATCH, "wallets/current").json(params))
    }

    fn create_invoice(&self, params: &CreateInvoiceParams) -> Result<Invoice> {
        self.post("invoices", params)
    }

    fn list_invoices(&self, params: ListParams) -> Result<Vec<Invoice>> {
        self.list("invoices", params)
    }

    fn create_payment(&self, params: &CreatePaymentParams) -> Result<Payment> {
        self.post("payments", params)
    }

    fn list_payments(&self, params: ListParams) -> Result<Vec<Payment>> {
        self.list("payments", params)
    }

    fn list_transactions(&self, params: ListParams) -> Result<Vec<Transaction>> {
        self.list("transactions", params)
    }

    fn list_addresses(&self) -> Result<Vec<Address>> {
        self.get("addresses")
    }

    fn create_address(&self, params: &CreateAddressParams) -> Result<Address> {
        self.post("addresses", params)
    }

    fn transfer_address(
        &self,
        address: &str,
        params: &TransferAddressParams,
    ) -> Result<AddressTransfer> {
        self.post(&format!("addresses/{}/transfer", address), params)
    }

    fn delete_address(&self, address: &str) -> Result<()> {
        self.delete(&format!("addresses/{}", address))
    }

    fn rotate_key(&self, slot: KeySlot) -> Result<RotatedKey> {
        self.post(
            &format!("keys/{}/rotate", slot.wire_index()),
            &serde_json::json!({}),
        )
    }

    fn backup_recovery(&self) -> Result<RecoveryBackup> {
        self.post("backup/recovery", &serde_json::json!({}))
    }

    fn restore_recovery(&self, params: &RestoreParams) -> Result<RestoredWallet> {
        self.post("restore/recovery", params)
    }

    fn create_webhook(&self, params: &CreateWebhookParams) -> Result<Webhook> {
        self.post("webhooks", params)
    }

    fn list_webhooks(&self) -> Result<Vec<Webhook>> {
        self.get("webhooks")
    }

    fn delete_webhook(&self, id: &str) -> Result<()> {
        self.delete(&format!("webhooks/{}", id))
    }
}
