use crate::client::WalletApi;
use crate::commands::{CmdMessage, CmdResult, Output};
use crate::error::{LnbotError, Result};
use crate::model::CreateWebhookParams;

/// Registers `url`. The signing secret is only ever returned here.
pub fn create<C: WalletApi>(client: &C, url: &str) -> Result<CmdResult> {
    let url = url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(LnbotError::Invalid(
            "--url must be an http(s) URL".into(),
        ));
    }
    let webhook = client
        .create_webhook(&CreateWebhookParams {
            url: url.to_string(),
        })
        .map_err(|e| e.context("creating webhook"))?;
    Ok(CmdResult::new(Output::Webhook(webhook)).with_message(CmdMessage::success("Webhook created")))
}

pub fn list<C: WalletApi>(client: &C) -> Result<CmdResult> {
    let webhooks = client
        .list_webhooks()
        .map_err(|e| e.context("listing webhooks"))?;
    let mut result = CmdResult::default();
    if webhooks.is_empty() {
        result.add_message(CmdMessage::info("No webhooks yet."));
    }
    result.output = Output::Webhooks(webhooks);
    Ok(result)
}

pub fn delete<C: WalletApi>(client: &C, id: &str) -> Result<CmdResult> {
    client
        .delete_webhook(id)
        .map_err(|e| e.context("deleting webhook"))?;
    Ok(CmdResult::default().with_message(CmdMessage::success(format!("Webhook {} deleted", id))))
}
