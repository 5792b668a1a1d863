//! Configuration snippets for MCP clients. Only the hosted endpoint
//! exists; there is no local server yet.

use crate::commands::{CmdMessage, CmdResult, Output};
use crate::resolver::Credential;
use serde_json::json;

const NOT_AVAILABLE: &str = "Local MCP server is not available yet.";

/// The `mcpServers` block pointing at `{api_url}/mcp`, authenticated with
/// the wallet's primary key.
pub fn remote_config(api_url: &str, credential: &Credential) -> CmdResult {
    let config = json!({
        "mcpServers": {
            "lnbot": {
                "type": "url",
                "url": format!("{}/mcp", api_url.trim_end_matches('/')),
                "headers": {
                    "Authorization": format!("Bearer {}", credential.record.primary_key),
                },
            },
        },
    });
    CmdResult::new(Output::McpConfig(config))
}

pub fn local_config() -> CmdResult {
    CmdResult::default()
        .with_message(CmdMessage::info(NOT_AVAILABLE))
        .with_message(CmdMessage::info(
            "Use --remote for the hosted endpoint:\n  lnbot mcp config --remote",
        ))
}

pub fn serve() -> CmdResult {
    CmdResult::default()
        .with_message(CmdMessage::info(NOT_AVAILABLE))
        .with_message(CmdMessage::info(
            "Use the remote endpoint instead:\n  lnbot mcp config --remote",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WalletRecord;

    #[test]
    fn remote_config_carries_bearer_key() {
        let credential = Credential {
            name: "main".into(),
            record: WalletRecord::new("wal_main", "key_secret"),
        };
        let Output::McpConfig(config) = remote_config("https://api.ln.bot/", &credential).output
        else {
            panic!("expected config");
        };
        let server = &config["mcpServers"]["lnbot"];
        assert_eq!(server["type"], "url");
        assert_eq!(server["url"], "https://api.ln.bot/mcp");
        assert_eq!(server["headers"]["Authorization"], "Bearer key_secret");
    }

    #[test]
    fn local_config_is_not_available() {
        let result = local_config();
        assert!(matches!(result.output, Output::None));
        assert_eq!(result.messages[0].content, NOT_AVAILABLE);
    }
}
