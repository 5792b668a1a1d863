use crate::client::WalletApi;
use crate::commands::{CmdResult, Identity, Output, StatusReport};
use crate::error::Result;
use crate::format::truncate_key;
use crate::resolver::Credential;
use std::time::Instant;

pub fn balance<C: WalletApi>(client: &C) -> Result<CmdResult> {
    let wallet = client
        .current_wallet()
        .map_err(|e| e.context("fetching balance"))?;
    Ok(CmdResult::new(Output::Balance(wallet)))
}

/// Wallet details plus the round-trip time of the wallet lookup.
pub fn status<C: WalletApi>(client: &C, credential: &Credential) -> Result<CmdResult> {
    let started = Instant::now();
    let wallet = client
        .current_wallet()
        .map_err(|e| e.context("fetching status"))?;
    let latency_ms = started.elapsed().as_millis();

    Ok(CmdResult::new(Output::Status(StatusReport {
        wallet: credential.name.clone(),
        wallet_id: wallet.wallet_id,
        balance: wallet.balance,
        available: wallet.available,
        on_hold: wallet.on_hold,
        address: first_address(client).unwrap_or_default(),
        latency_ms,
    })))
}

/// Identity from local credentials. The address lookup is the only network
/// call and is skipped when `lookup_address` is false.
pub fn whoami<C: WalletApi>(
    client: &C,
    credential: &Credential,
    lookup_address: bool,
) -> Result<CmdResult> {
    let address = if lookup_address {
        first_address(client)
    } else {
        None
    };
    Ok(CmdResult::new(Output::Identity(Identity {
        wallet_id: credential.record.id.clone(),
        name: credential.name.clone(),
        api_key: truncate_key(&credential.record.primary_key),
        address,
    })))
}

/// First Lightning address of the wallet; failures are not worth reporting.
pub(crate) fn first_address<C: WalletApi>(client: &C) -> Option<String> {
    match client.list_addresses() {
        Ok(addresses) => addresses.into_iter().next().map(|a| a.address),
        Err(e) => {
            log::debug!("address lookup failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Wallet};
    use crate::registry::WalletRecord;
    use crate::test_utils::MockClient;

    fn credential() -> Credential {
        Credential {
            name: "main".into(),
            record: WalletRecord::new("wal_main", "key_abcdefghijklmnopqrstuvwxyz"),
        }
    }

    fn client() -> MockClient {
        let client = MockClient::new();
        client.state().wallet = Wallet {
            wallet_id: "wal_main".into(),
            name: "main".into(),
            balance: 5000,
            available: 4500,
            on_hold: 500,
        };
        client.state().addresses = vec![Address {
            address: "main@ln.bot".into(),
            generated: true,
            ..Address::default()
        }];
        client
    }

    #[test]
    fn balance_error_carries_action() {
        let client = client();
        client.fail("current_wallet", 401, "invalid api key");
        let err = balance(&client).unwrap_err();
        assert_eq!(err.to_string(), "fetching balance: invalid api key");
    }

    #[test]
    fn status_includes_first_address() {
        let result = status(&client(), &credential()).unwrap();
        let Output::Status(report) = result.output else {
            panic!("expected status");
        };
        assert_eq!(report.wallet, "main");
        assert_eq!(report.available, 4500);
        assert_eq!(report.address, "main@ln.bot");
    }

    #[test]
    fn status_survives_address_failure() {
        let client = client();
        client.fail("list_addresses", 500, "boom");
        let result = status(&client, &credential()).unwrap();
        let Output::Status(report) = result.output else {
            panic!("expected status");
        };
        assert_eq!(report.address, "");
    }

    #[test]
    fn whoami_without_lookup_makes_no_calls() {
        let client = client();
        let result = whoami(&client, &credential(), false).unwrap();
        let Output::Identity(identity) = result.output else {
            panic!("expected identity");
        };
        assert_eq!(identity.api_key, "key_abcdefgh...wxyz");
        assert_eq!(identity.address, None);
        assert!(client.calls().is_empty());
    }
}
