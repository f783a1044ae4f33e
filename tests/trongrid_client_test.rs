//! TronGridClient against a mocked full-node HTTP API

use mockito::{Matcher, Server};
use serde_json::json;

use tronfee::chain::{ChainError, ChainResourceProvider, ContractCall};
use tronfee::config::TronConfig;
use tronfee::tron::abi::trc20_call;
use tronfee::tron::{Trc20Method, TronGridClient};
use tronfee::types::{Address, Token};

const OWNER: &str = "TA4Wt1DUCqz6YegbnsmqsWC5uUfbdBqPxm";
const RECIPIENT: &str = "TA9pkx4DFxrEw8JZzUtyDrh2uAat1LDuJL";

fn client(server: &Server, api_key: Option<&str>) -> TronGridClient {
    TronGridClient::new(&TronConfig {
        endpoint: server.url(),
        api_key: api_key.map(str::to_string),
        timeout_secs: 5,
    })
    .unwrap()
}

fn transfer_call() -> ContractCall {
    trc20_call(
        Trc20Method::Transfer,
        &Address::from(OWNER),
        &Token::tron_usdt().address,
        &Address::from(RECIPIENT),
        50_000_000,
    )
    .unwrap()
}

#[tokio::test]
async fn test_read_account_resources() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/wallet/getaccountresource")
        .match_header("TRON-PRO-API-KEY", "secret")
        .match_body(Matcher::PartialJson(json!({ "address": OWNER, "visible": true })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "freeNetLimit": 600,
                "freeNetUsed": 120,
                "NetLimit": 1000,
                "EnergyLimit": 40000,
                "EnergyUsed": 20000
            })
            .to_string(),
        )
        .create_async()
        .await;

    let snapshot = client(&server, Some("secret"))
        .read_account_resources(&Address::from(OWNER))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(snapshot.available_energy(), 20_000);
    assert_eq!(snapshot.available_bandwidth(), 1_480);
    assert_eq!(snapshot.staked_bandwidth_used, 0);
}

#[tokio::test]
async fn test_empty_resource_reply_means_account_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/wallet/getaccountresource")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let err = client(&server, None)
        .read_account_resources(&Address::from(OWNER))
        .await
        .unwrap_err();

    assert!(matches!(err, ChainError::AccountNotFound { .. }));
}

#[tokio::test]
async fn test_simulate_contract_call_returns_energy_used() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/wallet/triggerconstantcontract")
        .match_body(Matcher::PartialJson(json!({
            "owner_address": OWNER,
            "function_selector": "transfer(address,uint256)",
            "visible": true
        })))
        .with_status(200)
        .with_body(
            json!({
                "result": { "result": true },
                "energy_used": 14650,
                "constant_result": ["0000000000000000000000000000000000000000000000000000000000000001"],
                "transaction": { "ret": [{}] }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let energy = client(&server, None)
        .simulate_contract_call(&transfer_call())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(energy, 14_650);
}

#[tokio::test]
async fn test_revert_without_message_is_new_account_revert() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/wallet/triggerconstantcontract")
        .with_status(200)
        .with_body(
            json!({
                "result": { "result": true },
                "energy_used": 600,
                "transaction": { "ret": [{ "ret": "FAILED", "contractRet": "REVERT" }] }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(&server, None)
        .simulate_contract_call(&transfer_call())
        .await
        .unwrap_err();

    assert!(err.is_new_account_revert(), "{err}");
}

#[tokio::test]
async fn test_hex_encoded_revert_message_is_decoded() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/wallet/triggerconstantcontract")
        .with_status(200)
        .with_body(
            json!({
                "result": {
                    "code": "CONTRACT_EXE_ERROR",
                    "message": "524556455254206f70636f6465206578656375746564"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client(&server, None)
        .simulate_contract_call(&transfer_call())
        .await
        .unwrap_err();

    match err {
        ChainError::ContractReverted { message, .. } => assert_eq!(message, "REVERT opcode executed"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_token_balance_decodes_abi_word() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/wallet/triggerconstantcontract")
        .match_body(Matcher::PartialJson(json!({ "function_selector": "balanceOf(address)" })))
        .with_status(200)
        .with_body(
            json!({
                "result": { "result": true },
                "energy_used": 0,
                "constant_result": [format!("{:064x}", 100_000_000u64)]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let balance = client(&server, None)
        .token_balance(&Address::from(OWNER), &Token::tron_usdt())
        .await
        .unwrap();

    assert_eq!(balance, 100_000_000);
}

#[tokio::test]
async fn test_native_balance() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/wallet/getaccount")
        .match_body(Matcher::PartialJson(json!({ "address": RECIPIENT })))
        .with_status(200)
        .with_body(json!({ "address": RECIPIENT, "balance": 5_000_000 }).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/wallet/getaccount")
        .match_body(Matcher::PartialJson(json!({ "address": OWNER })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = client(&server, None);
    assert_eq!(client.native_balance(&Address::from(RECIPIENT)).await.unwrap(), 5_000_000);
    assert!(matches!(
        client.native_balance(&Address::from(OWNER)).await,
        Err(ChainError::AccountNotFound { .. })
    ));
}

#[tokio::test]
async fn test_build_sample_transaction_from_raw_data_hex() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/wallet/triggersmartcontract")
        .match_body(Matcher::PartialJson(json!({ "fee_limit": 30_000_000, "call_value": 0 })))
        .with_status(200)
        .with_body(
            json!({
                "result": { "result": true },
                "transaction": {
                    "visible": true,
                    "txID": "ab",
                    "raw_data_hex": "0a02abcd2208"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let sample = client(&server, None)
        .build_sample_transaction(&transfer_call())
        .await
        .unwrap();

    assert_eq!(sample.raw_data, vec![0x0a, 0x02, 0xab, 0xcd, 0x22, 0x08]);
    assert_eq!(sample.signature_count, 1);
}

#[tokio::test]
async fn test_server_error_is_retryable_rpc_response() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/wallet/getaccountresource")
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let err = client(&server, None)
        .read_account_resources(&Address::from(OWNER))
        .await
        .unwrap_err();

    assert!(matches!(err, ChainError::RpcResponse { code: Some(503), .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_invalid_address_never_reaches_the_node() {
    let server = Server::new_async().await;

    let err = client(&server, None)
        .read_account_resources(&Address::from("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6u"))
        .await
        .unwrap_err();

    assert!(matches!(err, ChainError::InvalidAddress(_)));
}
