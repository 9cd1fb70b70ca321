use super::*;
use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{extract::State, routing::post, Json, Router};
use tokio::{net::TcpListener, sync::Mutex};

const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
const ACCOUNT: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

#[derive(Clone)]
struct NodeState {
    replies: Arc<HashMap<&'static str, Value>>,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn handle_rpc(State(state): State<NodeState>, Json(body): Json<Value>) -> Json<Value> {
    let method = body["method"].as_str().unwrap_or_default().to_string();
    let id = body["id"].clone();
    state.requests.lock().await.push(body);

    let mut reply = state
        .replies
        .get(method.as_str())
        .cloned()
        .unwrap_or_else(|| json!({ "error": { "code": -32601, "message": "method not found" } }));
    reply["jsonrpc"] = json!("2.0");
    reply["id"] = id;
    Json(reply)
}

async fn spawn_node(
    replies: HashMap<&'static str, Value>,
) -> (JsonRpcChainClient, Arc<Mutex<Vec<Value>>>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = NodeState {
        replies: Arc::new(replies),
        requests: requests.clone(),
    };
    let app = Router::new().route("/", post(handle_rpc)).with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let endpoint = Url::parse(&format!("http://{addr}/")).expect("url");
    let client = JsonRpcChainClient::new(endpoint, Duration::from_secs(5)).expect("client");
    (client, requests)
}

fn uint_word(value: u128) -> String {
    format!("0x{:064x}", value)
}

fn contract() -> Address {
    CONTRACT.parse().expect("contract")
}

#[tokio::test]
async fn read_contract_sends_selector_and_decodes_uint() {
    let (client, requests) = spawn_node(HashMap::from([(
        "eth_call",
        json!({ "result": uint_word(3661) }),
    )]))
    .await;

    let value = client
        .read_contract(contract(), ReadFunction::ElapsedTime)
        .await
        .expect("read");
    assert_eq!(value, ContractValue::Uint(3661));

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["method"], "eth_call");
    assert_eq!(requests[0]["params"][0]["to"], CONTRACT);
    assert_eq!(
        requests[0]["params"][0]["data"],
        abi::encode_call("elapsedTime()")
    );
    assert_eq!(requests[0]["params"][1], "latest");
}

#[tokio::test]
async fn read_contract_decodes_bool() {
    let (client, _requests) = spawn_node(HashMap::from([(
        "eth_call",
        json!({ "result": uint_word(1) }),
    )]))
    .await;

    let value = client
        .read_contract(contract(), ReadFunction::IsRunning)
        .await
        .expect("read");
    assert_eq!(value, ContractValue::Bool(true));
}

#[tokio::test]
async fn write_contract_sends_from_first_node_account() {
    let hash = format!("0x{}", "11".repeat(32));
    let (client, requests) = spawn_node(HashMap::from([
        ("eth_accounts", json!({ "result": [ACCOUNT] })),
        ("eth_sendTransaction", json!({ "result": hash })),
    ]))
    .await;

    let submitted = client
        .write_contract(contract(), WriteFunction::Start)
        .await
        .expect("write");
    assert_eq!(submitted.to_string(), hash);

    let requests = requests.lock().await;
    let send = requests
        .iter()
        .find(|request| request["method"] == "eth_sendTransaction")
        .expect("send request");
    assert_eq!(send["params"][0]["from"], ACCOUNT);
    assert_eq!(send["params"][0]["to"], CONTRACT);
    assert_eq!(send["params"][0]["data"], abi::encode_call("start()"));
}

#[tokio::test]
async fn write_contract_without_accounts_reports_no_account() {
    let (client, requests) =
        spawn_node(HashMap::from([("eth_accounts", json!({ "result": [] }))])).await;

    let err = client
        .write_contract(contract(), WriteFunction::Stop)
        .await
        .expect_err("no account");
    assert_eq!(err, ChainError::NoAccount);
    assert!(requests
        .lock()
        .await
        .iter()
        .all(|request| request["method"] != "eth_sendTransaction"));
}

#[tokio::test]
async fn account_override_skips_eth_accounts() {
    let (client, requests) = spawn_node(HashMap::new()).await;
    let client = client.with_account(Some(ACCOUNT.parse().expect("account")));

    let account = client.connected_account().await.expect("account");
    assert_eq!(account.map(|a| a.to_string()).as_deref(), Some(ACCOUNT));
    assert!(requests.lock().await.is_empty());
}

#[tokio::test]
async fn rpc_error_objects_map_to_rpc_errors() {
    let (client, _requests) = spawn_node(HashMap::from([(
        "eth_call",
        json!({ "error": { "code": 3, "message": "execution reverted" } }),
    )]))
    .await;

    let err = client
        .read_contract(contract(), ReadFunction::StartTime)
        .await
        .expect_err("rpc error");
    assert_eq!(
        err,
        ChainError::Rpc {
            code: 3,
            message: "execution reverted".to_string()
        }
    );
}

#[tokio::test]
async fn pending_receipt_is_none() {
    let (client, _requests) = spawn_node(HashMap::from([(
        "eth_getTransactionReceipt",
        json!({ "result": null }),
    )]))
    .await;

    let receipt = client
        .transaction_receipt(TxHash([7; 32]))
        .await
        .expect("receipt");
    assert!(receipt.is_none());
}

#[tokio::test]
async fn receipt_status_zero_is_reverted() {
    let hash = TxHash([9; 32]);
    let (client, _requests) = spawn_node(HashMap::from([(
        "eth_getTransactionReceipt",
        json!({ "result": {
            "transactionHash": hash.to_string(),
            "status": "0x0",
            "blockNumber": "0x10",
        } }),
    )]))
    .await;

    let receipt = client
        .transaction_receipt(hash)
        .await
        .expect("receipt")
        .expect("included");
    assert_eq!(receipt.status, ReceiptStatus::Reverted);
    assert_eq!(receipt.block_number, Some(16));
    assert_eq!(receipt.transaction_hash, hash);
}

#[tokio::test]
async fn unreachable_node_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let client = JsonRpcChainClient::new(
        Url::parse(&format!("http://{addr}/")).expect("url"),
        Duration::from_secs(5),
    )
    .expect("client");

    let err = client
        .connected_account()
        .await
        .expect_err("connection refused");
    assert!(matches!(err, ChainError::Transport(_)));
}

#[tokio::test]
async fn silent_node_times_out_as_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    // Accept connections and never answer.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    let client = JsonRpcChainClient::new(
        Url::parse(&format!("http://{addr}/")).expect("url"),
        Duration::from_millis(200),
    )
    .expect("client");

    let result = tokio::time::timeout(Duration::from_secs(5), client.connected_account())
        .await
        .expect("request timeout should fire first");
    assert!(matches!(result, Err(ChainError::Transport(_))));
}
