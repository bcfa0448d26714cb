//! End-to-end control flow through the gateway: cache consultation,
//! coalescing, invalidation on mutation, and the idempotency token
//! lifecycle, all against a mock backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use fingate::config::Environment;
use fingate::errors::FingateError;
use fingate::idempotency::transfer_key;
use fingate::Gateway;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::provisioned_context;

const TIMEOUT: Duration = Duration::from_secs(5);

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(json!({"protocolVersion": "2.0", "id": "srv", "result": result}))
}

fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "protocolVersion": "2.0",
        "id": "srv",
        "error": {"code": code, "message": message}
    }))
}

async fn gateway_against(server: &MockServer) -> Gateway {
    let context = provisioned_context(&server.uri(), TIMEOUT);
    let gateway = Gateway::new(context.config.clone(), context.vault.clone()).unwrap();
    // The vault re-reads credentials from disk on every call, so the temp
    // keys directory (held by `context._keys_dir`) must outlive this helper.
    // Returning only the gateway would drop `context` and delete the fixture;
    // keep it alive for the rest of the process.
    std::mem::forget(context);
    gateway
}

#[tokio::test]
async fn concurrent_identical_reads_share_one_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({"method": "accounts.list"})))
        .respond_with(
            rpc_result(json!({"items": [{"id": "ACC-1"}]}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Arc::new(gateway_against(&server).await);

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .call_read(Environment::Pre, "accounts.list", json!({"currency": "EUR"}))
                    .await
            })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap().unwrap());
    }
    assert!(results.windows(2).all(|pair| pair[0].result == pair[1].result));
}

#[tokio::test]
async fn reordered_params_hit_the_same_cache_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .respond_with(rpc_result(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_against(&server).await;

    gateway
        .call_read(
            Environment::Pre,
            "transactions.list",
            json!({"account": "ACC-1", "currency": "EUR"}),
        )
        .await
        .unwrap();
    gateway
        .call_read(
            Environment::Pre,
            "transactions.list",
            json!({"currency": "EUR", "account": "ACC-1"}),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn non_rate_limited_reads_bypass_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({"method": "system.ping"})))
        .respond_with(rpc_result(json!({"pong": true})))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = gateway_against(&server).await;
    gateway.call_read(Environment::Pre, "system.ping", json!({})).await.unwrap();
    gateway.call_read(Environment::Pre, "system.ping", json!({})).await.unwrap();
}

#[tokio::test]
async fn successful_transfer_invalidates_declared_prefixes_only() {
    let server = MockServer::start().await;
    // accounts.list is fetched, invalidated by the transfer, fetched again.
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({"method": "accounts.list"})))
        .respond_with(rpc_result(json!({"items": []})))
        .expect(2)
        .mount(&server)
        .await;
    // beneficiaries.list is unrelated to a transfer and stays cached.
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({"method": "beneficiaries.list"})))
        .respond_with(rpc_result(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({"method": "transfers.create"})))
        .respond_with(rpc_result(json!({"transferId": "TR-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_against(&server).await;

    gateway.call_read(Environment::Pre, "accounts.list", json!({})).await.unwrap();
    gateway.call_read(Environment::Pre, "beneficiaries.list", json!({})).await.unwrap();

    let params = json!({"from": "ACC-A", "to": "ACC-B", "amount": "100.00"});
    gateway
        .call_idempotent_mutation(
            Environment::Pre,
            "transfers.create",
            params,
            &transfer_key("ACC-A", "ACC-B", "100.00"),
        )
        .await
        .unwrap();

    gateway.call_read(Environment::Pre, "accounts.list", json!({})).await.unwrap();
    gateway.call_read(Environment::Pre, "beneficiaries.list", json!({})).await.unwrap();
}

#[tokio::test]
async fn conflict_keeps_the_token_and_success_retires_it() {
    let server = MockServer::start().await;
    // First attempt: the backend reports the token as still processing.
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({"method": "transfers.create"})))
        .respond_with(rpc_error(6001, "a request with this token is already processing"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Subsequent attempts succeed.
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({"method": "transfers.create"})))
        .respond_with(rpc_result(json!({"transferId": "TR-2"})))
        .mount(&server)
        .await;

    let gateway = gateway_against(&server).await;
    let params = json!({"from": "ACC-A", "to": "ACC-B", "amount": "100.00"});
    let operation_key = transfer_key("ACC-A", "ACC-B", "100.00");

    let err = gateway
        .call_idempotent_mutation(
            Environment::Pre,
            "transfers.create",
            params.clone(),
            &operation_key,
        )
        .await
        .unwrap_err();
    assert!(err.is_idempotent_conflict());

    // Retry of the same intent, then a fresh attempt after success.
    gateway
        .call_idempotent_mutation(
            Environment::Pre,
            "transfers.create",
            params.clone(),
            &operation_key,
        )
        .await
        .unwrap();
    gateway
        .call_idempotent_mutation(Environment::Pre, "transfers.create", params, &operation_key)
        .await
        .unwrap();

    let tokens: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).ok()?;
            (body["method"] == "transfers.create")
                .then(|| body["params"]["idempotencyToken"].as_str().map(str::to_string))
                .flatten()
        })
        .collect();

    assert_eq!(tokens.len(), 3);
    // The conflict left the token in place for the retry...
    assert_eq!(tokens[0], tokens[1]);
    // ...and the success retired it, so the next attempt minted a new one.
    assert_ne!(tokens[1], tokens[2]);
}

#[tokio::test]
async fn terminal_failure_retires_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({"method": "transfers.create"})))
        .respond_with(rpc_error(2003, "balance too low"))
        .mount(&server)
        .await;

    let gateway = gateway_against(&server).await;
    let params = json!({"from": "ACC-A", "to": "ACC-B", "amount": "900.00"});
    let operation_key = transfer_key("ACC-A", "ACC-B", "900.00");

    for _ in 0..2 {
        let err = gateway
            .call_idempotent_mutation(
                Environment::Pre,
                "transfers.create",
                params.clone(),
                &operation_key,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FingateError::Backend(_)));
    }

    let tokens: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).ok()?;
            body["params"]["idempotencyToken"].as_str().map(str::to_string)
        })
        .collect();

    assert_eq!(tokens.len(), 2);
    assert_ne!(tokens[0], tokens[1]);
}

#[tokio::test]
async fn cache_info_reports_age_and_next_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .respond_with(rpc_result(json!({"items": []})))
        .mount(&server)
        .await;

    let gateway = gateway_against(&server).await;
    let params = json!({"currency": "EUR"});

    let before = gateway.cache_info(Environment::Pre, "accounts.list", &params);
    assert!(!before.cached);

    gateway.call_read(Environment::Pre, "accounts.list", params.clone()).await.unwrap();

    let after = gateway.cache_info(Environment::Pre, "accounts.list", &params);
    assert!(after.cached);
    assert!(after.age.is_some());
    assert!(after.next_allowed_at.is_some());
}
