//! HTTP surface tests: routing, auth header handling, and error mapping,
//! served over a real socket against the in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use paylink_core::adapters::MemoryLedgerStore;
use paylink_core::{create_app, AppState};

async fn setup_test_app() -> (String, reqwest::Client) {
    let store = Arc::new(MemoryLedgerStore::new());
    let app = create_app(AppState::new(store));

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let server = axum::Server::bind(&addr).serve(app.into_make_service());
    let actual_addr = server.local_addr();

    tokio::spawn(async move {
        server.await.unwrap();
    });

    (format!("http://{}", actual_addr), reqwest::Client::new())
}

async fn create_account(
    base: &str,
    client: &reqwest::Client,
    user_id: i64,
    bank_code: &str,
) -> Value {
    let res = client
        .post(format!("{base}/api/accounts"))
        .header("x-user-id", user_id)
        .json(&json!({ "bank_code": bank_code }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let (base, client) = setup_test_app().await;
    let res = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_requires_user_header() {
    let (base, client) = setup_test_app().await;
    let res = client
        .post(format!("{base}/api/accounts"))
        .json(&json!({ "bank_code": "088" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_list_and_connect_accounts() {
    let (base, client) = setup_test_app().await;

    let first = create_account(&base, &client, 1, "088").await;
    let second = create_account(&base, &client, 1, "090").await;
    assert_eq!(first["balance"], 0);

    let res = client
        .get(format!("{base}/api/accounts"))
        .header("x-user-id", 1)
        .send()
        .await
        .unwrap();
    let accounts: Vec<Value> = res.json().await.unwrap();
    assert_eq!(accounts.len(), 2);

    let res = client
        .post(format!("{base}/api/accounts/connect"))
        .header("x-user-id", 1)
        .json(&json!({ "account_number": second["account_number"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{base}/api/accounts/connected"))
        .header("x-user-id", 1)
        .send()
        .await
        .unwrap();
    let connected: Value = res.json().await.unwrap();
    assert_eq!(connected["account_number"], second["account_number"]);
}

#[tokio::test]
async fn unknown_bank_code_maps_to_bad_request() {
    let (base, client) = setup_test_app().await;
    let res = client
        .post(format!("{base}/api/accounts"))
        .header("x-user-id", 1)
        .json(&json!({ "bank_code": "777" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("bank code"));
}

#[tokio::test]
async fn connecting_foreign_account_maps_to_conflict() {
    let (base, client) = setup_test_app().await;
    let theirs = create_account(&base, &client, 2, "088").await;

    let res = client
        .post(format!("{base}/api/accounts/connect"))
        .header("x-user-id", 1)
        .json(&json!({ "account_number": theirs["account_number"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn charge_transfer_and_history_flow() {
    let (base, client) = setup_test_app().await;
    let a = create_account(&base, &client, 1, "088").await;
    let b = create_account(&base, &client, 2, "090").await;

    let res = client
        .post(format!("{base}/api/pay/charge"))
        .header("x-user-id", 1)
        .json(&json!({ "account_number": a["account_number"], "amount": 1500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let charge: Value = res.json().await.unwrap();
    assert_eq!(charge["pay_type"], "CHARGE");
    assert_eq!(charge["balance_after"], 1500);

    let res = client
        .post(format!("{base}/api/pay/transfer"))
        .header("x-user-id", 1)
        .json(&json!({
            "sender_account_number": a["account_number"],
            "target_account_number": b["account_number"],
            "amount": 700,
            "info": "gift",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let transfer: Value = res.json().await.unwrap();
    assert_eq!(transfer["pay_type"], "TRANSFER_OUT");
    assert_eq!(transfer["balance_after"], 800);
    assert_eq!(transfer["description"], "gift");

    let res = client
        .get(format!(
            "{base}/api/pay/{}/history?page=1&size=10",
            a["account_number"].as_str().unwrap()
        ))
        .header("x-user-id", 1)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total_items"], 2);
    assert_eq!(page["total_pages"], 1);
    assert_eq!(page["data"][0]["pay_type"], "TRANSFER_OUT");
    assert_eq!(page["data"][1]["pay_type"], "CHARGE");
}

#[tokio::test]
async fn overdraw_maps_to_unprocessable_entity() {
    let (base, client) = setup_test_app().await;
    let a = create_account(&base, &client, 1, "088").await;
    let b = create_account(&base, &client, 2, "090").await;

    let res = client
        .post(format!("{base}/api/pay/transfer"))
        .header("x-user-id", 1)
        .json(&json!({
            "sender_account_number": a["account_number"],
            "target_account_number": b["account_number"],
            "amount": 10_000,
            "info": "x",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn bad_page_request_maps_to_bad_request() {
    let (base, client) = setup_test_app().await;
    let a = create_account(&base, &client, 1, "088").await;

    let res = client
        .get(format!(
            "{base}/api/pay/{}/history?page=0&size=10",
            a["account_number"].as_str().unwrap()
        ))
        .header("x-user-id", 1)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
