//! HTTP gateway driven over a real socket.
//!
//! The FreeCurrencyApi provider points at a stub server on another
//! ephemeral port: USD quotes EUR only, CHF never answers in time.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::Query, routing::get};
use fund_transfer::config::AppConfig;
use fund_transfer::gateway::{self, AppState};
use fund_transfer::store::{LedgerStore, MemoryStore};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

async fn latest(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    match params.get("base_currency").map(String::as_str) {
        Some("USD") => Json(json!({ "data": { "EUR": 0.92 } })),
        Some("CHF") => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "data": { "EUR": 1.05 } }))
        }
        _ => Json(json!({ "data": {} })),
    }
}

async fn spawn_rate_stub() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/v1/latest", get(latest));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

struct TestServer {
    base: String,
    http: reqwest::Client,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        let stub = spawn_rate_stub().await;
        let yaml = format!(
            r#"
log_level: info
log_dir: ./logs
log_file: test.log
use_json: false
rotation: never
gateway:
  host: 127.0.0.1
  port: 0
ledger:
  max_conflict_retries: 3
  sufficiency: strict
exchange_rate:
  default_provider: fixed
  timeout_ms: 200
  max_attempts: 1
  backoff_ms: 10
  fixed_rates:
    USD/EUR: "1.25"
  free_currency_api:
    base_url: http://{}
    api_key: test-key
"#,
            stub
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let state = AppState::from_config(&config, store).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            gateway::serve(listener, state, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            base: format!("http://{}/api/v1", addr),
            http: reqwest::Client::new(),
            _shutdown: tx,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .http
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn create_client(&self, tag: &str) -> String {
        let (status, body) = self
            .post(
                "/clients",
                json!({
                    "name": format!("Client {}", tag),
                    "email": format!("{}@example.com", tag),
                    "phone": format!("+1 555 01{}", tag.len() + 10)
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn open_account(&self, owner: &str, currency: &str, deposit: &str) -> String {
        let (status, body) = self
            .post("/accounts", json!({ "owner_id": owner, "currency": currency }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let number = body["data"]["account_number"].as_str().unwrap().to_string();
        if deposit != "0" {
            let (status, body) = self
                .post(
                    "/transactions/credit",
                    json!({ "account_number": number, "amount": deposit }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
        }
        number
    }

    async fn balance(&self, number: &str) -> String {
        let (status, body) = self.get(&format!("/accounts/{}", number)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["total_balance"].as_str().unwrap().to_string()
    }
}

fn assert_error_shape(body: &Value, code: &str) {
    assert_eq!(body["code"], code, "{}", body);
    let correlation = body["correlation_id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(correlation).is_ok());
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn health_reports_memory_store() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "UP");
    assert_eq!(body["data"]["store"], "memory");
}

#[tokio::test]
async fn client_validation_lists_every_violation() {
    let server = TestServer::start().await;
    let (status, body) = server
        .post(
            "/clients",
            json!({ "name": "", "email": "nope", "phone": "+1 555 0100" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body, "VALIDATION_FAILED");
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let server = TestServer::start().await;
    server.create_client("dup").await;
    let (status, body) = server
        .post(
            "/clients",
            json!({ "name": "Other", "email": "dup@example.com", "phone": "+1 555 0199" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error_shape(&body, "VALUE_ALREADY_USED");
}

#[tokio::test]
async fn clients_can_be_searched() {
    let server = TestServer::start().await;
    let alpha = server.create_client("alpha").await;
    server.create_client("zed").await;

    let (status, body) = server.get("/clients?search=ALPHA").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["total_items"], 1);
    assert_eq!(body["data"]["items"][0]["id"], alpha);

    let (status, body) = server.get("/clients?search=example.com&size=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (_, body) = server.get("/clients?search=nobody").await;
    assert_eq!(body["data"]["total_items"], 0);
}

#[tokio::test]
async fn credit_then_debit_updates_balance() {
    let server = TestServer::start().await;
    let owner = server.create_client("ledger").await;
    let number = server.open_account(&owner, "usd", "100").await;
    assert_eq!(server.balance(&number).await, "100.000");

    let (status, body) = server
        .post(
            "/transactions/debit",
            json!({ "account_number": number, "amount": "40.5", "method": "ATM" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["tx_type"], "DEBIT");
    assert_eq!(body["data"]["method"], "ATM");
    assert_eq!(server.balance(&number).await, "59.500");

    let reference = body["data"]["reference"].as_str().unwrap().to_string();
    let (status, body) = server.get(&format!("/transactions/{}", reference)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], "40.500");

    let (status, body) = server
        .get(&format!("/transactions?account_number={}&type=CREDIT", number))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 1);
}

#[tokio::test]
async fn overdraft_and_bad_amounts_are_rejected() {
    let server = TestServer::start().await;
    let owner = server.create_client("overdraft").await;
    let number = server.open_account(&owner, "USD", "10").await;

    let (status, body) = server
        .post(
            "/transactions/debit",
            json!({ "account_number": number, "amount": "10" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_error_shape(&body, "INSUFFICIENT_FUNDS");

    let (status, body) = server
        .post(
            "/transactions/credit",
            json!({ "account_number": number, "amount": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body, "VALIDATION_FAILED");

    let (status, body) = server
        .post(
            "/transactions/credit",
            json!({ "account_number": number, "amount": "0" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body, "VALIDATION_FAILED");

    assert_eq!(server.balance(&number).await, "10.000");
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/accounts/NOPE0000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_shape(&body, "ACCOUNT_NOT_FOUND");

    let (status, body) = server.get("/transfers/TR-MISSING").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_shape(&body, "TRANSFER_NOT_FOUND");
}

#[tokio::test]
async fn suspended_account_cannot_be_debited() {
    let server = TestServer::start().await;
    let owner = server.create_client("suspend").await;
    let number = server.open_account(&owner, "USD", "50").await;

    let resp = server
        .http
        .patch(format!("{}/accounts/{}", server.base, number))
        .json(&json!({ "status": "SUSPENDED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, body) = server
        .post(
            "/transactions/debit",
            json!({ "account_number": number, "amount": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_error_shape(&body, "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn transfer_with_fixed_rate() {
    let server = TestServer::start().await;
    let owner = server.create_client("fixed").await;
    let usd = server.open_account(&owner, "USD", "1000").await;
    let eur = server.open_account(&owner, "EUR", "0").await;

    let (status, body) = server
        .post(
            "/transfers",
            json!({ "from_account": usd, "to_account": eur, "amount": "100" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let transfer = &body["data"];
    assert_eq!(transfer["status"], "COMPLETED");
    assert_eq!(transfer["amount_sent"], "100.000");
    assert_eq!(transfer["amount_received"], "125.000");
    assert_eq!(transfer["rate_provider"], "fixed");

    assert_eq!(server.balance(&usd).await, "900.000");
    assert_eq!(server.balance(&eur).await, "125.000");

    let reference = transfer["reference"].as_str().unwrap().to_string();
    let (status, body) = server.get(&format!("/transfers/{}", reference)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reference"], reference.as_str());

    let (status, body) = server
        .get(&format!("/transfers?from_account={}", usd))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 1);
}

#[tokio::test]
async fn transfer_with_remote_provider() {
    let server = TestServer::start().await;
    let owner = server.create_client("remote").await;
    let usd = server.open_account(&owner, "USD", "200").await;
    let eur = server.open_account(&owner, "EUR", "0").await;

    let (status, body) = server
        .post(
            "/transfers",
            json!({
                "from_account": usd,
                "to_account": eur,
                "amount": "100",
                "rate_provider": "freecurrencyapi"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["amount_received"], "92.000");
    assert_eq!(body["data"]["rate_provider"], "free_currency_api");
    assert_eq!(server.balance(&eur).await, "92.000");
}

#[tokio::test]
async fn missing_remote_currency_leaves_balances_untouched() {
    let server = TestServer::start().await;
    let owner = server.create_client("missing").await;
    let usd = server.open_account(&owner, "USD", "200").await;
    let jpy = server.open_account(&owner, "JPY", "0").await;

    let (status, body) = server
        .post(
            "/transfers",
            json!({
                "from_account": usd,
                "to_account": jpy,
                "amount": "50",
                "rate_provider": "freecurrencyapi"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_error_shape(&body, "UNKNOWN_ERROR");
    assert_eq!(server.balance(&usd).await, "200.000");
    assert_eq!(server.balance(&jpy).await, "0.000");
}

#[tokio::test]
async fn slow_remote_provider_times_out() {
    let server = TestServer::start().await;
    let owner = server.create_client("timeout").await;
    let chf = server.open_account(&owner, "CHF", "80").await;
    let eur = server.open_account(&owner, "EUR", "0").await;

    let (status, body) = server
        .post(
            "/transfers",
            json!({
                "from_account": chf,
                "to_account": eur,
                "amount": "10",
                "rate_provider": "freecurrencyapi"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_error_shape(&body, "UNKNOWN_ERROR");
    assert_eq!(server.balance(&chf).await, "80.000");
}

#[tokio::test]
async fn unknown_provider_and_self_transfer_are_rejected() {
    let server = TestServer::start().await;
    let owner = server.create_client("reject").await;
    let usd = server.open_account(&owner, "USD", "100").await;
    let eur = server.open_account(&owner, "EUR", "0").await;

    let (status, body) = server
        .post(
            "/transfers",
            json!({ "from_account": usd, "to_account": eur, "amount": "1", "rate_provider": "oracle" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body, "UNSUPPORTED_PROVIDER");

    let (status, body) = server
        .post(
            "/transfers",
            json!({ "from_account": usd, "to_account": usd, "amount": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body, "VALIDATION_FAILED");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = TestServer::start().await;
    let url = server.base.replace("/api/v1", "/api-docs/openapi.json");
    let resp = server.http.get(url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Value = resp.json().await.unwrap();
    assert!(doc["paths"]["/api/v1/transfers"].is_object());
}
