//! End-to-end tests driving a running backend over HTTP

use std::net::{IpAddr, Ipv4Addr};

use e2e_backend::{App, config::Config};

const ADMIN_EMAIL: &str = "admin@e2e.test";
const ADMIN_PASSWORD: &str = "password123";

/// Tables that must be empty whenever the store is in its post-seed state.
const NON_PRINCIPAL_TABLES: [&str; 7] = [
    "wish",
    "basket",
    "\"order\"",
    "deposit_point",
    "session",
    "account",
    "verification",
];

async fn start() -> (App, reqwest::Client) {
    e2e_backend::logging::init();

    let mut config = Config::from_env();
    config.bind_addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.port = 0;

    let (app, server) = e2e_backend::serve(config)
        .await
        .expect("failed to start backend");
    tokio::spawn(server);

    (app, reqwest::Client::new())
}

async fn sign_in(client: &reqwest::Client, app: &App, email: &str, password: &str) -> String {
    let res = client
        .post(format!("http://{}/api/auth/sign-in", app.addr))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("sign-in request failed");
    assert!(res.status().is_success(), "sign-in should succeed");

    let body: serde_json::Value = res.json().await.expect("sign-in body should be json");
    body["token"]
        .as_str()
        .expect("sign-in body should carry a token")
        .to_string()
}

async fn assert_post_seed_state(app: &App) {
    for table in NON_PRINCIPAL_TABLES {
        assert_eq!(
            app.db.table_row_count(table).await.unwrap(),
            0,
            "table {table} should be empty"
        );
    }
    assert_eq!(app.db.table_row_count("user").await.unwrap(), 1);
    assert_eq!(app.db.count_users_with_role("admin").await.unwrap(), 1);
}

#[tokio::test]
async fn cold_start_seeds_exactly_one_admin() {
    //* Given
    let (app, _client) = start().await;

    //* Then
    assert_post_seed_state(&app).await;
    let admin = app
        .db
        .user_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .expect("admin principal should exist");
    assert_eq!(admin.role, "admin");
}

#[tokio::test]
async fn reset_clears_data_and_reseeds_admin() {
    //* Given
    // A store with traffic-written rows referencing the admin principal.
    let (app, client) = start().await;
    let token = sign_in(&client, &app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = client
        .post(format!("http://{}/api/wishes", app.addr))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "a bicycle" }))
        .send()
        .await
        .expect("wish request failed");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let res = client
        .post(format!("http://{}/api/baskets", app.addr))
        .bearer_auth(&token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .expect("basket request failed");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    //* When
    let res = client
        .post(format!("http://{}/api/e2e/reset", app.addr))
        .send()
        .await
        .expect("reset request failed");

    //* Then
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.expect("reset body should be json");
    assert_eq!(body, serde_json::json!({ "status": "reset" }));
    assert_post_seed_state(&app).await;
}

#[tokio::test]
async fn sequential_resets_are_idempotent() {
    //* Given
    let (app, client) = start().await;

    //* When / Then
    // Each awaited reset must land in the same observable state.
    for _ in 0..3 {
        let res = client
            .post(format!("http://{}/api/e2e/reset", app.addr))
            .send()
            .await
            .expect("reset request failed");
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_post_seed_state(&app).await;
    }
}

#[tokio::test]
async fn concurrent_resets_serialize_and_both_succeed() {
    //* Given
    // A store with data, plus two resets racing each other. The reset guard
    // must serialize the sequences so neither observes the other's
    // half-wiped tables.
    let (app, client) = start().await;
    let token = sign_in(&client, &app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = client
        .post(format!("http://{}/api/wishes", app.addr))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "a bicycle" }))
        .send()
        .await
        .expect("wish request failed");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    //* When
    let reset_url = format!("http://{}/api/e2e/reset", app.addr);
    let (first, second) = tokio::join!(
        client.post(&reset_url).send(),
        client.post(&reset_url).send(),
    );

    //* Then
    let first = first.expect("first reset request failed");
    let second = second.expect("second reset request failed");
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    assert_eq!(second.status(), reqwest::StatusCode::OK);
    assert_post_seed_state(&app).await;
}

#[tokio::test]
async fn reset_failure_is_surfaced_to_the_caller() {
    //* Given
    // Break a mid-sequence table so the wipe fails partway.
    let (app, client) = start().await;
    sqlx::query("DROP TABLE deposit_point")
        .execute(&*app.db.pool)
        .await
        .expect("failed to drop deposit_point table");

    //* When
    let res = client
        .post(format!("http://{}/api/e2e/reset", app.addr))
        .send()
        .await
        .expect("reset request failed");

    //* Then
    assert!(res.status().is_server_error());
    let body: serde_json::Value = res.json().await.expect("error body should be json");
    assert_eq!(body["error_code"], "WIPE_FAILED");
}

#[tokio::test]
async fn sessions_do_not_survive_a_reset() {
    //* Given
    let (app, client) = start().await;
    let token = sign_in(&client, &app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    //* When
    let res = client
        .post(format!("http://{}/api/e2e/reset", app.addr))
        .send()
        .await
        .expect("reset request failed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    //* Then
    let res = client
        .get(format!("http://{}/api/auth/session", app.addr))
        .bearer_auth(&token)
        .send()
        .await
        .expect("session request failed");
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deposit_point_creation_requires_admin_role() {
    //* Given
    let (app, client) = start().await;

    let res = client
        .post(format!("http://{}/api/auth/sign-up", app.addr))
        .json(&serde_json::json!({
            "name": "Plain User",
            "email": "user@e2e.test",
            "password": "password123",
        }))
        .send()
        .await
        .expect("sign-up request failed");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let user_token = sign_in(&client, &app, "user@e2e.test", "password123").await;

    //* When
    let res = client
        .post(format!("http://{}/api/deposit-points", app.addr))
        .bearer_auth(&user_token)
        .json(&serde_json::json!({ "name": "Station North", "address": "1 North St" }))
        .send()
        .await
        .expect("deposit point request failed");

    //* Then
    assert_eq!(res.status(), reqwest::StatusCode::FORBIDDEN);

    // The admin principal can create one.
    let admin_token = sign_in(&client, &app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = client
        .post(format!("http://{}/api/deposit-points", app.addr))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "name": "Station North", "address": "1 North St" }))
        .send()
        .await
        .expect("deposit point request failed");
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
}

#[tokio::test]
async fn unauthenticated_business_requests_are_rejected() {
    //* Given
    let (app, client) = start().await;

    //* When
    let res = client
        .get(format!("http://{}/api/wishes", app.addr))
        .send()
        .await
        .expect("wishes request failed");

    //* Then
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cors_allows_only_trusted_origins() {
    //* Given
    let (app, client) = start().await;

    //* When
    let res = client
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}/api/deposit-points", app.addr),
        )
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .expect("preflight request failed");

    //* Then
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );

    // An unknown origin gets no allowance.
    let res = client
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{}/api/deposit-points", app.addr),
        )
        .header("Origin", "http://evil.test")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .expect("preflight request failed");
    assert!(res.headers().get("access-control-allow-origin").is_none());
}
