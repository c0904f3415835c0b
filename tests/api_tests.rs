use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use foliotrack::api::AppState;
use foliotrack::config::Config;
use foliotrack::services::{Mailer, MailerError};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Mailer that records outbound mail so tests can read one-time codes.
#[derive(Clone, Default)]
struct CaptureMailer {
    sent: Arc<Mutex<Vec<(String, String, String)>>>,
}

#[async_trait::async_trait]
impl Mailer for CaptureMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }
}

impl CaptureMailer {
    fn last_code(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, _, html) = sent.last().expect("no mail captured");
        extract_code(html).expect("no 6-digit code in captured mail")
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

/// First run of exactly six ASCII digits in the mail body.
fn extract_code(html: &str) -> Option<String> {
    let mut run = String::new();
    for c in html.chars() {
        if c.is_ascii_digit() {
            run.push(c);
        } else {
            if run.len() == 6 {
                return Some(run);
            }
            run.clear();
        }
    }
    (run.len() == 6).then_some(run)
}

async fn spawn_app() -> (Arc<AppState>, Router, CaptureMailer) {
    let db_path =
        std::env::temp_dir().join(format!("foliotrack-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;

    let mailer = CaptureMailer::default();
    let state =
        foliotrack::api::create_app_state_with_mailer(config, Arc::new(mailer.clone()), None)
            .await
            .expect("failed to create app state");

    let router = foliotrack::api::router(state.clone()).await;
    (state, router, mailer)
}

fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("no session cookie set")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn response_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Sign up a user and return the session cookie and user id.
async fn signup(app: &Router, email: &str, password: &str, name: &str) -> (String, i64) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            None,
            &serde_json::json!({ "email": email, "password": password, "name": name }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response);
    let body = response_json(response).await;
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();
    (cookie, user_id)
}

#[tokio::test]
async fn test_unauthenticated_requests_rejected() {
    let (_, app, _) = spawn_app().await;

    for uri in ["/api/categories", "/api/auth/me", "/api/system/status"] {
        let response = app.clone().oneshot(get_request(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
    }
}

#[tokio::test]
async fn test_signup_me_and_signout() {
    let (_, app, _) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["user"]["email"], "a@x.com");
    // New accounts get 2FA by default.
    assert_eq!(body["data"]["user"]["twoFactorEnabled"], true);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signout",
            Some(&cookie),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let (_, app, _) = spawn_app().await;

    signup(&app, "a@x.com", "secret1", "Asha").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            None,
            &serde_json::json!({ "email": "A@X.com", "password": "secret2", "name": "Dup" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_signin_requires_2fa_then_succeeds_with_code() {
    let (_, app, mailer) = spawn_app().await;

    signup(&app, "a@x.com", "secret1", "Asha").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &serde_json::json!({ "email": "a@x.com", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["requires2FA"], true);

    let code = mailer.last_code();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &serde_json::json!({ "email": "a@x.com", "password": "secret1", "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);

    let response = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signin_wrong_password() {
    let (_, app, _) = spawn_app().await;

    signup(&app, "a@x.com", "secret1", "Asha").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &serde_json::json!({ "email": "a@x.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_category_crud_and_duplicate_slug() {
    let (_, app, _) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Stocks" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["slug"], "stocks");
    assert_eq!(body["data"]["expectedPercent"], 15.0);
    assert_eq!(body["data"]["currentValue"], 0.0);

    // Same name normalizes to the same slug: exactly one success.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Stocks" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().to_lowercase().contains("slug"));

    let response = app
        .clone()
        .oneshot(get_request("/api/categories", Some(&cookie)))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // A different user is free to reuse the slug.
    let (other_cookie, _) = signup(&app, "b@x.com", "secret2", "Bo").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&other_cookie),
            &serde_json::json!({ "name": "Stocks" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Categories are invisible across owners.
    let response = app
        .clone()
        .oneshot(get_request("/api/categories/stocks", Some(&other_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/categories/stocks",
            Some(&other_cookie),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Deleting the other user's category must not touch ours.
    let response = app
        .clone()
        .oneshot(get_request("/api/categories/stocks", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_category_slug_normalization_and_rename() {
    let (_, app, _) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Mutual Funds", "slug": "  Mutual -- Funds!! " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["slug"], "mutual-funds");

    // Invalid slug: nothing survives normalization.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Misc", "slug": "!!!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Rename onto a fresh slug.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/categories/mutual-funds",
            Some(&cookie),
            &serde_json::json!({ "slug": "MF 2026" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["slug"], "mf-2026");

    let response = app
        .clone()
        .oneshot(get_request("/api/categories/mutual-funds", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Rename colliding with an existing slug is a duplicate.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Gold" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/categories/gold",
            Some(&cookie),
            &serde_json::json!({ "slug": "mf-2026" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_entry_lifecycle_recomputes_aggregate() {
    let (_, app, _) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Stocks" }),
        ))
        .await
        .unwrap();

    // Add without an explicit current value: the aggregate stays 0.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories/stocks/entries",
            Some(&cookie),
            &serde_json::json!({ "name": "TCS", "quantity": 10, "invested": 1000 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["currentValue"], 0.0);
    assert_eq!(body["data"]["entries"][0]["expectedPercent"], 10.0);
    assert_eq!(body["data"]["entries"][0]["expectedValue"], 1100.0);

    // Setting an explicit current value flows into the aggregate and the
    // entry-level profit/loss.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/categories/stocks/entries",
            Some(&cookie),
            &serde_json::json!({ "entryIndex": 0, "currentValue": 1200 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["currentValue"], 1200.0);
    assert_eq!(body["data"]["entries"][0]["profitLoss"], 200.0);

    // Explicit zero is preserved, not treated as unset.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories/stocks/entries",
            Some(&cookie),
            &serde_json::json!({ "name": "Infosys", "quantity": 5, "invested": 500, "currentValue": 0 }),
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["data"]["currentValue"], 1200.0);
    assert_eq!(body["data"]["entries"][1]["currentValue"], 0.0);

    // Clearing with an explicit null removes the entry's contribution.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/categories/stocks/entries",
            Some(&cookie),
            &serde_json::json!({ "entryIndex": 0, "currentValue": null }),
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["data"]["currentValue"], 0.0);
    assert!(body["data"]["entries"][0].get("currentValue").is_none());
}

#[tokio::test]
async fn test_entry_delete_shifts_indices() {
    let (_, app, _) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Stocks" }),
        ))
        .await
        .unwrap();

    for name in ["first", "second", "third"] {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/categories/stocks/entries",
                Some(&cookie),
                &serde_json::json!({ "name": name, "quantity": 1, "invested": 100 }),
            ))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/categories/stocks/entries?entryIndex=1",
            Some(&cookie),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;

    let names: Vec<&str> = body["data"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["first", "third"]);

    // Out-of-bounds index after the shift.
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/categories/stocks/entries?entryIndex=2",
            Some(&cookie),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_entry_validation_errors() {
    let (_, app, _) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Stocks" }),
        ))
        .await
        .unwrap();

    // Missing invested.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories/stocks/entries",
            Some(&cookie),
            &serde_json::json!({ "name": "TCS", "quantity": 10 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing entryIndex on update.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/categories/stocks/entries",
            Some(&cookie),
            &serde_json::json!({ "name": "TCS" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown category.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/categories/nope/entries",
            Some(&cookie),
            &serde_json::json!({ "name": "TCS", "quantity": 1, "invested": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_two_factor_enrollment_cycle() {
    let (_, app, mailer) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    // Start from a disabled state.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/2fa/disable",
            Some(&cookie),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/2fa/enable",
            Some(&cookie),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let code = mailer.last_code();

    // Wrong code leaves the pending code intact.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/2fa/verify",
            Some(&cookie),
            &serde_json::json!({ "code": "000000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/2fa/verify",
            Some(&cookie),
            &serde_json::json!({ "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["data"]["user"]["twoFactorEnabled"], true);
}

#[tokio::test]
async fn test_expired_code_is_cleared() {
    let (state, app, _) = spawn_app().await;

    let (cookie, user_id) = signup(&app, "a@x.com", "secret1", "Asha").await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/2fa/disable",
            Some(&cookie),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();

    // Plant a code whose expiry is already in the past.
    let past = (chrono::Utc::now() - chrono::Duration::minutes(11)).to_rfc3339();
    state
        .store()
        .set_two_factor_code(i32::try_from(user_id).unwrap(), "123456", &past)
        .await
        .expect("seed expired code");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/2fa/verify",
            Some(&cookie),
            &serde_json::json!({ "code": "123456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("expired"));

    // The expired attempt cleared the stored code; retrying the same code
    // now reports that no code exists.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/2fa/verify",
            Some(&cookie),
            &serde_json::json!({ "code": "123456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("No verification code"));

    // The flag never flipped.
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["data"]["user"]["twoFactorEnabled"], false);
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let (_, app, mailer) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    // Unknown address still reports success.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/forgot-password",
            None,
            &serde_json::json!({ "email": "ghost@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(mailer.sent_count(), 0);

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/2fa/disable",
            Some(&cookie),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/forgot-password",
            None,
            &serde_json::json!({ "email": "a@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let code = mailer.last_code();

    // Codes arrive pasted with whitespace; reset still verifies.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/reset-password",
            None,
            &serde_json::json!({
                "email": "a@x.com",
                "code": format!(" {code} "),
                "newPassword": "fresh-secret",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password is gone, new one works.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &serde_json::json!({ "email": "a@x.com", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            None,
            &serde_json::json!({ "email": "a@x.com", "password": "fresh-secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);

    // The reset cleared the stored code; it cannot be replayed.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/reset-password",
            None,
            &serde_json::json!({
                "email": "a@x.com",
                "code": code,
                "newPassword": "another-secret",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_email_flow() {
    let (_, app, mailer) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/change-email",
            Some(&cookie),
            &serde_json::json!({ "newEmail": "new@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["pendingEmail"], "new@x.com");

    // The code goes to the new address.
    let (to, _, _) = mailer.sent.lock().unwrap().last().unwrap().clone();
    assert_eq!(to, "new@x.com");

    let code = mailer.last_code();
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/auth/change-email",
            Some(&cookie),
            &serde_json::json!({ "code": code, "newEmail": "new@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["user"]["email"], "new@x.com");
}

#[tokio::test]
async fn test_change_password() {
    let (_, app, _) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/change-password",
            Some(&cookie),
            &serde_json::json!({ "currentPassword": "wrong", "newPassword": "fresh-secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/change-password",
            Some(&cookie),
            &serde_json::json!({ "currentPassword": "secret1", "newPassword": "fresh-secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_csv_export() {
    let (_, app, _) = spawn_app().await;

    let (cookie, _) = signup(&app, "a@x.com", "secret1", "Asha").await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/categories",
            Some(&cookie),
            &serde_json::json!({ "name": "Stocks" }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/categories/stocks/entries",
            Some(&cookie),
            &serde_json::json!({ "name": "TCS", "quantity": 10, "invested": 1000 }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/categories/export", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with('\u{feff}'));
    assert!(text.contains("Category Name,Display Name,Slug"));
    assert!(text.contains("TCS"));
}
