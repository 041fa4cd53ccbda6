use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use recruitr::config::Config;

async fn spawn_app() -> Router {
    let db_path =
        std::env::temp_dir().join(format!("recruitr-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.general.migrations_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/migrations").to_string();
    config.server.secure_cookies = false;
    // Cheap hashing keeps the test suite quick.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = recruitr::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    recruitr::api::router(state)
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// Full onboarding over HTTP: signup, approve via token, login.
/// Returns the session cookie.
async fn onboard(app: &Router, company: &str, email: &str, username: &str) -> String {
    let signup = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &serde_json::json!({
                "company_name": company,
                "email": email,
                "username": username,
                "password": "Password123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(signup.status(), StatusCode::OK);
    let signup_json = json_body(signup).await;
    let token = signup_json["data"]["approval"]["token"].as_str().unwrap().to_string();

    let approve = app
        .clone()
        .oneshot(post_json(
            "/api/tokens/approve",
            &serde_json::json!({ "token": token }),
        ))
        .await
        .unwrap();
    assert_eq!(approve.status(), StatusCode::OK);

    let login = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &serde_json::json!({ "identifier": username, "password": "Password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    session_cookie(&login)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn signup_approval_and_login_flow() {
    let app = spawn_app().await;

    let signup = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &serde_json::json!({
                "company_name": "Acme",
                "email": "a@acme.com",
                "username": "amy",
                "password": "Password123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(signup.status(), StatusCode::OK);

    let signup_json = json_body(signup).await;
    assert_eq!(signup_json["data"]["account"]["role"], "admin");
    assert_eq!(signup_json["data"]["account"]["is_approved"], false);
    let token = signup_json["data"]["approval"]["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);

    // Unapproved login is forbidden.
    let early_login = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &serde_json::json!({ "identifier": "amy", "password": "Password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(early_login.status(), StatusCode::FORBIDDEN);

    let approve = app
        .clone()
        .oneshot(post_json(
            "/api/tokens/approve",
            &serde_json::json!({ "token": token }),
        ))
        .await
        .unwrap();
    assert_eq!(approve.status(), StatusCode::OK);

    // Resubmitting the redeemed token is Gone, never a second approval.
    let again = app
        .clone()
        .oneshot(post_json(
            "/api/tokens/approve",
            &serde_json::json!({ "token": token }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::GONE);

    let login = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &serde_json::json!({ "identifier": "a@acme.com", "password": "Password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = session_cookie(&login);

    let me = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let me_json = json_body(me).await;
    assert_eq!(me_json["data"]["username"], "amy");
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let app = spawn_app().await;
    onboard(&app, "Acme", "a@acme.com", "amy").await;

    let bad_password = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &serde_json::json!({ "identifier": "amy", "password": "nope-nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad_password.status(), StatusCode::UNAUTHORIZED);

    let unknown = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &serde_json::json!({ "identifier": "ghost", "password": "nope-nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = spawn_app().await;
    onboard(&app, "Acme", "a@acme.com", "amy").await;

    let duplicate = app
        .clone()
        .oneshot(post_json(
            "/api/auth/signup",
            &serde_json::json!({
                "company_name": "Copycat",
                "email": "A@ACME.COM",
                "username": "amy2",
                "password": "Password123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn sub_account_creation_requires_admin_session() {
    let app = spawn_app().await;

    // No session at all.
    let anonymous = app
        .clone()
        .oneshot(post_json(
            "/api/accounts",
            &serde_json::json!({
                "role": "recruiter",
                "email": "rob@acme.com",
                "username": "rob",
                "password": "Password123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let cookie = onboard(&app, "Acme", "a@acme.com", "amy").await;

    let created = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/accounts")
                .header("Content-Type", "application/json")
                .header(header::COOKIE, cookie.clone())
                .body(Body::from(
                    serde_json::json!({
                        "role": "recruiter",
                        "email": "rob@acme.com",
                        "username": "rob",
                        "password": "Password123"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let created_json = json_body(created).await;
    assert_eq!(created_json["data"]["role"], "recruiter");
    assert_eq!(created_json["data"]["is_approved"], true);
    assert!(created_json["data"]["parent_account_id"].is_number());

    // Sub-accounts log in without any token step.
    let login = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &serde_json::json!({ "identifier": "rob", "password": "Password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    // An admin sub-account is rejected.
    let bad_role = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/accounts")
                .header("Content-Type", "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(
                    serde_json::json!({
                        "role": "admin",
                        "email": "adm@acme.com",
                        "username": "adm",
                        "password": "Password123"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(bad_role.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_flow() {
    let app = spawn_app().await;
    onboard(&app, "Acme", "a@acme.com", "amy").await;

    // Unknown email: same 200, no reset payload.
    let unknown = app
        .clone()
        .oneshot(post_json(
            "/api/auth/forgot-password",
            &serde_json::json!({ "email": "ghost@acme.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown_json = json_body(unknown).await;
    assert!(unknown_json["data"]["reset"].is_null());

    // A username is not an email; no token is issued for it.
    let by_username = app
        .clone()
        .oneshot(post_json(
            "/api/auth/forgot-password",
            &serde_json::json!({ "email": "amy" }),
        ))
        .await
        .unwrap();
    assert_eq!(by_username.status(), StatusCode::OK);
    let by_username_json = json_body(by_username).await;
    assert!(by_username_json["data"]["reset"].is_null());

    let known = app
        .clone()
        .oneshot(post_json(
            "/api/auth/forgot-password",
            &serde_json::json!({ "email": "a@acme.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(known.status(), StatusCode::OK);
    let known_json = json_body(known).await;
    let reset_token = known_json["data"]["reset"]["token"].as_str().unwrap().to_string();

    let reset = app
        .clone()
        .oneshot(post_json(
            "/api/auth/reset-password",
            &serde_json::json!({ "token": reset_token, "new_password": "NewSecret456" }),
        ))
        .await
        .unwrap();
    assert_eq!(reset.status(), StatusCode::OK);

    let old_password = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &serde_json::json!({ "identifier": "amy", "password": "Password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(old_password.status(), StatusCode::UNAUTHORIZED);

    let new_password = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &serde_json::json!({ "identifier": "amy", "password": "NewSecret456" }),
        ))
        .await
        .unwrap();
    assert_eq!(new_password.status(), StatusCode::OK);

    // Token is spent.
    let reuse = app
        .clone()
        .oneshot(post_json(
            "/api/auth/reset-password",
            &serde_json::json!({ "token": reset_token, "new_password": "Third789xyz" }),
        ))
        .await
        .unwrap();
    assert_eq!(reuse.status(), StatusCode::GONE);
}

#[tokio::test]
async fn candidates_stay_within_their_tenant() {
    let app = spawn_app().await;

    let cookie_a = onboard(&app, "Acme", "a@acme.com", "amy").await;
    let cookie_b = onboard(&app, "Beta", "b@beta.com", "bea").await;

    let created = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/candidates")
                .header("Content-Type", "application/json")
                .header(header::COOKIE, cookie_a.clone())
                .body(Body::from(
                    serde_json::json!({
                        "full_name": "Casey Doe",
                        "email": "casey@example.com"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);

    let list_a = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/candidates")
                .header(header::COOKIE, cookie_a)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let list_a_json = json_body(list_a).await;
    assert_eq!(list_a_json["data"].as_array().unwrap().len(), 1);

    let list_b = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/candidates")
                .header(header::COOKIE, cookie_b)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let list_b_json = json_body(list_b).await;
    assert!(list_b_json["data"].as_array().unwrap().is_empty());
}
