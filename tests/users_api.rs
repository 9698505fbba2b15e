mod common;

use common::spawn_app;
use serde_json::{json, Value};

async fn login_tokens(app: &common::TestApp, email: &str) -> Value {
    let response = app.login(email, "Analytical1").await;
    assert_eq!(200, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

// --- Signup ---

#[tokio::test]
async fn signup_returns_201_with_user_id() {
    let app = spawn_app().await;

    let response = app.signup("ada@example.com").await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["user_id"].as_str().map(|id| !id.is_empty()).unwrap_or(false));
}

#[tokio::test]
async fn signup_returns_409_for_duplicate_email() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;

    let response = app.signup("ADA@example.com").await;

    assert_eq!(409, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "DUPLICATE_ENTRY");
}

#[tokio::test]
async fn signup_returns_400_for_invalid_input() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({"first_name": "Ada", "last_name": "Lovelace", "email": "notanemail", "password": "Analytical1"}), "invalid email"),
        (json!({"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com", "password": "weak"}), "weak password"),
        (json!({"first_name": "", "last_name": "Lovelace", "email": "ada@example.com", "password": "Analytical1"}), "empty first name"),
        (json!({"first_name": "Ada", "last_name": "Lovelace", "email": {"$ne": null}, "password": "Analytical1"}), "operator object as email"),
        (json!({"first_name": "Ada", "last_name": "$gt", "email": "ada@example.com", "password": "Analytical1"}), "operator as name"),
    ];

    for (body, description) in test_cases {
        let response = app.post_json("/users/signup", &body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
}

// --- Login ---

#[tokio::test]
async fn login_returns_token_pair() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;

    let body = login_tokens(&app, "ada@example.com").await;

    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 86400);
}

#[tokio::test]
async fn login_returns_401_for_bad_credentials() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;

    let wrong_password = app.login("ada@example.com", "Wrong12345").await;
    let unknown_email = app.login("nobody@example.com", "Analytical1").await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a["message"], b["message"]);
}

// --- Current user ---

#[tokio::test]
async fn me_returns_current_user() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;
    let tokens = login_tokens(&app, "ada@example.com").await;

    let response = app.get_me(tokens["access_token"].as_str().unwrap()).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["first_name"], "Ada");
    assert_eq!(body["last_name"], "Lovelace");
    assert_eq!(body["user_id"], tokens["user_id"]);
}

#[tokio::test]
async fn me_requires_bearer_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(&format!("{}/users/me", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn me_rejects_garbage_token() {
    let app = spawn_app().await;

    let response = app.get_me("not.a.token").await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SIGNATURE_INVALID");
}

#[tokio::test]
async fn me_rejects_refresh_token() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;
    let tokens = login_tokens(&app, "ada@example.com").await;

    let response = app.get_me(tokens["refresh_token"].as_str().unwrap()).await;

    assert_eq!(401, response.status().as_u16());
}

// --- Logout ---

#[tokio::test]
async fn logout_ends_the_session() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;
    let tokens = login_tokens(&app, "ada@example.com").await;
    let access = tokens["access_token"].as_str().unwrap();

    let response = app.logout(access).await;
    assert_eq!(200, response.status().as_u16());

    let response = app.get_me(access).await;
    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SESSION_ENDED");

    // Logging out twice is not a server error
    let response = app.logout(access).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn login_after_logout_starts_a_new_session() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;
    let tokens = login_tokens(&app, "ada@example.com").await;
    app.logout(tokens["access_token"].as_str().unwrap()).await;

    let tokens = login_tokens(&app, "ada@example.com").await;
    let response = app.get_me(tokens["access_token"].as_str().unwrap()).await;

    assert_eq!(200, response.status().as_u16());
}

// --- Refresh ---

#[tokio::test]
async fn refresh_issues_a_working_pair() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;
    let tokens = login_tokens(&app, "ada@example.com").await;

    let response = app
        .post_json(
            "/users/refresh",
            &json!({
                "user_id": tokens["user_id"],
                "refresh_token": tokens["refresh_token"],
            }),
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let refreshed: Value = response.json().await.unwrap();
    let response = app.get_me(refreshed["access_token"].as_str().unwrap()).await;
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn refresh_after_logout_is_rejected() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;
    let tokens = login_tokens(&app, "ada@example.com").await;
    app.logout(tokens["access_token"].as_str().unwrap()).await;

    let response = app
        .post_json(
            "/users/refresh",
            &json!({
                "user_id": tokens["user_id"],
                "refresh_token": tokens["refresh_token"],
            }),
        )
        .await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SESSION_ENDED");
}

#[tokio::test]
async fn refresh_with_access_token_is_rejected() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;
    let tokens = login_tokens(&app, "ada@example.com").await;

    let response = app
        .post_json(
            "/users/refresh",
            &json!({
                "user_id": tokens["user_id"],
                "refresh_token": tokens["access_token"],
            }),
        )
        .await;

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn refresh_with_rotated_token_is_rejected() {
    let app = spawn_app().await;
    app.signup("ada@example.com").await;
    let first = login_tokens(&app, "ada@example.com").await;

    let response = app.refresh(&first["user_id"], &first["refresh_token"]).await;
    assert_eq!(200, response.status().as_u16());
    let second: Value = response.json().await.unwrap();
    assert_ne!(first["refresh_token"], second["refresh_token"]);

    let response = app.refresh(&first["user_id"], &first["refresh_token"]).await;
    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SESSION_ENDED");

    // The rotated-in pair is still the live session
    let response = app.get_me(second["access_token"].as_str().unwrap()).await;
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn refresh_token_of_another_user_is_rejected() {
    let app = spawn_app().await;
    app.signup("victim@example.com").await;
    app.signup("mallory@example.com").await;

    let (victim, mallory) = tokio::join!(
        login_tokens(&app, "victim@example.com"),
        login_tokens(&app, "mallory@example.com")
    );
    assert_ne!(victim["refresh_token"], mallory["refresh_token"]);

    let response = app.refresh(&victim["user_id"], &mallory["refresh_token"]).await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SESSION_ENDED");

    // The victim's own session is untouched
    let response = app.get_me(victim["access_token"].as_str().unwrap()).await;
    assert_eq!(200, response.status().as_u16());
    let me: Value = response.json().await.unwrap();
    assert_eq!(me["email"], "victim@example.com");
}
