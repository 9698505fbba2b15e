#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use serde_json::Value;
use user_auth::configuration::{
    ApplicationSettings, DatabaseSettings, JwtSettings, Settings, StoreBackend, StoreSettings,
};
use user_auth::startup::{run, AppState};
use user_auth::store::{InMemoryTokenStore, InMemoryUserStore};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn test_settings() -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseSettings {
            backend: StoreBackend::Memory,
            uri: "mongodb://localhost:27017".to_string(),
            database_name: "user_auth_test".to_string(),
        },
        jwt: JwtSettings {
            secret: "integration-test-secret-key".to_string(),
            access_token_expiry: 24 * 60 * 60,
            refresh_token_expiry: 168 * 60 * 60,
        },
        store: StoreSettings::default(),
    }
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let state = AppState::new(
        &test_settings(),
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryTokenStore::new()),
    )
    .expect("Failed to build application state");

    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn signup(&self, email: &str) -> reqwest::Response {
        self.post_json(
            "/users/signup",
            &serde_json::json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": email,
                "password": "Analytical1"
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/users/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn refresh(&self, user_id: &Value, refresh_token: &Value) -> reqwest::Response {
        self.post_json(
            "/users/refresh",
            &serde_json::json!({ "user_id": user_id, "refresh_token": refresh_token }),
        )
        .await
    }

    pub async fn get_me(&self, token: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}/users/me", &self.address))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn logout(&self, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/users/logout", &self.address))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
