#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use techit_api::auth::directory::NoDirectory;
use techit_api::auth::password;
use techit_api::config::AppConfig;
use techit_api::database::{fixture, MemoryStore, TicketStore, UserStore};
use techit_api::notify::{Mail, MailError, Mailer, Notifier};
use techit_api::state::AppState;

/// Keeps every mail it is handed.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<Mail>>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &Mail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Refuses every delivery, the way an unreachable relay would.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: &Mail) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".into()))
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// The full router over an in-memory store loaded with the sample dataset.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub mail: RecordingMailer,
}

/// How the store is seeded before the router is built.
enum Seed {
    Fixture,
    /// Sample users and tickets, but neither id sequence.
    WithoutSequences,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let mail = RecordingMailer::default();
        Self::build(AppConfig::development(), Arc::new(mail.clone()), mail, Seed::Fixture).await
    }

    pub async fn with_failing_mailer() -> Result<Self> {
        Self::build(
            AppConfig::development(),
            Arc::new(FailingMailer),
            RecordingMailer::default(),
            Seed::Fixture,
        )
        .await
    }

    /// Serves the single-page app shell out of `dir`.
    pub async fn with_static_dir(dir: &Path) -> Result<Self> {
        let mut config = AppConfig::development();
        config.server.static_dir = dir.to_string_lossy().into_owned();
        let mail = RecordingMailer::default();
        Self::build(config, Arc::new(mail.clone()), mail, Seed::Fixture).await
    }

    /// A deployment that skipped `techit init`: accounts exist, counters do not.
    pub async fn without_sequences() -> Result<Self> {
        let mail = RecordingMailer::default();
        Self::build(
            AppConfig::development(),
            Arc::new(mail.clone()),
            mail,
            Seed::WithoutSequences,
        )
        .await
    }

    async fn build(
        config: AppConfig,
        mailer: Arc<dyn Mailer>,
        mail: RecordingMailer,
        seed: Seed,
    ) -> Result<Self> {
        let store = MemoryStore::new();
        let hash = password::hash(fixture::FIXTURE_PASSWORD)?;
        match seed {
            Seed::Fixture => fixture::load(&store, &store, &store, &hash).await?,
            Seed::WithoutSequences => {
                for user in fixture::sample_users(&hash) {
                    UserStore::insert(&store, &user).await?;
                }
                for ticket in fixture::sample_tickets(Utc::now()) {
                    TicketStore::insert(&store, &ticket).await?;
                }
            }
        }

        let store_handle = Arc::new(store.clone());
        let (notifier, _worker) =
            Notifier::spawn(store_handle.clone(), mailer, config.mail.app_url.clone());

        let state = AppState {
            config: Arc::new(config),
            users: store_handle.clone(),
            tickets: store_handle.clone(),
            sequences: store_handle,
            directory: Arc::new(NoDirectory),
            notifier,
        };

        Ok(Self {
            router: techit_api::app(state),
            store,
            mail,
        })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Ok(TestResponse { status, body })
    }

    /// Unauthenticated GET returning the raw body, for non-JSON responses.
    pub async fn get_text(&self, uri: &str) -> Result<(StatusCode, String)> {
        let request = Request::builder().uri(uri).body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Option<Value>) -> Result<TestResponse> {
        self.request(Method::PUT, uri, Some(token), body).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<TestResponse> {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Logs in a fixture account and returns its token.
    pub async fn login(&self, username: &str) -> Result<String> {
        let body = serde_json::json!({
            "username": username,
            "password": fixture::FIXTURE_PASSWORD,
        });
        let res = self.request(Method::POST, "/api/login", None, Some(body)).await?;
        anyhow::ensure!(res.status == StatusCode::OK, "login as {} failed: {}", username, res.status);
        res.body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carried no token")
    }

    /// Waits for the notification worker to deliver at least `count` mails.
    pub async fn wait_for_mail(&self, count: usize) -> Result<Vec<Mail>> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let sent = self.mail.sent.lock().unwrap().clone();
            if sent.len() >= count {
                return Ok(sent);
            }
            if Instant::now() > deadline {
                anyhow::bail!("expected {} mails, got {}", count, sent.len());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
