#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use feature_flag_manager::config::AppConfig;
use feature_flag_manager::store::MemoryStore;
use feature_flag_manager::users::{NewUser, Permissoes};
use feature_flag_manager::{FlagRouter, RouterOptions};

pub const ADMIN: &str = "admin@example.com";
pub const WRITER: &str = "writer@example.com";
pub const READER: &str = "reader@example.com";

/// One in-process server per test, backed by a fresh in-memory store
pub struct TestServer {
    pub base_url: String,
    pub store: MemoryStore,
    client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::from_lookup(|_| None);
        config.security.bootstrap_admin = None;
        config.api.enable_request_logging = false;

        let store = MemoryStore::new();
        let router = FlagRouter::new(Arc::new(store.clone()), RouterOptions::default());
        seed(&router).await?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            if let Err(e) = feature_flag_manager::server::run(listener, router, &config).await {
                eprintln!("test server stopped: {e}");
            }
        });

        Ok(Self {
            base_url,
            store,
            client: reqwest::Client::new(),
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Send `body` (if any) as `user` (if any); returns status and parsed JSON
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(user) = user {
            request = request.header("X-User-Id", user);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let value = response.json::<Value>().await?;
        Ok((status, value))
    }

    pub async fn get(&self, path: &str, user: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, Some(user), None).await
    }

    pub async fn post(&self, path: &str, user: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, path, Some(user), Some(body)).await
    }

    pub async fn put(&self, path: &str, user: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, path, Some(user), Some(body)).await
    }

    pub async fn delete(&self, path: &str, user: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, path, Some(user), None).await
    }
}

async fn seed(router: &FlagRouter) -> Result<()> {
    let users = [
        (ADMIN, Permissoes { leitura: true, escrita: true, admin: true }),
        (WRITER, Permissoes { leitura: true, escrita: true, admin: false }),
        (READER, Permissoes { leitura: true, escrita: false, admin: false }),
    ];
    for (id, permissoes) in users {
        router
            .users()
            .create(NewUser {
                id: id.to_string(),
                nome: id.to_string(),
                permissoes,
                ativo: true,
            })
            .await
            .with_context(|| format!("failed to seed {}", id))?;
    }
    Ok(())
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn().await?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
