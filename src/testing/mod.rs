use std::sync::Arc;

use crate::api::{ApiRequest, ApiResponse};
use crate::router::{FlagRouter, RouterOptions};
use crate::store::MemoryStore;
use crate::users::{NewUser, Permissoes};

/// In-memory store plus a router over it, with helpers to seed users and
/// send requests as one of them
pub struct TestContext {
    pub store: MemoryStore,
    pub router: FlagRouter,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        let store = MemoryStore::new();
        let router = FlagRouter::new(Arc::new(store.clone()), options);
        Self { store, router }
    }

    /// Add an active user
    pub async fn user(self, id: &str, permissoes: Permissoes) -> anyhow::Result<Self> {
        self.seed_user(id, permissoes, true).await
    }

    pub async fn seed_user(self, id: &str, permissoes: Permissoes, ativo: bool) -> anyhow::Result<Self> {
        self.router
            .users()
            .create(NewUser {
                id: id.to_string(),
                nome: id.to_string(),
                permissoes,
                ativo,
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed user {}: {}", id, e))?;
        Ok(self)
    }

    pub fn request_as(&self, user: &str, method: &str, path: &str) -> ApiRequest {
        ApiRequest::new(method, path).header("X-User-Id", user)
    }

    pub async fn send(&self, request: ApiRequest) -> ApiResponse {
        self.router.handle(request).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn reader() -> Permissoes {
    Permissoes { leitura: true, ..Default::default() }
}

pub fn writer() -> Permissoes {
    Permissoes { leitura: true, escrita: true, admin: false }
}

pub fn admin() -> Permissoes {
    Permissoes::admin()
}
