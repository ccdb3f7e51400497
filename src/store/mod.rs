pub mod memory;
pub mod ssm;

pub use memory::MemoryStore;
pub use ssm::{SsmConfig, SsmStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the remote parameter store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Parameter not found: {0}")]
    NotFound(String),

    #[error("Parameter already exists: {0}")]
    AlreadyExists(String),

    #[error("Store request failed: {0}")]
    Request(String),

    #[error("Store rejected request ({code}): {message}")]
    Service { code: String, message: String },

    #[error("Unreadable store response: {0}")]
    Decode(String),
}

/// Storage class of a parameter. SecureString values are encrypted at rest
/// and only readable in clear with decryption requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParameterKind {
    #[default]
    String,
    StringList,
    SecureString,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 3] = [
        ParameterKind::String,
        ParameterKind::StringList,
        ParameterKind::SecureString,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::String => "String",
            ParameterKind::StringList => "StringList",
            ParameterKind::SecureString => "SecureString",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// A parameter as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredParameter {
    pub name: String,
    pub value: String,
    pub kind: ParameterKind,
    pub version: i64,
    pub last_modified: DateTime<Utc>,
    /// Canonical resource identifier assigned by the store
    pub arn: String,
}

#[derive(Debug, Clone)]
pub struct PutParameter {
    pub name: String,
    pub value: String,
    pub kind: ParameterKind,
    pub description: Option<String>,
    pub overwrite: bool,
}

impl PutParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: ParameterKind::String,
            description: None,
            overwrite: false,
        }
    }

    pub fn kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// One page of a by-path listing
#[derive(Debug, Clone, Default)]
pub struct ParameterPage {
    pub parameters: Vec<StoredParameter>,
    pub next_token: Option<String>,
}

/// Hierarchical key-value store holding slash-delimited parameter names.
///
/// Repositories receive an `Arc<dyn ParameterStore>` at construction; nothing
/// in the crate reaches for a global client.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch one parameter, `None` when the name is unoccupied
    async fn get(&self, name: &str, with_decryption: bool)
        -> Result<Option<StoredParameter>, StoreError>;

    /// Write a parameter. Without `overwrite` an occupied name fails with
    /// `StoreError::AlreadyExists`.
    async fn put(&self, parameter: PutParameter) -> Result<(), StoreError>;

    async fn delete(&self, name: &str) -> Result<(), StoreError>;

    /// Fetch a single page of parameters below `path`
    async fn get_by_path(
        &self,
        path: &str,
        recursive: bool,
        with_decryption: bool,
        next_token: Option<String>,
    ) -> Result<ParameterPage, StoreError>;

    /// Every parameter below `path` (recursive), with pagination drained
    async fn list_by_path(
        &self,
        path: &str,
        with_decryption: bool,
    ) -> Result<Vec<StoredParameter>, StoreError> {
        let mut parameters = Vec::new();
        let mut next_token = None;
        loop {
            let page = self
                .get_by_path(path, true, with_decryption, next_token)
                .await?;
            parameters.extend(page.parameters);
            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }
        Ok(parameters)
    }
}

/// Join name segments into a store path, skipping empty segments
pub fn join_path(root: &str, segments: &[&str]) -> String {
    let mut path = root.trim_end_matches('/').to_string();
    for segment in segments.iter().map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
        path.push('/');
        path.push_str(segment);
    }
    path
}
