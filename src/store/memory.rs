use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ParameterKind, ParameterPage, ParameterStore, PutParameter, StoreError, StoredParameter};

const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    kind: ParameterKind,
    description: Option<String>,
    version: i64,
    last_modified: chrono::DateTime<Utc>,
}

/// In-process parameter store with the same paging and overwrite rules as
/// the remote one. Clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
    page_size: usize,
    region: String,
    account: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
            region: "us-east-1".to_string(),
            account: "000000000000".to_string(),
        }
    }

    /// Page size used by `get_by_path` (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Raw value currently held at `name`, bypassing decryption rules
    pub async fn raw_value(&self, name: &str) -> Option<String> {
        self.entries.read().await.get(name).map(|e| e.value.clone())
    }

    /// Description stored alongside `name`
    pub async fn description(&self, name: &str) -> Option<String> {
        self.entries
            .read()
            .await
            .get(name)
            .and_then(|e| e.description.clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn arn(&self, name: &str) -> String {
        format!("arn:aws:ssm:{}:{}:parameter{}", self.region, self.account, name)
    }

    fn materialize(&self, name: &str, entry: &Entry, with_decryption: bool) -> StoredParameter {
        let value = if entry.kind == ParameterKind::SecureString && !with_decryption {
            format!("encrypted:{}", hex::encode(entry.value.as_bytes()))
        } else {
            entry.value.clone()
        };
        StoredParameter {
            name: name.to_string(),
            value,
            kind: entry.kind,
            version: entry.version,
            last_modified: entry.last_modified,
            arn: self.arn(name),
        }
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if !name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return Err(StoreError::Service {
            code: "ValidationException".to_string(),
            message: format!("Invalid parameter name: {}", name),
        });
    }
    Ok(())
}

#[async_trait]
impl ParameterStore for MemoryStore {
    async fn get(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<StoredParameter>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(name)
            .map(|entry| self.materialize(name, entry, with_decryption)))
    }

    async fn put(&self, parameter: PutParameter) -> Result<(), StoreError> {
        validate_name(&parameter.name)?;
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        match entries.get_mut(&parameter.name) {
            Some(_) if !parameter.overwrite => {
                return Err(StoreError::AlreadyExists(parameter.name));
            }
            Some(entry) => {
                entry.value = parameter.value;
                entry.kind = parameter.kind;
                if parameter.description.is_some() {
                    entry.description = parameter.description;
                }
                entry.version += 1;
                entry.last_modified = now;
            }
            None => {
                entries.insert(
                    parameter.name,
                    Entry {
                        value: parameter.value,
                        kind: parameter.kind,
                        description: parameter.description,
                        version: 1,
                        last_modified: now,
                    },
                );
            }
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        match self.entries.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    async fn get_by_path(
        &self,
        path: &str,
        recursive: bool,
        with_decryption: bool,
        next_token: Option<String>,
    ) -> Result<ParameterPage, StoreError> {
        let base = format!("{}/", path.trim_end_matches('/'));
        let entries = self.entries.read().await;

        let lower = match &next_token {
            Some(token) => Bound::Excluded(token.clone()),
            None => Bound::Included(base.clone()),
        };

        let mut parameters = Vec::new();
        let mut last_name = None;
        for (name, entry) in entries.range((lower, Bound::Unbounded)) {
            if !name.starts_with(&base) {
                break;
            }
            if !recursive && name[base.len()..].contains('/') {
                continue;
            }
            if parameters.len() == self.page_size {
                break;
            }
            parameters.push(self.materialize(name, entry, with_decryption));
            last_name = Some(name.clone());
        }

        // Only hand out a token when something matching remains past this page
        let next_token = match last_name {
            Some(last) if parameters.len() == self.page_size => {
                let more = entries
                    .range((Bound::Excluded(last.clone()), Bound::Unbounded))
                    .take_while(|(name, _)| name.starts_with(&base))
                    .any(|(name, _)| recursive || !name[base.len()..].contains('/'));
                more.then_some(last)
            }
            _ => None,
        };

        Ok(ParameterPage { parameters, next_token })
    }
}
