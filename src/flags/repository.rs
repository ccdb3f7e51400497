use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::codec::{self, FlagEnvelope, FlagRecord, PreviousVersion, ValueType};
use super::{key_for, reference, split_key, FlagError, DEFAULT_ROOT};
use crate::store::{ParameterKind, ParameterStore, PutParameter, StoreError, StoredParameter};

/// Input for creating a flag
#[derive(Debug, Clone)]
pub struct NewFlag {
    pub id: String,
    pub value: String,
    pub value_type: ValueType,
    pub description: String,
    pub modified_by: String,
    pub store_type: ParameterKind,
    pub prefix: String,
}

/// Fields to merge into an existing flag; `None` leaves the stored field as is
#[derive(Debug, Clone, Default)]
pub struct FlagChanges {
    pub value: Option<String>,
    pub description: Option<String>,
    pub value_type: Option<ValueType>,
    pub modified_by: Option<String>,
}

/// Flag records stored as JSON envelopes under a fixed root path
pub struct FlagRepository {
    store: Arc<dyn ParameterStore>,
    root: String,
    reserved: Vec<String>,
    with_decryption: bool,
}

impl FlagRepository {
    pub fn new(store: Arc<dyn ParameterStore>, root: impl Into<String>) -> Self {
        let root = root.into();
        let root = match root.trim_end_matches('/') {
            "" => DEFAULT_ROOT.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            store,
            root,
            reserved: Vec::new(),
            with_decryption: true,
        }
    }

    /// Exclude a key under the root (e.g. the user collection) from flag operations
    pub fn with_reserved(mut self, key: impl Into<String>) -> Self {
        self.reserved.push(key.into());
        self
    }

    pub fn with_decryption(mut self, with_decryption: bool) -> Self {
        self.with_decryption = with_decryption;
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn key_for(&self, id: &str, prefix: &str) -> String {
        key_for(&self.root, prefix, id)
    }

    fn is_reserved(&self, key: &str) -> bool {
        self.reserved.iter().any(|r| r == key)
    }

    fn guard_reserved(&self, key: &str) -> Result<(), FlagError> {
        if self.is_reserved(key) {
            return Err(FlagError::Reserved(key.to_string()));
        }
        Ok(())
    }

    /// Every stored parameter under `path` that can hold a flag, in canonical
    /// resource-identifier order
    async fn stored_under(&self, path: &str) -> Result<Vec<StoredParameter>, FlagError> {
        let mut stored: Vec<_> = self
            .store
            .list_by_path(path, self.with_decryption)
            .await?
            .into_iter()
            .filter(|p| !self.is_reserved(&p.name) && split_key(&self.root, &p.name).is_some())
            .collect();
        stored.sort_by(|a, b| a.arn.cmp(&b.arn).then_with(|| a.name.cmp(&b.name)));
        Ok(stored)
    }

    pub async fn list(&self) -> Result<Vec<FlagRecord>, FlagError> {
        let stored = self.stored_under(&self.root).await?;
        Ok(stored.iter().map(|p| codec::decode(p, &self.root)).collect())
    }

    /// Records below `{root}/{prefix}`; empty when nothing lives there
    pub async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<FlagRecord>, FlagError> {
        let path = key_for(&self.root, prefix, "");
        let stored = self.stored_under(&path).await?;
        Ok(stored.iter().map(|p| codec::decode(p, &self.root)).collect())
    }

    /// Sorted distinct first path segments below the root
    pub async fn list_prefixes(&self) -> Result<Vec<String>, FlagError> {
        let stored = self.stored_under(&self.root).await?;
        let prefixes: BTreeSet<String> = stored
            .iter()
            .filter_map(|p| split_key(&self.root, &p.name))
            .filter_map(|(prefix, _)| prefix.split('/').next().map(str::to_string))
            .filter(|segment| !segment.is_empty())
            .collect();
        Ok(prefixes.into_iter().collect())
    }

    pub async fn get(&self, id: &str, prefix: &str) -> Result<FlagRecord, FlagError> {
        let stored = self.locate(id, prefix).await?;
        Ok(codec::decode(&stored, &self.root))
    }

    /// Direct key lookup, falling back to `find_by_id_scan` only when no
    /// prefix was given
    async fn locate(&self, id: &str, prefix: &str) -> Result<StoredParameter, FlagError> {
        let key = self.key_for(id, prefix);
        if !self.is_reserved(&key) {
            if let Some(stored) = self.store.get(&key, self.with_decryption).await? {
                return Ok(stored);
            }
        }

        if prefix.is_empty() {
            if let Some(stored) = self.find_by_id_scan(id).await? {
                return Ok(stored);
            }
        }

        Err(FlagError::NotFound(key))
    }

    /// Slow path: walk every record under the root and return the first whose
    /// trailing key segment equals `id`. Costs a full listing.
    pub async fn find_by_id_scan(&self, id: &str) -> Result<Option<StoredParameter>, FlagError> {
        debug!("Scanning {} for flag id {}", self.root, id);
        let stored = self.stored_under(&self.root).await?;
        Ok(stored.into_iter().find(|p| {
            split_key(&self.root, &p.name)
                .map(|(_, key_id)| key_id == id)
                .unwrap_or(false)
        }))
    }

    pub async fn create(&self, flag: NewFlag) -> Result<FlagRecord, FlagError> {
        let key = self.key_for(&flag.id, &flag.prefix);
        self.guard_reserved(&key)?;

        let envelope = FlagEnvelope {
            id: flag.id,
            value: flag.value,
            value_type: flag.value_type,
            description: flag.description,
            last_modified_at: Utc::now(),
            last_modified_by: flag.modified_by,
            previous_version: None,
        };

        let mut put = PutParameter::new(&key, codec::encode(&envelope)?).kind(flag.store_type);
        if !envelope.description.is_empty() {
            put = put.description(&envelope.description);
        }

        self.store.put(put).await.map_err(|e| match e {
            StoreError::AlreadyExists(_) => FlagError::AlreadyExists(key.clone()),
            other => FlagError::Store(other),
        })?;
        info!("Created flag {}", key);

        self.reload(&key).await
    }

    /// Merge `changes` into the stored record. A changed value moves the
    /// current value into `previousVersion`, replacing any older snapshot.
    ///
    /// Read and write are separate store calls; a concurrent update between
    /// them is overwritten.
    pub async fn update(
        &self,
        id: &str,
        prefix: &str,
        changes: FlagChanges,
    ) -> Result<FlagRecord, FlagError> {
        let stored = self.locate(id, prefix).await?;
        let current = codec::decode(&stored, &self.root);
        let mut envelope = current.envelope;

        if let Some(value) = changes.value {
            if value != envelope.value {
                envelope.previous_version = Some(PreviousVersion {
                    value: std::mem::replace(&mut envelope.value, value),
                    modified_at: envelope.last_modified_at,
                    modified_by: envelope.last_modified_by.clone(),
                });
            }
        }
        if let Some(description) = changes.description {
            envelope.description = description;
        }
        if let Some(value_type) = changes.value_type {
            envelope.value_type = value_type;
        }
        if let Some(modified_by) = changes.modified_by {
            envelope.last_modified_by = modified_by;
        }
        envelope.last_modified_at = Utc::now();

        // The store-side description always tracks the envelope, cleared included
        let put = PutParameter::new(&stored.name, codec::encode(&envelope)?)
            .kind(stored.kind)
            .description(&envelope.description)
            .overwrite(true);
        self.store.put(put).await?;
        info!("Updated flag {}", stored.name);

        self.reload(&stored.name).await
    }

    /// Remove `{root}/{prefix}/{id}`; returns the deleted key
    pub async fn delete(&self, id: &str, prefix: &str) -> Result<String, FlagError> {
        let key = self.key_for(id, prefix);
        self.delete_key(key).await
    }

    /// Remove the record an external reference points at, once it is shown to
    /// belong to the flags namespace
    pub async fn delete_by_external_reference(&self, reference: &str) -> Result<String, FlagError> {
        let key = reference::resolve(reference, &self.root)?;
        self.delete_key(key).await
    }

    async fn delete_key(&self, key: String) -> Result<String, FlagError> {
        self.guard_reserved(&key)?;
        match self.store.delete(&key).await {
            Ok(()) => {
                info!("Deleted flag {}", key);
                Ok(key)
            }
            Err(StoreError::NotFound(_)) => Err(FlagError::NotFound(key)),
            Err(other) => Err(other.into()),
        }
    }

    async fn reload(&self, key: &str) -> Result<FlagRecord, FlagError> {
        match self.store.get(key, self.with_decryption).await? {
            Some(stored) => Ok(codec::decode(&stored, &self.root)),
            None => Err(FlagError::NotFound(key.to_string())),
        }
    }
}
