pub mod codec;
pub mod reference;
pub mod repository;

pub use codec::{FlagEnvelope, FlagRecord, PreviousVersion, ValueType};
pub use repository::{FlagChanges, FlagRepository, NewFlag};

use thiserror::Error;

use crate::store::{join_path, StoreError};

/// Default store path every flag lives under
pub const DEFAULT_ROOT: &str = "/feature-flags";

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("Parameter {0} not found")]
    NotFound(String),

    #[error("Parameter {0} already exists")]
    AlreadyExists(String),

    #[error("Invalid external reference {0}")]
    InvalidReference(String),

    #[error("Key {0} is reserved and cannot hold a flag")]
    Reserved(String),

    #[error("Failed to encode flag: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// `{root}/{prefix}/{id}`, or `{root}/{id}` when prefix is empty
pub fn key_for(root: &str, prefix: &str, id: &str) -> String {
    join_path(root, &[prefix, id])
}

/// Split a store key below `root` into `(prefix, id)`. The id is the last
/// segment; everything between root and id is the prefix.
pub fn split_key(root: &str, key: &str) -> Option<(String, String)> {
    let rest = key
        .strip_prefix(root.trim_end_matches('/'))?
        .strip_prefix('/')?;
    match rest.rsplit_once('/') {
        Some((prefix, id)) if !id.is_empty() => Some((prefix.to_string(), id.to_string())),
        Some(_) => None,
        None if rest.is_empty() => None,
        None => Some((String::new(), rest.to_string())),
    }
}
