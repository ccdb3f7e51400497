pub mod model;
pub mod repository;

pub use model::{Capability, NewUser, Permissoes, PermissoesPatch, UserChanges, UserCollection, UserRecord};
pub use repository::{UserRepository, DEFAULT_USERS_KEY};

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(String),

    #[error("User {0} already exists")]
    AlreadyExists(String),

    #[error("User collection is unreadable: {0}")]
    Corrupt(String),

    #[error("Failed to encode users: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
