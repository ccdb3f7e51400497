use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::users::{Capability, UserError, UserRecord, UserRepository};

/// Header carrying the caller's user id
pub const IDENTITY_HEADER: &str = "X-User-Id";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Forbidden(String),

    /// The user collection could not be read; not a permission decision
    #[error(transparent)]
    Lookup(#[from] UserError),
}

/// Case-insensitive lookup of `header` in the request headers
pub fn extract_identity(headers: &HashMap<String, String>, header: &str) -> Option<String> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(header))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolves a caller identity against the user collection and decides
/// whether it holds a capability
#[derive(Clone)]
pub struct Authorizer {
    users: Arc<UserRepository>,
    header: String,
}

impl Authorizer {
    pub fn new(users: Arc<UserRepository>) -> Self {
        Self {
            users,
            header: IDENTITY_HEADER.to_string(),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn identity(&self, headers: &HashMap<String, String>) -> Option<String> {
        extract_identity(headers, &self.header)
    }

    /// Succeeds with the caller's record when it is active and holds
    /// `capability` (admin holds every capability)
    pub async fn check(
        &self,
        identity: Option<&str>,
        capability: Capability,
    ) -> Result<UserRecord, AuthError> {
        let Some(id) = identity else {
            warn!("Denied {}: missing {} header", capability, self.header);
            return Err(AuthError::Forbidden(format!("Missing {} header", self.header)));
        };

        let Some(user) = self.users.get(id).await? else {
            warn!("Denied {}: unknown user {}", capability, id);
            return Err(AuthError::Forbidden("User not found".to_string()));
        };

        if !user.ativo {
            warn!("Denied {}: user {} is inactive", capability, id);
            return Err(AuthError::Forbidden("User is inactive".to_string()));
        }

        if !user.permissoes.grants(capability) {
            warn!("Denied {}: user {} lacks permission", capability, id);
            return Err(AuthError::Forbidden(format!(
                "User lacks '{}' permission",
                capability
            )));
        }

        debug!("Granted {} to {}", capability, id);
        Ok(user)
    }

    /// Never fails: any lookup problem counts as not admin
    pub async fn is_admin(&self, identity: Option<&str>) -> bool {
        self.check(identity, Capability::Admin).await.is_ok()
    }
}
