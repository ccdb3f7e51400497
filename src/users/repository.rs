use std::sync::Arc;

use tracing::info;

use super::model::{NewUser, Permissoes, UserChanges, UserCollection, UserRecord};
use super::UserError;
use crate::store::{ParameterKind, ParameterStore, PutParameter};

/// Default store key for the user collection
pub const DEFAULT_USERS_KEY: &str = "/feature-flags/users";

const COLLECTION_DESCRIPTION: &str = "Feature flags users with permissions";

/// Users kept as one JSON collection at a fixed key. Every mutation reads the
/// whole collection and writes it back; concurrent writers race and the last
/// write wins.
pub struct UserRepository {
    store: Arc<dyn ParameterStore>,
    key: String,
    with_decryption: bool,
}

impl UserRepository {
    pub fn new(store: Arc<dyn ParameterStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            with_decryption: true,
        }
    }

    pub fn with_decryption(mut self, with_decryption: bool) -> Self {
        self.with_decryption = with_decryption;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The whole collection; initializes an empty one on first miss
    pub async fn list(&self) -> Result<Vec<UserRecord>, UserError> {
        match self.store.get(&self.key, self.with_decryption).await? {
            Some(stored) => {
                let collection: UserCollection = serde_json::from_str(&stored.value)
                    .map_err(|e| UserError::Corrupt(format!("{}: {}", self.key, e)))?;
                Ok(collection.usuarios)
            }
            None => {
                info!("User collection {} not found, initializing", self.key);
                self.save(Vec::new()).await?;
                Ok(Vec::new())
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<UserRecord>, UserError> {
        Ok(self.list().await?.into_iter().find(|u| u.id == id))
    }

    pub async fn create(&self, user: NewUser) -> Result<UserRecord, UserError> {
        let mut users = self.list().await?;
        if users.iter().any(|u| u.id == user.id) {
            return Err(UserError::AlreadyExists(user.id));
        }

        let record = UserRecord {
            id: user.id,
            nome: user.nome,
            permissoes: user.permissoes,
            ativo: user.ativo,
        };
        users.push(record.clone());
        self.save(users).await?;
        info!("Created user {}", record.id);
        Ok(record)
    }

    pub async fn update(&self, id: &str, changes: UserChanges) -> Result<UserRecord, UserError> {
        let mut users = self.list().await?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        if let Some(nome) = changes.nome {
            user.nome = nome;
        }
        if let Some(patch) = changes.permissoes {
            patch.apply(&mut user.permissoes);
        }
        if let Some(ativo) = changes.ativo {
            user.ativo = ativo;
        }
        let updated = user.clone();

        self.save(users).await?;
        info!("Updated user {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), UserError> {
        let users = self.list().await?;
        let before = users.len();
        let remaining: Vec<_> = users.into_iter().filter(|u| u.id != id).collect();
        if remaining.len() == before {
            return Err(UserError::NotFound(id.to_string()));
        }

        self.save(remaining).await?;
        info!("Deleted user {}", id);
        Ok(())
    }

    /// Seed `id` as an active admin when the collection holds nobody.
    /// Returns whether a user was created.
    pub async fn bootstrap_admin(&self, id: &str) -> Result<bool, UserError> {
        if !self.list().await?.is_empty() {
            return Ok(false);
        }
        self.create(NewUser {
            id: id.to_string(),
            nome: id.to_string(),
            permissoes: Permissoes::admin(),
            ativo: true,
        })
        .await?;
        Ok(true)
    }

    async fn save(&self, usuarios: Vec<UserRecord>) -> Result<(), UserError> {
        let value = serde_json::to_string(&UserCollection { usuarios })?;
        self.store
            .put(
                PutParameter::new(&self.key, value)
                    .kind(ParameterKind::String)
                    .description(COLLECTION_DESCRIPTION)
                    .overwrite(true),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::users::PermissoesPatch;

    fn repo(store: &MemoryStore) -> UserRepository {
        UserRepository::new(Arc::new(store.clone()), DEFAULT_USERS_KEY)
    }

    fn new_user(id: &str) -> NewUser {
        NewUser {
            id: id.to_string(),
            nome: "Ana".to_string(),
            permissoes: Permissoes { leitura: true, ..Default::default() },
            ativo: true,
        }
    }

    #[tokio::test]
    async fn first_list_initializes_empty_collection() {
        let store = MemoryStore::new();
        assert!(repo(&store).list().await.unwrap().is_empty());
        assert_eq!(
            store.raw_value(DEFAULT_USERS_KEY).await.as_deref(),
            Some(r#"{"usuarios":[]}"#)
        );
    }

    #[tokio::test]
    async fn create_get_and_reject_duplicates() {
        let store = MemoryStore::new();
        let users = repo(&store);
        users.create(new_user("ana@x.com")).await.unwrap();

        let found = users.get("ana@x.com").await.unwrap().unwrap();
        assert_eq!(found.nome, "Ana");
        assert!(users.get("bob@x.com").await.unwrap().is_none());

        let err = users.create(new_user("ana@x.com")).await.unwrap_err();
        assert!(matches!(err, UserError::AlreadyExists(_)));
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_merges_supplied_fields() {
        let store = MemoryStore::new();
        let users = repo(&store);
        users.create(new_user("ana@x.com")).await.unwrap();

        let updated = users
            .update(
                "ana@x.com",
                UserChanges {
                    permissoes: Some(PermissoesPatch { escrita: Some(true), ..Default::default() }),
                    ativo: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nome, "Ana");
        assert!(updated.permissoes.leitura && updated.permissoes.escrita);
        assert!(!updated.ativo);
        assert_eq!(users.get("ana@x.com").await.unwrap().unwrap(), updated);

        let err = users.update("bob@x.com", UserChanges::default()).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_filters_user_out() {
        let store = MemoryStore::new();
        let users = repo(&store);
        users.create(new_user("ana@x.com")).await.unwrap();
        users.create(new_user("bob@x.com")).await.unwrap();

        users.delete("ana@x.com").await.unwrap();
        let ids: Vec<_> = users.list().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["bob@x.com"]);
        assert!(matches!(users.delete("ana@x.com").await, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn bootstrap_only_seeds_an_empty_collection() {
        let store = MemoryStore::new();
        let users = repo(&store);
        assert!(users.bootstrap_admin("root@x.com").await.unwrap());
        assert!(!users.bootstrap_admin("other@x.com").await.unwrap());

        let root = users.get("root@x.com").await.unwrap().unwrap();
        assert!(root.ativo && root.permissoes.admin);
        assert!(users.get("other@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_collection_is_reported() {
        let store = MemoryStore::new();
        store
            .put(PutParameter::new(DEFAULT_USERS_KEY, "not json"))
            .await
            .unwrap();
        assert!(matches!(repo(&store).list().await, Err(UserError::Corrupt(_))));
    }
}
