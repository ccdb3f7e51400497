use serde::{Deserialize, Serialize};

/// The three permission bits a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `leitura`
    Read,
    /// `escrita`
    Write,
    Admin,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "leitura",
            Capability::Write => "escrita",
            Capability::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissoes {
    #[serde(default)]
    pub leitura: bool,
    #[serde(default)]
    pub escrita: bool,
    #[serde(default)]
    pub admin: bool,
}

impl Permissoes {
    pub fn admin() -> Self {
        Self { leitura: true, escrita: true, admin: true }
    }

    /// Admin grants everything; otherwise the exact bit must be set
    pub fn grants(&self, capability: Capability) -> bool {
        if self.admin {
            return true;
        }
        match capability {
            Capability::Read => self.leitura,
            Capability::Write => self.escrita,
            Capability::Admin => false,
        }
    }
}

/// Partial permission update; unset bits keep their stored value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissoesPatch {
    pub leitura: Option<bool>,
    pub escrita: Option<bool>,
    pub admin: Option<bool>,
}

impl PermissoesPatch {
    pub fn apply(&self, permissoes: &mut Permissoes) {
        if let Some(v) = self.leitura {
            permissoes.leitura = v;
        }
        if let Some(v) = self.escrita {
            permissoes.escrita = v;
        }
        if let Some(v) = self.admin {
            permissoes.admin = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub permissoes: Permissoes,
    #[serde(default)]
    pub ativo: bool,
}

/// The single stored value holding every user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCollection {
    #[serde(default)]
    pub usuarios: Vec<UserRecord>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub nome: String,
    pub permissoes: Permissoes,
    pub ativo: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub nome: Option<String>,
    pub permissoes: Option<PermissoesPatch>,
    pub ativo: Option<bool>,
}
