use serde_json::Value;

use super::{as_bool, as_non_empty_string, parse_object, patch, required, JsonObject, Patch, ValidationError};
use crate::users::{NewUser, Permissoes, PermissoesPatch, UserChanges};

const PERMISSIONS: [&str; 3] = ["leitura", "escrita", "admin"];

#[derive(Debug, Clone, PartialEq)]
pub struct CreateUserRequest {
    pub id: String,
    pub nome: String,
    pub permissoes: Permissoes,
    pub ativo: bool,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            id: req.id,
            nome: req.nome,
            permissoes: req.permissoes,
            ativo: req.ativo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateUserRequest {
    pub nome: Option<String>,
    pub permissoes: Option<PermissoesPatch>,
    pub ativo: Option<bool>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        UserChanges {
            nome: req.nome,
            permissoes: req.permissoes,
            ativo: req.ativo,
        }
    }
}

pub fn validate_create_user(body: Option<&str>) -> Result<CreateUserRequest, ValidationError> {
    let body = parse_object(body)?;

    let id = as_non_empty_string("id", required(&body, "id")?)?;
    let nome = as_non_empty_string("nome", required(&body, "nome")?)?;
    let permissoes = permission_patch(required(&body, "permissoes")?, true)?;
    let ativo = match patch(&body, "ativo") {
        Patch::Absent => true,
        Patch::Null => return Err(ValidationError::field("ativo", "Field 'ativo' must be a boolean")),
        Patch::Value(v) => as_bool("ativo", v)?,
    };

    Ok(CreateUserRequest {
        id,
        nome,
        permissoes: Permissoes {
            leitura: permissoes.leitura.unwrap_or_default(),
            escrita: permissoes.escrita.unwrap_or_default(),
            admin: permissoes.admin.unwrap_or_default(),
        },
        ativo,
    })
}

pub fn validate_update_user(body: Option<&str>) -> Result<UpdateUserRequest, ValidationError> {
    let body = parse_object(body)?;

    let request = UpdateUserRequest {
        nome: non_null(&body, "nome")?.map(|v| as_non_empty_string("nome", v)).transpose()?,
        permissoes: non_null(&body, "permissoes")?.map(|v| permission_patch(v, false)).transpose()?,
        ativo: non_null(&body, "ativo")?.map(|v| as_bool("ativo", v)).transpose()?,
    };

    if request == UpdateUserRequest::default() {
        return Err(ValidationError::Body(
            "At least one field must be provided for update".to_string(),
        ));
    }
    Ok(request)
}

/// A supplied update field; `null` is an error rather than "leave as is"
fn non_null<'a>(body: &'a JsonObject, key: &str) -> Result<Option<&'a Value>, ValidationError> {
    match patch(body, key) {
        Patch::Absent => Ok(None),
        Patch::Null => Err(ValidationError::field(key, format!("Field '{}' must not be null", key))),
        Patch::Value(v) => Ok(Some(v)),
    }
}

/// With `complete`, all three permission keys must be present
fn permission_patch(value: &Value, complete: bool) -> Result<PermissoesPatch, ValidationError> {
    let Some(map) = value.as_object() else {
        return Err(ValidationError::field("permissoes", "Field 'permissoes' must be an object"));
    };

    let mut bits = [None; 3];
    for (slot, name) in bits.iter_mut().zip(PERMISSIONS) {
        match map.get(name) {
            None if complete => {
                return Err(ValidationError::field(
                    "permissoes",
                    format!("Permission '{}' is required in permissoes", name),
                ))
            }
            None => {}
            Some(Value::Bool(b)) => *slot = Some(*b),
            Some(_) => {
                return Err(ValidationError::field(
                    "permissoes",
                    format!("Permission '{}' must be a boolean", name),
                ))
            }
        }
    }

    let [leitura, escrita, admin] = bits;
    Ok(PermissoesPatch { leitura, escrita, admin })
}
