use serde_json::json;

use super::HandlerResult;
use crate::api::ApiResponse;
use crate::error::ApiError;
use crate::users::UserRepository;
use crate::validation::{validate_create_user, validate_update_user};

/// GET /users
pub async fn list(users: &UserRepository) -> HandlerResult {
    let usuarios = users.list().await?;
    Ok(ApiResponse::ok(&json!({ "usuarios": usuarios })))
}

/// GET /users/:id
pub async fn get(users: &UserRepository, id: &str) -> HandlerResult {
    match users.get(id).await? {
        Some(user) => Ok(ApiResponse::ok(&json!(user))),
        None => Err(ApiError::not_found(format!("User {} not found", id))),
    }
}

/// POST /users - admin only
pub async fn create(users: &UserRepository, body: Option<&str>) -> HandlerResult {
    let request = validate_create_user(body)?;
    let user = users.create(request.into()).await?;
    Ok(ApiResponse::created(&json!({
        "message": "User created successfully",
        "id": user.id,
    })))
}

/// PUT /users/:id - admin only; permission bits merge into the stored ones
pub async fn update(users: &UserRepository, id: &str, body: Option<&str>) -> HandlerResult {
    let request = validate_update_user(body)?;
    let user = users.update(id, request.into()).await?;
    Ok(ApiResponse::ok(&json!({
        "message": "User updated successfully",
        "id": user.id,
    })))
}

/// DELETE /users/:id - admin only
pub async fn delete(users: &UserRepository, id: &str) -> HandlerResult {
    users.delete(id).await?;
    Ok(ApiResponse::ok(&json!({
        "message": "User deleted successfully",
        "id": id,
    })))
}
