use serde_json::json;

use super::HandlerResult;
use crate::api::ApiResponse;
use crate::flags::{FlagChanges, FlagRepository, NewFlag};
use crate::users::UserRecord;
use crate::validation::{validate_create_flag, validate_update_flag, Patch};

/// GET /parameters - every flag under the root
pub async fn list(flags: &FlagRepository) -> HandlerResult {
    let parameters = flags.list().await?;
    Ok(ApiResponse::ok(&json!({
        "parameters": parameters,
        "count": parameters.len(),
    })))
}

/// GET /parameters/prefixes - distinct first-level groupings
pub async fn prefixes(flags: &FlagRepository) -> HandlerResult {
    let prefixes = flags.list_prefixes().await?;
    Ok(ApiResponse::ok(&json!({ "prefixes": prefixes })))
}

/// GET /parameters/prefix/:prefix - flags grouped under one prefix
pub async fn list_by_prefix(flags: &FlagRepository, prefix: &str) -> HandlerResult {
    let parameters = flags.list_by_prefix(prefix).await?;
    Ok(ApiResponse::ok(&json!({
        "prefix": prefix,
        "parameters": parameters,
        "count": parameters.len(),
    })))
}

/// GET /parameters/[:prefix/]:id
pub async fn get(flags: &FlagRepository, prefix: &str, id: &str) -> HandlerResult {
    let record = flags.get(id, prefix).await?;
    Ok(ApiResponse::ok(&json!(record)))
}

/// POST /parameters - create a flag; `lastModifiedBy` defaults to the caller
pub async fn create(flags: &FlagRepository, caller: &UserRecord, body: Option<&str>) -> HandlerResult {
    let request = validate_create_flag(body)?;

    let record = flags
        .create(NewFlag {
            id: request.id,
            value: request.value,
            value_type: request.value_type,
            description: request.description,
            modified_by: request.last_modified_by.unwrap_or_else(|| caller.id.clone()),
            store_type: request.store_type,
            prefix: request.prefix.unwrap_or_default(),
        })
        .await?;

    Ok(ApiResponse::created(&json!({
        "message": "Parameter created successfully",
        "id": record.id(),
        "prefix": record.prefix,
        "parameter": record,
    })))
}

/// PUT /parameters/[:prefix/]:id - merge the supplied fields. A prefix in
/// the path wins over one in the body.
pub async fn update(
    flags: &FlagRepository,
    caller: &UserRecord,
    prefix: &str,
    id: &str,
    body: Option<&str>,
) -> HandlerResult {
    let request = validate_update_flag(body)?;

    let prefix = match (prefix, request.prefix) {
        ("", Patch::Value(body_prefix)) => body_prefix,
        (path_prefix, _) => path_prefix.to_string(),
    };
    let description = match request.description {
        Patch::Absent => None,
        Patch::Null => Some(String::new()),
        Patch::Value(description) => Some(description),
    };
    let changes = FlagChanges {
        value: request.value.value(),
        description,
        value_type: request.value_type.value(),
        modified_by: Some(request.last_modified_by.value().unwrap_or_else(|| caller.id.clone())),
    };

    let record = flags.update(id, &prefix, changes).await?;
    Ok(ApiResponse::ok(&json!({
        "message": "Parameter updated successfully",
        "id": record.id(),
        "prefix": record.prefix,
        "parameter": record,
    })))
}

/// DELETE /parameters/[:prefix/]:id
pub async fn delete(flags: &FlagRepository, prefix: &str, id: &str) -> HandlerResult {
    flags.delete(id, prefix).await?;
    Ok(ApiResponse::ok(&json!({
        "message": "Parameter deleted successfully",
        "id": id,
    })))
}

/// DELETE /parameters/arn/:arn - delete through the store's resource name
pub async fn delete_by_arn(flags: &FlagRepository, arn: &str) -> HandlerResult {
    flags.delete_by_external_reference(arn).await?;
    Ok(ApiResponse::ok(&json!({
        "message": "Parameter deleted successfully",
        "arn": arn,
    })))
}
