use chrono::Utc;
use serde_json::{json, Value};

use super::HandlerResult;
use crate::api::ApiResponse;

/// GET / - service index
pub async fn index() -> HandlerResult {
    let version = env!("CARGO_PKG_VERSION");

    Ok(ApiResponse::ok(&json!({
        "name": "Feature Flag Manager",
        "version": version,
        "description": "Feature flags and user permissions over a hierarchical parameter store",
        "identity_header": "X-User-Id",
        "endpoints": {
            "docs": "/docs (public)",
            "health": "/health (public)",
            "parameters": "/parameters[/:prefix]/:id (leitura to read, escrita to write, admin to delete)",
            "prefixes": "/parameters/prefixes, /parameters/prefix/:prefix (leitura)",
            "arn": "/parameters/arn/:arn (admin, DELETE)",
            "users": "/users[/:id] (leitura to read, admin to write)",
        }
    })))
}

/// GET /health
pub async fn health() -> HandlerResult {
    Ok(ApiResponse::ok(&json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    })))
}

/// GET /docs - OpenAPI document
pub async fn docs() -> HandlerResult {
    Ok(ApiResponse::ok(&openapi()))
}

fn identity_parameter() -> Value {
    json!({
        "name": "X-User-Id",
        "in": "header",
        "required": true,
        "description": "Id of the calling user",
        "schema": {"type": "string"}
    })
}

fn path_parameter(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": {"type": "string"}
    })
}

fn operation(tag: &str, summary: &str, permission: &str, extra_params: Vec<Value>, body: Option<&str>) -> Value {
    let mut parameters = vec![identity_parameter()];
    parameters.extend(extra_params);

    let mut op = json!({
        "tags": [tag],
        "summary": summary,
        "description": format!("Requires permission `{}`", permission),
        "parameters": parameters,
        "responses": {
            "200": {"description": "Success"},
            "400": {"$ref": "#/components/responses/BadRequest"},
            "403": {"$ref": "#/components/responses/Forbidden"},
            "404": {"$ref": "#/components/responses/NotFound"},
            "500": {"$ref": "#/components/responses/InternalError"}
        }
    });
    if let Some(schema) = body {
        op["requestBody"] = json!({
            "required": true,
            "content": {"application/json": {"schema": {"$ref": format!("#/components/schemas/{}", schema)}}}
        });
    }
    op
}

pub fn openapi() -> Value {
    let id = || path_parameter("id", "Flag id");
    let prefix = || path_parameter("prefix", "Flag prefix");
    let user_id = || path_parameter("id", "User id");
    let error = |description: &str| {
        json!({
            "description": description,
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Error"}}}
        })
    };

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Feature Flag Manager API",
            "description": "Feature flags with user permissions. Every request except the system routes needs the `X-User-Id` header.\n\nPermissions: `leitura` reads, `escrita` creates and updates flags, `admin` does everything including user management and deletes.",
            "version": env!("CARGO_PKG_VERSION")
        },
        "tags": [
            {"name": "Parameters", "description": "Feature flag records"},
            {"name": "Users", "description": "Users and permissions"},
            {"name": "System", "description": "Service endpoints"}
        ],
        "paths": {
            "/": {"get": {"tags": ["System"], "summary": "Service index", "responses": {"200": {"description": "Index"}}}},
            "/docs": {"get": {"tags": ["System"], "summary": "OpenAPI document", "responses": {"200": {"description": "This document"}}}},
            "/health": {"get": {"tags": ["System"], "summary": "Health check", "responses": {"200": {"description": "Service is healthy"}}}},
            "/parameters": {
                "get": operation("Parameters", "List flags", "leitura", vec![], None),
                "post": operation("Parameters", "Create a flag", "escrita", vec![], Some("CreateParameter"))
            },
            "/parameters/prefixes": {
                "get": operation("Parameters", "List prefixes", "leitura", vec![], None)
            },
            "/parameters/prefix/{prefix}": {
                "get": operation("Parameters", "List flags under a prefix", "leitura", vec![prefix()], None)
            },
            "/parameters/arn/{arn}": {
                "delete": operation("Parameters", "Delete a flag by ARN", "admin", vec![path_parameter("arn", "Parameter ARN")], None)
            },
            "/parameters/{id}": {
                "get": operation("Parameters", "Get a flag", "leitura", vec![id()], None),
                "put": operation("Parameters", "Update a flag", "escrita", vec![id()], Some("UpdateParameter")),
                "delete": operation("Parameters", "Delete a flag", "admin", vec![id()], None)
            },
            "/parameters/{prefix}/{id}": {
                "get": operation("Parameters", "Get a flag under a prefix", "leitura", vec![prefix(), id()], None),
                "put": operation("Parameters", "Update a flag under a prefix", "escrita", vec![prefix(), id()], Some("UpdateParameter")),
                "delete": operation("Parameters", "Delete a flag under a prefix", "admin", vec![prefix(), id()], None)
            },
            "/users": {
                "get": operation("Users", "List users", "leitura", vec![], None),
                "post": operation("Users", "Create a user", "admin", vec![], Some("CreateUser"))
            },
            "/users/{id}": {
                "get": operation("Users", "Get a user", "leitura", vec![user_id()], None),
                "put": operation("Users", "Update a user", "admin", vec![user_id()], Some("UpdateUser")),
                "delete": operation("Users", "Delete a user", "admin", vec![user_id()], None)
            }
        },
        "components": {
            "schemas": {
                "ValueType": {
                    "type": "string",
                    "enum": ["BOOLEAN", "STRING", "INTEGER", "DOUBLE", "DATE", "TIME", "DATETIME", "JSON"]
                },
                "PreviousVersion": {
                    "type": "object",
                    "properties": {
                        "value": {"type": "string"},
                        "modifiedAt": {"type": "string", "format": "date-time"},
                        "modifiedBy": {"type": "string"}
                    }
                },
                "Parameter": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "value": {"type": "string"},
                        "type": {"$ref": "#/components/schemas/ValueType"},
                        "description": {"type": "string"},
                        "lastModifiedAt": {"type": "string", "format": "date-time"},
                        "lastModifiedBy": {"type": "string"},
                        "previousVersion": {"$ref": "#/components/schemas/PreviousVersion"},
                        "prefix": {"type": "string"},
                        "name": {"type": "string"},
                        "arn": {"type": "string"},
                        "parameterStoreType": {"type": "string", "enum": ["String", "StringList", "SecureString"]}
                    }
                },
                "CreateParameter": {
                    "type": "object",
                    "required": ["id", "value", "type"],
                    "properties": {
                        "id": {"type": "string", "example": "DARK_MODE"},
                        "value": {"type": "string", "example": "true"},
                        "type": {"$ref": "#/components/schemas/ValueType"},
                        "description": {"type": "string"},
                        "lastModifiedBy": {"type": "string"},
                        "parameterStoreType": {"type": "string", "enum": ["String", "StringList", "SecureString"]},
                        "prefix": {"type": "string", "example": "ui"}
                    }
                },
                "UpdateParameter": {
                    "type": "object",
                    "minProperties": 1,
                    "properties": {
                        "value": {"type": "string"},
                        "description": {"type": "string", "nullable": true},
                        "type": {"$ref": "#/components/schemas/ValueType"},
                        "lastModifiedBy": {"type": "string"},
                        "prefix": {"type": "string"}
                    }
                },
                "Permissoes": {
                    "type": "object",
                    "required": ["leitura", "escrita", "admin"],
                    "properties": {
                        "leitura": {"type": "boolean"},
                        "escrita": {"type": "boolean"},
                        "admin": {"type": "boolean"}
                    }
                },
                "CreateUser": {
                    "type": "object",
                    "required": ["id", "nome", "permissoes"],
                    "properties": {
                        "id": {"type": "string", "example": "ana@example.com"},
                        "nome": {"type": "string"},
                        "permissoes": {"$ref": "#/components/schemas/Permissoes"},
                        "ativo": {"type": "boolean", "default": true}
                    }
                },
                "UpdateUser": {
                    "type": "object",
                    "minProperties": 1,
                    "properties": {
                        "nome": {"type": "string"},
                        "permissoes": {"type": "object", "description": "Any subset of leitura, escrita, admin"},
                        "ativo": {"type": "boolean"}
                    }
                },
                "Error": {
                    "type": "object",
                    "properties": {
                        "error": {"type": "string"},
                        "code": {"type": "string"},
                        "field": {"type": "string"}
                    }
                }
            },
            "responses": {
                "BadRequest": error("Malformed JSON or failed validation"),
                "Forbidden": error("Missing identity or permission"),
                "NotFound": error("Resource not found"),
                "InternalError": error("Store failure")
            }
        }
    })
}
