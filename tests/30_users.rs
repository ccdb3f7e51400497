mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{ADMIN, READER, WRITER};

#[tokio::test]
async fn non_admin_cannot_create_users() -> Result<()> {
    let server = common::start_server().await?;

    let (status, body) = server
        .post(
            "/users",
            WRITER,
            json!({"id": "new@example.com", "nome": "New", "permissoes": {"leitura": true, "escrita": true, "admin": true}}),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = server.get("/users/new@example.com", ADMIN).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User new@example.com not found");
    Ok(())
}

#[tokio::test]
async fn admin_manages_users() -> Result<()> {
    let server = common::start_server().await?;

    let (status, body) = server
        .post(
            "/users",
            ADMIN,
            json!({"id": "ana@example.com", "nome": "Ana", "permissoes": {"leitura": true, "escrita": false, "admin": false}}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "User created successfully");

    let (_, body) = server.get("/users/ana@example.com", ADMIN).await?;
    assert_eq!(body["nome"], "Ana");
    assert_eq!(body["ativo"], true);

    // Ana can read but not write yet
    let (status, _) = server.get("/parameters", "ana@example.com").await?;
    assert_eq!(status, StatusCode::OK);
    let flag = json!({"id": "ANA_FLAG", "value": "x", "type": "STRING"});
    let (status, _) = server.post("/parameters", "ana@example.com", flag.clone()).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .put("/users/ana@example.com", ADMIN, json!({"permissoes": {"escrita": true}}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = server.get("/users/ana@example.com", ADMIN).await?;
    assert_eq!(body["permissoes"], json!({"leitura": true, "escrita": true, "admin": false}));
    let (status, _) = server.post("/parameters", "ana@example.com", flag).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = server
        .put("/users/ana@example.com", ADMIN, json!({"ativo": false}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get("/parameters", "ana@example.com").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.delete("/users/ana@example.com", ADMIN).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.delete("/users/ana@example.com", ADMIN).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = server.get("/users", ADMIN).await?;
    let ids: Vec<_> = body["usuarios"]
        .as_array()
        .map(|users| users.iter().filter_map(|u| u["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![ADMIN, WRITER, READER]);
    Ok(())
}

#[tokio::test]
async fn user_validation_and_conflicts() -> Result<()> {
    let server = common::start_server().await?;

    let (status, body) = server
        .post(
            "/users",
            ADMIN,
            json!({"id": "x@example.com", "nome": "X", "permissoes": {"leitura": true, "escrita": false}}),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Permission 'admin' is required in permissoes");

    let (status, body) = server
        .post(
            "/users",
            ADMIN,
            json!({"id": READER, "nome": "Again", "permissoes": {"leitura": true, "escrita": false, "admin": false}}),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = server.put(&format!("/users/{}", READER), ADMIN, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}
