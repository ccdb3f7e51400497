mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{ADMIN, READER, WRITER};

#[tokio::test]
async fn flag_lifecycle_keeps_previous_version() -> Result<()> {
    let server = common::start_server().await?;

    let (status, body) = server
        .post(
            "/parameters",
            WRITER,
            json!({"id": "DARK_MODE", "value": "false", "type": "BOOLEAN", "description": "Dark theme"}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["id"], "DARK_MODE");
    assert_eq!(body["parameter"]["lastModifiedBy"], WRITER);

    let (status, body) = server.get("/parameters/DARK_MODE", READER).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], "false");
    assert_eq!(body["type"], "BOOLEAN");
    assert!(body.get("previousVersion").is_none());

    let (status, body) = server
        .put("/parameters/DARK_MODE", ADMIN, json!({"value": "true"}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let parameter = &body["parameter"];
    assert_eq!(parameter["value"], "true");
    assert_eq!(parameter["lastModifiedBy"], ADMIN);
    assert_eq!(parameter["previousVersion"]["value"], "false");
    assert_eq!(parameter["previousVersion"]["modifiedBy"], WRITER);
    assert_eq!(parameter["description"], "Dark theme");

    let (status, _) = server.delete("/parameters/DARK_MODE", WRITER).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server.delete("/parameters/DARK_MODE", ADMIN).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Parameter deleted successfully");

    let (status, _) = server.get("/parameters/DARK_MODE", READER).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn readers_cannot_write() -> Result<()> {
    let server = common::start_server().await?;

    let (status, body) = server
        .post("/parameters", READER, json!({"id": "X", "value": "1", "type": "INTEGER"}))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (_, body) = server.get("/parameters", READER).await?;
    assert_eq!(body["count"], 0);
    Ok(())
}

#[tokio::test]
async fn duplicate_create_conflicts() -> Result<()> {
    let server = common::start_server().await?;
    let flag = json!({"id": "BETA", "value": "on", "type": "STRING"});

    let (status, _) = server.post("/parameters", WRITER, flag.clone()).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = server.post("/parameters", WRITER, flag).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn invalid_bodies_are_rejected() -> Result<()> {
    let server = common::start_server().await?;

    let (status, body) = server
        .post("/parameters", WRITER, json!({"id": "X", "value": "1", "type": "NUMBER"}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "type");

    let (status, body) = server.post("/parameters", WRITER, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request body is required");
    Ok(())
}

#[tokio::test]
async fn prefixes_group_flags() -> Result<()> {
    let server = common::start_server().await?;

    for (prefix, id) in [("checkout", "NEW_FLOW"), ("checkout", "PIX"), ("ui", "DARK_MODE")] {
        let (status, body) = server
            .post(
                "/parameters",
                WRITER,
                json!({"id": id, "value": "true", "type": "BOOLEAN", "prefix": prefix}),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (_, body) = server.get("/parameters/prefixes", READER).await?;
    assert_eq!(body["prefixes"], json!(["checkout", "ui"]));

    let (_, body) = server.get("/parameters/prefix/checkout", READER).await?;
    assert_eq!(body["prefix"], "checkout");
    assert_eq!(body["count"], 2);

    let (status, body) = server.get("/parameters/ui/DARK_MODE", READER).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prefix"], "ui");

    let (_, body) = server.get("/parameters", READER).await?;
    assert_eq!(body["count"], 3);

    // The user collection lives under the same root but is never listed as a flag
    assert!(server.store.raw_value("/feature-flags/users").await.is_some());
    Ok(())
}

#[tokio::test]
async fn delete_by_arn() -> Result<()> {
    let server = common::start_server().await?;

    let (_, body) = server
        .post(
            "/parameters",
            WRITER,
            json!({"id": "LIMIT", "value": "10", "type": "INTEGER", "prefix": "api"}),
        )
        .await?;
    let arn = body["parameter"]["arn"].as_str().unwrap_or_default().to_string();
    assert!(arn.starts_with("arn:aws:ssm:"), "{arn}");

    let path = format!("/parameters/arn/{}", urlencoding::encode(&arn));
    let (status, body) = server.delete(&path, ADMIN).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["arn"], arn.as_str());

    let (status, _) = server.get("/parameters/api/LIMIT", READER).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn prefixed_flags_update_in_place() -> Result<()> {
    let server = common::start_server().await?;

    let (status, _) = server
        .post(
            "/parameters",
            WRITER,
            json!({"id": "N", "value": "1", "type": "INTEGER", "prefix": "ui", "description": "old"}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = server
        .put("/parameters/ui/N", WRITER, json!({"value": "2", "description": null}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["prefix"], "ui");
    assert_eq!(body["parameter"]["name"], "/feature-flags/ui/N");
    assert_eq!(body["parameter"]["previousVersion"]["value"], "1");
    assert_eq!(body["parameter"]["description"], "");
    assert_eq!(server.store.description("/feature-flags/ui/N").await.as_deref(), Some(""));

    // Without the prefix the record is found by id and still written in place
    let (status, body) = server.put("/parameters/N", WRITER, json!({"value": "3"})).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["parameter"]["name"], "/feature-flags/ui/N");
    assert_eq!(body["parameter"]["previousVersion"]["value"], "2");
    assert!(server.store.raw_value("/feature-flags/N").await.is_none());
    Ok(())
}
