//! HTTP front end: every request goes through one fallback handler that turns
//! it into an `ApiRequest` for the router and writes the `ApiResponse` back.

use std::collections::HashMap;

use anyhow::Context;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::api::{ApiRequest, ApiResponse};
use crate::config::{AppConfig, SecurityConfig};
use crate::error::ApiError;
use crate::router::FlagRouter;

#[derive(Clone)]
struct GatewayState {
    router: FlagRouter,
    max_body: usize,
}

pub fn app(router: FlagRouter, config: &AppConfig) -> Router {
    let state = GatewayState {
        router,
        max_body: config.api.max_request_size_bytes,
    };

    let mut app = Router::new().fallback(gateway).with_state(state);
    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn gateway(State(state): State<GatewayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, state.max_body).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return ApiError::payload_too_large(format!(
                "Request body exceeds {} bytes",
                state.max_body
            ))
            .into_response()
        }
    };
    let body = if bytes.is_empty() {
        None
    } else {
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(text),
            Err(_) => return ApiError::bad_request("Request body must be UTF-8").into_response(),
        }
    };

    let headers: HashMap<String, String> = parts
        .headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();

    let request = ApiRequest {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        headers,
        body,
    };
    into_http(state.router.handle(request).await)
}

fn into_http(response: ApiResponse) -> Response {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = Response::new(Body::from(response.body));
    *http.status_mut() = status;
    for (name, value) in response.headers {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            http.headers_mut().insert(name, value);
        }
    }
    http
}

/// Seed the configured admin when nobody exists yet
pub async fn bootstrap(router: &FlagRouter, config: &AppConfig) -> anyhow::Result<()> {
    let Some(admin) = config.security.bootstrap_admin.as_deref() else {
        return Ok(());
    };
    match router.users().bootstrap_admin(admin).await {
        Ok(true) => info!("Seeded bootstrap admin {}", admin),
        Ok(false) => {}
        Err(e) => warn!("Could not seed bootstrap admin {}: {}", admin, e),
    }
    Ok(())
}

/// Serve on an already bound listener until the server stops
pub async fn run(listener: TcpListener, router: FlagRouter, config: &AppConfig) -> anyhow::Result<()> {
    bootstrap(&router, config).await?;
    let addr = listener.local_addr()?;
    info!("Feature flag manager listening on http://{}", addr);
    axum::serve(listener, app(router, config))
        .await
        .context("server error")
}

/// Build the store from config, bind the configured port and serve
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let store = config.build_store().await;
    let router = FlagRouter::new(store, config.router_options());

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    run(listener, router, config).await
}
