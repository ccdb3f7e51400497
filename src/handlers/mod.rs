// handlers/mod.rs - endpoint handlers behind the router
//
// Handlers receive already-authorized callers; the router resolves the
// identity and checks the route's capability before calling in here.
pub mod parameters; // /parameters/*
pub mod system;     // /, /docs, /health
pub mod users;      // /users/*

use crate::api::ApiResponse;
use crate::error::ApiError;

pub type HandlerResult = Result<ApiResponse, ApiError>;
