pub mod route;

pub use route::Route;

use std::sync::Arc;

use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::api::{ApiRequest, ApiResponse};
use crate::error::ApiError;
use crate::flags::{FlagRepository, DEFAULT_ROOT};
use crate::handlers::{self, HandlerResult};
use crate::middleware::{AuthError, Authorizer, IDENTITY_HEADER};
use crate::store::ParameterStore;
use crate::users::{UserRecord, UserRepository, DEFAULT_USERS_KEY};

/// Where the router keeps its data and which header names the caller
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub root: String,
    pub users_key: String,
    pub identity_header: String,
    pub with_decryption: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            users_key: DEFAULT_USERS_KEY.to_string(),
            identity_header: IDENTITY_HEADER.to_string(),
            with_decryption: true,
        }
    }
}

/// Stateless request dispatcher: a request envelope in, a response envelope
/// out. Nothing is kept between requests.
#[derive(Clone)]
pub struct FlagRouter {
    flags: Arc<FlagRepository>,
    users: Arc<UserRepository>,
    authorizer: Authorizer,
}

impl FlagRouter {
    pub fn new(store: Arc<dyn ParameterStore>, options: RouterOptions) -> Self {
        let flags = FlagRepository::new(store.clone(), options.root)
            .with_reserved(options.users_key.clone())
            .with_decryption(options.with_decryption);
        let users = Arc::new(
            UserRepository::new(store, options.users_key).with_decryption(options.with_decryption),
        );
        let authorizer = Authorizer::new(users.clone()).with_header(options.identity_header);

        Self {
            flags: Arc::new(flags),
            users,
            authorizer,
        }
    }

    pub fn flags(&self) -> &FlagRepository {
        &self.flags
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("request", %request_id, method = %request.method, path = %request.path);

        async move {
            match self.route(&request).await {
                Ok(response) => {
                    debug!(status = response.status_code, "Request completed");
                    response
                }
                Err(err) => {
                    if err.status_code() >= 500 {
                        error!(status = err.status_code(), "Request failed: {}", err);
                    } else {
                        debug!(status = err.status_code(), "Request rejected: {}", err);
                    }
                    err.into_api_response()
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn route(&self, request: &ApiRequest) -> HandlerResult {
        let Some(route) = Route::parse(&request.method, &request.path) else {
            debug!("No route matched");
            return Err(ApiError::not_found("Not found"));
        };
        debug!(route = route.name(), "Route matched");

        let caller = match route.capability() {
            Some(capability) => {
                let identity = self.authorizer.identity(&request.headers);
                match self.authorizer.check(identity.as_deref(), capability).await {
                    Ok(user) => Some(user),
                    Err(AuthError::Forbidden(msg)) => return Err(ApiError::forbidden(msg)),
                    Err(err) => {
                        warn!("Authorization lookup failed: {}", err);
                        return Err(err.into());
                    }
                }
            }
            None => None,
        };

        self.dispatch(route, caller, request.body.as_deref()).await
    }

    async fn dispatch(&self, route: Route, caller: Option<UserRecord>, body: Option<&str>) -> HandlerResult {
        let caller = || caller.clone().ok_or_else(|| ApiError::forbidden("Missing caller identity"));

        match route {
            Route::Index => handlers::system::index().await,
            Route::Docs => handlers::system::docs().await,
            Route::Health => handlers::system::health().await,

            Route::ListUsers => handlers::users::list(&self.users).await,
            Route::GetUser(id) => handlers::users::get(&self.users, &id).await,
            Route::CreateUser => handlers::users::create(&self.users, body).await,
            Route::UpdateUser(id) => handlers::users::update(&self.users, &id, body).await,
            Route::DeleteUser(id) => handlers::users::delete(&self.users, &id).await,

            Route::ListParameters => handlers::parameters::list(&self.flags).await,
            Route::ListPrefixes => handlers::parameters::prefixes(&self.flags).await,
            Route::ListByPrefix(prefix) => handlers::parameters::list_by_prefix(&self.flags, &prefix).await,
            Route::GetParameter { prefix, id } => handlers::parameters::get(&self.flags, &prefix, &id).await,
            Route::CreateParameter => handlers::parameters::create(&self.flags, &caller()?, body).await,
            Route::UpdateParameter { prefix, id } => {
                handlers::parameters::update(&self.flags, &caller()?, &prefix, &id, body).await
            }
            Route::DeleteParameter { prefix, id } => handlers::parameters::delete(&self.flags, &prefix, &id).await,
            Route::DeleteByArn(arn) => handlers::parameters::delete_by_arn(&self.flags, &arn).await,
        }
    }
}
