pub mod authorization;

pub use authorization::{extract_identity, AuthError, Authorizer, IDENTITY_HEADER};
