use std::borrow::Cow;

use crate::users::Capability;

/// Every endpoint the router serves, with path parameters already decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Docs,
    Health,

    ListUsers,
    CreateUser,
    GetUser(String),
    UpdateUser(String),
    DeleteUser(String),

    ListParameters,
    CreateParameter,
    ListPrefixes,
    ListByPrefix(String),
    DeleteByArn(String),
    GetParameter { prefix: String, id: String },
    UpdateParameter { prefix: String, id: String },
    DeleteParameter { prefix: String, id: String },
}

impl Route {
    /// Match a method and path. Trailing slashes are ignored; `prefixes`,
    /// `prefix/..` and `arn/..` below `/parameters` are never flag ids.
    pub fn parse(method: &str, path: &str) -> Option<Route> {
        let method = method.to_ascii_uppercase();
        let path = normalize(path);

        match (method.as_str(), path) {
            ("GET", "/") => return Some(Route::Index),
            ("GET", "/docs") => return Some(Route::Docs),
            ("GET", "/health") => return Some(Route::Health),
            ("GET", "/users") => return Some(Route::ListUsers),
            ("POST", "/users") => return Some(Route::CreateUser),
            ("GET", "/parameters") => return Some(Route::ListParameters),
            ("POST", "/parameters") => return Some(Route::CreateParameter),
            _ => {}
        }

        if let Some(id) = path.strip_prefix("/users/") {
            let id = decode(id);
            return match method.as_str() {
                "GET" => Some(Route::GetUser(id)),
                "PUT" => Some(Route::UpdateUser(id)),
                "DELETE" => Some(Route::DeleteUser(id)),
                _ => None,
            };
        }

        let rest = path.strip_prefix("/parameters/")?;
        if rest == "prefixes" {
            return (method == "GET").then_some(Route::ListPrefixes);
        }
        if let Some(prefix) = rest.strip_prefix("prefix/") {
            let prefix = path_segment(prefix)?;
            return (method == "GET").then_some(Route::ListByPrefix(prefix));
        }
        if rest == "prefix" {
            return None;
        }
        if let Some(reference) = rest.strip_prefix("arn/") {
            return (method == "DELETE").then(|| Route::DeleteByArn(decode(reference)));
        }
        if rest == "arn" {
            return None;
        }

        let (prefix, id) = match rest.split_once('/') {
            Some((prefix, id)) => (path_segment(prefix)?, path_segment(id)?),
            None => (String::new(), path_segment(rest)?),
        };
        if id.is_empty() {
            return None;
        }
        match method.as_str() {
            "GET" => Some(Route::GetParameter { prefix, id }),
            "PUT" => Some(Route::UpdateParameter { prefix, id }),
            "DELETE" => Some(Route::DeleteParameter { prefix, id }),
            _ => None,
        }
    }

    /// Permission the caller must hold; `None` for the public system routes
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Route::Index | Route::Docs | Route::Health => None,
            Route::ListUsers | Route::GetUser(_) => Some(Capability::Read),
            Route::CreateUser | Route::UpdateUser(_) | Route::DeleteUser(_) => Some(Capability::Admin),
            Route::ListParameters
            | Route::ListPrefixes
            | Route::ListByPrefix(_)
            | Route::GetParameter { .. } => Some(Capability::Read),
            Route::CreateParameter | Route::UpdateParameter { .. } => Some(Capability::Write),
            Route::DeleteByArn(_) | Route::DeleteParameter { .. } => Some(Capability::Admin),
        }
    }

    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            Route::Index => "index",
            Route::Docs => "docs",
            Route::Health => "health",
            Route::ListUsers => "users.list",
            Route::CreateUser => "users.create",
            Route::GetUser(_) => "users.get",
            Route::UpdateUser(_) => "users.update",
            Route::DeleteUser(_) => "users.delete",
            Route::ListParameters => "parameters.list",
            Route::CreateParameter => "parameters.create",
            Route::ListPrefixes => "parameters.prefixes",
            Route::ListByPrefix(_) => "parameters.by_prefix",
            Route::DeleteByArn(_) => "parameters.delete_arn",
            Route::GetParameter { .. } => "parameters.get",
            Route::UpdateParameter { .. } => "parameters.update",
            Route::DeleteParameter { .. } => "parameters.delete",
        }
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .unwrap_or(Cow::Borrowed(segment))
        .into_owned()
}

/// A decoded prefix or id: one key segment, never a traversal
fn path_segment(raw: &str) -> Option<String> {
    let segment = decode(raw);
    match segment.as_str() {
        "." | ".." => None,
        s if s.contains('/') => None,
        _ => Some(segment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(prefix: &str, id: &str) -> (String, String) {
        (prefix.to_string(), id.to_string())
    }

    #[test]
    fn system_and_collection_routes() {
        assert_eq!(Route::parse("GET", "/"), Some(Route::Index));
        assert_eq!(Route::parse("GET", ""), Some(Route::Index));
        assert_eq!(Route::parse("get", "/health/"), Some(Route::Health));
        assert_eq!(Route::parse("GET", "/docs"), Some(Route::Docs));
        assert_eq!(Route::parse("POST", "/parameters/"), Some(Route::CreateParameter));
        assert_eq!(Route::parse("GET", "/users"), Some(Route::ListUsers));
        assert_eq!(Route::parse("POST", "/health"), None);
    }

    #[test]
    fn parameter_paths_split_prefix_from_id() {
        let Some(Route::GetParameter { prefix, id }) = Route::parse("GET", "/parameters/DARK_MODE") else {
            panic!("expected GetParameter");
        };
        assert_eq!((prefix, id), param("", "DARK_MODE"));

        let Some(Route::UpdateParameter { prefix, id }) = Route::parse("PUT", "/parameters/ui/DARK_MODE") else {
            panic!("expected UpdateParameter");
        };
        assert_eq!((prefix, id), param("ui", "DARK_MODE"));

        assert_eq!(Route::parse("GET", "/parameters/ui/"), Some(Route::GetParameter {
            prefix: String::new(),
            id: "ui".to_string()
        }));
        assert_eq!(Route::parse("PATCH", "/parameters/X"), None);
    }

    #[test]
    fn reserved_segments_win_over_flag_ids() {
        assert_eq!(Route::parse("GET", "/parameters/prefixes"), Some(Route::ListPrefixes));
        assert_eq!(Route::parse("PUT", "/parameters/prefixes"), None);
        assert_eq!(
            Route::parse("GET", "/parameters/prefix/ui"),
            Some(Route::ListByPrefix("ui".to_string()))
        );
        assert_eq!(Route::parse("GET", "/parameters/prefix"), None);
        assert_eq!(Route::parse("GET", "/parameters/arn/x"), None);
    }

    #[test]
    fn flag_segments_cannot_escape_their_key() {
        for path in [
            "/parameters/..",
            "/parameters/ui/..",
            "/parameters/../X",
            "/parameters/%2E%2E/X",
            "/parameters/ui%2Fnested/X",
            "/parameters/ui/a%2Fb",
            "/parameters/ui/a/b",
            "/parameters/prefix/..",
            "/parameters/prefix/a%2Fb",
        ] {
            assert_eq!(Route::parse("GET", path), None, "{}", path);
        }
        assert_eq!(Route::parse("DELETE", "/parameters/ui/..%2F..%2Fusers"), None);
        assert_eq!(Route::parse("PUT", "/parameters/./X"), None);

        assert_eq!(
            Route::parse("GET", "/parameters/ui/A.B"),
            Some(Route::GetParameter { prefix: "ui".to_string(), id: "A.B".to_string() })
        );
    }

    #[test]
    fn arn_keeps_slashes_and_is_decoded() {
        let arn = "arn:aws:ssm:us-east-1:000000000000:parameter/feature-flags/ui/X";
        assert_eq!(
            Route::parse("DELETE", &format!("/parameters/arn/{}", arn)),
            Some(Route::DeleteByArn(arn.to_string()))
        );
        assert_eq!(
            Route::parse("DELETE", &format!("/parameters/arn/{}", urlencoding::encode(arn))),
            Some(Route::DeleteByArn(arn.to_string()))
        );
    }

    #[test]
    fn user_ids_are_decoded() {
        assert_eq!(
            Route::parse("GET", "/users/ana%40x.com"),
            Some(Route::GetUser("ana@x.com".to_string()))
        );
        assert_eq!(Route::parse("PATCH", "/users/a"), None);
    }

    #[test]
    fn capabilities_follow_the_route_table() {
        let cases = [
            ("GET", "/health", None),
            ("GET", "/users", Some(Capability::Read)),
            ("POST", "/users", Some(Capability::Admin)),
            ("PUT", "/users/a", Some(Capability::Admin)),
            ("GET", "/parameters", Some(Capability::Read)),
            ("POST", "/parameters", Some(Capability::Write)),
            ("PUT", "/parameters/X", Some(Capability::Write)),
            ("DELETE", "/parameters/ui/X", Some(Capability::Admin)),
            ("DELETE", "/parameters/arn/a", Some(Capability::Admin)),
        ];
        for (method, path, capability) in cases {
            let route = Route::parse(method, path).unwrap();
            assert_eq!(route.capability(), capability, "{} {}", method, path);
        }
    }
}
