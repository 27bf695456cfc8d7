use std::fmt;

use crate::models::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    List(ResourceKind),
    Detail(ResourceKind, String),
}

impl Route {
    /// Parse a location. Unknown paths fall through to the dashboard.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let kind = |segment: &str| match segment {
            "users" => Some(ResourceKind::Users),
            "groups" => Some(ResourceKind::Groups),
            "policies" => Some(ResourceKind::Policies),
            _ => None,
        };

        match segments.as_slice() {
            ["login"] => Route::Login,
            ["dashboard"] => Route::Dashboard,
            [collection] => kind(*collection).map(Route::List).unwrap_or(Route::Dashboard),
            [collection, id] => kind(*collection)
                .map(|k| Route::Detail(k, decode_segment(id)))
                .unwrap_or(Route::Dashboard),
            _ => Route::Dashboard,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::List(kind) => kind.collection_path(),
            Route::Detail(kind, id) => kind.item_path(id),
        }
    }

    /// Everything except the login view requires a session
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Route::List(kind) | Route::Detail(kind, _) => Some(*kind),
            Route::Login | Route::Dashboard => None,
        }
    }
}

/// Undo the percent-encoding `ResourceKind::item_path` applies. Malformed
/// sequences are kept as typed.
fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_routes() {
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/dashboard"), Route::Dashboard);
        assert_eq!(Route::parse("/users"), Route::List(ResourceKind::Users));
        assert_eq!(Route::parse("/groups/"), Route::List(ResourceKind::Groups));
        assert_eq!(
            Route::parse("/policies/p-1"),
            Route::Detail(ResourceKind::Policies, "p-1".to_string())
        );
        assert_eq!(
            Route::parse("users/u1?tab=details"),
            Route::Detail(ResourceKind::Users, "u1".to_string())
        );
    }

    #[test]
    fn test_unknown_paths_fall_back_to_dashboard() {
        assert_eq!(Route::parse(""), Route::Dashboard);
        assert_eq!(Route::parse("/"), Route::Dashboard);
        assert_eq!(Route::parse("/roles"), Route::Dashboard);
        assert_eq!(Route::parse("/users/u1/groups"), Route::Dashboard);
    }

    #[test]
    fn test_path_roundtrip() {
        for path in ["/login", "/dashboard", "/users", "/groups/g1", "/policies/p9"] {
            assert_eq!(Route::parse(path).path(), path);
        }
    }

    #[test]
    fn test_ids_with_reserved_characters_roundtrip() {
        let route = Route::Detail(ResourceKind::Groups, "team/ops?x".to_string());
        assert_eq!(route.path(), "/groups/team%2Fops%3Fx");
        assert_eq!(Route::parse(&route.path()), route);
    }

    #[test]
    fn test_kind_of_route() {
        assert_eq!(Route::Login.kind(), None);
        assert_eq!(Route::Dashboard.kind(), None);
        assert_eq!(
            Route::Detail(ResourceKind::Policies, "p1".to_string()).kind(),
            Some(ResourceKind::Policies)
        );
    }

    #[test]
    fn test_only_login_is_public() {
        assert!(!Route::Login.is_protected());
        assert!(Route::Dashboard.is_protected());
        assert!(Route::List(ResourceKind::Users).is_protected());
    }
}
