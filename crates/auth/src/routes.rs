//! Route descriptors and the application route table.

use std::collections::BTreeMap;

use serde::Serialize;

/// Path of the login view.
pub const LOGIN_PATH: &str = "/login";

/// Landing path; always resolved to the identity's default route.
pub const ROOT_PATH: &str = "/";

/// Query key carrying the return target of a login redirect.
pub const REDIRECT_QUERY: &str = "redirect";

/// Access requirements of one route.
///
/// Fields are private so that non-empty `required_roles` always implies
/// `requires_auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    pattern: String,
    title: String,
    requires_auth: bool,
    required_roles: Vec<String>,
}

impl RouteDescriptor {
    /// Reachable without a session.
    pub fn public(pattern: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            title: title.into(),
            requires_auth: false,
            required_roles: Vec::new(),
        }
    }

    /// Any authenticated identity.
    pub fn authenticated(pattern: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            requires_auth: true,
            ..Self::public(pattern, title)
        }
    }

    /// Authenticated identity holding at least one of `roles`.
    pub fn protected(
        pattern: impl Into<String>,
        title: impl Into<String>,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            required_roles: roles.into_iter().map(Into::into).collect(),
            ..Self::authenticated(pattern, title)
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn is_login(&self) -> bool {
        self.pattern == LOGIN_PATH
    }

    /// Match a concrete path against this pattern.
    ///
    /// `:name` matches one non-empty segment, `:name?` additionally matches
    /// nothing when it is the last segment. Returns the captured params.
    pub fn match_path(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let pattern: Vec<&str> = segments(&self.pattern).collect();
        let actual: Vec<&str> = segments(path).collect();
        let mut params = BTreeMap::new();

        for (index, part) in pattern.iter().enumerate() {
            let value = actual.get(index).copied();
            match (part.strip_prefix(':'), value) {
                (Some(name), value) if name.ends_with('?') => {
                    if index + 1 != pattern.len() {
                        return None;
                    }
                    if let Some(value) = value {
                        params.insert(name.trim_end_matches('?').to_string(), value.to_string());
                    }
                }
                (Some(name), Some(value)) => {
                    params.insert(name.to_string(), value.to_string());
                }
                (None, Some(value)) if value == *part => {}
                _ => return None,
            }
        }

        (actual.len() <= pattern.len()).then_some(params)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// A route resolved against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute<'a> {
    pub route: &'a RouteDescriptor,
    pub params: BTreeMap<String, String>,
}

/// Ordered route table; first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn find(&self, path: &str) -> Option<MatchedRoute<'_>> {
        self.routes.iter().find_map(|route| {
            route
                .match_path(path)
                .map(|params| MatchedRoute { route, params })
        })
    }
}

impl Default for RouteTable {
    /// The warehouse client's route table.
    fn default() -> Self {
        Self::new(vec![
            RouteDescriptor::public(LOGIN_PATH, "Sign in"),
            RouteDescriptor::authenticated(ROOT_PATH, "Home"),
            RouteDescriptor::protected("/procurement/create", "Create procurement request", ["BUYER"]),
            RouteDescriptor::protected("/procurement/list", "My procurement requests", ["BUYER"]),
            RouteDescriptor::protected("/procurement/inventory", "Inventory lookup", ["BUYER"]),
            RouteDescriptor::protected("/warehouse/inbound", "Create inbound request", ["WAREHOUSE_CLERK"]),
            RouteDescriptor::protected("/warehouse/outbound", "Create outbound request", ["WAREHOUSE_CLERK"]),
            RouteDescriptor::protected("/warehouse/tasks", "Pending tasks", ["WAREHOUSE_CLERK"]),
            RouteDescriptor::protected("/warehouse/inventory", "Inventory lookup", ["WAREHOUSE_CLERK"]),
            RouteDescriptor::protected("/manager/pending-approvals", "Pending approvals", ["MANAGER"]),
            RouteDescriptor::protected("/manager/approval/:id?", "Approval", ["MANAGER"]),
            RouteDescriptor::protected("/manager/analytics", "Analytics dashboard", ["MANAGER"]),
            RouteDescriptor::protected("/manager/monitoring", "Inventory monitoring", ["MANAGER"]),
            RouteDescriptor::protected("/admin/users", "User management", ["ADMIN"]),
            RouteDescriptor::protected("/admin/system", "System monitoring", ["ADMIN"]),
            RouteDescriptor::protected("/admin/logs", "Operation logs", ["ADMIN"]),
            RouteDescriptor::protected("/admin/downloads", "Log downloads", ["ADMIN"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_routes_always_require_auth() {
        for route in RouteTable::default().routes() {
            if !route.required_roles().is_empty() {
                assert!(route.requires_auth(), "{} must require auth", route.pattern());
            }
        }
    }

    #[test]
    fn static_patterns_match_exactly() {
        let route = RouteDescriptor::protected("/admin/users", "Users", ["ADMIN"]);
        assert!(route.match_path("/admin/users").is_some());
        assert!(route.match_path("/admin/users/").is_some());
        assert!(route.match_path("/admin").is_none());
        assert!(route.match_path("/admin/users/3").is_none());
        assert!(route.match_path("/admin/logs").is_none());
    }

    #[test]
    fn optional_param_matches_with_and_without_value() {
        let table = RouteTable::default();

        let matched = table.find("/manager/approval/PROCUREMENT:7").unwrap();
        assert_eq!(matched.route.pattern(), "/manager/approval/:id?");
        assert_eq!(matched.params.get("id").map(String::as_str), Some("PROCUREMENT:7"));

        let matched = table.find("/manager/approval").unwrap();
        assert!(matched.params.is_empty());
    }

    #[test]
    fn root_and_unknown_paths() {
        let table = RouteTable::default();
        assert_eq!(table.find("/").unwrap().route.pattern(), ROOT_PATH);
        assert!(table.find("/nowhere").is_none());
    }
}
