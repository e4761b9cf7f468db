//! Navigation guard.
//!
//! A pure decision of (route descriptor, requested path, session snapshot):
//!
//! - No IO
//! - No panics
//! - No navigation side effects (the router applies the decision)

use serde::Serialize;

use crate::routes::{LOGIN_PATH, RouteDescriptor};
use crate::session::Session;

/// Outcome of guarding one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum NavigationDecision {
    /// Render the requested view.
    Allowed,
    /// Send the visitor to login, remembering where they wanted to go.
    RedirectLogin { redirect: String },
    /// Send the identity to its own landing page.
    RedirectDefault { target: String },
}

impl NavigationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationDecision::Allowed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationDecision::Allowed => "allowed",
            NavigationDecision::RedirectLogin { .. } => "redirect_login",
            NavigationDecision::RedirectDefault { .. } => "redirect_default",
        }
    }
}

/// Decide whether `session` may open `route`.
///
/// `requested` is the full path the navigation asked for; it becomes the
/// return target of a login redirect.
pub fn evaluate(route: &RouteDescriptor, requested: &str, session: &Session) -> NavigationDecision {
    if route.requires_auth() && !session.is_authenticated() {
        return NavigationDecision::RedirectLogin {
            redirect: requested.to_string(),
        };
    }

    if route.is_login() && !route.requires_auth() && session.is_authenticated() {
        let target = session.resolve_default_route();
        // An identity without a known role lands on login itself; let it stay
        // there instead of bouncing.
        if target != LOGIN_PATH {
            return NavigationDecision::RedirectDefault {
                target: target.to_string(),
            };
        }
    }

    if route.requires_auth() && !session.has_any_role(route.required_roles()) {
        return NavigationDecision::RedirectDefault {
            target: session.resolve_default_route().to_string(),
        };
    }

    NavigationDecision::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Credentials;

    fn admin_users() -> RouteDescriptor {
        RouteDescriptor::protected("/admin/users", "User management", ["ADMIN"])
    }

    fn session_with(authorities: &[&str]) -> Session {
        Session::from_credentials(Credentials::new("token", "someone", authorities.iter().copied()))
    }

    #[test]
    fn unauthenticated_visitor_is_sent_to_login_with_return_path() {
        let decision = evaluate(&admin_users(), "/admin/users", &Session::empty());
        assert_eq!(
            decision,
            NavigationDecision::RedirectLogin {
                redirect: "/admin/users".into()
            }
        );
    }

    #[test]
    fn manager_is_demoted_to_own_landing_page() {
        let decision = evaluate(&admin_users(), "/admin/users", &session_with(&["ROLE_MANAGER"]));
        assert_eq!(
            decision,
            NavigationDecision::RedirectDefault {
                target: "/manager/pending-approvals".into()
            }
        );
    }

    #[test]
    fn admin_is_allowed() {
        let decision = evaluate(&admin_users(), "/admin/users", &session_with(&["ROLE_ADMIN"]));
        assert!(decision.is_allowed());
    }

    #[test]
    fn authenticated_identity_cannot_revisit_login() {
        let login = RouteDescriptor::public(LOGIN_PATH, "Sign in");
        let decision = evaluate(&login, LOGIN_PATH, &session_with(&["ROLE_OPERATOR"]));
        assert_eq!(
            decision,
            NavigationDecision::RedirectDefault {
                target: "/warehouse/tasks".into()
            }
        );
        assert!(evaluate(&login, LOGIN_PATH, &Session::empty()).is_allowed());
    }

    #[test]
    fn identity_without_known_role_may_stay_on_login() {
        let login = RouteDescriptor::public(LOGIN_PATH, "Sign in");
        assert!(evaluate(&login, LOGIN_PATH, &session_with(&["ROLE_AUDITOR"])).is_allowed());
    }

    #[test]
    fn empty_role_requirement_admits_any_authenticated_identity() {
        let home = RouteDescriptor::authenticated("/", "Home");
        assert!(evaluate(&home, "/", &session_with(&["ROLE_AUDITOR"])).is_allowed());
        assert!(!evaluate(&home, "/", &Session::empty()).is_allowed());
    }

    #[test]
    fn alias_requirement_is_met_by_canonical_role() {
        let create = RouteDescriptor::protected("/procurement/create", "Create", ["BUYER"]);
        assert!(evaluate(&create, "/procurement/create", &session_with(&["ROLE_PURCHASER"])).is_allowed());
    }
}
