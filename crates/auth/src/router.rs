//! In-process router: applies guard decisions and tracks the current location.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use url::form_urlencoded;

use crate::guard::{NavigationDecision, evaluate};
use crate::routes::{LOGIN_PATH, REDIRECT_QUERY, ROOT_PATH, RouteTable};
use crate::session::SessionStore;

/// Upper bound on redirects followed for one navigation.
const MAX_REDIRECTS: usize = 8;

/// A path plus its query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// The login view, carrying `redirect` as its return target.
    pub fn login(redirect: impl Into<String>) -> Self {
        let mut location = Self::new(LOGIN_PATH);
        location.query.insert(REDIRECT_QUERY.to_string(), redirect.into());
        location
    }

    /// Parse `"/path?key=value"`.
    pub fn parse(full_path: &str) -> Self {
        let (path, query) = full_path.split_once('?').unwrap_or((full_path, ""));
        let path = if path.is_empty() { ROOT_PATH } else { path };
        Self {
            path: path.to_string(),
            query: form_urlencoded::parse(query.as_bytes()).into_owned().collect(),
        }
    }

    /// Path plus encoded query string.
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        self.query.get(REDIRECT_QUERY).map(String::as_str)
    }
}

/// Navigation seam used by the transport's 401 handler.
pub trait Navigator: Send + Sync {
    fn current_location(&self) -> Location;

    /// Replace the current location (no history entry).
    fn replace(&self, location: Location);
}

/// Result of one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Full path that was asked for.
    pub requested: String,
    /// Guard decision for the requested path.
    pub decision: NavigationDecision,
    /// Where navigation settled after following redirects.
    pub location: Location,
    pub title: Option<String>,
    pub params: BTreeMap<String, String>,
}

/// Router over a [`RouteTable`], guarded by the shared [`SessionStore`].
#[derive(Debug)]
pub struct Router {
    table: RouteTable,
    session: Arc<SessionStore>,
    current: RwLock<Location>,
}

impl Router {
    pub fn new(table: RouteTable, session: Arc<SessionStore>) -> Self {
        Self {
            table,
            session,
            current: RwLock::new(Location::new(LOGIN_PATH)),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Navigate to `target`, following guard redirects until a view is
    /// allowed.
    pub fn navigate(&self, target: &str) -> Navigation {
        let mut location = Location::parse(target);
        let mut first_decision = None;

        for _ in 0..MAX_REDIRECTS {
            let session = self.session.snapshot();
            let full_path = location.full_path();

            let (decision, title, params) = match self.table.find(&location.path) {
                Some(matched) => {
                    let mut decision = evaluate(matched.route, &full_path, &session);
                    if decision.is_allowed() && matched.route.pattern() == ROOT_PATH {
                        decision = NavigationDecision::RedirectDefault {
                            target: session.resolve_default_route().to_string(),
                        };
                    }
                    (decision, matched.route.title().to_string(), matched.params)
                }
                None => {
                    tracing::debug!(path = %location.path, "no route matched");
                    let decision = NavigationDecision::RedirectDefault {
                        target: session.resolve_default_route().to_string(),
                    };
                    (decision, String::new(), BTreeMap::new())
                }
            };

            tracing::debug!(path = %full_path, decision = decision.as_str(), "guarded navigation");
            let settled = decision.is_allowed();
            let decision_for_caller = first_decision.get_or_insert_with(|| decision.clone()).clone();

            match decision {
                NavigationDecision::Allowed => {}
                NavigationDecision::RedirectLogin { redirect } => location = Location::login(redirect),
                NavigationDecision::RedirectDefault { target } => location = Location::parse(&target),
            }

            if settled {
                self.set_current(location.clone());
                return Navigation {
                    requested: target.to_string(),
                    decision: decision_for_caller,
                    location,
                    title: Some(title),
                    params,
                };
            }
        }

        tracing::warn!(target = %target, "too many redirects; settling on login");
        let location = Location::new(LOGIN_PATH);
        self.set_current(location.clone());
        Navigation {
            requested: target.to_string(),
            decision: first_decision.unwrap_or(NavigationDecision::RedirectDefault {
                target: LOGIN_PATH.to_string(),
            }),
            location,
            title: None,
            params: BTreeMap::new(),
        }
    }

    /// Land after a successful login: the remembered return target if any,
    /// otherwise the identity's default route.
    pub fn after_login(&self) -> Navigation {
        let current = self.current_location();
        let target = current
            .redirect_target()
            .filter(|target| !target.is_empty() && Location::parse(target).path != LOGIN_PATH)
            .map(str::to_string)
            .unwrap_or_else(|| self.session.resolve_default_route().to_string());
        self.navigate(&target)
    }

    fn set_current(&self, location: Location) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = location;
    }
}

impl Navigator for Router {
    fn current_location(&self) -> Location {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace(&self, location: Location) {
        self.navigate(&location.full_path());
    }
}
