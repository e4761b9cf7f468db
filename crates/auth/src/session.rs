//! Client-held session and its store.

use std::collections::BTreeSet;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::roles::{Role, canonical_token, normalize_role};
use crate::routes::LOGIN_PATH;
use crate::storage::SessionStorage;

/// Login result handed to [`SessionStore::set_session`].
///
/// The backend reports raw authorities (`ROLE_MANAGER`); older payloads call
/// the same field `roles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "roles")]
    pub authorities: Vec<String>,
}

impl Credentials {
    pub fn new(
        token: impl Into<String>,
        username: impl Into<String>,
        authorities: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }
}

/// Authenticated identity (or the empty, unauthenticated session).
///
/// `roles` is always derived from `authorities`; there is no way to set it
/// independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    token: String,
    username: String,
    roles: BTreeSet<String>,
    authorities: Vec<String>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_credentials(credentials: Credentials) -> Self {
        let roles = derive_roles(&credentials.authorities);
        Self {
            token: credentials.token,
            username: credentials.username,
            roles,
            authorities: credentials.authorities,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Normalized role tokens.
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Raw authorities as received.
    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    /// Authorization check for a single role.
    ///
    /// - empty argument: no restriction
    /// - `ADMIN` holders pass every check
    /// - otherwise the normalized role (or its alias target) must be held
    pub fn has_role(&self, role: &str) -> bool {
        let normalized = normalize_role(role);
        if normalized.is_empty() {
            return true;
        }
        if self.roles.contains(Role::Admin.as_str()) {
            return true;
        }
        self.roles.contains(&normalized) || self.roles.contains(canonical_token(&normalized))
    }

    /// True if any of `roles` passes [`Session::has_role`]. An empty list is
    /// no restriction.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.is_empty() || roles.iter().any(|role| self.has_role(role.as_ref()))
    }

    /// Known roles held by this identity, in landing priority order.
    pub fn known_roles(&self) -> Vec<Role> {
        Role::PRIORITY
            .into_iter()
            .filter(|role| self.roles.contains(role.as_str()))
            .collect()
    }

    /// Landing path for this identity.
    pub fn resolve_default_route(&self) -> &'static str {
        if !self.is_authenticated() {
            return LOGIN_PATH;
        }
        self.known_roles()
            .first()
            .map(|role| role.home_path())
            .unwrap_or(LOGIN_PATH)
    }
}

/// Normalized role set; legacy aliases are stored under their canonical role.
fn derive_roles(authorities: &[String]) -> BTreeSet<String> {
    authorities
        .iter()
        .map(|authority| match Role::from_token(authority) {
            Some(role) => role.as_str().to_string(),
            None => normalize_role(authority),
        })
        .filter(|role| !role.is_empty())
        .collect()
}

/// On-disk shape. Every field is optional so partial blobs still restore.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSession {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    authorities: Option<Vec<String>>,
}

impl PersistedSession {
    fn from_session(session: &Session) -> Self {
        Self {
            token: Some(session.token.clone()),
            username: Some(session.username.clone()),
            roles: Some(session.roles.iter().cloned().collect()),
            authorities: Some(session.authorities.clone()),
        }
    }

    fn into_session(self) -> Session {
        // Blobs written before authorities were tracked only carry roles.
        let authorities = match (self.authorities, self.roles) {
            (Some(authorities), _) if !authorities.is_empty() => authorities,
            (_, Some(roles)) => roles,
            (authorities, None) => authorities.unwrap_or_default(),
        };
        Session::from_credentials(Credentials {
            token: self.token.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            authorities,
        })
    }
}

/// Owner of the process-wide session.
///
/// Constructed once at startup and shared (`Arc`) with the router and the
/// transport. Readers get cloned snapshots; mutations write through to
/// storage before returning.
pub struct SessionStore {
    state: RwLock<Session>,
    storage: Box<dyn SessionStorage>,
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Restore from storage. Absent or malformed blobs yield an empty session.
    pub fn restore(storage: impl SessionStorage + 'static) -> Self {
        let session = match storage.load() {
            Ok(Some(blob)) => match serde_json::from_str::<PersistedSession>(&blob) {
                Ok(persisted) => persisted.into_session(),
                Err(err) => {
                    tracing::warn!("[auth] failed to parse persisted session: {err}");
                    Session::empty()
                }
            },
            Ok(None) => Session::empty(),
            Err(err) => {
                tracing::warn!("[auth] failed to read persisted session: {err:#}");
                Session::empty()
            }
        };

        if session.is_authenticated() {
            tracing::info!(username = %session.username(), "restored session");
        }

        Self {
            state: RwLock::new(session),
            storage: Box::new(storage),
        }
    }

    /// Immutable copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Current bearer token, `None` when unauthenticated.
    pub fn token(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.is_authenticated().then(|| state.token.clone())
    }

    /// Replace the session wholesale and persist it.
    pub fn set_session(&self, credentials: Credentials) -> Session {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = Session::from_credentials(credentials);
        self.persist(&state);
        tracing::info!(username = %state.username(), roles = ?state.roles(), "session established");
        state.clone()
    }

    /// Wipe the session and remove the persisted copy.
    pub fn clear_session(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = Session::empty();
        self.persist(&state);
        tracing::info!("session cleared");
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().unwrap_or_else(|e| e.into_inner()).is_authenticated()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.state.read().unwrap_or_else(|e| e.into_inner()).has_role(role)
    }

    pub fn resolve_default_route(&self) -> &'static str {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .resolve_default_route()
    }

    /// Durable write; always the last step of a mutation. Failures are
    /// logged, never propagated.
    fn persist(&self, session: &Session) {
        let result = if session.is_authenticated() {
            serde_json::to_string(&PersistedSession::from_session(session))
                .map_err(anyhow::Error::from)
                .and_then(|blob| self.storage.save(&blob))
        } else {
            self.storage.remove()
        };

        if let Err(err) = result {
            tracing::warn!("[auth] failed to persist session: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySessionStorage;

    fn session_with(authorities: &[&str]) -> Session {
        Session::from_credentials(Credentials::new("token", "alice", authorities.iter().copied()))
    }

    #[test]
    fn token_decides_authentication() {
        assert!(!Session::empty().is_authenticated());
        assert!(session_with(&[]).is_authenticated());
        assert!(!Session::from_credentials(Credentials::new("", "bob", ["ROLE_ADMIN"])).is_authenticated());
    }

    #[test]
    fn roles_are_normalized_from_authorities() {
        let session = session_with(&["ROLE_MANAGER", "role_operator", ""]);
        assert_eq!(session.authorities(), ["ROLE_MANAGER", "role_operator", ""]);
        assert!(session.roles().contains("MANAGER"));
        assert!(session.roles().contains("OPERATOR"));
        assert_eq!(session.roles().len(), 2);
    }

    #[test]
    fn has_role_is_reflexive_for_every_known_role() {
        for role in Role::PRIORITY {
            let session = session_with(&[role.as_str()]);
            assert!(session.has_role(role.as_str()), "{role} should authorize itself");
        }
    }

    #[test]
    fn admin_passes_every_check() {
        let session = session_with(&["ROLE_ADMIN"]);
        for check in ["PURCHASER", "OPERATOR", "MANAGER", "BUYER", "WAREHOUSE_CLERK", "AUDITOR"] {
            assert!(session.has_role(check));
        }
    }

    #[test]
    fn empty_role_argument_is_no_restriction() {
        assert!(Session::empty().has_role(""));
        assert!(session_with(&["ROLE_PURCHASER"]).has_role("  "));
    }

    #[test]
    fn legacy_alias_checks_resolve_against_canonical_roles() {
        let purchaser = session_with(&["ROLE_PURCHASER"]);
        assert!(purchaser.has_role("BUYER"));
        assert!(!purchaser.has_role("WAREHOUSE_CLERK"));

        let operator = session_with(&["ROLE_OPERATOR"]);
        assert!(operator.has_role("WAREHOUSE_CLERK"));
        assert!(!operator.has_role("MANAGER"));
    }

    #[test]
    fn legacy_authorities_land_on_canonical_home() {
        let buyer = session_with(&["ROLE_BUYER"]);
        assert!(buyer.has_role("BUYER"));
        assert!(buyer.has_role("PURCHASER"));
        assert_eq!(buyer.known_roles(), [Role::Purchaser]);
        assert_eq!(buyer.resolve_default_route(), "/procurement/create");

        let clerk = session_with(&["WAREHOUSE_CLERK"]);
        assert!(clerk.roles().contains("OPERATOR"));
        assert_eq!(clerk.resolve_default_route(), "/warehouse/tasks");
    }

    #[test]
    fn default_route_follows_priority() {
        assert_eq!(Session::empty().resolve_default_route(), "/login");
        assert_eq!(session_with(&["MANAGER", "ADMIN"]).resolve_default_route(), "/admin/users");
        assert_eq!(
            session_with(&["ROLE_PURCHASER", "ROLE_MANAGER"]).resolve_default_route(),
            "/manager/pending-approvals"
        );
        assert_eq!(session_with(&["ROLE_OPERATOR"]).resolve_default_route(), "/warehouse/tasks");
        assert_eq!(session_with(&["ROLE_PURCHASER"]).resolve_default_route(), "/procurement/create");
        assert_eq!(session_with(&["ROLE_AUDITOR"]).resolve_default_route(), "/login");
    }

    #[test]
    fn session_survives_a_fresh_restore() {
        let storage = MemorySessionStorage::new();
        let store = SessionStore::restore(storage.clone());
        store.set_session(Credentials::new("t", "u", ["MANAGER"]));

        let restored = SessionStore::restore(storage);
        let session = restored.snapshot();
        assert_eq!(session.token(), "t");
        assert_eq!(session.username(), "u");
        assert!(session.roles().contains("MANAGER"));
        assert_eq!(session, store.snapshot());
    }

    #[test]
    fn clear_session_removes_persisted_copy() {
        let storage = MemorySessionStorage::new();
        let store = SessionStore::restore(storage.clone());
        store.set_session(Credentials::new("t", "u", ["ROLE_ADMIN"]));
        assert!(storage.blob().is_some());

        store.clear_session();
        assert!(storage.blob().is_none());
        assert_eq!(store.snapshot(), Session::empty());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn set_session_replaces_rather_than_merges() {
        let store = SessionStore::restore(MemorySessionStorage::new());
        store.set_session(Credentials::new("t1", "first", ["ROLE_ADMIN"]));
        store.set_session(Credentials::new("t2", "second", ["ROLE_PURCHASER"]));

        let session = store.snapshot();
        assert_eq!(session.username(), "second");
        assert!(!session.roles().contains("ADMIN"));
        assert!(!store.has_role("MANAGER"));
    }

    #[test]
    fn malformed_blob_restores_empty() {
        for blob in ["not json", "{\"token\": 42}", "[]", "{\"roles\": \"ADMIN\"}"] {
            let store = SessionStore::restore(MemorySessionStorage::with_blob(blob));
            assert_eq!(store.snapshot(), Session::empty(), "blob {blob:?}");
        }
    }

    #[test]
    fn restore_recomputes_roles_from_authorities() {
        let blob = r#"{"token":"t","username":"u","roles":["ADMIN"],"authorities":["ROLE_PURCHASER"]}"#;
        let store = SessionStore::restore(MemorySessionStorage::with_blob(blob));
        let session = store.snapshot();
        assert!(session.roles().contains("PURCHASER"));
        assert!(!session.roles().contains("ADMIN"));
    }

    #[test]
    fn restore_falls_back_to_roles_for_older_blobs() {
        let blob = r#"{"token":"t","username":"u","roles":["MANAGER"]}"#;
        let store = SessionStore::restore(MemorySessionStorage::with_blob(blob));
        assert!(store.has_role("MANAGER"));
    }

    #[test]
    fn credentials_accept_roles_alias() {
        let credentials: Credentials =
            serde_json::from_str(r#"{"token":"t","username":"u","roles":["ROLE_OPERATOR"]}"#).unwrap();
        assert_eq!(credentials.authorities, vec!["ROLE_OPERATOR".to_string()]);
    }
}
