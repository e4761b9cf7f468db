//! `wms-auth`: client-side session, role policy and navigation guard.
//!
//! This crate is intentionally decoupled from HTTP. The transport only sees
//! the [`SessionStore`] and the [`Navigator`] seam.

pub mod guard;
pub mod menu;
pub mod roles;
pub mod router;
pub mod routes;
pub mod session;
pub mod storage;

pub use guard::{NavigationDecision, evaluate};
pub use menu::{MenuEntry, MenuSection, visible_sections};
pub use roles::{Role, canonical_token, normalize_role};
pub use router::{Location, Navigation, Navigator, Router};
pub use routes::{LOGIN_PATH, RouteDescriptor, RouteTable};
pub use session::{Credentials, Session, SessionStore};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
