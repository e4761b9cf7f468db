use serde::{Deserialize, Serialize};

/// Conventional authority prefix added by the backend (`ROLE_MANAGER`).
const AUTHORITY_PREFIX: &str = "ROLE_";

/// Known role classes, each with its own dashboard.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Purchaser,
    Operator,
    Manager,
    Admin,
}

impl Role {
    /// Landing priority: the first role held decides the default route.
    pub const PRIORITY: [Role; 4] = [Role::Admin, Role::Manager, Role::Operator, Role::Purchaser];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Purchaser => "PURCHASER",
            Role::Operator => "OPERATOR",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }

    /// Home path of the role's dashboard.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Purchaser => "/procurement/create",
            Role::Operator => "/warehouse/tasks",
            Role::Manager => "/manager/pending-approvals",
            Role::Admin => "/admin/users",
        }
    }

    /// Resolve a raw token (any case, optional `ROLE_` prefix, legacy alias).
    pub fn from_token(raw: &str) -> Option<Role> {
        match canonical_token(&normalize_role(raw)) {
            "PURCHASER" => Some(Role::Purchaser),
            "OPERATOR" => Some(Role::Operator),
            "MANAGER" => Some(Role::Manager),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a raw role string into a comparable token.
///
/// Trims, uppercases and strips every leading `ROLE_` marker. Idempotent.
pub fn normalize_role(raw: &str) -> String {
    let mut token = raw.trim().to_uppercase();
    while let Some(rest) = token.strip_prefix(AUTHORITY_PREFIX) {
        token = rest.trim().to_string();
    }
    token
}

/// Map a normalized token to the canonical token it stands for.
///
/// Legacy business names are aliases of the canonical roles; anything else
/// maps to itself.
pub fn canonical_token(normalized: &str) -> &str {
    match normalized {
        "BUYER" => "PURCHASER",
        "WAREHOUSE_CLERK" => "OPERATOR",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_prefix_and_uppercases() {
        assert_eq!(normalize_role("ROLE_MANAGER"), "MANAGER");
        assert_eq!(normalize_role("role_admin"), "ADMIN");
        assert_eq!(normalize_role("  purchaser "), "PURCHASER");
        assert_eq!(normalize_role(""), "");
    }

    #[test]
    fn aliases_resolve_to_canonical_roles() {
        assert_eq!(Role::from_token("BUYER"), Some(Role::Purchaser));
        assert_eq!(Role::from_token("ROLE_WAREHOUSE_CLERK"), Some(Role::Operator));
        assert_eq!(Role::from_token("auditor"), None);
    }

    #[test]
    fn priority_starts_with_admin() {
        assert_eq!(Role::PRIORITY[0], Role::Admin);
        assert_eq!(Role::PRIORITY[3], Role::Purchaser);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[A-Za-z_ ]{0,24}") {
            let once = normalize_role(&raw);
            prop_assert_eq!(normalize_role(&once), once.clone());
        }

        #[test]
        fn normalization_ignores_case_and_prefix(name in "[A-Z]{1,12}") {
            let prefixed = format!("role_{}", name.to_lowercase());
            prop_assert_eq!(normalize_role(&prefixed), name.clone());
        }
    }
}
