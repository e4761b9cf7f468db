//! Role-filtered navigation menu.

use serde::Serialize;

use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub path: &'static str,
    pub title: &'static str,
}

/// One dashboard section, shown only to identities passing `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub base: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    pub role: &'static str,
    pub children: Vec<MenuEntry>,
}

fn entry(path: &'static str, title: &'static str) -> MenuEntry {
    MenuEntry { path, title }
}

/// Every section of the client.
pub fn sections() -> Vec<MenuSection> {
    vec![
        MenuSection {
            base: "/procurement",
            title: "Purchaser workbench",
            icon: "ShoppingCart",
            role: "BUYER",
            children: vec![
                entry("/procurement/create", "Create procurement request"),
                entry("/procurement/list", "My requests"),
                entry("/procurement/inventory", "Inventory lookup"),
            ],
        },
        MenuSection {
            base: "/warehouse",
            title: "Warehouse operator",
            icon: "Box",
            role: "WAREHOUSE_CLERK",
            children: vec![
                entry("/warehouse/inbound", "Inbound request"),
                entry("/warehouse/outbound", "Outbound request"),
                entry("/warehouse/tasks", "Pending tasks"),
                entry("/warehouse/inventory", "Inventory lookup"),
            ],
        },
        MenuSection {
            base: "/manager",
            title: "Warehouse manager",
            icon: "Suitcase",
            role: "MANAGER",
            children: vec![
                entry("/manager/pending-approvals", "Pending approvals"),
                entry("/manager/approval", "Approval"),
                entry("/manager/analytics", "Reports dashboard"),
                entry("/manager/monitoring", "Inventory monitoring"),
            ],
        },
        MenuSection {
            base: "/admin",
            title: "System administrator",
            icon: "Management",
            role: "ADMIN",
            children: vec![
                entry("/admin/users", "User management"),
                entry("/admin/system", "System monitoring"),
                entry("/admin/logs", "Operation logs"),
                entry("/admin/downloads", "Log downloads"),
            ],
        },
    ]
}

/// Sections visible to `session`. Empty when unauthenticated.
pub fn visible_sections(session: &Session) -> Vec<MenuSection> {
    if !session.is_authenticated() {
        return Vec::new();
    }
    sections()
        .into_iter()
        .filter(|section| session.has_role(section.role))
        .collect()
}
