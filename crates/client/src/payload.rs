//! Request drafts and the bodies built from them.
//!
//! Builders validate before anything is dispatched; a rejected draft never
//! reaches the backend.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

const MIN_PASSWORD_LEN: usize = 8;
const DEFAULT_INVENTORY_REASON: &str = "Created from the warehouse client";
const DEFAULT_LOG_PAGE_SIZE: u32 = 20;
const DEFAULT_USER_PAGE_SIZE: u32 = 20;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// -------------------------
// Procurement
// -------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
    pub expected_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDraft {
    pub remark: Option<String>,
    #[serde(default)]
    pub items: Vec<PurchaseLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItemBody {
    pub product_id: i64,
    pub quantity: i64,
    pub expected_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequestBody {
    pub title: String,
    pub total_amount: f64,
    pub items: Vec<PurchaseItemBody>,
}

/// Keep lines with a product and a positive quantity; reject a draft with
/// none. `now_millis` names untitled requests.
pub fn build_purchase_request(draft: &PurchaseDraft, now_millis: i64) -> ClientResult<PurchaseRequestBody> {
    let items: Vec<PurchaseItemBody> = draft
        .items
        .iter()
        .filter_map(|line| {
            let product_id = line.product_id.filter(|id| *id > 0)?;
            let quantity = line.quantity.filter(|q| *q > 0)?;
            Some(PurchaseItemBody {
                product_id,
                quantity,
                expected_price: line.expected_price.unwrap_or(0.0),
            })
        })
        .collect();

    if items.is_empty() {
        return Err(ClientError::validation(
            "a procurement request needs at least one line with a product and quantity",
        ));
    }

    let total_amount = items.iter().map(|item| item.expected_price * item.quantity as f64).sum();
    let title = non_blank(draft.remark.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Procurement request {now_millis}"));

    Ok(PurchaseRequestBody {
        title,
        total_amount,
        items,
    })
}

// -------------------------
// Inbound / outbound
// -------------------------

/// Direction of a stock movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl Direction {
    pub fn collection_path(&self) -> &'static str {
        match self {
            Direction::In => "/inventory/in-applications",
            Direction::Out => "/inventory/out-applications",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "inbound",
            Direction::Out => "outbound",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLine {
    pub product_id: Option<i64>,
    /// Used for the product id when `product_id` is absent (`SKU-1001` → 1001).
    pub sku: Option<String>,
    pub quantity: Option<i64>,
    pub location_id: Option<i64>,
}

impl InventoryLine {
    fn resolved_product_id(&self) -> Option<i64> {
        self.product_id.or_else(|| {
            let digits: String = self.sku.as_deref()?.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDraft {
    pub reference: Option<String>,
    #[serde(default)]
    pub lines: Vec<InventoryLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemBody {
    pub product_id: i64,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRequestBody {
    #[serde(rename = "type")]
    pub direction: Direction,
    pub reason: String,
    pub items: Vec<InventoryItemBody>,
}

pub fn build_inventory_request(draft: &InventoryDraft, direction: Direction) -> ClientResult<InventoryRequestBody> {
    let items: Vec<InventoryItemBody> = draft
        .lines
        .iter()
        .filter_map(|line| {
            let product_id = line.resolved_product_id().filter(|id| *id > 0)?;
            let quantity = line.quantity.filter(|q| *q > 0)?;
            Some(InventoryItemBody {
                product_id,
                quantity,
                location_id: line.location_id.filter(|id| *id > 0),
            })
        })
        .collect();

    if items.is_empty() {
        return Err(ClientError::validation(format!(
            "an {} request needs at least one line with a product and quantity",
            direction.as_str()
        )));
    }

    Ok(InventoryRequestBody {
        direction,
        reason: non_blank(draft.reference.as_deref())
            .unwrap_or(DEFAULT_INVENTORY_REASON)
            .to_string(),
        items,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLine {
    pub product_id: i64,
    pub actual_quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionBody {
    pub items: Vec<ExecutionLine>,
}

/// Actual quantities for executing an approved application.
pub fn build_execution(lines: Vec<ExecutionLine>) -> ClientResult<ExecutionBody> {
    if lines.is_empty() {
        return Err(ClientError::validation("execution needs at least one line"));
    }
    if let Some(line) = lines.iter().find(|line| line.product_id <= 0 || line.actual_quantity < 0) {
        return Err(ClientError::validation(format!(
            "invalid execution line for product {}",
            line.product_id
        )));
    }
    Ok(ExecutionBody { items: lines })
}

// -------------------------
// Approvals
// -------------------------

/// A manager's decision on one approval item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub comment: String,
}

impl ApprovalDecision {
    pub fn approve(remark: Option<String>) -> Self {
        Self {
            approved: true,
            comment: remark.unwrap_or_default(),
        }
    }

    pub fn reject(remark: Option<String>) -> Self {
        Self {
            approved: false,
            comment: remark.unwrap_or_default(),
        }
    }

    /// Anything other than `APPROVED` is a rejection.
    pub fn from_status(status: &str, remark: Option<String>) -> Self {
        if status.trim().eq_ignore_ascii_case("APPROVED") {
            Self::approve(remark)
        } else {
            Self::reject(remark)
        }
    }
}

// -------------------------
// Locations
// -------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDraft {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Only sent on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl LocationDraft {
    pub fn validate(&self) -> ClientResult<()> {
        if self.code.trim().is_empty() {
            return Err(ClientError::validation("location code is required"));
        }
        if self.name.trim().is_empty() {
            return Err(ClientError::validation("location name is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationStatusBody {
    pub active: bool,
}

// -------------------------
// Users
// -------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserDraft {
    /// Present when editing an existing user.
    pub id: Option<i64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub real_name: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    pub username: String,
    pub password: String,
    pub real_name: Option<String>,
    pub department: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    pub real_name: Option<String>,
    pub department: Option<String>,
}

/// Create or update, decided by the presence of an id.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminUserRequest {
    Create(CreateUserBody),
    Update { id: i64, body: UpdateUserBody },
}

fn validate_password(password: Option<&str>, what: &str) -> ClientResult<String> {
    match password {
        Some(password) if password.chars().count() >= MIN_PASSWORD_LEN => Ok(password.to_string()),
        _ => Err(ClientError::validation(format!(
            "{what} must be at least {MIN_PASSWORD_LEN} characters"
        ))),
    }
}

fn validate_roles(roles: &[String]) -> ClientResult<Vec<String>> {
    let roles: Vec<String> = roles
        .iter()
        .map(|role| role.trim().to_string())
        .filter(|role| !role.is_empty())
        .collect();
    if roles.is_empty() {
        return Err(ClientError::validation("select at least one role"));
    }
    Ok(roles)
}

pub fn build_admin_user(draft: &AdminUserDraft) -> ClientResult<AdminUserRequest> {
    if let Some(id) = draft.id {
        return Ok(AdminUserRequest::Update {
            id,
            body: UpdateUserBody {
                real_name: draft.real_name.clone(),
                department: draft.department.clone(),
            },
        });
    }

    let username = non_blank(draft.username.as_deref())
        .ok_or_else(|| ClientError::validation("username is required"))?
        .to_string();
    let password = validate_password(draft.password.as_deref(), "initial password")?;
    let roles = validate_roles(&draft.roles)?;

    Ok(AdminUserRequest::Create(CreateUserBody {
        username,
        password,
        real_name: draft.real_name.clone(),
        department: draft.department.clone(),
        roles,
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetBody {
    pub new_password: String,
}

pub fn build_password_reset(new_password: &str) -> ClientResult<PasswordResetBody> {
    Ok(PasswordResetBody {
        new_password: validate_password(Some(new_password), "new password")?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignmentBody {
    pub role_codes: Vec<String>,
}

pub fn build_role_assignment(roles: &[String]) -> ClientResult<RoleAssignmentBody> {
    Ok(RoleAssignmentBody {
        role_codes: validate_roles(roles)?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatusBody {
    pub status: String,
}

// -------------------------
// Queries
// -------------------------

/// Operation log filter. `page` is one-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub username: Option<String>,
    pub module: Option<String>,
    pub action: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl LogQuery {
    /// Zero-based page index sent to the backend.
    pub fn page_index(&self) -> u32 {
        self.page.unwrap_or(1).saturating_sub(1)
    }

    pub fn page_size(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_LOG_PAGE_SIZE)
    }

    /// Filter parameters shared by listing and export.
    pub fn filters(&self) -> Vec<(&'static str, String)> {
        [
            ("username", &self.username),
            ("module", &self.module),
            ("action", &self.action),
            ("startTime", &self.start_time),
            ("endTime", &self.end_time),
        ]
        .into_iter()
        .filter_map(|(key, value)| non_blank(value.as_deref()).map(|v| (key, v.to_string())))
        .collect()
    }
}

/// Admin user filter. `page` is one-based; status `ALL` means no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl UserQuery {
    pub fn page_index(&self) -> u32 {
        self.page.unwrap_or(1).saturating_sub(1)
    }

    pub fn per_page(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_USER_PAGE_SIZE)
    }

    pub fn filters(&self) -> Vec<(&'static str, String)> {
        let mut filters = Vec::new();
        if let Some(keyword) = non_blank(self.keyword.as_deref()) {
            filters.push(("username", keyword.to_string()));
        }
        if let Some(status) = non_blank(self.status.as_deref()).filter(|s| *s != "ALL") {
            filters.push(("status", status.to_string()));
        }
        if let Some(role) = non_blank(self.role.as_deref()) {
            filters.push(("role", role.to_string()));
        }
        filters
    }
}
