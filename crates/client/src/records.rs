//! Raw backend records.
//!
//! Every field is optional and numeric fields accept numbers or numeric
//! strings. Normalizers in [`crate::normalize`] decide what an absent field
//! means; nothing here does.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a JSON array element by element, skipping malformed elements.
/// Anything that is not an array yields an empty list.
pub fn ensure_array<T: DeserializeOwned>(value: Value, label: &str) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(source = label, index, error = %err, "skipping malformed record");
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(source = label, kind = value_kind(&other), "expected a list");
            Vec::new()
        }
    }
}

/// Decode a single object; `null` or a malformed object yields `None`.
pub fn decode_record<T: DeserializeOwned>(value: Value, label: &str) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(source = label, error = %err, "skipping malformed record");
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Field deserializers that never reject a record over a field's shape.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Identifier kept as opaque text.
    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }

    /// Text, or `None` for non-textual shapes (e.g. timestamps sent as arrays).
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Bool(b)) => Some(b),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
            _ => None,
        })
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
        Ok(super::ensure_array(value, "nested list"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRef {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub updated_at: Option<String>,
}

/// One stock row, location flattened or nested.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    #[serde(default, deserialize_with = "lenient::int")]
    pub product_id: Option<i64>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub current_stock: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub safety_stock: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub locked_stock: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub location_id: Option<i64>,
    pub location_code: Option<String>,
    pub location_name: Option<String>,
    #[serde(default)]
    pub location: Option<LocationRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementItemRecord {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub expected_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub total_amount: Option<f64>,
    pub status: Option<String>,
    pub applicant: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub items: Vec<ProcurementItemRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemRecord {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub actual_quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub location_id: Option<i64>,
    pub location_code: Option<String>,
    pub location_name: Option<String>,
}

/// Inbound or outbound application; `type` is `"IN"` or `"OUT"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryApplicationRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub applicant: Option<String>,
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub items: Vec<InventoryItemRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLogRecord {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    pub operator: Option<String>,
    pub module: Option<String>,
    pub action: Option<String>,
    pub details: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogArchiveRecord {
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub record_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_record_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRecord {
    #[serde(default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    pub username: Option<String>,
    pub real_name: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub roles: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Paged listing. Page fields are read under either naming scheme.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: DeserializeOwned"))]
pub struct PageRecord<T> {
    #[serde(default, deserialize_with = "lenient::list")]
    pub content: Vec<T>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub total_elements: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub page_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub page_size: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub size: Option<i64>,
}

impl<T> Default for PageRecord<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            total_elements: None,
            page_number: None,
            page: None,
            page_size: None,
            size: None,
        }
    }
}

impl<T> PageRecord<T> {
    /// Zero-based page index, under either naming scheme.
    pub fn index(&self) -> Option<i64> {
        self.page_number.or(self.page)
    }

    pub fn per_page(&self) -> Option<i64> {
        self.page_size.or(self.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStatsRecord {
    #[serde(default, deserialize_with = "lenient::int")]
    pub procurement_approvals: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub inventory_in_approvals: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub inventory_out_approvals: Option<i64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub approval_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub average_approval_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummaryRecord {
    #[serde(default, deserialize_with = "lenient::float")]
    pub total_inventory_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub average_turnover_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub low_stock_warnings: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub obsolete_items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPointRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub in_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub out_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub approval_count: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationTrendsRecord {
    #[serde(default, deserialize_with = "lenient::list")]
    pub points: Vec<TrendPointRecord>,
}

/// Body of a successful `POST /auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub token: Option<String>,
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub roles: Vec<String>,
}
