//! Entity normalizers: total, side-effect-free `record -> view model`
//! functions.
//!
//! Absent fields get deterministic defaults derived from the record's id, so
//! a view never has to render an empty cell.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use wms_core::{ApprovalKind, ApprovalRef};

use crate::records::{
    AdminUserRecord, ApprovalStatsRecord, InventoryApplicationRecord, InventoryItemRecord, InventorySummaryRecord,
    LocationRecord, LogArchiveRecord, OperationLogRecord, ProcurementItemRecord, ProcurementRecord, ProductRecord,
    RoleRecord, StockRecord, TrendPointRecord,
};

/// Label used when a location has neither code nor name.
pub const DEFAULT_LOCATION_LABEL: &str = "Main warehouse";
pub const DEFAULT_UNIT: &str = "pcs";
const LABEL_DELIMITER: &str = " · ";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const PLACEHOLDER: &str = "-";

/// Render a backend timestamp as `YYYY-MM-DD HH:MM:SS`.
///
/// Absent or empty input renders as `""`; input that cannot be parsed is
/// returned unchanged. Never fails.
pub fn format_date_time(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return String::new();
    };
    match parse_timestamp(raw.trim()) {
        Some(parsed) => parsed.format(DISPLAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }
    const FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Join the non-empty parts with the label delimiter.
pub fn label(parts: &[Option<&str>]) -> Option<String> {
    let parts: Vec<&str> = parts
        .iter()
        .flatten()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(LABEL_DELIMITER))
}

/// `code · name`, or [`DEFAULT_LOCATION_LABEL`] when both are absent.
pub fn location_label(code: Option<&str>, name: Option<&str>) -> String {
    label(&[code, name]).unwrap_or_else(|| DEFAULT_LOCATION_LABEL.to_string())
}

fn id_text(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string())
}

fn product_name(id: Option<i64>) -> String {
    format!("Product {}", id_text(id))
}

fn product_sku(id: Option<i64>) -> String {
    format!("SKU-{}", id_text(id))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn text_or(value: Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
    pub sku: String,
    pub unit: String,
    pub price: f64,
}

pub fn to_product(record: ProductRecord) -> Product {
    Product {
        id: record.id,
        name: non_blank(record.name).unwrap_or_else(|| product_name(record.id)),
        sku: non_blank(record.sku).unwrap_or_else(|| product_sku(record.id)),
        unit: text_or(record.unit, DEFAULT_UNIT),
        price: record.price.unwrap_or(0.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseLocation {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub display_label: String,
}

pub fn to_location(record: LocationRecord) -> WarehouseLocation {
    WarehouseLocation {
        display_label: location_label(record.code.as_deref(), record.name.as_deref()),
        id: record.id,
        active: record.active.or(record.is_active).unwrap_or(true),
        created_at: format_date_time(record.created_at.as_deref()),
        updated_at: format_date_time(record.updated_at.as_deref()),
        code: record.code,
        name: record.name,
        description: record.description,
    }
}

/// One stock row with its location flattened into a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub product_id: Option<i64>,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub warehouse: String,
    pub location_id: Option<i64>,
    pub location_code: Option<String>,
    pub location_name: Option<String>,
    pub location_label: String,
    pub quantity: Option<i64>,
    pub safety_stock: Option<i64>,
    pub locked_stock: Option<i64>,
}

pub fn to_inventory_row(record: StockRecord) -> InventoryRow {
    let nested = record.location.unwrap_or_default();
    let location_id = record.location_id.or(nested.id);
    let location_code = record.location_code.or(nested.code);
    let location_name = record.location_name.or(nested.name);
    let location_label = location_label(location_code.as_deref(), location_name.as_deref());

    InventoryRow {
        product_id: record.product_id,
        sku: non_blank(record.sku).unwrap_or_else(|| product_sku(record.product_id)),
        name: non_blank(record.name).unwrap_or_else(|| product_name(record.product_id)),
        unit: text_or(record.unit, DEFAULT_UNIT),
        warehouse: location_label.clone(),
        location_id,
        location_code,
        location_name,
        location_label,
        quantity: record.current_stock,
        safety_stock: record.safety_stock,
        locked_stock: record.locked_stock,
    }
}

/// Case-insensitive sku/name match; an empty keyword matches everything.
pub fn matches_keyword(row: &InventoryRow, keyword: Option<&str>) -> bool {
    let keyword = keyword.map(|k| k.trim().to_lowercase()).unwrap_or_default();
    keyword.is_empty() || row.sku.to_lowercase().contains(&keyword) || row.name.to_lowercase().contains(&keyword)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementItem {
    pub id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
    pub expected_price: Option<f64>,
    pub name: String,
    pub sku: String,
}

pub fn to_procurement_item(record: ProcurementItemRecord) -> ProcurementItem {
    ProcurementItem {
        id: record.id,
        product_id: record.product_id,
        quantity: record.quantity,
        expected_price: record.expected_price,
        name: product_name(record.product_id),
        sku: product_sku(record.product_id),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementApplication {
    /// Composite id, `PROCUREMENT:<raw id>`.
    pub id: ApprovalRef,
    pub raw_id: String,
    pub display_id: String,
    pub title: Option<String>,
    pub total_amount: Option<f64>,
    pub applicant: Option<String>,
    pub status: Option<String>,
    pub submitted_at: String,
    pub items: Vec<ProcurementItem>,
}

pub fn to_procurement_application(record: ProcurementRecord) -> ProcurementApplication {
    let raw_id = record.id.unwrap_or_default();
    ProcurementApplication {
        id: ApprovalRef::Procurement(raw_id.clone()),
        display_id: ApprovalKind::Procurement.display_id(&raw_id),
        raw_id,
        title: record.title,
        total_amount: record.total_amount,
        applicant: record.applicant,
        status: record.status,
        submitted_at: format_date_time(record.created_at.as_deref()),
        items: record.items.into_iter().map(to_procurement_item).collect(),
    }
}

/// Kind of an inbound/outbound record: its own `type` when recognised,
/// otherwise the kind of the collection it was read from.
pub fn inventory_kind(raw_type: Option<&str>, source: ApprovalKind) -> ApprovalKind {
    match raw_type.map(str::trim) {
        Some("IN") | Some("INBOUND") => ApprovalKind::Inbound,
        Some("OUT") | Some("OUTBOUND") => ApprovalKind::Outbound,
        _ => source,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Option<i64>,
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
    pub actual_quantity: Option<i64>,
    pub location_id: Option<i64>,
    pub location_code: Option<String>,
    pub location_name: Option<String>,
    pub location_label: String,
}

fn to_inventory_item(record: InventoryItemRecord) -> InventoryItem {
    InventoryItem {
        location_label: location_label(record.location_code.as_deref(), record.location_name.as_deref()),
        id: record.id,
        product_id: record.product_id,
        quantity: record.quantity,
        actual_quantity: record.actual_quantity,
        location_id: record.location_id,
        location_code: record.location_code,
        location_name: record.location_name,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryApplication {
    pub id: ApprovalRef,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub type_label: &'static str,
    pub display_id: String,
    pub status: Option<String>,
    pub applicant: Option<String>,
    pub submitted_at: String,
    pub reason: Option<String>,
    pub items: Vec<InventoryItem>,
}

pub fn to_inventory_application(record: InventoryApplicationRecord, source: ApprovalKind) -> InventoryApplication {
    let kind = inventory_kind(record.kind.as_deref(), source);
    let raw_id = record.id.unwrap_or_default();
    InventoryApplication {
        id: ApprovalRef::new(kind, raw_id.clone()),
        display_id: kind.display_id(&raw_id),
        raw_id,
        kind,
        type_label: kind.type_label(),
        status: record.status,
        applicant: record.applicant,
        submitted_at: format_date_time(record.created_at.as_deref()),
        reason: record.reason,
        items: record.items.into_iter().map(to_inventory_item).collect(),
    }
}

/// Row of the warehouse operator's task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseTask {
    pub id: ApprovalRef,
    pub display_id: String,
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub type_label: &'static str,
    pub status: Option<String>,
    pub applicant: Option<String>,
    pub created_at: String,
}

pub fn to_warehouse_task(application: InventoryApplication) -> WarehouseTask {
    WarehouseTask {
        id: application.id,
        display_id: application.display_id,
        kind: application.kind,
        type_label: application.type_label,
        status: application.status,
        applicant: application.applicant,
        created_at: application.submitted_at,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLog {
    pub id: Option<i64>,
    pub operator: String,
    pub module: Option<String>,
    pub action: Option<String>,
    pub details: Option<String>,
    pub created_at: Option<String>,
    pub created_at_text: String,
}

pub fn to_operation_log(record: OperationLogRecord) -> OperationLog {
    OperationLog {
        id: record.id,
        operator: text_or(record.operator, PLACEHOLDER),
        module: record.module,
        action: record.action,
        details: record.details,
        created_at_text: format_date_time(record.created_at.as_deref()),
        created_at: record.created_at,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLogPage {
    pub records: Vec<OperationLog>,
    pub total: i64,
    /// One-based.
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogArchive {
    pub file_name: Option<String>,
    pub date: Option<String>,
    pub record_count: i64,
    pub last_record_at: Option<String>,
    pub generated_at_text: String,
}

pub fn to_log_archive(record: LogArchiveRecord) -> LogArchive {
    LogArchive {
        file_name: record.file_name,
        date: record.date,
        record_count: record.record_count.unwrap_or(0),
        generated_at_text: format_date_time(record.last_record_at.as_deref()),
        last_record_at: record.last_record_at,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub real_name: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub roles: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub fn to_admin_user(record: AdminUserRecord) -> AdminUser {
    AdminUser {
        id: record.id,
        username: record.username,
        real_name: record.real_name,
        department: record.department,
        status: record.status,
        roles: record.roles,
        created_at: format_date_time(record.created_at.as_deref()),
        updated_at: format_date_time(record.updated_at.as_deref()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserPage {
    pub items: Vec<AdminUser>,
    pub total: i64,
    /// One-based.
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleOption {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

pub fn to_role_option(record: RoleRecord) -> RoleOption {
    RoleOption {
        name: record.name.or_else(|| record.code.clone()),
        code: record.code,
        description: record.description,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Pending inbound approvals.
    pub inbound: i64,
    /// Pending outbound approvals.
    pub outbound: i64,
    pub inventory_value: f64,
    /// Average approval time in hours, one decimal.
    pub turnover_days: f64,
}

pub fn to_dashboard_stats(
    summary: Option<InventorySummaryRecord>,
    approvals: Option<ApprovalStatsRecord>,
) -> DashboardStats {
    let summary = summary.unwrap_or_default();
    let approvals = approvals.unwrap_or_default();
    DashboardStats {
        inbound: approvals.inventory_in_approvals.unwrap_or(0),
        outbound: approvals.inventory_out_approvals.unwrap_or(0),
        inventory_value: summary.total_inventory_value.unwrap_or(0.0),
        turnover_days: round_tenths(approvals.average_approval_hours.unwrap_or(0.0)),
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: Option<String>,
    pub inbound: i64,
    pub outbound: i64,
    pub approvals: i64,
}

pub fn to_trend_point(record: TrendPointRecord) -> TrendPoint {
    TrendPoint {
        date: record.date,
        inbound: record.in_count.unwrap_or(0),
        outbound: record.out_count.unwrap_or(0),
        approvals: record.approval_count.unwrap_or(0),
    }
}

/// A downloaded file and the name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::LocationRef;

    #[test]
    fn timestamps_render_uniformly() {
        assert_eq!(format_date_time(Some("2025-11-27T18:00")), "2025-11-27 18:00:00");
        assert_eq!(format_date_time(Some("2025-11-27T09:05:30.123")), "2025-11-27 09:05:30");
        assert_eq!(format_date_time(Some("2025-11-27T09:05:30+08:00")), "2025-11-27 09:05:30");
        assert_eq!(format_date_time(Some("2025-11-27")), "2025-11-27 00:00:00");
    }

    #[test]
    fn unparseable_timestamp_is_returned_unchanged() {
        assert_eq!(format_date_time(Some("yesterday")), "yesterday");
        assert_eq!(format_date_time(None), "");
        assert_eq!(format_date_time(Some("")), "");
    }

    #[test]
    fn location_without_code_or_name_gets_sentinel_label() {
        let location = to_location(LocationRecord::default());
        assert_eq!(location.display_label, DEFAULT_LOCATION_LABEL);
        assert!(location.active);
        assert_eq!(location.created_at, "");
    }

    #[test]
    fn location_label_skips_missing_parts() {
        assert_eq!(location_label(Some("A-01"), Some("Rack A")), "A-01 · Rack A");
        assert_eq!(location_label(None, Some("Rack A")), "Rack A");
        assert_eq!(location_label(Some(""), Some("  ")), DEFAULT_LOCATION_LABEL);
    }

    #[test]
    fn inactive_flag_is_read_under_either_name() {
        let record = LocationRecord {
            is_active: Some(false),
            ..LocationRecord::default()
        };
        assert!(!to_location(record).active);
    }

    #[test]
    fn product_defaults_derive_from_id() {
        let product = to_product(ProductRecord {
            id: Some(7),
            ..ProductRecord::default()
        });
        assert_eq!(product.name, "Product 7");
        assert_eq!(product.sku, "SKU-7");
        assert_eq!(product.unit, DEFAULT_UNIT);
        assert_eq!(product.price, 0.0);
    }

    #[test]
    fn stock_row_reads_nested_location() {
        let row = to_inventory_row(StockRecord {
            product_id: Some(3),
            current_stock: Some(40),
            location: Some(LocationRef {
                id: Some(2),
                code: Some("B-02".into()),
                name: None,
            }),
            ..StockRecord::default()
        });
        assert_eq!(row.location_id, Some(2));
        assert_eq!(row.location_label, "B-02");
        assert_eq!(row.warehouse, "B-02");
        assert_eq!(row.name, "Product 3");
        assert_eq!(row.quantity, Some(40));
    }

    #[test]
    fn keyword_matches_sku_or_name_case_insensitively() {
        let row = to_inventory_row(StockRecord {
            sku: Some("SKU-1001".into()),
            name: Some("Bearing A1".into()),
            ..StockRecord::default()
        });
        assert!(matches_keyword(&row, Some(" bearing ")));
        assert!(matches_keyword(&row, Some("sku-10")));
        assert!(matches_keyword(&row, None));
        assert!(!matches_keyword(&row, Some("glove")));
    }

    #[test]
    fn procurement_application_gets_composite_and_display_ids() {
        let app = to_procurement_application(ProcurementRecord {
            id: Some("42".into()),
            created_at: Some("2025-11-27T16:00".into()),
            items: vec![ProcurementItemRecord {
                product_id: Some(5),
                quantity: Some(3),
                ..ProcurementItemRecord::default()
            }],
            ..ProcurementRecord::default()
        });
        assert_eq!(app.id.encode(), "PROCUREMENT:42");
        assert_eq!(app.display_id, "PO-000042");
        assert_eq!(app.submitted_at, "2025-11-27 16:00:00");
        assert_eq!(app.items[0].name, "Product 5");
    }

    #[test]
    fn inventory_kind_prefers_record_type() {
        assert_eq!(inventory_kind(Some("IN"), ApprovalKind::Outbound), ApprovalKind::Inbound);
        assert_eq!(inventory_kind(Some("OUT"), ApprovalKind::Inbound), ApprovalKind::Outbound);
        assert_eq!(inventory_kind(None, ApprovalKind::Inbound), ApprovalKind::Inbound);
    }

    #[test]
    fn warehouse_task_uses_kind_prefix() {
        let app = to_inventory_application(
            InventoryApplicationRecord {
                id: Some("8".into()),
                kind: Some("OUT".into()),
                ..InventoryApplicationRecord::default()
            },
            ApprovalKind::Outbound,
        );
        let task = to_warehouse_task(app);
        assert_eq!(task.display_id, "OUT-000008");
        assert_eq!(task.type_label, "Outbound request");
    }

    #[test]
    fn dashboard_rounds_average_hours() {
        let stats = to_dashboard_stats(
            None,
            Some(ApprovalStatsRecord {
                inventory_in_approvals: Some(4),
                average_approval_hours: Some(5.26),
                ..ApprovalStatsRecord::default()
            }),
        );
        assert_eq!(stats.inbound, 4);
        assert_eq!(stats.outbound, 0);
        assert_eq!(stats.turnover_days, 5.3);
        assert_eq!(stats.inventory_value, 0.0);
    }

    #[test]
    fn blank_product_text_gets_id_defaults() {
        let product = to_product(ProductRecord {
            id: Some(9),
            name: Some("  ".into()),
            sku: Some(String::new()),
            unit: Some(" ".into()),
            ..ProductRecord::default()
        });
        assert_eq!(product.name, "Product 9");
        assert_eq!(product.sku, "SKU-9");
        assert_eq!(product.unit, "pcs");

        let row = to_inventory_row(StockRecord {
            product_id: Some(4),
            name: Some(String::new()),
            ..StockRecord::default()
        });
        assert_eq!(row.name, "Product 4");
        assert_eq!(row.sku, "SKU-4");
    }

    #[test]
    fn operation_log_operator_defaults_to_placeholder() {
        let log = to_operation_log(OperationLogRecord {
            operator: Some(String::new()),
            ..OperationLogRecord::default()
        });
        assert_eq!(log.operator, "-");
    }

    #[test]
    fn role_name_defaults_to_code() {
        let role = to_role_option(RoleRecord {
            code: Some("MANAGER".into()),
            ..RoleRecord::default()
        });
        assert_eq!(role.name.as_deref(), Some("MANAGER"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn formatted_timestamps_are_fixed_width(
                secs in 0i64..4_102_444_800,
                sep in prop::sample::select(vec!["T", " "]),
            ) {
                let raw = chrono::DateTime::from_timestamp(secs, 0)
                    .unwrap()
                    .naive_utc()
                    .format(&format!("%Y-%m-%d{sep}%H:%M:%S"))
                    .to_string();
                let formatted = format_date_time(Some(&raw));
                prop_assert_eq!(formatted.len(), 19);
                prop_assert_eq!(format_date_time(Some(&formatted)), formatted.clone());
            }

            #[test]
            fn unparseable_input_passes_through(raw in "[a-z]{1,12}") {
                prop_assert_eq!(format_date_time(Some(&raw)), raw);
            }
        }
    }
}
