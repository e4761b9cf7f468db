//! Typed client over the warehouse backend.
//!
//! Every operation returns normalized view models. With `use_mock` set, reads
//! are served from [`MockData`] and writes are acknowledged without touching
//! the backend.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use percent_encoding::percent_decode_str;

use wms_auth::{Credentials, Navigator, Session, SessionStore};
use wms_core::{ApprovalKind, ApprovalRef, decode, decode_opt};

use crate::approvals::{self, ApprovalDetail, ApprovalItem, ApprovalSource};
use crate::backend::{ApiRequest, HttpBackend};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::mock::MockData;
use crate::normalize::{
    AdminUserPage, DashboardStats, DownloadedFile, InventoryRow, LogArchive, OperationLog, OperationLogPage, Product,
    ProcurementApplication, RoleOption, TrendPoint, WarehouseLocation, WarehouseTask, matches_keyword,
    to_admin_user, to_dashboard_stats, to_inventory_application, to_inventory_row, to_location, to_log_archive,
    to_operation_log, to_procurement_application, to_product, to_role_option, to_trend_point, to_warehouse_task,
};
use crate::payload::{
    AdminUserDraft, AdminUserRequest, ApprovalDecision, Direction, ExecutionLine, InventoryDraft, LocationDraft,
    LocationStatusBody, LogQuery, PurchaseDraft, UserQuery, UserStatusBody, build_admin_user, build_execution,
    build_inventory_request, build_password_reset, build_purchase_request, build_role_assignment,
};
use crate::records::{
    AdminUserRecord, ApprovalStatsRecord, InventoryApplicationRecord, InventorySummaryRecord, LocationRecord,
    LogArchiveRecord, LoginRecord, OperationLogRecord, OperationTrendsRecord, PageRecord, ProcurementRecord,
    ProductRecord, RoleRecord, StockRecord, decode_record, ensure_array,
};
use crate::transport::{Transport, call, degrade, fallback};

const TREND_DAYS: u32 = 30;
const DEFAULT_ARCHIVE_LIMIT: u32 = 30;
const DEFAULT_PREVIEW_SIZE: u32 = 50;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn acknowledged() -> Value {
    json!({ "success": true })
}

/// File name from a `Content-Disposition` header.
///
/// `filename*=UTF-8''…` wins over a plain `filename=`.
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    let lower = header.to_ascii_lowercase();

    const EXTENDED: &str = "filename*=utf-8''";
    if let Some(start) = lower.find(EXTENDED) {
        let raw = header[start + EXTENDED.len()..].split(';').next().unwrap_or_default().trim();
        if !raw.is_empty() {
            let decoded = percent_decode_str(raw).decode_utf8().ok();
            if let Some(name) = decoded.filter(|name| !name.is_empty()) {
                return Some(name.into_owned());
            }
        }
    }

    let mut search = 0;
    while let Some(offset) = lower[search..].find("filename=") {
        let start = search + offset + "filename=".len();
        let raw = header[start..].split(';').next().unwrap_or_default().trim().trim_matches('"');
        if !raw.is_empty() {
            return Some(raw.to_string());
        }
        search = start;
    }
    None
}

/// Client for every backend operation the warehouse UI uses.
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Transport,
    use_mock: bool,
    mock: MockData,
}

impl ApiClient {
    pub fn new(transport: Transport, use_mock: bool) -> Self {
        Self {
            transport,
            use_mock,
            mock: MockData,
        }
    }

    /// Wire an HTTP-backed client from configuration.
    pub fn from_config(
        config: &ClientConfig,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let backend = Arc::new(HttpBackend::new(config)?);
        Ok(Self::new(Transport::new(backend, session, navigator), config.use_mock))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.transport.session()
    }

    pub fn uses_mock(&self) -> bool {
        self.use_mock
    }

    async fn fetch_list<T: DeserializeOwned>(&self, request: ApiRequest, label: &str) -> ClientResult<Vec<T>> {
        let value = self.transport.fetch(request).await?;
        Ok(ensure_array(value, label))
    }

    async fn fetch_one<T: DeserializeOwned>(&self, request: ApiRequest, label: &str) -> ClientResult<Option<T>> {
        let value = self.transport.fetch(request).await?;
        Ok(decode_record(value, label))
    }

    async fn download(&self, request: ApiRequest, default_name: String) -> ClientResult<DownloadedFile> {
        let response = self.transport.send(request).await?;
        let file_name = response
            .content_disposition
            .as_deref()
            .and_then(file_name_from_disposition)
            .unwrap_or(default_name);
        Ok(DownloadedFile {
            file_name,
            content: response.body,
        })
    }

    // -------------------------
    // Auth
    // -------------------------

    /// Authenticate and replace the session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Session> {
        let credentials = if self.use_mock {
            self.mock_credentials(username)?
        } else {
            let request = ApiRequest::post("/auth/login").json(&json!({
                "username": username,
                "password": password,
            }));
            let record: LoginRecord = self.fetch_one(request, "login").await?.unwrap_or_default();
            let token = record
                .token
                .filter(|token| !token.is_empty())
                .ok_or_else(|| ClientError::Login("invalid username or password".to_string()))?;
            Credentials::new(token, record.username.unwrap_or_else(|| username.to_string()), record.roles)
        };

        let session = self.session().set_session(credentials);
        tracing::info!(username = %session.username(), "logged in");
        Ok(session)
    }

    fn mock_credentials(&self, username: &str) -> ClientResult<Credentials> {
        let user = self
            .mock
            .admin_users()
            .into_iter()
            .find(|user| user.username.as_deref() == Some(username))
            .ok_or_else(|| ClientError::Login(format!("unknown mock user '{username}'")))?;
        Ok(Credentials::new(format!("mock-token-{username}"), username, user.roles))
    }

    pub fn logout(&self) {
        self.session().clear_session();
        tracing::info!("logged out");
    }

    // -------------------------
    // Catalogue and stock
    // -------------------------

    pub async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let records: Vec<ProductRecord> = if self.use_mock {
            self.mock.products()
        } else {
            let mock = self.mock;
            call(
                "list products",
                self.fetch_list(ApiRequest::get("/products"), "products"),
                fallback(move || mock.products()),
            )
            .await?
        };
        Ok(records.into_iter().map(to_product).collect())
    }

    /// Stock rows, optionally filtered by a case-insensitive sku/name keyword.
    pub async fn list_inventory(&self, keyword: Option<&str>) -> ClientResult<Vec<InventoryRow>> {
        let records: Vec<StockRecord> = if self.use_mock {
            self.mock.stock()
        } else {
            let mock = self.mock;
            call(
                "list inventory",
                self.fetch_list(ApiRequest::get("/inventory/stocks"), "stocks"),
                fallback(move || mock.stock()),
            )
            .await?
        };
        Ok(records
            .into_iter()
            .map(to_inventory_row)
            .filter(|row| matches_keyword(row, keyword))
            .collect())
    }

    // -------------------------
    // Procurement
    // -------------------------

    pub async fn submit_purchase(&self, draft: &PurchaseDraft) -> ClientResult<Value> {
        let body = build_purchase_request(draft, now_millis())?;
        if self.use_mock {
            tracing::info!(items = body.items.len(), "mock procurement request accepted");
            return Ok(acknowledged());
        }
        self.transport
            .fetch(ApiRequest::post("/procurement/applications").json(&body))
            .await
    }

    pub async fn list_purchase_requests(&self) -> ClientResult<Vec<ProcurementApplication>> {
        let records: Vec<ProcurementRecord> = if self.use_mock {
            self.mock.purchase_requests()
        } else {
            let mock = self.mock;
            call(
                "list purchase requests",
                self.fetch_list(ApiRequest::get("/procurement/applications"), "procurement applications"),
                fallback(move || mock.purchase_requests()),
            )
            .await?
        };
        Ok(records.into_iter().map(to_procurement_application).collect())
    }

    // -------------------------
    // Inbound / outbound
    // -------------------------

    pub async fn submit_inbound(&self, draft: &InventoryDraft) -> ClientResult<Value> {
        self.submit_inventory(draft, Direction::In).await
    }

    pub async fn submit_outbound(&self, draft: &InventoryDraft) -> ClientResult<Value> {
        self.submit_inventory(draft, Direction::Out).await
    }

    async fn submit_inventory(&self, draft: &InventoryDraft, direction: Direction) -> ClientResult<Value> {
        let body = build_inventory_request(draft, direction)?;
        if self.use_mock {
            tracing::info!(direction = direction.as_str(), items = body.items.len(), "mock request accepted");
            return Ok(acknowledged());
        }
        self.transport
            .fetch(ApiRequest::post(direction.collection_path()).json(&body))
            .await
    }

    // -------------------------
    // Locations
    // -------------------------

    pub async fn list_locations(&self, include_inactive: bool) -> ClientResult<Vec<WarehouseLocation>> {
        if self.use_mock {
            return Ok(Vec::new());
        }
        let request = ApiRequest::get("/warehouse/locations").query_opt("includeInactive", include_inactive.then_some(true));
        let records: Vec<LocationRecord> =
            call("list locations", self.fetch_list(request, "locations"), fallback(Vec::new)).await?;
        Ok(records.into_iter().map(to_location).collect())
    }

    pub async fn create_location(&self, draft: &LocationDraft) -> ClientResult<Option<WarehouseLocation>> {
        draft.validate()?;
        let body = LocationDraft {
            active: None,
            ..draft.clone()
        };
        if self.use_mock {
            return Ok(Some(Self::mock_location(now_millis(), &body)));
        }
        let record: Option<LocationRecord> = self
            .fetch_one(ApiRequest::post("/warehouse/locations").json(&body), "location")
            .await?;
        Ok(record.map(to_location))
    }

    pub async fn update_location(&self, id: i64, draft: &LocationDraft) -> ClientResult<Option<WarehouseLocation>> {
        draft.validate()?;
        if self.use_mock {
            return Ok(Some(Self::mock_location(id, draft)));
        }
        let record: Option<LocationRecord> = self
            .fetch_one(ApiRequest::put(format!("/warehouse/locations/{id}")).json(draft), "location")
            .await?;
        Ok(record.map(to_location))
    }

    pub async fn toggle_location_status(&self, id: i64, active: bool) -> ClientResult<Option<WarehouseLocation>> {
        if self.use_mock {
            return Ok(Some(to_location(LocationRecord {
                id: Some(id),
                active: Some(active),
                ..LocationRecord::default()
            })));
        }
        let request = ApiRequest::patch(format!("/warehouse/locations/{id}/status")).json(&LocationStatusBody { active });
        let record: Option<LocationRecord> = self.fetch_one(request, "location").await?;
        Ok(record.map(to_location))
    }

    pub async fn delete_location(&self, id: i64) -> ClientResult<()> {
        if self.use_mock {
            return Ok(());
        }
        self.transport
            .send(ApiRequest::delete(format!("/warehouse/locations/{id}")))
            .await?;
        Ok(())
    }

    fn mock_location(id: i64, draft: &LocationDraft) -> WarehouseLocation {
        to_location(LocationRecord {
            id: Some(id),
            code: Some(draft.code.clone()),
            name: Some(draft.name.clone()),
            description: draft.description.clone(),
            active: draft.active,
            ..LocationRecord::default()
        })
    }

    // -------------------------
    // Warehouse tasks
    // -------------------------

    /// Inbound and outbound applications as one task list, newest first.
    pub async fn list_warehouse_tasks(&self) -> ClientResult<Vec<WarehouseTask>> {
        let (inbound, outbound) = tokio::join!(
            degrade("inbound tasks", self.inbound_applications()),
            degrade("outbound tasks", self.outbound_applications()),
        );

        let mut tasks: Vec<WarehouseTask> = inbound
            .into_iter()
            .map(|record| to_inventory_application(record, ApprovalKind::Inbound))
            .chain(
                outbound
                    .into_iter()
                    .map(|record| to_inventory_application(record, ApprovalKind::Outbound)),
            )
            .map(to_warehouse_task)
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    /// Record actual quantities for an inbound/outbound task.
    pub async fn execute_task(&self, composite_id: &str, lines: Vec<ExecutionLine>) -> ClientResult<Value> {
        let reference: ApprovalRef = composite_id.parse()?;
        let direction = match reference.kind() {
            ApprovalKind::Inbound => Direction::In,
            ApprovalKind::Outbound => Direction::Out,
            ApprovalKind::Procurement => {
                return Err(ClientError::validation("procurement requests have no execution step"));
            }
        };
        let body = build_execution(lines)?;
        if self.use_mock {
            return Ok(acknowledged());
        }
        let path = format!("{}/{}/execute", direction.collection_path(), reference.raw_id());
        self.transport.fetch(ApiRequest::post(path).json(&body)).await
    }

    // -------------------------
    // Approvals
    // -------------------------

    pub async fn list_approvals(&self) -> Vec<ApprovalItem> {
        approvals::list_approvals(self).await
    }

    /// Full record behind a composite id; `None` when the id is empty,
    /// unknown, or no longer exists.
    pub async fn fetch_approval_detail(&self, composite_id: Option<&str>) -> ClientResult<Option<ApprovalDetail>> {
        let decoded = decode_opt(composite_id);
        if decoded.id.is_empty() {
            return Ok(None);
        }
        let Ok(kind) = decoded.kind.parse::<ApprovalKind>() else {
            tracing::warn!(kind = %decoded.kind, "unknown approval kind");
            return Ok(None);
        };
        let reference = ApprovalRef::new(kind, decoded.id);

        match kind {
            ApprovalKind::Procurement => {
                let record = self.procurement_record(reference.raw_id()).await?;
                Ok(record.map(|record| {
                    let mut app = to_procurement_application(record);
                    app.id = reference;
                    ApprovalDetail::Procurement(app)
                }))
            }
            ApprovalKind::Inbound | ApprovalKind::Outbound => {
                let records = degrade(
                    "approval detail",
                    if kind == ApprovalKind::Inbound {
                        self.inbound_applications()
                    } else {
                        self.outbound_applications()
                    },
                )
                .await;
                Ok(records
                    .into_iter()
                    .find(|record| record.id.as_deref() == Some(reference.raw_id()))
                    .map(|record| {
                        let mut app = to_inventory_application(record, kind);
                        app.id = reference;
                        ApprovalDetail::Inventory(app)
                    }))
            }
        }
    }

    async fn procurement_record(&self, raw_id: &str) -> ClientResult<Option<ProcurementRecord>> {
        if self.use_mock {
            return Ok(self
                .mock
                .purchase_requests()
                .into_iter()
                .find(|record| record.id.as_deref() == Some(raw_id)));
        }
        let request = ApiRequest::get(format!("/procurement/applications/{raw_id}"));
        call("procurement detail", self.fetch_one(request, "procurement application"), fallback(|| None)).await
    }

    /// Submit an approve/reject decision.
    pub async fn process_approval(&self, composite_id: &str, decision: &ApprovalDecision) -> ClientResult<Value> {
        let decoded = decode(composite_id);
        if decoded.id.is_empty() {
            return Err(ClientError::validation(format!("unknown approval id '{composite_id}'")));
        }
        let kind: ApprovalKind = decoded.kind.parse()?;
        if self.use_mock {
            return Ok(acknowledged());
        }

        let path = match kind {
            ApprovalKind::Procurement => format!("/procurement/applications/{}/approve", decoded.id),
            ApprovalKind::Inbound => format!("{}/{}/approve", Direction::In.collection_path(), decoded.id),
            ApprovalKind::Outbound => format!("{}/{}/approve", Direction::Out.collection_path(), decoded.id),
        };
        tracing::info!(id = %composite_id, approved = decision.approved, "submitting approval decision");
        self.transport.fetch(ApiRequest::put(path).json(decision)).await
    }

    // -------------------------
    // Reports
    // -------------------------

    pub async fn get_dashboard_stats(&self) -> ClientResult<DashboardStats> {
        if self.use_mock {
            return Ok(to_dashboard_stats(
                Some(self.mock.inventory_summary()),
                Some(self.mock.approval_stats()),
            ));
        }
        let (summary, approvals) = tokio::join!(
            call(
                "inventory summary",
                self.fetch_one::<InventorySummaryRecord>(ApiRequest::get("/reports/inventory-summary"), "inventory summary"),
                fallback(|| None),
            ),
            call(
                "approval stats",
                self.fetch_one::<ApprovalStatsRecord>(ApiRequest::get("/reports/approval-stats"), "approval stats"),
                fallback(|| None),
            ),
        );
        Ok(to_dashboard_stats(summary?, approvals?))
    }

    /// Daily operation counts over the last 30 days.
    pub async fn get_inventory_trends(&self) -> ClientResult<Vec<TrendPoint>> {
        let points = if self.use_mock {
            self.mock.trends()
        } else {
            let mock = self.mock;
            let request = ApiRequest::get("/reports/operation-trends").query("days", TREND_DAYS);
            call(
                "inventory trends",
                async {
                    let trends: Option<OperationTrendsRecord> = self.fetch_one(request, "operation trends").await?;
                    Ok::<_, ClientError>(trends.unwrap_or_default().points)
                },
                fallback(move || mock.trends()),
            )
            .await?
        };
        Ok(points.into_iter().map(to_trend_point).collect())
    }

    // -------------------------
    // Operation logs
    // -------------------------

    pub async fn list_operation_logs(&self, query: &LogQuery) -> ClientResult<OperationLogPage> {
        let page: PageRecord<OperationLogRecord> = if self.use_mock {
            PageRecord {
                content: self.mock.operation_logs(),
                ..PageRecord::default()
            }
        } else {
            let mut request = ApiRequest::get("/admin/logs")
                .query("page", query.page_index())
                .query("size", query.page_size());
            for (key, value) in query.filters() {
                request = request.query(key, value);
            }
            call(
                "list operation logs",
                async { Ok::<_, ClientError>(self.fetch_one(request, "operation logs").await?.unwrap_or_default()) },
                fallback(PageRecord::default),
            )
            .await?
        };

        let index = page.index().unwrap_or(i64::from(query.page_index()));
        let page_size = page.per_page().unwrap_or(i64::from(query.page_size()));
        let records: Vec<OperationLog> = page.content.into_iter().map(to_operation_log).collect();
        Ok(OperationLogPage {
            total: page.total_elements.unwrap_or(records.len() as i64),
            page: index + 1,
            page_size,
            records,
        })
    }

    pub async fn export_operation_logs(&self, query: &LogQuery) -> ClientResult<DownloadedFile> {
        if self.use_mock {
            return Ok(DownloadedFile {
                file_name: "operation-logs-mock.csv".to_string(),
                content: self.mock.log_export(),
            });
        }
        let mut request = ApiRequest::get("/admin/logs/export");
        for (key, value) in query.filters() {
            request = request.query(key, value);
        }
        self.download(request, format!("operation-logs-{}.csv", now_millis())).await
    }

    pub async fn list_log_archives(&self, limit: Option<u32>) -> ClientResult<Vec<LogArchive>> {
        let records: Vec<LogArchiveRecord> = if self.use_mock {
            self.mock.log_archives()
        } else {
            let request = ApiRequest::get("/admin/logs/archives").query("limit", limit.unwrap_or(DEFAULT_ARCHIVE_LIMIT));
            call("list log archives", self.fetch_list(request, "log archives"), fallback(Vec::new)).await?
        };
        Ok(records.into_iter().map(to_log_archive).collect())
    }

    pub async fn download_log_archive(&self, date: &str) -> ClientResult<DownloadedFile> {
        let date = required_date(date)?;
        if self.use_mock {
            return Ok(DownloadedFile {
                file_name: "operation-log-mock.csv".to_string(),
                content: self.mock.log_export(),
            });
        }
        let request = ApiRequest::get(format!("/admin/logs/archives/{date}/download"));
        self.download(request, format!("operation-log-{date}.csv")).await
    }

    pub async fn preview_log_archive(&self, date: &str, size: Option<u32>) -> ClientResult<Vec<OperationLog>> {
        let date = required_date(date)?;
        let records: Vec<OperationLogRecord> = if self.use_mock {
            self.mock.operation_logs()
        } else {
            let request = ApiRequest::get(format!("/admin/logs/archives/{date}/preview"))
                .query("size", size.unwrap_or(DEFAULT_PREVIEW_SIZE));
            call("preview log archive", self.fetch_list(request, "archive preview"), fallback(Vec::new)).await?
        };
        Ok(records.into_iter().map(to_operation_log).collect())
    }

    // -------------------------
    // Users and roles
    // -------------------------

    pub async fn list_admin_users(&self, query: &UserQuery) -> ClientResult<AdminUserPage> {
        let page: PageRecord<AdminUserRecord> = if self.use_mock {
            PageRecord {
                content: self.mock_users(query),
                ..PageRecord::default()
            }
        } else {
            let mut request = ApiRequest::get("/admin/users")
                .query("page", query.page_index())
                .query("size", query.per_page());
            for (key, value) in query.filters() {
                request = request.query(key, value);
            }
            call(
                "list admin users",
                async { Ok::<_, ClientError>(self.fetch_one(request, "admin users").await?.unwrap_or_default()) },
                fallback(PageRecord::default),
            )
            .await?
        };

        let index = page.index().unwrap_or(i64::from(query.page_index()));
        let page_size = page.per_page().unwrap_or(i64::from(query.per_page()));
        let items: Vec<_> = page.content.into_iter().map(to_admin_user).collect();
        Ok(AdminUserPage {
            total: page.total_elements.unwrap_or(items.len() as i64),
            page: index + 1,
            page_size,
            items,
        })
    }

    fn mock_users(&self, query: &UserQuery) -> Vec<AdminUserRecord> {
        let keyword = query.keyword.as_deref().unwrap_or_default().trim().to_lowercase();
        let status = query.status.as_deref().filter(|s| !s.is_empty() && *s != "ALL");
        self.mock
            .admin_users()
            .into_iter()
            .filter(|user| {
                keyword.is_empty()
                    || [&user.username, &user.real_name]
                        .into_iter()
                        .flatten()
                        .any(|field| field.to_lowercase().contains(&keyword))
            })
            .filter(|user| status.is_none() || user.status.as_deref() == status)
            .collect()
    }

    /// Update when the draft has an id, create otherwise.
    pub async fn save_admin_user(&self, draft: &AdminUserDraft) -> ClientResult<Value> {
        let request = build_admin_user(draft)?;
        if self.use_mock {
            return Ok(acknowledged());
        }
        let request = match request {
            AdminUserRequest::Update { id, body } => ApiRequest::put(format!("/admin/users/{id}")).json(&body),
            AdminUserRequest::Create(body) => ApiRequest::post("/admin/users").json(&body),
        };
        self.transport.fetch(request).await
    }

    pub async fn update_user_status(&self, id: i64, status: &str) -> ClientResult<Value> {
        let status = status.trim();
        if status.is_empty() {
            return Err(ClientError::validation("status is required"));
        }
        if self.use_mock {
            return Ok(acknowledged());
        }
        let body = UserStatusBody {
            status: status.to_string(),
        };
        self.transport
            .fetch(ApiRequest::put(format!("/admin/users/{id}/status")).json(&body))
            .await
    }

    pub async fn assign_roles(&self, id: i64, roles: &[String]) -> ClientResult<Value> {
        let body = build_role_assignment(roles)?;
        if self.use_mock {
            return Ok(acknowledged());
        }
        self.transport
            .fetch(ApiRequest::post(format!("/admin/users/{id}/roles")).json(&body))
            .await
    }

    pub async fn reset_user_password(&self, id: i64, new_password: &str) -> ClientResult<Value> {
        let body = build_password_reset(new_password)?;
        if self.use_mock {
            return Ok(acknowledged());
        }
        self.transport
            .fetch(ApiRequest::put(format!("/admin/users/{id}/password")).json(&body))
            .await
    }

    pub async fn list_roles(&self) -> ClientResult<Vec<RoleOption>> {
        let records: Vec<RoleRecord> = if self.use_mock {
            self.mock.roles()
        } else {
            let mock = self.mock;
            call(
                "list roles",
                self.fetch_list(ApiRequest::get("/admin/roles"), "roles"),
                fallback(move || mock.roles()),
            )
            .await?
        };
        Ok(records.into_iter().map(to_role_option).collect())
    }
}

fn required_date(date: &str) -> ClientResult<&str> {
    let date = date.trim();
    if date.is_empty() {
        return Err(ClientError::validation("a log date is required"));
    }
    Ok(date)
}

#[async_trait::async_trait]
impl ApprovalSource for ApiClient {
    async fn pending_procurements(&self) -> ClientResult<Vec<ProcurementRecord>> {
        if self.use_mock {
            return self.mock.pending_procurements().await;
        }
        self.fetch_list(ApiRequest::get("/procurement/applications/pending"), "pending procurements")
            .await
    }

    async fn inbound_applications(&self) -> ClientResult<Vec<InventoryApplicationRecord>> {
        if self.use_mock {
            return Ok(self.mock.inbound_records());
        }
        self.fetch_list(ApiRequest::get(Direction::In.collection_path()), "inbound applications")
            .await
    }

    async fn outbound_applications(&self) -> ClientResult<Vec<InventoryApplicationRecord>> {
        if self.use_mock {
            return Ok(self.mock.outbound_records());
        }
        self.fetch_list(ApiRequest::get(Direction::Out.collection_path()), "outbound applications")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, Method, RawResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wms_auth::{MemorySessionStorage, RouteTable, Router};

    /// Routes `(method, path)` to canned JSON bodies; anything else is 404.
    #[derive(Default)]
    struct Canned {
        routes: HashMap<(&'static str, String), RawResponse>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl Canned {
        fn with(mut self, method: Method, path: &str, body: Value) -> Self {
            self.routes
                .insert((method.as_str(), path.to_string()), RawResponse::json(200, &json!({"success": true, "data": body})));
            self
        }

        fn failing(mut self, method: Method, path: &str, status: u16) -> Self {
            self.routes
                .insert((method.as_str(), path.to_string()), RawResponse::json(status, &json!({"message": "boom"})));
            self
        }

        fn seen(&self) -> Vec<ApiRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Backend for Canned {
        async fn send(&self, request: ApiRequest) -> ClientResult<RawResponse> {
            let key = (request.method.as_str(), request.path.clone());
            self.seen.lock().unwrap().push(request);
            Ok(self
                .routes
                .get(&key)
                .cloned()
                .unwrap_or_else(|| RawResponse::json(404, &json!({"message": "not found"}))))
        }
    }

    fn client(backend: Canned) -> (ApiClient, Arc<Canned>) {
        let backend = Arc::new(backend);
        let session = Arc::new(SessionStore::restore(MemorySessionStorage::new()));
        let router = Arc::new(Router::new(RouteTable::default(), session.clone()));
        let transport = Transport::new(backend.clone(), session, router);
        (ApiClient::new(transport, false), backend)
    }

    fn mock_client() -> ApiClient {
        let (client, _) = client(Canned::default());
        ApiClient { use_mock: true, ..client }
    }

    #[test]
    fn disposition_prefers_extended_file_name() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=\"fallback.csv\"; filename*=UTF-8''log%202025-11-27.csv")
                .as_deref(),
            Some("log 2025-11-27.csv")
        );
        assert_eq!(
            file_name_from_disposition("attachment; filename=\"operation-log.csv\"").as_deref(),
            Some("operation-log.csv")
        );
        assert_eq!(file_name_from_disposition("inline"), None);
    }

    #[test]
    fn disposition_keeps_raw_reserved_characters() {
        assert_eq!(
            file_name_from_disposition("attachment; filename*=UTF-8''logs&2025=a+b.csv").as_deref(),
            Some("logs&2025=a+b.csv")
        );
        assert_eq!(
            file_name_from_disposition("attachment; filename*=UTF-8''%E6%97%A5%E5%BF%97.csv").as_deref(),
            Some("日志.csv")
        );
    }

    #[tokio::test]
    async fn login_populates_session_from_roles() {
        let (client, _) = client(Canned::default().with(
            Method::Post,
            "/auth/login",
            json!({"token": "jwt", "username": "manager", "roles": ["ROLE_MANAGER"]}),
        ));

        let session = client.login("manager", "secret-pass").await.unwrap();
        assert!(session.is_authenticated());
        assert!(session.has_role("MANAGER"));
        assert_eq!(client.session().resolve_default_route(), "/manager/pending-approvals");
    }

    #[tokio::test]
    async fn login_without_token_fails() {
        let (client, _) = client(Canned::default().with(Method::Post, "/auth/login", json!({"username": "x"})));
        assert!(matches!(client.login("x", "y").await, Err(ClientError::Login(_))));
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn product_listing_falls_back_to_fixtures() {
        let (client, _) = client(Canned::default().failing(Method::Get, "/products", 500));
        let products = client.list_products().await.unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].sku, "SKU-1001");
    }

    #[tokio::test]
    async fn inventory_keyword_filters_rows() {
        let (client, _) = client(Canned::default().with(
            Method::Get,
            "/inventory/stocks",
            json!([
                {"productId": 1, "sku": "SKU-1001", "name": "Bearing", "currentStock": 5},
                {"productId": 2, "sku": "SKU-1002", "name": "Scanner", "currentStock": 2, "locationCode": "A-01"}
            ]),
        ));

        let rows = client.list_inventory(Some("scan")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location_label, "A-01");
        assert_eq!(client.list_inventory(None).await.unwrap()[0].location_label, "Main warehouse");
    }

    #[tokio::test]
    async fn invalid_purchase_is_never_sent() {
        let (client, backend) = client(Canned::default());
        let err = client.submit_purchase(&PurchaseDraft::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(backend.seen().is_empty());
    }

    #[tokio::test]
    async fn submissions_without_fallback_propagate_failure() {
        let (client, _) = client(Canned::default().failing(Method::Post, "/inventory/in-applications", 500));
        let draft = InventoryDraft {
            reference: None,
            lines: vec![crate::payload::InventoryLine {
                product_id: Some(1),
                quantity: Some(2),
                ..Default::default()
            }],
        };
        assert!(matches!(
            client.submit_inbound(&draft).await,
            Err(ClientError::Api { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn warehouse_tasks_merge_both_directions_newest_first() {
        let (client, _) = client(
            Canned::default()
                .with(
                    Method::Get,
                    "/inventory/in-applications",
                    json!([{"id": 1, "type": "IN", "status": "APPROVED", "createdAt": "2025-11-27T08:00:00"}]),
                )
                .with(
                    Method::Get,
                    "/inventory/out-applications",
                    json!([{"id": 2, "type": "OUT", "status": "PENDING_APPROVAL", "createdAt": "2025-11-27T12:00:00"}]),
                ),
        );

        let tasks = client.list_warehouse_tasks().await.unwrap();
        let ids: Vec<&str> = tasks.iter().map(|t| t.display_id.as_str()).collect();
        assert_eq!(ids, ["OUT-000002", "IN-000001"]);
    }

    #[tokio::test]
    async fn approval_detail_resolves_each_kind() {
        let (client, _) = client(
            Canned::default()
                .with(
                    Method::Get,
                    "/procurement/applications/5",
                    json!({"id": 5, "title": "Gloves", "items": [{"productId": 3, "quantity": 10}]}),
                )
                .with(
                    Method::Get,
                    "/inventory/out-applications",
                    json!([{"id": 9, "type": "OUT", "status": "PENDING_APPROVAL"}]),
                ),
        );

        let Some(ApprovalDetail::Procurement(app)) = client.fetch_approval_detail(Some("PROCUREMENT:5")).await.unwrap()
        else {
            panic!("expected procurement detail");
        };
        assert_eq!(app.display_id, "PO-000005");
        assert_eq!(app.items[0].name, "Product 3");

        let detail = client.fetch_approval_detail(Some("OUTBOUND:9")).await.unwrap().unwrap();
        assert_eq!(detail.id(), &ApprovalRef::Outbound("9".into()));

        assert_eq!(client.fetch_approval_detail(Some("OUTBOUND:10")).await.unwrap(), None);
        assert_eq!(client.fetch_approval_detail(None).await.unwrap(), None);
        assert_eq!(client.fetch_approval_detail(Some("")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn process_approval_targets_kind_endpoint() {
        let (client, backend) = client(Canned::default().with(Method::Put, "/inventory/in-applications/3/approve", json!(null)));

        client
            .process_approval("INBOUND:3", &ApprovalDecision::approve(Some("ok".into())))
            .await
            .unwrap();

        let sent = backend.seen();
        assert_eq!(sent[0].body, Some(json!({"approved": true, "comment": "ok"})));
    }

    #[tokio::test]
    async fn process_approval_rejects_empty_id() {
        let (client, backend) = client(Canned::default());
        let err = client.process_approval("", &ApprovalDecision::reject(None)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(backend.seen().is_empty());
    }

    #[tokio::test]
    async fn log_pages_convert_between_one_and_zero_based() {
        let (client, backend) = client(Canned::default().with(
            Method::Get,
            "/admin/logs",
            json!({"content": [{"id": 1, "operator": null, "createdAt": "2025-11-27T10:11:00"}], "totalElements": 41, "pageNumber": 1, "pageSize": 20}),
        ));

        let page = client
            .list_operation_logs(&LogQuery {
                page: Some(2),
                ..LogQuery::default()
            })
            .await
            .unwrap();

        assert_eq!((page.total, page.page, page.page_size), (41, 2, 20));
        assert_eq!(page.records[0].operator, "-");
        assert_eq!(page.records[0].created_at_text, "2025-11-27 10:11:00");
        assert!(backend.seen()[0].query.contains(&("page".to_string(), "1".to_string())));
    }

    #[tokio::test]
    async fn log_pages_accept_short_paging_keys() {
        let (client, _) = client(Canned::default().with(
            Method::Get,
            "/admin/logs",
            json!({"content": [{"id": 7}, {"id": 8}], "page": 2, "size": 2}),
        ));

        let page = client.list_operation_logs(&LogQuery::default()).await.unwrap();
        assert_eq!((page.total, page.page, page.page_size), (2, 3, 2));
        assert_eq!(page.records.len(), 2);
    }

    #[tokio::test]
    async fn archive_operations_require_a_date() {
        let (client, backend) = client(Canned::default());
        assert!(matches!(client.download_log_archive(" ").await, Err(ClientError::Validation(_))));
        assert!(matches!(client.preview_log_archive("", None).await, Err(ClientError::Validation(_))));
        assert!(backend.seen().is_empty());
    }

    #[tokio::test]
    async fn dashboard_tolerates_missing_reports() {
        let (client, _) = client(Canned::default().with(
            Method::Get,
            "/reports/approval-stats",
            json!({"inventoryInApprovals": 3, "inventoryOutApprovals": 1, "averageApprovalHours": 2.345}),
        ));

        let stats = client.get_dashboard_stats().await.unwrap();
        assert_eq!((stats.inbound, stats.outbound), (3, 1));
        assert_eq!(stats.turnover_days, 2.3);
        assert_eq!(stats.inventory_value, 0.0);
    }

    #[tokio::test]
    async fn mock_mode_never_touches_the_backend() {
        let client = mock_client();

        assert_eq!(client.list_approvals().await.len(), 3);
        assert_eq!(client.list_warehouse_tasks().await.unwrap().len(), 3);
        assert_eq!(client.list_roles().await.unwrap().len(), 4);
        let session = client.login("clerk01", "anything").await.unwrap();
        assert_eq!(session.resolve_default_route(), "/warehouse/tasks");

        let users = client
            .list_admin_users(&UserQuery {
                keyword: Some("wang".into()),
                ..UserQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(users.items.len(), 1);
        assert_eq!(users.page, 1);
    }
}
