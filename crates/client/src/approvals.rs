//! Approval aggregation across the three approval-capable collections.
//!
//! Procurement applications arrive pre-filtered to pending by the backend;
//! inbound and outbound applications are filtered here. Each collection is
//! fetched concurrently and degrades to empty on failure, so one unavailable
//! collection never hides the other two.

use async_trait::async_trait;
use serde::Serialize;

use wms_core::{ApprovalKind, ApprovalRef};

use crate::error::ClientResult;
use crate::normalize::{InventoryApplication, ProcurementApplication, format_date_time, inventory_kind};
use crate::records::{InventoryApplicationRecord, ProcurementRecord};
use crate::transport::degrade;

/// Status of an inbound/outbound application awaiting a decision.
pub const PENDING_APPROVAL: &str = "PENDING_APPROVAL";

/// One row of the manager's approval queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalItem {
    /// Composite id; serialized as `"<KIND>:<raw id>"`.
    pub id: ApprovalRef,
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub raw_id: String,
    pub display_id: String,
    pub type_label: &'static str,
    pub applicant: Option<String>,
    /// Formatted `YYYY-MM-DD HH:MM:SS`; sorts lexicographically.
    pub submitted_at: String,
    pub status: Option<String>,
}

impl ApprovalItem {
    fn new(
        kind: ApprovalKind,
        raw_id: String,
        applicant: Option<String>,
        created_at: Option<&str>,
        status: Option<String>,
    ) -> Self {
        Self {
            id: ApprovalRef::new(kind, raw_id.clone()),
            kind,
            display_id: kind.display_id(&raw_id),
            raw_id,
            type_label: kind.type_label(),
            applicant,
            submitted_at: format_date_time(created_at),
            status,
        }
    }

    pub fn from_procurement(record: ProcurementRecord) -> Self {
        Self::new(
            ApprovalKind::Procurement,
            record.id.unwrap_or_default(),
            record.applicant,
            record.created_at.as_deref(),
            record.status,
        )
    }

    /// `source` is the collection the record was read from.
    pub fn from_inventory(record: InventoryApplicationRecord, source: ApprovalKind) -> Self {
        let kind = inventory_kind(record.kind.as_deref(), source);
        Self::new(
            kind,
            record.id.unwrap_or_default(),
            record.applicant,
            record.created_at.as_deref(),
            record.status,
        )
    }
}

/// Full record behind an approval item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApprovalDetail {
    Procurement(ProcurementApplication),
    Inventory(InventoryApplication),
}

impl ApprovalDetail {
    pub fn id(&self) -> &ApprovalRef {
        match self {
            ApprovalDetail::Procurement(app) => &app.id,
            ApprovalDetail::Inventory(app) => &app.id,
        }
    }
}

/// The three collections an approval queue is built from.
#[async_trait]
pub trait ApprovalSource: Send + Sync {
    /// Procurement applications already filtered to pending.
    async fn pending_procurements(&self) -> ClientResult<Vec<ProcurementRecord>>;

    /// All inbound applications, any status.
    async fn inbound_applications(&self) -> ClientResult<Vec<InventoryApplicationRecord>>;

    /// All outbound applications, any status.
    async fn outbound_applications(&self) -> ClientResult<Vec<InventoryApplicationRecord>>;
}

/// Fetch all three collections concurrently and merge them into one queue,
/// newest first.
///
/// Never fails: a collection that cannot be fetched contributes nothing.
pub async fn list_approvals<S>(source: &S) -> Vec<ApprovalItem>
where
    S: ApprovalSource + ?Sized,
{
    let (procurement, inbound, outbound) = tokio::join!(
        degrade("pending procurements", source.pending_procurements()),
        degrade("inbound applications", source.inbound_applications()),
        degrade("outbound applications", source.outbound_applications()),
    );

    let items = merge(procurement, inbound, outbound);
    tracing::info!(count = items.len(), "approval queue aggregated");
    items
}

/// Normalize, filter and sort fetched records.
///
/// Ties on `submitted_at` (including missing timestamps) keep fetch order:
/// procurement, then inbound, then outbound. That tie-break is incidental,
/// not a guarantee.
pub fn merge(
    procurement: Vec<ProcurementRecord>,
    inbound: Vec<InventoryApplicationRecord>,
    outbound: Vec<InventoryApplicationRecord>,
) -> Vec<ApprovalItem> {
    let mut items: Vec<ApprovalItem> = procurement.into_iter().map(ApprovalItem::from_procurement).collect();

    let pending = |record: &InventoryApplicationRecord| record.status.as_deref() == Some(PENDING_APPROVAL);
    items.extend(
        inbound
            .into_iter()
            .filter(pending)
            .map(|record| ApprovalItem::from_inventory(record, ApprovalKind::Inbound)),
    );
    items.extend(
        outbound
            .into_iter()
            .filter(pending)
            .map(|record| ApprovalItem::from_inventory(record, ApprovalKind::Outbound)),
    );

    sort_newest_first(&mut items);
    items
}

/// Stable sort by `submitted_at`, descending; empty timestamps go last.
pub fn sort_newest_first(items: &mut [ApprovalItem]) {
    items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}
