//! Fixture data source.
//!
//! Serves the same raw records the backend would, so fixtures go through the
//! normal normalizers and the approval aggregator.

use async_trait::async_trait;

use crate::approvals::{ApprovalSource, PENDING_APPROVAL};
use crate::error::ClientResult;
use crate::records::{
    AdminUserRecord, ApprovalStatsRecord, InventoryApplicationRecord, InventoryItemRecord, InventorySummaryRecord,
    LogArchiveRecord, OperationLogRecord, ProcurementItemRecord, ProcurementRecord, ProductRecord, RoleRecord,
    StockRecord, TrendPointRecord,
};

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

/// Stateless fixture set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockData;

impl MockData {
    pub fn products(&self) -> Vec<ProductRecord> {
        [
            (1, "Industrial bearing A1", "SKU-1001", "box", 1250.0),
            (2, "Smart barcode scanner", "SKU-1002", "unit", 980.0),
            (3, "Anti-static gloves", "SKU-1003", "pack", 65.0),
        ]
        .into_iter()
        .map(|(id, name, sku, unit, price)| ProductRecord {
            id: Some(id),
            name: text(name),
            sku: text(sku),
            unit: text(unit),
            price: Some(price),
        })
        .collect()
    }

    pub fn stock(&self) -> Vec<StockRecord> {
        [
            (1, "SKU-1001", "Industrial bearing A1", "EAST", "East hub", 520, 400),
            (2, "SKU-1002", "Smart barcode scanner", "NORTH", "North hub", 115, 150),
            (3, "SKU-1003", "Anti-static gloves", "SOUTH", "South hub", 890, 600),
        ]
        .into_iter()
        .map(|(id, sku, name, code, location, quantity, safety)| StockRecord {
            product_id: Some(id),
            sku: text(sku),
            name: text(name),
            current_stock: Some(quantity),
            safety_stock: Some(safety),
            locked_stock: Some(0),
            location_id: Some(id),
            location_code: text(code),
            location_name: text(location),
            ..StockRecord::default()
        })
        .collect()
    }

    pub fn purchase_requests(&self) -> Vec<ProcurementRecord> {
        vec![
            ProcurementRecord {
                id: text("2025001"),
                title: text("Bearing restock"),
                total_amount: Some(88_000.0),
                status: text("SUBMITTED"),
                applicant: text("buyer01"),
                created_at: text("2025-11-27T09:32:00"),
                items: vec![
                    ProcurementItemRecord {
                        id: Some(1),
                        product_id: Some(1),
                        quantity: Some(60),
                        expected_price: Some(1250.0),
                    },
                    ProcurementItemRecord {
                        id: Some(2),
                        product_id: Some(3),
                        quantity: Some(200),
                        expected_price: Some(65.0),
                    },
                ],
            },
            ProcurementRecord {
                id: text("2025002"),
                title: text("Scanner replacement"),
                total_amount: Some(14_700.0),
                status: text("APPROVED"),
                applicant: text("buyer02"),
                created_at: text("2025-11-26T14:18:00"),
                items: vec![ProcurementItemRecord {
                    id: Some(3),
                    product_id: Some(2),
                    quantity: Some(15),
                    expected_price: Some(980.0),
                }],
            },
        ]
    }

    pub fn inbound_records(&self) -> Vec<InventoryApplicationRecord> {
        vec![
            inventory_application("8", "IN", PENDING_APPROVAL, "clerk01", "2025-11-27T16:45:00"),
            inventory_application("7", "IN", "EXECUTING", "clerk01", "2025-11-28T08:20:00"),
        ]
    }

    pub fn outbound_records(&self) -> Vec<InventoryApplicationRecord> {
        vec![inventory_application("21", "OUT", PENDING_APPROVAL, "clerk02", "2025-11-27T18:05:00")]
    }

    pub fn approval_stats(&self) -> ApprovalStatsRecord {
        ApprovalStatsRecord {
            procurement_approvals: Some(12),
            inventory_in_approvals: Some(245),
            inventory_out_approvals: Some(198),
            approval_rate: Some(0.92),
            average_approval_hours: Some(42.0),
        }
    }

    pub fn inventory_summary(&self) -> InventorySummaryRecord {
        InventorySummaryRecord {
            total_inventory_value: Some(6.5),
            ..InventorySummaryRecord::default()
        }
    }

    pub fn trends(&self) -> Vec<TrendPointRecord> {
        [
            ("2025-10-01", 35, 28, 6),
            ("2025-10-10", 40, 25, 9),
            ("2025-10-20", 28, 31, 4),
            ("2025-10-30", 32, 30, 7),
            ("2025-11-10", 44, 35, 11),
        ]
        .into_iter()
        .map(|(date, inbound, outbound, approvals)| TrendPointRecord {
            date: text(date),
            in_count: Some(inbound),
            out_count: Some(outbound),
            approval_count: Some(approvals),
        })
        .collect()
    }

    pub fn operation_logs(&self) -> Vec<OperationLogRecord> {
        vec![
            OperationLogRecord {
                id: Some(1),
                operator: text("admin"),
                module: text("User management"),
                action: text("Create user"),
                details: text("Added user buyer01"),
                created_at: text("2025-11-27T10:11:00"),
            },
            OperationLogRecord {
                id: Some(2),
                operator: text("manager"),
                module: text("Approvals"),
                action: text("Approve"),
                details: text("Procurement request PO-2025002"),
                created_at: text("2025-11-27T14:32:00"),
            },
        ]
    }

    pub fn log_archives(&self) -> Vec<LogArchiveRecord> {
        let logs = self.operation_logs();
        vec![LogArchiveRecord {
            file_name: text("operation-log-20251127.csv"),
            date: text("2025-11-27"),
            record_count: Some(logs.len() as i64),
            last_record_at: logs.last().and_then(|log| log.created_at.clone()),
        }]
    }

    pub fn admin_users(&self) -> Vec<AdminUserRecord> {
        vec![
            AdminUserRecord {
                id: Some(1),
                username: text("buyer01"),
                real_name: text("Li Lei"),
                department: text("Procurement"),
                status: text("ACTIVE"),
                roles: vec!["BUYER".to_string()],
                created_at: text("2025-11-10T09:00:00"),
                updated_at: None,
            },
            AdminUserRecord {
                id: Some(2),
                username: text("manager"),
                real_name: text("Wang Qiang"),
                department: text("Operations"),
                status: text("ACTIVE"),
                roles: vec!["MANAGER".to_string()],
                created_at: text("2025-11-08T09:00:00"),
                updated_at: None,
            },
            AdminUserRecord {
                id: Some(3),
                username: text("clerk01"),
                real_name: text("Zhang Wei"),
                department: text("Warehouse"),
                status: text("ACTIVE"),
                roles: vec!["WAREHOUSE_CLERK".to_string()],
                created_at: text("2025-11-08T09:30:00"),
                updated_at: None,
            },
            AdminUserRecord {
                id: Some(4),
                username: text("admin"),
                real_name: text("System administrator"),
                department: text("IT"),
                status: text("ACTIVE"),
                roles: vec!["ADMIN".to_string()],
                created_at: text("2025-11-01T08:00:00"),
                updated_at: None,
            },
        ]
    }

    pub fn roles(&self) -> Vec<RoleRecord> {
        [
            ("BUYER", "Purchaser"),
            ("WAREHOUSE_CLERK", "Warehouse operator"),
            ("MANAGER", "Warehouse manager"),
            ("ADMIN", "System administrator"),
        ]
        .into_iter()
        .map(|(code, name)| RoleRecord {
            code: text(code),
            name: text(name),
            description: None,
        })
        .collect()
    }

    /// Placeholder export contents.
    pub fn log_export(&self) -> Vec<u8> {
        let mut csv = String::from("id,operator,module,action,details,createdAt\n");
        for log in self.operation_logs() {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                log.id.unwrap_or_default(),
                log.operator.unwrap_or_default(),
                log.module.unwrap_or_default(),
                log.action.unwrap_or_default(),
                log.details.unwrap_or_default(),
                log.created_at.unwrap_or_default(),
            ));
        }
        csv.into_bytes()
    }
}

fn inventory_application(
    id: &str,
    kind: &str,
    status: &str,
    applicant: &str,
    created_at: &str,
) -> InventoryApplicationRecord {
    InventoryApplicationRecord {
        id: text(id),
        kind: text(kind),
        status: text(status),
        applicant: text(applicant),
        reason: text("Scheduled replenishment"),
        created_at: text(created_at),
        items: vec![InventoryItemRecord {
            id: Some(1),
            product_id: Some(1),
            quantity: Some(20),
            location_id: Some(1),
            location_code: text("EAST"),
            location_name: text("East hub"),
            ..InventoryItemRecord::default()
        }],
    }
}

#[async_trait]
impl ApprovalSource for MockData {
    async fn pending_procurements(&self) -> ClientResult<Vec<ProcurementRecord>> {
        Ok(self
            .purchase_requests()
            .into_iter()
            .filter(|record| record.status.as_deref() == Some("SUBMITTED"))
            .collect())
    }

    async fn inbound_applications(&self) -> ClientResult<Vec<InventoryApplicationRecord>> {
        Ok(self.inbound_records())
    }

    async fn outbound_applications(&self) -> ClientResult<Vec<InventoryApplicationRecord>> {
        Ok(self.outbound_records())
    }
}
