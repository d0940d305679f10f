//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results (ADR-020).
//! Routing decisions, receipts, snapshots and rebalance reports are returned
//! as the core serializes them.

use serde::{Deserialize, Serialize};
use ticketflow_core::domain::{
    ChannelId, CompanyId, ContactId, ProtectionStats, QueueId, TicketId, TransferProtectionEntry,
    UserId,
};

/// ticket.checkOpen.v1 / ticket.route.v1
#[derive(Debug, Deserialize)]
pub struct ContactChannelRequest {
    pub contact_id: ContactId,
    pub channel_id: ChannelId,
    pub company_id: CompanyId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOpenTicketResponse {
    pub contact_id: ContactId,
    pub channel_id: ChannelId,
    pub company_id: CompanyId,
    pub can_open: bool,
}

/// ticket.assign.v1
#[derive(Debug, Deserialize)]
pub struct AssignTicketRequest {
    pub ticket_id: TicketId,
}

/// ticket.transfer.v1 / protection.mark.v1
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub queue_id: QueueId,
}

/// queue.select.v1 / queue.loads.v1
#[derive(Debug, Deserialize)]
pub struct CompanyRequest {
    pub company_id: CompanyId,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectQueueResponse {
    pub company_id: CompanyId,
    pub queue_id: QueueId,
}

/// protection.check.v1 / protection.remove.v1
#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    pub ticket_id: TicketId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProtectionStatusResponse {
    pub ticket_id: TicketId,
    pub protected: bool,
    pub age_minutes: Option<i64>,
    pub entry: Option<TransferProtectionEntry>,
}

/// protection.sweep.v1 (no parameters)
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub removed: usize,
    pub stats: ProtectionStats,
}

/// protection.stats.v1 (no parameters)
#[derive(Debug, Clone, Serialize)]
pub struct ProtectionStatsResponse {
    pub total: usize,
    pub protected_count: usize,
    pub window_secs: u64,
}

/// admin.rebalance.v1 - one company, or all when params or company_id are omitted
#[derive(Debug, Deserialize)]
pub struct RebalanceRequest {
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}
