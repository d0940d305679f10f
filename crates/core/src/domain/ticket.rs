// Ticket Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::queue::QueueId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ticket ID
pub type TicketId = i64;

/// Contact (customer) ID
pub type ContactId = i64;

/// Messaging channel ID (e.g. a WhatsApp account)
pub type ChannelId = i64;

/// Tenant ID
pub type CompanyId = i64;

/// Agent (user) ID
pub type UserId = i64;

/// Ticket status
///
/// Only `Open` and `Pending` matter for distribution. Matching is exact, the
/// same way the store filters; anything else (including `"Open"`) is kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TicketStatus {
    Open,
    Pending,
    Closed,
    Other(String),
}

/// Statuses that count towards queue load and block a second ticket
pub const ACTIVE_STATUSES: [TicketStatus; 2] = [TicketStatus::Open, TicketStatus::Pending];

impl TicketStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Closed => "closed",
            TicketStatus::Other(s) => s.as_str(),
        }
    }

    /// Open or pending
    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::Pending)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "pending" => Ok(TicketStatus::Pending),
            "closed" => Ok(TicketStatus::Closed),
            _ if s.trim().is_empty() => Err(DomainError::InvalidStatus(s.to_string())),
            _ => Ok(TicketStatus::Other(s.to_string())),
        }
    }
}

impl From<TicketStatus> for String {
    fn from(status: TicketStatus) -> Self {
        status.as_str().to_string()
    }
}

impl TryFrom<String> for TicketStatus {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Ticket Entity (read model for distribution)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub status: TicketStatus,
    pub queue_id: Option<QueueId>,
    pub contact_id: ContactId,
    pub channel_id: ChannelId,
    pub company_id: CompanyId,
}

impl Ticket {
    /// Create a new unassigned ticket
    pub fn new(
        id: TicketId,
        status: TicketStatus,
        contact_id: ContactId,
        channel_id: ChannelId,
        company_id: CompanyId,
    ) -> Self {
        Self {
            id,
            status,
            queue_id: None,
            contact_id,
            channel_id,
            company_id,
        }
    }

    /// Builder-style queue assignment (for seeding and tests)
    pub fn in_queue(mut self, queue_id: QueueId) -> Self {
        self.queue_id = Some(queue_id);
        self
    }
}

/// Reject non-positive identifiers
///
/// Identifiers come from an auto-increment store, so zero or negative values
/// mean the caller passed a default instead of a real id.
pub fn ensure_id(field: &'static str, value: i64) -> Result<i64> {
    if value <= 0 {
        return Err(DomainError::InvalidIdentifier { field, value });
    }
    Ok(value)
}
