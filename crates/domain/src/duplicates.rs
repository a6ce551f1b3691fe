//! Agent reports of the same accommodation offered by several suppliers.

use chrono::{DateTime, Utc};
use common::{AgencyId, AgentContext, AgentId, Supplier};
use serde::{Deserialize, Serialize};

/// One supplier's id for an accommodation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SupplierAccommodationId {
    pub supplier: Supplier,
    pub accommodation_id: String,
}

impl SupplierAccommodationId {
    pub fn new(supplier: Supplier, accommodation_id: impl Into<String>) -> Self {
        Self {
            supplier,
            accommodation_id: accommodation_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DuplicateReportState {
    #[default]
    PendingApproval,
    Approved,
    Disapproved,
}

/// A claim that several supplier accommodations are the same property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccommodationDuplicateReport {
    pub id: i64,
    pub reporter_agent_id: AgentId,
    pub reporter_agency_id: AgencyId,
    pub state: DuplicateReportState,
    pub accommodations: Vec<SupplierAccommodationId>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl AccommodationDuplicateReport {
    /// Approved reports apply to everybody; the reporter sees its own
    /// reports right away.
    pub fn applies_to(&self, agent: &AgentContext) -> bool {
        match self.state {
            DuplicateReportState::Approved => true,
            DuplicateReportState::PendingApproval => self.reporter_agent_id == agent.agent_id,
            DuplicateReportState::Disapproved => false,
        }
    }
}
