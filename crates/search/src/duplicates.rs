//! Registry of accommodation duplicate reports.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use common::AgentContext;
use dashmap::DashMap;
use domain::{AccommodationDuplicateReport, DuplicateReportState, SupplierAccommodationId};

use crate::error::{Result, SearchError};

/// Duplicate reports, readable by the merge step of every search.
#[derive(Debug, Clone, Default)]
pub struct DuplicateRegistry {
    reports: Arc<DashMap<i64, AccommodationDuplicateReport>>,
    next_id: Arc<AtomicI64>,
}

impl DuplicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files a report that the given accommodations are the same property.
    ///
    /// The report starts as `PendingApproval` and already applies to the
    /// reporting agent.
    #[tracing::instrument(skip(self, accommodations), fields(agent_id = %agent.agent_id))]
    pub fn report(
        &self,
        agent: &AgentContext,
        mut accommodations: Vec<SupplierAccommodationId>,
    ) -> Result<AccommodationDuplicateReport> {
        accommodations.sort();
        accommodations.dedup();
        if accommodations.len() < 2 {
            return Err(SearchError::Validation(
                "A duplicate report needs at least two accommodations".to_string(),
            ));
        }

        let now = Utc::now();
        let report = AccommodationDuplicateReport {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            reporter_agent_id: agent.agent_id,
            reporter_agency_id: agent.agency_id,
            state: DuplicateReportState::PendingApproval,
            accommodations,
            created: now,
            modified: now,
        };
        self.reports.insert(report.id, report.clone());
        tracing::info!(report_id = report.id, "duplicate report filed");
        Ok(report)
    }

    pub fn approve(&self, report_id: i64) -> Result<AccommodationDuplicateReport> {
        self.set_state(report_id, DuplicateReportState::Approved)
    }

    pub fn disapprove(&self, report_id: i64) -> Result<AccommodationDuplicateReport> {
        self.set_state(report_id, DuplicateReportState::Disapproved)
    }

    pub fn get(&self, report_id: i64) -> Option<AccommodationDuplicateReport> {
        self.reports.get(&report_id).map(|report| report.clone())
    }

    /// Builds the lookup used to merge results for `agent`.
    pub fn index_for(&self, agent: &AgentContext) -> DuplicateIndex {
        let mut groups: HashMap<SupplierAccommodationId, Vec<i64>> = HashMap::new();
        for report in self.reports.iter().filter(|report| report.applies_to(agent)) {
            for accommodation in &report.accommodations {
                groups.entry(accommodation.clone()).or_default().push(report.id);
            }
        }
        DuplicateIndex { groups }
    }

    fn set_state(&self, report_id: i64, state: DuplicateReportState) -> Result<AccommodationDuplicateReport> {
        let mut report = self
            .reports
            .get_mut(&report_id)
            .ok_or_else(|| SearchError::NotFound(format!("duplicate report {report_id}")))?;
        report.state = state;
        report.modified = Utc::now();
        tracing::info!(report_id, state = ?state, "duplicate report reviewed");
        Ok(report.clone())
    }
}

/// Which reports each supplier accommodation belongs to.
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    groups: HashMap<SupplierAccommodationId, Vec<i64>>,
}

impl DuplicateIndex {
    pub fn reports_for(&self, accommodation: &SupplierAccommodationId) -> &[i64] {
        self.groups.get(accommodation).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
