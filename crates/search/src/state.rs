//! Per-supplier search progress and its aggregate.

use common::{SearchId, Supplier};
use serde::{Deserialize, Serialize};

/// Progress of one supplier within a search.
///
/// ```text
/// Pending ──┬──► Completed
///           └──► Failed(error)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "error")]
pub enum SupplierSearchStatus {
    #[default]
    Pending,
    Completed,
    Failed(String),
}

impl SupplierSearchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SupplierSearchStatus::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SupplierSearchStatus::Failed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SupplierSearchStatus::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierSearchState {
    pub supplier: Supplier,
    pub status: SupplierSearchStatus,
    pub result_count: usize,
}

impl SupplierSearchState {
    pub fn pending(supplier: Supplier) -> Self {
        Self {
            supplier,
            status: SupplierSearchStatus::Pending,
            result_count: 0,
        }
    }

    pub fn completed(supplier: Supplier, result_count: usize) -> Self {
        Self {
            supplier,
            status: SupplierSearchStatus::Completed,
            result_count,
        }
    }

    pub fn failed(supplier: Supplier, error: impl Into<String>) -> Self {
        Self {
            supplier,
            status: SupplierSearchStatus::Failed(error.into()),
            result_count: 0,
        }
    }
}

/// Aggregate status of a search across its suppliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStatus {
    Pending,
    PartiallyCompleted,
    Completed,
    Failed,
}

impl SearchStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, SearchStatus::Completed | SearchStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Pending => "Pending",
            SearchStatus::PartiallyCompleted => "PartiallyCompleted",
            SearchStatus::Completed => "Completed",
            SearchStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    pub search_id: SearchId,
    pub status: SearchStatus,
    pub result_count: usize,
    /// Failed suppliers' errors joined with `"; "`, in supplier order.
    pub error: Option<String>,
    pub suppliers: Vec<SupplierSearchState>,
}

impl SearchState {
    /// Reduces per-supplier states into the search state.
    ///
    /// The reduction does not depend on the order `states` arrive in.
    pub fn aggregate(search_id: SearchId, mut states: Vec<SupplierSearchState>) -> Self {
        states.sort_by_key(|state| state.supplier);

        let terminal = states.iter().filter(|state| state.status.is_terminal()).count();
        let failed = states.iter().filter(|state| state.status.is_failed()).count();
        let status = if terminal == 0 {
            SearchStatus::Pending
        } else if terminal < states.len() {
            SearchStatus::PartiallyCompleted
        } else if failed == states.len() {
            SearchStatus::Failed
        } else {
            SearchStatus::Completed
        };

        let errors: Vec<&str> = states.iter().filter_map(|state| state.status.error()).collect();
        let error = (!errors.is_empty()).then(|| errors.join("; "));

        Self {
            search_id,
            status,
            result_count: states.iter().map(|state| state.result_count).sum(),
            error,
            suppliers: states,
        }
    }
}
