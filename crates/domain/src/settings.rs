//! Accommodation booking settings and their merge across scopes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{AgencyId, AgentContext, AgentId, CounterpartyId, PaymentMethod, Supplier};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use store::TtlCache;

/// Who may book advance-purchase-rate offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AprMode {
    Hide,
    #[default]
    DisplayOnly,
    CardPurchasesOnly,
    CardAndAccountPurchases,
}

/// Who may book offers whose cancellation deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PassedDeadlineOffersMode {
    Hide,
    #[default]
    DisplayOnly,
    CardPurchasesOnly,
    CardAndAccountPurchases,
}

/// Shared permission check for the APR and passed-deadline modes.
fn permits(card_only: bool, card_and_account: bool, method: PaymentMethod) -> bool {
    card_and_account || (card_only && method == PaymentMethod::CreditCard)
}

impl AprMode {
    pub fn permits(&self, method: PaymentMethod) -> bool {
        permits(
            *self == AprMode::CardPurchasesOnly,
            *self == AprMode::CardAndAccountPurchases,
            method,
        )
    }
}

impl PassedDeadlineOffersMode {
    pub fn permits(&self, method: PaymentMethod) -> bool {
        permits(
            *self == PassedDeadlineOffersMode::CardPurchasesOnly,
            *self == PassedDeadlineOffersMode::CardAndAccountPurchases,
            method,
        )
    }
}

/// Settings stored for one scope. Unset single-valued fields defer to the
/// next, less specific scope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopeBookingSettings {
    #[serde(default)]
    pub enabled_suppliers: Option<Vec<Supplier>>,
    #[serde(default)]
    pub apr_mode: Option<AprMode>,
    #[serde(default)]
    pub passed_deadline_offers_mode: Option<PassedDeadlineOffersMode>,
    #[serde(default)]
    pub is_markup_disabled: bool,
    #[serde(default)]
    pub is_supplier_visible: bool,
}

/// Effective settings for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccommodationBookingSettings {
    pub enabled_suppliers: Vec<Supplier>,
    pub apr_mode: AprMode,
    pub passed_deadline_offers_mode: PassedDeadlineOffersMode,
    pub is_markup_disabled: bool,
    pub is_supplier_visible: bool,
}

/// Merges scope settings ordered most specific first.
///
/// The first scope that sets a single-valued field wins; boolean
/// restrictions are OR-ed across all scopes.
pub fn merge_settings<'a>(
    scopes: impl IntoIterator<Item = &'a ScopeBookingSettings>,
    default_suppliers: &[Supplier],
) -> AccommodationBookingSettings {
    let mut enabled_suppliers = None;
    let mut apr_mode = None;
    let mut passed_deadline_offers_mode = None;
    let mut is_markup_disabled = false;
    let mut is_supplier_visible = false;

    for scope in scopes {
        if enabled_suppliers.is_none() {
            enabled_suppliers = scope.enabled_suppliers.clone();
        }
        apr_mode = apr_mode.or(scope.apr_mode);
        passed_deadline_offers_mode = passed_deadline_offers_mode.or(scope.passed_deadline_offers_mode);
        is_markup_disabled |= scope.is_markup_disabled;
        is_supplier_visible |= scope.is_supplier_visible;
    }

    AccommodationBookingSettings {
        enabled_suppliers: enabled_suppliers.unwrap_or_else(|| default_suppliers.to_vec()),
        apr_mode: apr_mode.unwrap_or_default(),
        passed_deadline_offers_mode: passed_deadline_offers_mode.unwrap_or_default(),
        is_markup_disabled,
        is_supplier_visible,
    }
}

#[derive(Debug, Default)]
struct SettingsTable {
    agents: HashMap<AgentId, ScopeBookingSettings>,
    agencies: HashMap<AgencyId, ScopeBookingSettings>,
    counterparties: HashMap<CounterpartyId, ScopeBookingSettings>,
}

/// Resolves and caches the effective booking settings of agents.
#[derive(Debug, Clone)]
pub struct BookingSettingsService {
    table: Arc<RwLock<SettingsTable>>,
    cache: TtlCache<AgentId, AccommodationBookingSettings>,
    default_suppliers: Arc<Vec<Supplier>>,
}

impl Default for BookingSettingsService {
    fn default() -> Self {
        Self::new(Supplier::ALL.to_vec(), Duration::from_secs(300))
    }
}

impl BookingSettingsService {
    pub fn new(default_suppliers: Vec<Supplier>, cache_ttl: Duration) -> Self {
        Self {
            table: Arc::default(),
            cache: TtlCache::new(cache_ttl),
            default_suppliers: Arc::new(default_suppliers),
        }
    }

    pub fn set_agent_settings(&self, agent_id: AgentId, settings: ScopeBookingSettings) {
        self.table.write().agents.insert(agent_id, settings);
        self.cache.remove(&agent_id);
    }

    /// Stores agency settings. Cached merges of the agency's agents refresh
    /// when their cache entries expire.
    pub fn set_agency_settings(&self, agency_id: AgencyId, settings: ScopeBookingSettings) {
        self.table.write().agencies.insert(agency_id, settings);
    }

    pub fn set_counterparty_settings(&self, counterparty_id: CounterpartyId, settings: ScopeBookingSettings) {
        self.table.write().counterparties.insert(counterparty_id, settings);
    }

    /// Effective settings of the agent, cached per agent.
    pub fn get(&self, agent: &AgentContext) -> AccommodationBookingSettings {
        self.cache.get_or_insert_with(agent.agent_id, || self.merge_for(agent))
    }

    fn merge_for(&self, agent: &AgentContext) -> AccommodationBookingSettings {
        let table = self.table.read();
        let scopes = [
            table.agents.get(&agent.agent_id),
            table.agencies.get(&agent.agency_id),
            table.counterparties.get(&agent.counterparty_id),
        ];
        merge_settings(scopes.into_iter().flatten(), &self.default_suppliers)
    }
}
