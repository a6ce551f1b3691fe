//! Explicit agent context and payment methods.

use serde::{Deserialize, Serialize};

use crate::money::Currency;
use crate::types::{AgencyId, AgentId, CounterpartyId};

/// The agent on whose behalf an operation runs.
///
/// Passed explicitly through search and booking calls; nothing in the core
/// resolves the current agent implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentContext {
    pub agent_id: AgentId,
    pub agency_id: AgencyId,
    pub counterparty_id: CounterpartyId,
    /// Currency the agent is shown and charged in.
    #[serde(default)]
    pub currency: Currency,
}

impl AgentContext {
    pub fn new(agent_id: AgentId, agency_id: AgencyId, counterparty_id: CounterpartyId) -> Self {
        Self {
            agent_id,
            agency_id,
            counterparty_id,
            currency: Currency::default(),
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }
}

/// How an agent pays for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    BankTransfer,
    CreditCard,
    Offline,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "BankTransfer",
            PaymentMethod::CreditCard => "CreditCard",
            PaymentMethod::Offline => "Offline",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
