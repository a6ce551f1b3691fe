//! Markup policy records and scopes.

use chrono::{DateTime, Utc};
use common::{AgentContext, Currency};
use serde::{Deserialize, Serialize};

use super::MarkupError;
use super::template::{MarkupTemplate, TemplateSettings};

/// Scope kinds, listed from least to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarkupScopeType {
    Global,
    Counterparty,
    Agency,
    Agent,
    /// Markup an agent applies on top of its own prices for end clients.
    EndClient,
}

impl MarkupScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkupScopeType::Global => "Global",
            MarkupScopeType::Counterparty => "Counterparty",
            MarkupScopeType::Agency => "Agency",
            MarkupScopeType::Agent => "Agent",
            MarkupScopeType::EndClient => "EndClient",
        }
    }
}

impl std::fmt::Display for MarkupScopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a policy applies: a scope kind plus the id of the scoped entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkupPolicyScope {
    pub scope_type: MarkupScopeType,
    #[serde(default)]
    pub scope_id: Option<i32>,
}

impl MarkupPolicyScope {
    pub fn global() -> Self {
        Self {
            scope_type: MarkupScopeType::Global,
            scope_id: None,
        }
    }

    pub fn new(scope_type: MarkupScopeType, scope_id: i32) -> Self {
        Self {
            scope_type,
            scope_id: Some(scope_id),
        }
    }

    /// Global scopes carry no id; every other scope needs one.
    pub fn validate(&self) -> Result<(), MarkupError> {
        match (self.scope_type, self.scope_id) {
            (MarkupScopeType::Global, None) => Ok(()),
            (MarkupScopeType::Global, Some(_)) => Err(MarkupError::Validation(
                "Global scope must not have a scope id".to_string(),
            )),
            (_, None) => Err(MarkupError::Validation(format!(
                "Scope id is required for {} scope",
                self.scope_type
            ))),
            (_, Some(_)) => Ok(()),
        }
    }

    /// Returns true if the policy scope covers the agent.
    pub fn applies_to(&self, agent: &AgentContext) -> bool {
        match self.scope_type {
            MarkupScopeType::Global => true,
            MarkupScopeType::Counterparty => self.scope_id == Some(agent.counterparty_id.value()),
            MarkupScopeType::Agency => self.scope_id == Some(agent.agency_id.value()),
            MarkupScopeType::Agent | MarkupScopeType::EndClient => self.scope_id == Some(agent.agent_id.value()),
        }
    }
}

impl std::fmt::Display for MarkupPolicyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scope_id {
            Some(id) => write!(f, "{}({})", self.scope_type, id),
            None => write!(f, "{}", self.scope_type),
        }
    }
}

/// What kind of prices a policy marks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MarkupPolicyTarget {
    #[default]
    NotSpecified,
    AccommodationAvailability,
}

/// Policy fields supplied when adding or modifying a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupPolicyData {
    pub scope: MarkupPolicyScope,
    pub target: MarkupPolicyTarget,
    pub order: i32,
    pub template_id: i32,
    pub settings: TemplateSettings,
    pub currency: Currency,
    #[serde(default)]
    pub description: String,
}

impl MarkupPolicyData {
    /// Validates everything that can be checked without other policies.
    pub fn validate(&self) -> Result<(), MarkupError> {
        let template = MarkupTemplate::by_id(self.template_id)?;
        if !template.is_valid(&self.settings) {
            return Err(MarkupError::InvalidTemplateSettings);
        }
        self.scope.validate()?;
        if self.target == MarkupPolicyTarget::NotSpecified {
            return Err(MarkupError::Validation("Policy target must be specified".to_string()));
        }
        Ok(())
    }
}

/// A stored markup policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupPolicy {
    pub id: i64,
    #[serde(flatten)]
    pub data: MarkupPolicyData,
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}
