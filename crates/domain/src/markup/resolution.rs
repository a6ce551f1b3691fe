//! Resolution of an agent's policy chain into one pricing function.

use std::sync::Arc;

use common::{AgentContext, Currency, Decimal, Money};
use serde::{Deserialize, Serialize};
use store::{KeyedStore, Numerator};

use super::manager::MarkupPolicyManager;
use super::policy::{MarkupPolicy, MarkupPolicyScope, MarkupPolicyTarget};
use super::template::{PriceFunction, TemplateSettings, create_expression};
use crate::currency::CurrencyConverter;
use crate::error::DomainError;
use crate::settings::BookingSettingsService;

/// Audit record of one policy used to price an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMarkup {
    pub policy_id: i64,
    pub scope: MarkupPolicyScope,
    pub order: i32,
    pub template_id: i32,
    pub settings: TemplateSettings,
    pub currency: Currency,
    #[serde(default)]
    pub description: String,
}

impl From<&MarkupPolicy> for AppliedMarkup {
    fn from(policy: &MarkupPolicy) -> Self {
        Self {
            policy_id: policy.id,
            scope: policy.data.scope,
            order: policy.data.order,
            template_id: policy.data.template_id,
            settings: policy.data.settings.clone(),
            currency: policy.data.currency,
            description: policy.data.description.clone(),
        }
    }
}

/// The effective markup for one agent: a composed function plus the
/// ordered list of policies it was built from.
#[derive(Clone)]
pub struct Markup {
    function: PriceFunction,
    applied: Vec<AppliedMarkup>,
}

impl std::fmt::Debug for Markup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Markup").field("applied", &self.applied).finish()
    }
}

impl Markup {
    pub fn identity() -> Self {
        Self {
            function: Arc::new(|price| price),
            applied: Vec::new(),
        }
    }

    pub fn apply(&self, price: Money) -> Money {
        (self.function)(price)
    }

    /// Resolved policies, most specific scope first.
    pub fn applied_policies(&self) -> &[AppliedMarkup] {
        &self.applied
    }
}

/// Orders policies most specific scope first, then by `order` within a scope.
pub fn order_policies(mut policies: Vec<MarkupPolicy>) -> Vec<MarkupPolicy> {
    policies.sort_by(|a, b| {
        b.data
            .scope
            .scope_type
            .cmp(&a.data.scope.scope_type)
            .then(a.data.order.cmp(&b.data.order))
            .then(a.id.cmp(&b.id))
    });
    policies
}

/// Composes policy functions given most specific first.
///
/// The least specific function is applied to the raw price first, so the
/// global markup is the base the agency and agent markups build on.
pub fn compose(functions: Vec<PriceFunction>) -> PriceFunction {
    Arc::new(move |price| functions.iter().rev().fold(price, |price, function| function(price)))
}

/// Resolves the markup an agent sees.
pub struct MarkupResolutionEngine<S, N, C>
where
    S: KeyedStore<i64, MarkupPolicy>,
    N: Numerator,
    C: CurrencyConverter,
{
    policies: Arc<MarkupPolicyManager<S, N>>,
    settings: BookingSettingsService,
    converter: C,
}

impl<S, N, C> MarkupResolutionEngine<S, N, C>
where
    S: KeyedStore<i64, MarkupPolicy>,
    N: Numerator,
    C: CurrencyConverter,
{
    pub fn new(policies: Arc<MarkupPolicyManager<S, N>>, settings: BookingSettingsService, converter: C) -> Self {
        Self {
            policies,
            settings,
            converter,
        }
    }

    /// Resolves the agent's policies for `target` into one function.
    ///
    /// Returns the identity with an empty audit trail when markups are
    /// disabled for the agent.
    #[tracing::instrument(skip(self), fields(agent_id = %agent.agent_id))]
    pub async fn get(&self, agent: &AgentContext, target: MarkupPolicyTarget) -> Result<Markup, DomainError> {
        if self.settings.get(agent).is_markup_disabled {
            return Ok(Markup::identity());
        }

        let policies = order_policies(self.policies.get_for_agent(agent, target).await?);
        let mut functions = Vec::with_capacity(policies.len());
        let mut applied = Vec::with_capacity(policies.len());
        for policy in &policies {
            let rate = if policy.data.currency == agent.currency {
                Decimal::ONE
            } else {
                self.converter.rate(policy.data.currency, agent.currency).await?
            };
            functions.push(create_expression(policy.data.template_id, &policy.data.settings, rate)?);
            applied.push(AppliedMarkup::from(policy));
        }

        tracing::debug!(policies = applied.len(), "markup resolved");
        Ok(Markup {
            function: compose(functions),
            applied,
        })
    }
}
