//! Markup policy storage with validation.

use chrono::Utc;
use common::AgentContext;
use store::{KeyedStore, Numerator};

use super::MarkupError;
use super::policy::{MarkupPolicy, MarkupPolicyData, MarkupPolicyScope, MarkupPolicyTarget};
use crate::error::DomainError;

const POLICY_SEQUENCE: &str = "markup_policy";

impl From<MarkupError> for DomainError {
    fn from(error: MarkupError) -> Self {
        DomainError::Markup(error)
    }
}

/// Adds, modifies, removes and lists markup policies.
///
/// Policies are validated against their template before they are stored, and
/// no two active policies of one scope may share an order.
pub struct MarkupPolicyManager<S, N>
where
    S: KeyedStore<i64, MarkupPolicy>,
    N: Numerator,
{
    store: S,
    numerator: N,
}

impl<S, N> MarkupPolicyManager<S, N>
where
    S: KeyedStore<i64, MarkupPolicy>,
    N: Numerator,
{
    pub fn new(store: S, numerator: N) -> Self {
        Self { store, numerator }
    }

    #[tracing::instrument(skip(self, data), fields(scope = %data.scope, order = data.order))]
    pub async fn add(&self, data: MarkupPolicyData) -> Result<MarkupPolicy, DomainError> {
        data.validate()?;
        self.ensure_order_is_free(&data, None).await?;

        let id = self.numerator.next(POLICY_SEQUENCE).await?;
        let now = Utc::now();
        let policy = MarkupPolicy {
            id,
            data,
            is_active: true,
            created: now,
            modified: now,
        };
        self.store.insert(id, policy.clone()).await?;

        tracing::info!(policy_id = id, "markup policy added");
        Ok(policy)
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn modify(&self, policy_id: i64, data: MarkupPolicyData) -> Result<MarkupPolicy, DomainError> {
        let row = self.active_policy(policy_id).await?;
        data.validate()?;
        if data.scope != row.value.data.scope {
            return Err(MarkupError::Validation("Policy scope cannot be changed".to_string()).into());
        }
        self.ensure_order_is_free(&data, Some(policy_id)).await?;

        let policy = MarkupPolicy {
            data,
            modified: Utc::now(),
            ..row.value
        };
        self.store.update(&policy_id, policy.clone(), row.version).await?;
        Ok(policy)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, policy_id: i64) -> Result<(), DomainError> {
        let row = self.active_policy(policy_id).await?;
        let policy = MarkupPolicy {
            is_active: false,
            modified: Utc::now(),
            ..row.value
        };
        self.store.update(&policy_id, policy, row.version).await?;
        tracing::info!(policy_id, "markup policy removed");
        Ok(())
    }

    /// Active policies of exactly this scope, ordered by `order`.
    pub async fn get(&self, scope: MarkupPolicyScope) -> Result<Vec<MarkupPolicy>, DomainError> {
        let mut policies: Vec<_> = self
            .store
            .scan(&|_, policy: &MarkupPolicy| policy.is_active && policy.data.scope == scope)
            .await?
            .into_iter()
            .map(|(_, row)| row.value)
            .collect();
        policies.sort_by_key(|policy| policy.data.order);
        Ok(policies)
    }

    /// Active policies of `target` whose scope covers the agent.
    pub async fn get_for_agent(
        &self,
        agent: &AgentContext,
        target: MarkupPolicyTarget,
    ) -> Result<Vec<MarkupPolicy>, DomainError> {
        let agent = *agent;
        let rows = self
            .store
            .scan(&move |_, policy: &MarkupPolicy| {
                policy.is_active && policy.data.target == target && policy.data.scope.applies_to(&agent)
            })
            .await?;
        Ok(rows.into_iter().map(|(_, row)| row.value).collect())
    }

    async fn active_policy(&self, policy_id: i64) -> Result<store::Versioned<MarkupPolicy>, DomainError> {
        match self.store.get(&policy_id).await? {
            Some(row) if row.value.is_active => Ok(row),
            _ => Err(MarkupError::PolicyNotFound.into()),
        }
    }

    async fn ensure_order_is_free(&self, data: &MarkupPolicyData, except: Option<i64>) -> Result<(), DomainError> {
        let taken = self
            .get(data.scope)
            .await?
            .iter()
            .any(|policy| policy.data.order == data.order && Some(policy.id) != except);
        if taken {
            return Err(MarkupError::DuplicateOrder.into());
        }
        Ok(())
    }
}
