//! Markup policies and their resolution into pricing functions.

mod manager;
mod policy;
mod resolution;
mod template;

pub use manager::MarkupPolicyManager;
pub use policy::{MarkupPolicy, MarkupPolicyData, MarkupPolicyScope, MarkupPolicyTarget, MarkupScopeType};
pub use resolution::{AppliedMarkup, Markup, MarkupResolutionEngine, compose, order_policies};
pub use template::{
    ADDITION_TEMPLATE_ID, MULTIPLIER_TEMPLATE_ID, MarkupTemplate, PriceFunction, TemplateSettings, create_expression,
};

use thiserror::Error;

/// Errors that can occur during markup policy operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("Could not find template by id {0}")]
    TemplateNotFound(i32),

    #[error("Invalid template settings")]
    InvalidTemplateSettings,

    /// Scope or target checks failed.
    #[error("{0}")]
    Validation(String),

    #[error("Could not find policy")]
    PolicyNotFound,

    /// Another active policy of the scope already uses the order.
    #[error("Policy with same order is already defined")]
    DuplicateOrder,
}
