//! Markup pricing function templates.

use std::collections::BTreeMap;
use std::sync::Arc;

use common::{Decimal, Money};
use serde::{Deserialize, Serialize};

use super::MarkupError;

/// Composable price transform.
pub type PriceFunction = Arc<dyn Fn(Money) -> Money + Send + Sync>;

/// Named numeric parameters of a policy.
pub type TemplateSettings = BTreeMap<String, Decimal>;

pub const MULTIPLIER_TEMPLATE_ID: i32 = 1;
pub const ADDITION_TEMPLATE_ID: i32 = 2;

const FACTOR_KEY: &str = "Factor";
const ADDITION_KEY: &str = "Addition";

/// A pricing function template selected by a policy's template id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkupTemplate {
    /// `raw * Factor`, with `Factor > 1`.
    Multiplier,
    /// `raw + Addition`, with `Addition > 0`, expressed in the policy currency.
    Addition,
}

impl MarkupTemplate {
    pub fn by_id(id: i32) -> Result<Self, MarkupError> {
        match id {
            MULTIPLIER_TEMPLATE_ID => Ok(MarkupTemplate::Multiplier),
            ADDITION_TEMPLATE_ID => Ok(MarkupTemplate::Addition),
            _ => Err(MarkupError::TemplateNotFound(id)),
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            MarkupTemplate::Multiplier => MULTIPLIER_TEMPLATE_ID,
            MarkupTemplate::Addition => ADDITION_TEMPLATE_ID,
        }
    }

    /// Returns true if the settings are acceptable for this template.
    pub fn is_valid(&self, settings: &TemplateSettings) -> bool {
        if settings.len() != 1 {
            return false;
        }
        match self {
            MarkupTemplate::Multiplier => settings.get(FACTOR_KEY).is_some_and(|factor| *factor > Decimal::ONE),
            MarkupTemplate::Addition => settings
                .get(ADDITION_KEY)
                .is_some_and(|addition| *addition > Decimal::ZERO),
        }
    }

    /// Builds the pricing function.
    ///
    /// `policy_rate` converts amounts in the policy currency into the
    /// currency of the prices being marked up; only additive templates use it.
    pub fn create_function(&self, settings: &TemplateSettings, policy_rate: Decimal) -> Result<PriceFunction, MarkupError> {
        if !self.is_valid(settings) {
            return Err(MarkupError::InvalidTemplateSettings);
        }

        match self {
            MarkupTemplate::Multiplier => {
                let factor = settings
                    .get(FACTOR_KEY)
                    .copied()
                    .ok_or(MarkupError::InvalidTemplateSettings)?;
                Ok(Arc::new(move |price: Money| price.with_amount(price.amount * factor)))
            }
            MarkupTemplate::Addition => {
                let addition = settings
                    .get(ADDITION_KEY)
                    .copied()
                    .ok_or(MarkupError::InvalidTemplateSettings)?
                    * policy_rate;
                Ok(Arc::new(move |price: Money| price.with_amount(price.amount + addition)))
            }
        }
    }
}

/// Builds the function of template `template_id` from `settings`.
pub fn create_expression(template_id: i32, settings: &TemplateSettings, policy_rate: Decimal) -> Result<PriceFunction, MarkupError> {
    MarkupTemplate::by_id(template_id)?.create_function(settings, policy_rate)
}

#[cfg(test)]
mod tests {
    use common::Currency;

    use super::*;

    fn settings(key: &str, value: Decimal) -> TemplateSettings {
        TemplateSettings::from([(key.to_string(), value)])
    }

    #[test]
    fn multiplier_requires_single_factor_above_one() {
        let template = MarkupTemplate::Multiplier;
        assert!(template.is_valid(&settings("Factor", Decimal::new(11, 1))));
        assert!(!template.is_valid(&settings("Factor", Decimal::ONE)));
        assert!(!template.is_valid(&settings("Addition", Decimal::TWO)));
        assert!(!template.is_valid(&TemplateSettings::new()));

        let mut extra = settings("Factor", Decimal::TWO);
        extra.insert("Other".to_string(), Decimal::ONE);
        assert!(!template.is_valid(&extra));
    }

    #[test]
    fn addition_requires_single_positive_amount() {
        let template = MarkupTemplate::Addition;
        assert!(template.is_valid(&settings("Addition", Decimal::new(5, 0))));
        assert!(!template.is_valid(&settings("Addition", Decimal::ZERO)));
        assert!(!template.is_valid(&settings("Addition", Decimal::new(-5, 0))));
    }

    #[test]
    fn multiplier_function_scales_amount() {
        let function = create_expression(1, &settings("Factor", Decimal::new(12, 1)), Decimal::ONE).unwrap();
        let price = Money::from_minor(10000, Currency::Usd);
        assert_eq!(function(price), Money::from_minor(12000, Currency::Usd));
    }

    #[test]
    fn addition_function_converts_policy_amount() {
        let function = create_expression(2, &settings("Addition", Decimal::new(10, 0)), Decimal::new(2, 0)).unwrap();
        let price = Money::from_minor(10000, Currency::Eur);
        assert_eq!(function(price), Money::from_minor(12000, Currency::Eur));
    }

    #[test]
    fn unknown_template_and_invalid_settings() {
        assert_eq!(
            create_expression(9, &settings("Factor", Decimal::TWO), Decimal::ONE).err(),
            Some(MarkupError::TemplateNotFound(9))
        );
        assert_eq!(
            create_expression(1, &settings("Factor", Decimal::ONE), Decimal::ONE).err(),
            Some(MarkupError::InvalidTemplateSettings)
        );
        assert_eq!(MarkupError::TemplateNotFound(9).to_string(), "Could not find template by id 9");
    }
}
