//! Itinerary numbers and booking reference codes.

use store::Numerator;

use crate::error::DomainError;

/// Service type prefix of accommodation bookings.
pub const ACCOMMODATION_SERVICE_TYPE: &str = "HTL";

const ITN_SEQUENCE: &str = "itinerary_number";

/// Mints itinerary numbers and reference codes from monotonic counters.
///
/// Reference codes look like `HTL-AE-0000042-03`: service type, country,
/// itinerary number and a per-itinerary counter, so two bookings sharing an
/// itinerary never collide.
#[derive(Debug, Clone)]
pub struct ReferenceCodeGenerator<N: Numerator> {
    numerator: N,
}

impl<N: Numerator> ReferenceCodeGenerator<N> {
    pub fn new(numerator: N) -> Self {
        Self { numerator }
    }

    pub async fn generate_itn(&self) -> Result<String, DomainError> {
        let next = self.numerator.next(ITN_SEQUENCE).await?;
        Ok(format!("{next:07}"))
    }

    pub async fn generate(&self, country_code: &str, itn: &str) -> Result<String, DomainError> {
        if country_code.is_empty() {
            return Err(DomainError::Validation("Country code is required".to_string()));
        }
        if !is_valid_itn(itn) {
            return Err(DomainError::Validation(format!("Invalid itinerary number {itn}")));
        }

        let counter = self.numerator.next(&format!("itn:{itn}")).await?;
        Ok(format!(
            "{ACCOMMODATION_SERVICE_TYPE}-{}-{itn}-{counter:02}",
            country_code.to_uppercase()
        ))
    }
}

fn is_valid_itn(itn: &str) -> bool {
    !itn.is_empty() && itn.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Extracts the itinerary number from a reference code, if the value is one.
pub fn itn_from_reference_code(value: &str) -> Option<&str> {
    let mut parts = value.split('-');
    let service_type = parts.next()?;
    let country = parts.next()?;
    let itn = parts.next()?;
    let counter = parts.next()?;

    let is_reference_code = service_type == ACCOMMODATION_SERVICE_TYPE
        && country.len() == 2
        && is_valid_itn(itn)
        && !counter.is_empty()
        && counter.chars().all(|c| c.is_ascii_digit())
        && parts.next().is_none();
    is_reference_code.then_some(itn)
}
