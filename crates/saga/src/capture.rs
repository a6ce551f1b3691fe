//! Capture of authorized card payments once bookings can no longer be
//! cancelled for free.

use chrono::{DateTime, Utc};
use domain::{Booking, Payment, PaymentStatus};
use serde::Serialize;
use store::{Journal, KeyedStore, Numerator};

use crate::coordinator::BookingRegistrationSaga;
use crate::error::Result;
use crate::events::SagaEvent;

/// Result of capturing one booking's payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureOutcome {
    pub booking_id: i64,
    pub reference_code: Option<String>,
    pub status: Option<PaymentStatus>,
    pub error: Option<String>,
}

impl CaptureOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl<B, P, J, N> BookingRegistrationSaga<B, P, J, N>
where
    B: KeyedStore<i64, Booking> + Clone,
    P: KeyedStore<String, Payment>,
    J: Journal<SagaEvent>,
    N: Numerator + Clone,
{
    /// Ids of confirmed card bookings with an authorized payment whose
    /// `deadline ?? check_in` is at or before `date`.
    pub async fn get_for_capture(&self, date: DateTime<Utc>) -> Result<Vec<i64>> {
        self.bookings.ids_for_capture(date).await
    }

    /// Captures each booking's payment. One failure does not stop the rest.
    #[tracing::instrument(skip(self, booking_ids), fields(count = booking_ids.len()))]
    pub async fn capture(&self, booking_ids: &[i64]) -> Vec<CaptureOutcome> {
        let mut outcomes = Vec::with_capacity(booking_ids.len());
        for &booking_id in booking_ids {
            let mut outcome = CaptureOutcome {
                booking_id,
                reference_code: None,
                status: None,
                error: None,
            };

            let captured = match self.bookings.get(booking_id).await {
                Ok(booking) => {
                    outcome.reference_code = Some(booking.reference_code.clone());
                    self.payments.capture(&booking.reference_code).await
                }
                Err(error) => Err(error),
            };
            match captured {
                Ok(payment) => outcome.status = Some(payment.status),
                Err(error) => {
                    tracing::warn!(booking_id, %error, "capture failed");
                    outcome.error = Some(error.to_string());
                }
            }
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|outcome| !outcome.is_success()).count();
        tracing::info!(captured = outcomes.len() - failed, failed, "capture finished");
        outcomes
    }
}
