//! Supplier status updates pushed after booking.

use common::Supplier;
use domain::{Booking, Payment, SupplierResponseOutcome};
use serde_json::Value;
use store::{Journal, KeyedStore, Numerator};

use crate::booking_registration::{SAGA_LOCK_ENTITY, STEP_BOOK_ON_SUPPLIER};
use crate::coordinator::BookingRegistrationSaga;
use crate::error::{Result, SagaError};
use crate::events::SagaEvent;

impl<B, P, J, N> BookingRegistrationSaga<B, P, J, N>
where
    B: KeyedStore<i64, Booking> + Clone,
    P: KeyedStore<String, Payment>,
    J: Journal<SagaEvent>,
    N: Numerator + Clone,
{
    /// Applies a supplier's booking status update.
    ///
    /// The answer goes through the same transition as a synchronous booking
    /// response, then the waiting saga run is settled. Answers that do not
    /// change the booking are acknowledged without side effects. The update
    /// waits for any saga run already in progress on the booking.
    #[tracing::instrument(skip(self, payload))]
    pub async fn process_supplier_webhook(&self, supplier: Supplier, payload: &Value) -> Result<Booking> {
        if !supplier.is_asynchronous() {
            return Err(SagaError::Validation(format!("{supplier} isn't asynchronous")));
        }

        let connector = self.services.connectors.get(supplier)?;
        let response = connector.parse_webhook(payload)?;
        let reference_code = response.reference_code.clone();

        let booking = self.bookings.find_by_reference(&reference_code).await?;
        if booking.supplier != supplier {
            tracing::error!(%reference_code, booked_with = %booking.supplier, "webhook from a different supplier");
            return Err(SagaError::Validation(format!(
                "Booking {reference_code} is not booked with {supplier}"
            )));
        }

        self.locker
            .run_locked(SAGA_LOCK_ENTITY, &reference_code, || async {
                let (booking, outcome) = self.apply_response(&reference_code, &response).await?;
                self.settle_webhook(&reference_code, booking, outcome, response.supplier_reference.clone())
                    .await
            })
            .await
    }

    async fn settle_webhook(
        &self,
        reference_code: &str,
        booking: Booking,
        outcome: SupplierResponseOutcome,
        supplier_reference: String,
    ) -> Result<Booking> {
        match outcome {
            SupplierResponseOutcome::Ignored => {
                tracing::info!(%reference_code, status = %booking.status, "ignoring update for a terminal booking");
                Ok(booking)
            }
            SupplierResponseOutcome::Applied { previous, current } if previous == current => {
                tracing::debug!(%reference_code, status = %current, "supplier repeated the booking status");
                Ok(booking)
            }
            SupplierResponseOutcome::Applied { previous, current } => {
                tracing::info!(%reference_code, %previous, %current, "supplier status applied");
                let mut run = self.resume_run(reference_code).await?;
                let supplier_reference = Some(supplier_reference).filter(|reference| !reference.is_empty());
                self.record(&mut run, SagaEvent::step_completed(STEP_BOOK_ON_SUPPLIER, supplier_reference))
                    .await?;
                self.settle(&mut run, booking).await
            }
        }
    }
}
