//! Booking row access shared by the saga and the payment controller.

use chrono::{DateTime, Utc};
use common::{AgencyId, PaymentMethod};
use domain::{Booking, BookingStatus, PaymentStatus};
use store::{KeyedStore, StoreError};

use crate::error::{Result, SagaError};

/// Attempts made by [`BookingRecords::modify`] before a version conflict is
/// returned to the caller.
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Booking rows keyed by booking id.
#[derive(Debug, Clone)]
pub struct BookingRecords<B> {
    store: B,
}

impl<B> BookingRecords<B>
where
    B: KeyedStore<i64, Booking>,
{
    pub fn new(store: B) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: i64) -> Result<Booking> {
        self.store
            .get(&id)
            .await?
            .map(|row| row.value)
            .ok_or_else(|| SagaError::BookingNotFound(id.to_string()))
    }

    pub async fn find_by_reference(&self, reference_code: &str) -> Result<Booking> {
        let id = self.id_of(reference_code).await?;
        self.get(id).await
    }

    pub async fn insert(&self, booking: Booking) -> Result<()> {
        self.store.insert(booking.id, booking).await?;
        Ok(())
    }

    /// Applies `change` to the booking and writes it back against the
    /// version it was read at. On a version conflict the row is re-read and
    /// `change` runs again.
    pub async fn modify<T, F>(&self, reference_code: &str, mut change: F) -> Result<(Booking, T)>
    where
        F: FnMut(&mut Booking) -> Result<T> + Send,
        T: Send,
    {
        let id = self.id_of(reference_code).await?;
        let mut attempt = 1;
        loop {
            let row = self
                .store
                .get(&id)
                .await?
                .ok_or_else(|| SagaError::BookingNotFound(reference_code.to_string()))?;

            let mut booking = row.value;
            let output = change(&mut booking)?;
            match self.store.update(&id, booking.clone(), row.version).await {
                Ok(_) => return Ok((booking, output)),
                Err(StoreError::ConcurrencyConflict { .. }) if attempt < MAX_UPDATE_ATTEMPTS => {
                    tracing::debug!(reference_code, attempt, "booking row changed concurrently, retrying");
                    attempt += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    pub async fn set_payment_status(&self, reference_code: &str, status: PaymentStatus) -> Result<Booking> {
        let (booking, ()) = self
            .modify(reference_code, |booking| {
                booking.payment_status = status;
                Ok(())
            })
            .await?;
        Ok(booking)
    }

    /// Returns true if the agency has at least one booking on the itinerary.
    pub async fn has_itinerary(&self, agency_id: AgencyId, itinerary_number: &str) -> Result<bool> {
        let rows = self
            .store
            .scan(&|_, booking: &Booking| {
                booking.agency_id == agency_id && booking.itinerary_number == itinerary_number
            })
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn for_agency(&self, agency_id: AgencyId) -> Result<Vec<Booking>> {
        let rows = self
            .store
            .scan(&|_, booking: &Booking| booking.agency_id == agency_id)
            .await?;
        Ok(rows.into_iter().map(|(_, row)| row.value).collect())
    }

    /// Ids of confirmed card bookings with an authorized payment whose
    /// deadline is at or before `date`, ascending.
    pub async fn ids_for_capture(&self, date: DateTime<Utc>) -> Result<Vec<i64>> {
        let rows = self
            .store
            .scan(&|_, booking: &Booking| {
                booking.status == BookingStatus::Confirmed
                    && booking.payment_status == PaymentStatus::Authorized
                    && booking.payment_method == PaymentMethod::CreditCard
                    && booking.effective_deadline() <= date
            })
            .await?;
        let mut ids: Vec<_> = rows.into_iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn id_of(&self, reference_code: &str) -> Result<i64> {
        let rows = self
            .store
            .scan(&|_, booking: &Booking| booking.reference_code == reference_code)
            .await?;

        match rows.as_slice() {
            [] => Err(SagaError::BookingNotFound(reference_code.to_string())),
            [(id, _)] => Ok(*id),
            [(id, _), ..] => {
                tracing::error!(reference_code, count = rows.len(), "reference code is not unique");
                Ok(*id)
            }
        }
    }
}
