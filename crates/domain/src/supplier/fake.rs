//! In-memory supplier connector.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::Supplier;
use parking_lot::Mutex;

use super::{
    AvailabilityRequest, AvailabilityResponse, SupplierBooking, SupplierBookingRequest, SupplierBookingStatus,
    SupplierConnector, SupplierError,
};
use crate::offer::AvailabilityResult;

#[derive(Debug)]
struct FakeSupplierState {
    results: Vec<AvailabilityResult>,
    latency: Duration,
    cancel_latency: Duration,
    book_status: SupplierBookingStatus,
    fail_on_availability: bool,
    fail_on_book: bool,
    fail_on_cancel: bool,
    availability_calls: usize,
    booked: Vec<SupplierBookingRequest>,
    cancelled: Vec<String>,
    next_id: u32,
}

impl Default for FakeSupplierState {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            latency: Duration::ZERO,
            cancel_latency: Duration::ZERO,
            book_status: SupplierBookingStatus::Confirmed,
            fail_on_availability: false,
            fail_on_book: false,
            fail_on_cancel: false,
            availability_calls: 0,
            booked: Vec::new(),
            cancelled: Vec::new(),
            next_id: 0,
        }
    }
}

/// Supplier connector for tests and local runs.
///
/// Serves a fixed list of availability results, optionally after a delay,
/// and books with a configurable status.
#[derive(Debug, Clone)]
pub struct InMemorySupplierConnector {
    supplier: Supplier,
    state: Arc<Mutex<FakeSupplierState>>,
}

impl InMemorySupplierConnector {
    pub fn new(supplier: Supplier) -> Self {
        Self {
            supplier,
            state: Arc::default(),
        }
    }

    pub fn set_availability(&self, results: Vec<AvailabilityResult>) {
        self.state.lock().results = results;
    }

    /// Delay applied before every availability and booking answer.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Delay applied before every cancellation answer.
    pub fn set_cancel_latency(&self, latency: Duration) {
        self.state.lock().cancel_latency = latency;
    }

    /// Status returned by successful `book` calls.
    pub fn set_book_status(&self, status: SupplierBookingStatus) {
        self.state.lock().book_status = status;
    }

    pub fn set_fail_on_availability(&self, fail: bool) {
        self.state.lock().fail_on_availability = fail;
    }

    pub fn set_fail_on_book(&self, fail: bool) {
        self.state.lock().fail_on_book = fail;
    }

    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.state.lock().fail_on_cancel = fail;
    }

    pub fn availability_calls(&self) -> usize {
        self.state.lock().availability_calls
    }

    pub fn book_calls(&self) -> usize {
        self.state.lock().booked.len()
    }

    /// Reference codes cancelled so far.
    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().cancelled.clone()
    }

    async fn wait(&self) {
        let latency = self.state.lock().latency;
        Self::sleep(latency).await;
    }

    async fn sleep(latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl SupplierConnector for InMemorySupplierConnector {
    fn supplier(&self) -> Supplier {
        self.supplier
    }

    async fn get_availability(&self, _request: &AvailabilityRequest) -> Result<AvailabilityResponse, SupplierError> {
        self.state.lock().availability_calls += 1;
        self.wait().await;

        let state = self.state.lock();
        if state.fail_on_availability {
            return Err(SupplierError::unavailable(format!("{} is unavailable", self.supplier)));
        }
        Ok(AvailabilityResponse {
            supplier: self.supplier,
            results: state.results.clone(),
        })
    }

    async fn book(&self, request: &SupplierBookingRequest) -> Result<SupplierBooking, SupplierError> {
        self.wait().await;

        let mut state = self.state.lock();
        state.booked.push(request.clone());
        if state.fail_on_book {
            return Err(SupplierError::unavailable(format!(
                "{} failed to book {}",
                self.supplier, request.reference_code
            )));
        }

        state.next_id += 1;
        Ok(SupplierBooking {
            reference_code: request.reference_code.clone(),
            supplier_reference: format!("{}-{:04}", self.supplier.as_str().to_uppercase(), state.next_id),
            status: state.book_status,
            check_in: request.check_in,
            check_out: request.check_out,
            deadline: None,
        })
    }

    async fn cancel_booking(&self, reference_code: &str) -> Result<(), SupplierError> {
        let latency = self.state.lock().cancel_latency;
        Self::sleep(latency).await;

        let mut state = self.state.lock();
        if state.fail_on_cancel {
            return Err(SupplierError::unavailable(format!(
                "{} failed to cancel {reference_code}",
                self.supplier
            )));
        }
        state.cancelled.push(reference_code.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use common::{ResultId, RoomContractSetId, SearchId};

    use super::*;

    fn booking_request(reference_code: &str) -> SupplierBookingRequest {
        SupplierBookingRequest {
            reference_code: reference_code.to_string(),
            search_id: SearchId::new(),
            result_id: ResultId::new(),
            room_contract_set_id: RoomContractSetId::new(),
            check_in: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 12, 3).unwrap(),
            rooms: Vec::new(),
            nationality: "GB".to_string(),
            residency: "GB".to_string(),
            reject_if_unavailable: true,
        }
    }

    #[tokio::test]
    async fn book_uses_configured_status_and_sequential_references() {
        let connector = InMemorySupplierConnector::new(Supplier::Illusions);
        connector.set_book_status(SupplierBookingStatus::Pending);

        let first = connector.book(&booking_request("HTL-AE-0000001-01")).await.unwrap();
        let second = connector.book(&booking_request("HTL-AE-0000001-02")).await.unwrap();

        assert_eq!(first.status, SupplierBookingStatus::Pending);
        assert_eq!(first.supplier_reference, "ILLUSIONS-0001");
        assert_eq!(second.supplier_reference, "ILLUSIONS-0002");
        assert_eq!(connector.book_calls(), 2);
    }

    #[tokio::test]
    async fn failure_toggles() {
        let connector = InMemorySupplierConnector::new(Supplier::Etg);
        connector.set_fail_on_book(true);
        connector.set_fail_on_cancel(true);

        assert!(connector.book(&booking_request("HTL-AE-0000001-01")).await.is_err());
        assert!(connector.cancel_booking("HTL-AE-0000001-01").await.is_err());
        assert!(connector.cancelled().is_empty());

        connector.set_fail_on_cancel(false);
        connector.cancel_booking("HTL-AE-0000001-01").await.unwrap();
        assert_eq!(connector.cancelled(), vec!["HTL-AE-0000001-01".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_the_answer() {
        let connector = InMemorySupplierConnector::new(Supplier::Rakuten);
        connector.set_latency(Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        let request = AvailabilityRequest {
            location: crate::supplier::Location {
                country_code: "AE".to_string(),
                suppliers: Vec::new(),
            },
            check_in: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 12, 3).unwrap(),
            rooms: vec![crate::offer::Occupancy::adults(2)],
            nationality: "GB".to_string(),
            residency: "GB".to_string(),
        };
        connector.get_availability(&request).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(connector.availability_calls(), 1);
    }
}
