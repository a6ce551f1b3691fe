//! Booking saga view rebuilt from the journal.

use domain::BookingStatus;
use serde::{Deserialize, Serialize};
use store::JournalEntry;

use crate::events::SagaEvent;
use crate::state::SagaState;

/// The latest saga run of one booking.
///
/// Built by replaying the booking's journal stream. Every `SagaStarted`
/// begins a new run, so after a crash the view shows the last step that
/// completed before it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingSagaInstance {
    reference_code: Option<String>,
    saga_type: String,
    state: SagaState,
    runs: u32,
    current_step: Option<String>,
    completed_steps: Vec<String>,
    /// Supplier reference from the supplier booking step.
    supplier_reference: Option<String>,
    booking_status: Option<BookingStatus>,
    failure_reason: Option<String>,
}

impl BookingSagaInstance {
    /// Replays journal entries in order.
    pub fn from_entries(entries: impl IntoIterator<Item = JournalEntry<SagaEvent>>) -> Self {
        let mut saga = Self::default();
        for entry in entries {
            saga.apply(entry.event);
        }
        saga
    }

    pub fn apply(&mut self, event: SagaEvent) {
        match event {
            SagaEvent::SagaStarted(data) => {
                self.reference_code = Some(data.reference_code);
                self.saga_type = data.saga_type;
                self.state = SagaState::Running;
                self.runs += 1;
                self.current_step = None;
                self.completed_steps.clear();
                self.failure_reason = None;
            }
            SagaEvent::StepStarted(data) => {
                self.current_step = Some(data.step_name);
            }
            SagaEvent::StepCompleted(data) => {
                if data.step_name == crate::booking_registration::STEP_BOOK_ON_SUPPLIER
                    && let Some(reference) = &data.detail
                {
                    self.supplier_reference = Some(reference.clone());
                }
                self.completed_steps.push(data.step_name);
                self.current_step = None;
            }
            SagaEvent::StepFailed(data) => {
                self.failure_reason = Some(data.error);
            }
            SagaEvent::CompensationStarted(_) => {
                self.state = SagaState::Compensating;
            }
            SagaEvent::CompensationStepCompleted(_) | SagaEvent::CompensationStepFailed(_) => {}
            SagaEvent::AwaitingSupplier(data) => {
                self.state = SagaState::AwaitingSupplier;
                self.booking_status = Some(BookingStatus::WaitingForResponse);
                self.failure_reason.get_or_insert(data.reason);
            }
            SagaEvent::SagaCompleted(data) => {
                self.state = SagaState::Completed;
                self.booking_status = Some(data.booking_status);
            }
            SagaEvent::SagaFailed(data) => {
                self.state = SagaState::Failed;
                self.failure_reason = Some(data.reason);
            }
        }
    }
}

// Query methods
impl BookingSagaInstance {
    pub fn reference_code(&self) -> Option<&str> {
        self.reference_code.as_deref()
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Number of runs recorded for the booking.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Step started but not completed in the latest run.
    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    /// Steps completed in the latest run, in order.
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    pub fn last_completed_step(&self) -> Option<&str> {
        self.completed_steps.last().map(String::as_str)
    }

    pub fn has_completed(&self, step: &str) -> bool {
        self.completed_steps.iter().any(|completed| completed == step)
    }

    pub fn supplier_reference(&self) -> Option<&str> {
        self.supplier_reference.as_deref()
    }

    pub fn booking_status(&self) -> Option<BookingStatus> {
        self.booking_status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking_registration::{
        SAGA_TYPE_CANCELLATION, SAGA_TYPE_REGISTRATION, STEP_BOOK_ON_SUPPLIER, STEP_CANCEL_ON_SUPPLIER,
        STEP_PAY_IF_DEADLINE_PASSED, STEP_REGISTER, STEP_RETURN_MONEY,
    };

    const REFERENCE: &str = "HTL-AE-0000001-01";

    fn started() -> BookingSagaInstance {
        let mut saga = BookingSagaInstance::default();
        saga.apply(SagaEvent::saga_started(REFERENCE, SAGA_TYPE_REGISTRATION));
        saga
    }

    #[test]
    fn default_instance_has_not_started() {
        let saga = BookingSagaInstance::default();
        assert!(saga.reference_code().is_none());
        assert_eq!(saga.state(), SagaState::NotStarted);
        assert_eq!(saga.runs(), 0);
    }

    #[test]
    fn successful_registration_run() {
        let mut saga = started();
        assert_eq!(saga.reference_code(), Some(REFERENCE));
        assert_eq!(saga.state(), SagaState::Running);

        for step in [STEP_REGISTER, STEP_PAY_IF_DEADLINE_PASSED] {
            saga.apply(SagaEvent::step_started(step));
            saga.apply(SagaEvent::step_completed(step, None));
        }
        saga.apply(SagaEvent::step_started(STEP_BOOK_ON_SUPPLIER));
        assert_eq!(saga.current_step(), Some(STEP_BOOK_ON_SUPPLIER));

        saga.apply(SagaEvent::step_completed(STEP_BOOK_ON_SUPPLIER, Some("NS-7".to_string())));
        saga.apply(SagaEvent::saga_completed(BookingStatus::Confirmed));

        assert_eq!(saga.state(), SagaState::Completed);
        assert_eq!(saga.supplier_reference(), Some("NS-7"));
        assert_eq!(saga.booking_status(), Some(BookingStatus::Confirmed));
        assert_eq!(saga.completed_steps().len(), 3);
        assert!(saga.current_step().is_none());
    }

    #[test]
    fn crashed_run_shows_last_completed_step() {
        let mut saga = started();
        saga.apply(SagaEvent::step_started(STEP_REGISTER));
        saga.apply(SagaEvent::step_completed(STEP_REGISTER, None));
        saga.apply(SagaEvent::step_started(STEP_BOOK_ON_SUPPLIER));

        assert_eq!(saga.state(), SagaState::Running);
        assert_eq!(saga.last_completed_step(), Some(STEP_REGISTER));
        assert_eq!(saga.current_step(), Some(STEP_BOOK_ON_SUPPLIER));
    }

    #[test]
    fn supplier_failure_leaves_run_awaiting() {
        let mut saga = started();
        saga.apply(SagaEvent::step_started(STEP_BOOK_ON_SUPPLIER));
        saga.apply(SagaEvent::step_failed(STEP_BOOK_ON_SUPPLIER, "Etg is unavailable"));
        saga.apply(SagaEvent::awaiting_supplier("supplier did not answer"));

        assert_eq!(saga.state(), SagaState::AwaitingSupplier);
        assert!(saga.state().can_compensate());
        assert_eq!(saga.booking_status(), Some(BookingStatus::WaitingForResponse));
        assert_eq!(saga.failure_reason(), Some("Etg is unavailable"));
    }

    #[test]
    fn compensation_failure_keeps_compensating() {
        let mut saga = started();
        saga.apply(SagaEvent::step_failed(STEP_BOOK_ON_SUPPLIER, "Rejected"));
        saga.apply(SagaEvent::compensation_started(STEP_BOOK_ON_SUPPLIER));
        saga.apply(SagaEvent::compensation_step_failed(STEP_RETURN_MONEY, "gateway down"));
        assert_eq!(saga.state(), SagaState::Compensating);

        saga.apply(SagaEvent::saga_failed("Booking was rejected by the supplier"));
        assert_eq!(saga.state(), SagaState::Failed);
        assert!(saga.state().is_terminal());
        assert_eq!(saga.failure_reason(), Some("Booking was rejected by the supplier"));
    }

    #[test]
    fn a_new_run_resets_step_tracking() {
        let mut saga = started();
        saga.apply(SagaEvent::step_completed(STEP_BOOK_ON_SUPPLIER, Some("NS-1".to_string())));
        saga.apply(SagaEvent::saga_completed(BookingStatus::Confirmed));

        saga.apply(SagaEvent::saga_started(REFERENCE, SAGA_TYPE_CANCELLATION));
        saga.apply(SagaEvent::step_completed(STEP_CANCEL_ON_SUPPLIER, None));

        assert_eq!(saga.runs(), 2);
        assert_eq!(saga.saga_type(), SAGA_TYPE_CANCELLATION);
        assert_eq!(saga.completed_steps(), &[STEP_CANCEL_ON_SUPPLIER.to_string()]);
        assert_eq!(saga.supplier_reference(), Some("NS-1"));
    }

    #[test]
    fn serialization() {
        let mut saga = started();
        saga.apply(SagaEvent::step_completed(STEP_REGISTER, None));

        let json = serde_json::to_string(&saga).unwrap();
        let deserialized: BookingSagaInstance = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.reference_code(), Some(REFERENCE));
        assert_eq!(deserialized.state(), SagaState::Running);
        assert!(deserialized.has_completed(STEP_REGISTER));
    }
}
