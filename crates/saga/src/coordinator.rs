//! Booking saga: register, pay, book on the supplier, settle.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{AgentContext, PaymentMethod};
use domain::{
    AccommodationBookingRequest, Booking, BookingSettingsService, BookingStatus, Payment, PaymentStatus,
    ReferenceCodeGenerator, StoredBookingRequest, SupplierBooking, SupplierBookingRequest, SupplierConnectorRouter,
    SupplierError, SupplierResponseOutcome, itn_from_reference_code,
};
use search::{BookingEvaluationCache, CachedOffer, EvaluationKey};
use store::{EntityLocker, Journal, KeyedStore, Numerator, Version};

use crate::aggregate::BookingSagaInstance;
use crate::booking_registration::{
    BOOKING_ID_SEQUENCE, BOOKING_LOCK_ENTITY, SAGA_LOCK_ENTITY, SAGA_TYPE_CANCELLATION, SAGA_TYPE_FINALIZATION,
    SAGA_TYPE_REGISTRATION, STEP_BOOK_ON_SUPPLIER, STEP_CANCEL_ON_SUPPLIER, STEP_PAY_IF_DEADLINE_PASSED,
    STEP_POST_PROCESS, STEP_REGISTER, STEP_RETURN_MONEY, check_apr, check_deadline, stream_name,
};
use crate::bookings::BookingRecords;
use crate::error::{Result, SagaError};
use crate::events::SagaEvent;
use crate::options::SagaOptions;
use crate::payments::PaymentAuthorizationController;
use crate::services::{AccountPaymentService, DocumentsService, NotificationService, PaymentGateway};

/// Collaborators the booking saga calls out to.
#[derive(Clone)]
pub struct BookingServices {
    pub connectors: SupplierConnectorRouter,
    pub settings: BookingSettingsService,
    pub evaluation_cache: BookingEvaluationCache,
    pub gateway: Arc<dyn PaymentGateway>,
    pub accounts: Arc<dyn AccountPaymentService>,
    pub documents: Arc<dyn DocumentsService>,
    pub notifications: Arc<dyn NotificationService>,
}

/// A saga run being recorded to the journal.
pub(crate) struct SagaRun {
    stream: String,
    version: Version,
    instance: BookingSagaInstance,
    started: Instant,
}

/// Orchestrates booking registration, supplier booking, cancellation and
/// the money movements around them.
///
/// Every run is journaled under the booking's reference code. Runs on an
/// existing booking hold the saga entity lock from start to settlement, so
/// a cancellation and a supplier webhook never append to the same stream
/// at once. Booking rows are mutated under the booking entity lock; that
/// lock is never held across a supplier call.
pub struct BookingRegistrationSaga<B, P, J, N: Numerator> {
    pub(crate) bookings: BookingRecords<B>,
    pub(crate) payments: PaymentAuthorizationController<B, P>,
    journal: J,
    numerator: N,
    references: ReferenceCodeGenerator<N>,
    pub(crate) services: BookingServices,
    pub(crate) locker: EntityLocker,
    options: SagaOptions,
}

impl<B, P, J, N> BookingRegistrationSaga<B, P, J, N>
where
    B: KeyedStore<i64, Booking> + Clone,
    P: KeyedStore<String, Payment>,
    J: Journal<SagaEvent>,
    N: Numerator + Clone,
{
    pub fn new(bookings: B, payments: P, journal: J, numerator: N, services: BookingServices, options: SagaOptions) -> Self {
        let locker = EntityLocker::new(options.lock);
        let bookings = BookingRecords::new(bookings);
        let payments = PaymentAuthorizationController::new(
            bookings.clone(),
            payments,
            Arc::clone(&services.gateway),
            locker.clone(),
        );

        Self {
            bookings,
            payments,
            journal,
            references: ReferenceCodeGenerator::new(numerator.clone()),
            numerator,
            services,
            locker,
            options,
        }
    }

    pub fn payments(&self) -> &PaymentAuthorizationController<B, P> {
        &self.payments
    }

    pub fn bookings(&self) -> &BookingRecords<B> {
        &self.bookings
    }

    /// Registers a booking for the evaluated offer without contacting the
    /// supplier. A rejected registration writes nothing.
    #[tracing::instrument(skip(self, request, agent), fields(agent_id = %agent.agent_id))]
    pub async fn register(&self, request: AccommodationBookingRequest, agent: &AgentContext) -> Result<Booking> {
        let draft = self.prepare(&request, agent).await?;
        let mut run = self.start_run(&draft.reference_code, SAGA_TYPE_REGISTRATION).await?;
        let booking = self.persist(&mut run, draft, false).await?;
        self.complete(&mut run, booking.status).await?;
        Ok(booking)
    }

    /// Registers, pays from the agency account when the deadline has passed,
    /// and books on the supplier in one run.
    #[tracing::instrument(skip(self, request, agent), fields(agent_id = %agent.agent_id))]
    pub async fn register_and_book(
        &self,
        request: AccommodationBookingRequest,
        agent: &AgentContext,
    ) -> Result<Booking> {
        if request.payment_method == PaymentMethod::CreditCard {
            return Err(SagaError::Validation(
                "Card bookings are finalized after the payment is authorized".to_string(),
            ));
        }

        let draft = self.prepare(&request, agent).await?;
        let mut run = self.start_run(&draft.reference_code, SAGA_TYPE_REGISTRATION).await?;
        let booking = self.persist(&mut run, draft, true).await?;
        let booking = self.book_on_supplier(&mut run, booking).await?;
        self.settle(&mut run, booking).await
    }

    /// Books a registered and paid booking on the supplier.
    #[tracing::instrument(skip(self, agent), fields(agent_id = %agent.agent_id))]
    pub async fn finalize(&self, reference_code: &str, agent: &AgentContext) -> Result<Booking> {
        self.locker
            .run_locked(SAGA_LOCK_ENTITY, reference_code, || self.finalize_locked(reference_code, agent))
            .await
    }

    async fn finalize_locked(&self, reference_code: &str, agent: &AgentContext) -> Result<Booking> {
        let booking = self.get_booking(reference_code, agent).await?;
        if booking.payment_status == PaymentStatus::NotPaid {
            return Err(SagaError::Validation(format!("Booking {reference_code} is not paid")));
        }
        if !booking.status.can_book() {
            return Err(SagaError::Validation(format!(
                "Booking in status {} cannot be finalized",
                booking.status
            )));
        }

        let mut run = self.start_run(reference_code, SAGA_TYPE_FINALIZATION).await?;
        let booking = self.book_on_supplier(&mut run, booking).await?;
        self.settle(&mut run, booking).await
    }

    /// Cancels on the supplier, then marks the booking cancelled and returns
    /// the money. When the supplier refuses, nothing changes.
    #[tracing::instrument(skip(self, agent), fields(agent_id = %agent.agent_id))]
    pub async fn cancel(&self, reference_code: &str, agent: &AgentContext) -> Result<Booking> {
        self.locker
            .run_locked(SAGA_LOCK_ENTITY, reference_code, || self.cancel_locked(reference_code, agent))
            .await
    }

    async fn cancel_locked(&self, reference_code: &str, agent: &AgentContext) -> Result<Booking> {
        let booking = self.get_booking(reference_code, agent).await?;
        booking.clone().mark_cancelled(Utc::now())?;

        let mut run = self.start_run(reference_code, SAGA_TYPE_CANCELLATION).await?;

        if booking.status != BookingStatus::InternalProcessing {
            tracing::info!(step = STEP_CANCEL_ON_SUPPLIER, reference_code, "saga step started");
            self.record(&mut run, SagaEvent::step_started(STEP_CANCEL_ON_SUPPLIER))
                .await?;

            if let Err(error) = self.cancel_on_supplier(&booking).await {
                tracing::warn!(reference_code, %error, "supplier refused cancellation");
                self.record(&mut run, SagaEvent::step_failed(STEP_CANCEL_ON_SUPPLIER, error.to_string()))
                    .await?;
                self.fail(&mut run, error.to_string()).await?;
                return Err(error.into());
            }
            self.record(&mut run, SagaEvent::step_completed(STEP_CANCEL_ON_SUPPLIER, None))
                .await?;
        }

        let (booking, ()) = {
            let _guard = self.locker.acquire(BOOKING_LOCK_ENTITY, reference_code).await?;
            let now = Utc::now();
            self.bookings
                .modify(reference_code, |booking| booking.mark_cancelled(now).map_err(SagaError::from))
                .await?
        };

        if let Some(error) = self.release_money(&mut run, &booking, false).await? {
            self.fail(&mut run, error.to_string()).await?;
            return Err(error);
        }
        self.complete(&mut run, BookingStatus::Cancelled).await?;
        self.bookings.find_by_reference(reference_code).await
    }

    /// The booking, if it belongs to the agent's agency.
    pub async fn get_booking(&self, reference_code: &str, agent: &AgentContext) -> Result<Booking> {
        let booking = self.bookings.find_by_reference(reference_code).await?;
        if !booking.belongs_to_agency(agent) {
            return Err(SagaError::BookingNotFound(reference_code.to_string()));
        }
        Ok(booking)
    }

    /// Latest saga run of a booking, rebuilt from the journal.
    pub async fn saga_instance(&self, reference_code: &str) -> Result<BookingSagaInstance> {
        let entries = self.journal.read(&stream_name(reference_code)).await?;
        if entries.is_empty() {
            return Err(SagaError::BookingNotFound(reference_code.to_string()));
        }
        Ok(BookingSagaInstance::from_entries(entries))
    }

    /// Runs the gates and builds the booking row. Writes nothing.
    async fn prepare(&self, request: &AccommodationBookingRequest, agent: &AgentContext) -> Result<Booking> {
        request.validate()?;

        let settings = self.services.settings.get(agent);
        let key = EvaluationKey::new(request.search_id, request.result_id, request.room_contract_set_id);
        let offer = self
            .services
            .evaluation_cache
            .get(&key, agent.agent_id, &settings.enabled_suppliers)?;

        let now = Utc::now();
        check_apr(&offer, &settings, request.payment_method)
            .and_then(|()| check_deadline(&offer, &settings, request.payment_method, now))
            .inspect_err(|error| tracing::info!(reason = %error, "booking registration rejected"))?;

        let itinerary_number = self
            .resolve_itinerary_number(request.itinerary_number.as_deref(), agent)
            .await?;
        let reference_code = self
            .references
            .generate(&offer.accommodation.country_code, &itinerary_number)
            .await?;
        let id = self.numerator.next(BOOKING_ID_SEQUENCE).await?;

        Ok(new_booking(id, reference_code, itinerary_number, request, offer, agent, now))
    }

    /// Reuses the requested itinerary (or the one inside a reference code)
    /// when the agency already booked under it; otherwise mints a new one.
    async fn resolve_itinerary_number(&self, requested: Option<&str>, agent: &AgentContext) -> Result<String> {
        if let Some(value) = requested.map(str::trim).filter(|value| !value.is_empty()) {
            let itn = itn_from_reference_code(value).unwrap_or(value);
            if self.bookings.has_itinerary(agent.agency_id, itn).await? {
                return Ok(itn.to_string());
            }
            tracing::debug!(itn, "itinerary has no bookings of the agency, minting a new one");
        }
        Ok(self.references.generate_itn().await?)
    }

    async fn persist(&self, run: &mut SagaRun, booking: Booking, pay_if_deadline_passed: bool) -> Result<Booking> {
        let _guard = self
            .locker
            .acquire(BOOKING_LOCK_ENTITY, &booking.reference_code)
            .await?;

        tracing::info!(step = STEP_REGISTER, reference_code = %booking.reference_code, "saga step started");
        self.record(run, SagaEvent::step_started(STEP_REGISTER)).await?;
        self.bookings.insert(booking.clone()).await?;
        self.record(run, SagaEvent::step_completed(STEP_REGISTER, None)).await?;

        if !pay_if_deadline_passed {
            return Ok(booking);
        }
        self.pay_if_deadline_passed(run, booking).await
    }

    /// Charges the agency account before the supplier is contacted when the
    /// booking can no longer be cancelled for free.
    async fn pay_if_deadline_passed(&self, run: &mut SagaRun, booking: Booking) -> Result<Booking> {
        if booking.payment_method != PaymentMethod::BankTransfer || booking.effective_deadline() > Utc::now() {
            return Ok(booking);
        }

        tracing::info!(step = STEP_PAY_IF_DEADLINE_PASSED, reference_code = %booking.reference_code, "saga step started");
        self.record(run, SagaEvent::step_started(STEP_PAY_IF_DEADLINE_PASSED))
            .await?;

        let charged = self
            .services
            .accounts
            .charge(booking.agency_id, booking.total_price, &booking.reference_code)
            .await;

        match charged {
            Ok(()) => {
                let booking = self
                    .bookings
                    .set_payment_status(&booking.reference_code, PaymentStatus::Captured)
                    .await?;
                self.record(
                    run,
                    SagaEvent::step_completed(STEP_PAY_IF_DEADLINE_PASSED, Some(PaymentStatus::Captured.to_string())),
                )
                .await?;
                Ok(booking)
            }
            Err(error) => {
                tracing::warn!(reference_code = %booking.reference_code, %error, "account charge failed");
                self.bookings
                    .modify(&booking.reference_code, |booking| {
                        booking.status = BookingStatus::Invalid;
                        Ok(())
                    })
                    .await?;
                self.record(run, SagaEvent::step_failed(STEP_PAY_IF_DEADLINE_PASSED, error.to_string()))
                    .await?;
                self.fail(run, error.to_string()).await?;
                Err(error)
            }
        }
    }

    /// Sends the booking to the supplier.
    ///
    /// A failed or timed out call is followed by a best-effort cancellation
    /// and leaves the booking waiting for the supplier's answer.
    async fn book_on_supplier(&self, run: &mut SagaRun, booking: Booking) -> Result<Booking> {
        let reference_code = booking.reference_code.clone();
        tracing::info!(step = STEP_BOOK_ON_SUPPLIER, %reference_code, supplier = %booking.supplier, "saga step started");
        self.record(run, SagaEvent::step_started(STEP_BOOK_ON_SUPPLIER)).await?;

        match self.send_to_supplier(&booking).await {
            Ok(response) => {
                let (booking, outcome) = self.apply_response(&reference_code, &response).await?;
                if outcome == SupplierResponseOutcome::Ignored {
                    tracing::warn!(%reference_code, status = %booking.status, "supplier answered for a terminal booking");
                }
                let supplier_reference = Some(response.supplier_reference).filter(|reference| !reference.is_empty());
                self.record(run, SagaEvent::step_completed(STEP_BOOK_ON_SUPPLIER, supplier_reference))
                    .await?;
                Ok(booking)
            }
            Err(error) => {
                tracing::warn!(%reference_code, supplier = %booking.supplier, %error, "supplier booking failed");
                self.record(run, SagaEvent::step_failed(STEP_BOOK_ON_SUPPLIER, error.to_string()))
                    .await?;
                self.cancel_after_failure(&booking).await;

                let _guard = self.locker.acquire(BOOKING_LOCK_ENTITY, &reference_code).await?;
                let (booking, ()) = self
                    .bookings
                    .modify(&reference_code, |booking| {
                        if booking.status == BookingStatus::InternalProcessing {
                            booking.status = BookingStatus::WaitingForResponse;
                        }
                        Ok(())
                    })
                    .await?;
                Ok(booking)
            }
        }
    }

    async fn send_to_supplier(&self, booking: &Booking) -> std::result::Result<SupplierBooking, SupplierError> {
        let connector = self.services.connectors.get(booking.supplier)?;
        let stored = booking.request.request();
        let request = SupplierBookingRequest {
            reference_code: booking.reference_code.clone(),
            search_id: stored.search_id,
            result_id: stored.result_id,
            room_contract_set_id: stored.room_contract_set_id,
            check_in: booking.check_in,
            check_out: booking.check_out,
            rooms: stored.rooms.clone(),
            nationality: stored.nationality.clone(),
            residency: stored.residency.clone(),
            reject_if_unavailable: stored.reject_if_unavailable,
        };

        let timeout = self.options.supplier_timeout;
        tokio::time::timeout(timeout, connector.book(&request))
            .await
            .map_err(|_| SupplierError::timeout(booking.supplier, timeout.as_millis()))?
    }

    async fn cancel_on_supplier(&self, booking: &Booking) -> std::result::Result<(), SupplierError> {
        let connector = self.services.connectors.get(booking.supplier)?;
        let timeout = self.options.supplier_timeout;
        tokio::time::timeout(timeout, connector.cancel_booking(&booking.reference_code))
            .await
            .map_err(|_| SupplierError::timeout(booking.supplier, timeout.as_millis()))?
    }

    async fn cancel_after_failure(&self, booking: &Booking) {
        match self.cancel_on_supplier(booking).await {
            Ok(()) => tracing::info!(reference_code = %booking.reference_code, "released supplier booking after failure"),
            Err(error) => {
                tracing::warn!(reference_code = %booking.reference_code, %error, "could not release supplier booking")
            }
        }
    }

    /// Applies a supplier answer under the booking lock.
    pub(crate) async fn apply_response(
        &self,
        reference_code: &str,
        response: &SupplierBooking,
    ) -> Result<(Booking, SupplierResponseOutcome)> {
        let _guard = self.locker.acquire(BOOKING_LOCK_ENTITY, reference_code).await?;
        let now = Utc::now();
        self.bookings
            .modify(reference_code, |booking| Ok(booking.apply_supplier_response(response, now)))
            .await
    }

    /// Finishes a run according to the booking status the supplier left.
    pub(crate) async fn settle(&self, run: &mut SagaRun, booking: Booking) -> Result<Booking> {
        let reference_code = booking.reference_code.clone();
        match booking.status {
            BookingStatus::Confirmed | BookingStatus::Pending => {
                self.post_process(run, &booking).await?;
                self.complete(run, booking.status).await?;
                Ok(booking)
            }
            BookingStatus::InternalProcessing | BookingStatus::WaitingForResponse => {
                self.await_supplier(run, "Waiting for the supplier to confirm the booking")
                    .await?;
                Ok(booking)
            }
            BookingStatus::Cancelled => {
                if let Some(error) = self.release_money(run, &booking, false).await? {
                    self.fail(run, error.to_string()).await?;
                    return Err(error);
                }
                self.complete(run, BookingStatus::Cancelled).await?;
                self.bookings.find_by_reference(&reference_code).await
            }
            BookingStatus::Rejected | BookingStatus::Invalid => {
                tracing::warn!(%reference_code, status = %booking.status, "supplier refused the booking");
                self.record(run, SagaEvent::compensation_started(STEP_BOOK_ON_SUPPLIER))
                    .await?;
                self.release_money(run, &booking, true).await?;
                self.fail(run, format!("The supplier answered {}", booking.status))
                    .await?;
                self.bookings.find_by_reference(&reference_code).await
            }
        }
    }

    /// Voids or refunds whatever was paid, recording the outcome. Returns
    /// the money error, if any, after it has been journaled.
    async fn release_money(&self, run: &mut SagaRun, booking: &Booking, as_compensation: bool) -> Result<Option<SagaError>> {
        if !as_compensation {
            self.record(run, SagaEvent::step_started(STEP_RETURN_MONEY)).await?;
        }

        match self.return_money(booking).await {
            Ok(status) => {
                let event = if as_compensation {
                    SagaEvent::compensation_step_completed(STEP_RETURN_MONEY)
                } else {
                    SagaEvent::step_completed(STEP_RETURN_MONEY, status.map(|status| status.to_string()))
                };
                self.record(run, event).await?;
                Ok(None)
            }
            Err(error) => {
                tracing::error!(reference_code = %booking.reference_code, %error, "could not return money");
                let event = if as_compensation {
                    SagaEvent::compensation_step_failed(STEP_RETURN_MONEY, error.to_string())
                } else {
                    SagaEvent::step_failed(STEP_RETURN_MONEY, error.to_string())
                };
                self.record(run, event).await?;
                Ok(Some(error))
            }
        }
    }

    async fn return_money(&self, booking: &Booking) -> Result<Option<PaymentStatus>> {
        let reference_code = booking.reference_code.as_str();
        match (booking.payment_method, booking.payment_status) {
            (PaymentMethod::CreditCard, status) if status.can_void() => {
                Ok(Some(self.payments.void(reference_code).await?.status))
            }
            (PaymentMethod::CreditCard, status) if status.can_refund() => {
                Ok(Some(self.payments.refund(reference_code).await?.status))
            }
            (PaymentMethod::CreditCard, _) => Ok(None),
            (_, PaymentStatus::Captured) => {
                self.services
                    .accounts
                    .refund(booking.agency_id, booking.total_price, reference_code)
                    .await?;
                self.bookings
                    .set_payment_status(reference_code, PaymentStatus::Refunded)
                    .await?;
                Ok(Some(PaymentStatus::Refunded))
            }
            _ => Ok(None),
        }
    }

    /// Invoice, booking notification and invoice email. Failures are logged
    /// and do not fail the run.
    async fn post_process(&self, run: &mut SagaRun, booking: &Booking) -> Result<()> {
        let reference_code = booking.reference_code.as_str();
        tracing::info!(step = STEP_POST_PROCESS, reference_code, "saga step started");
        self.record(run, SagaEvent::step_started(STEP_POST_PROCESS)).await?;

        let invoice_number = self
            .services
            .documents
            .generate_invoice(booking)
            .await
            .inspect_err(|error| tracing::warn!(reference_code, %error, "invoice generation failed"))
            .ok();

        if let Err(error) = self.services.notifications.send_booking_notification(booking).await {
            tracing::warn!(reference_code, %error, "booking notification failed");
        }

        if let Some(number) = &invoice_number
            && let Err(error) = self.services.notifications.send_invoice(booking, number).await
        {
            tracing::warn!(reference_code, %error, "invoice email failed");
        }

        self.record(run, SagaEvent::step_completed(STEP_POST_PROCESS, invoice_number))
            .await
    }

    async fn start_run(&self, reference_code: &str, saga_type: &'static str) -> Result<SagaRun> {
        metrics::counter!("booking_saga_executions_total", "saga_type" => saga_type).increment(1);

        let stream = stream_name(reference_code);
        let current = self.journal.version(&stream).await?;
        let started = SagaEvent::saga_started(reference_code, saga_type);
        let version = self
            .journal
            .append(&stream, vec![started.clone()], Some(current))
            .await?;

        let mut instance = BookingSagaInstance::default();
        instance.apply(started);
        Ok(SagaRun {
            stream,
            version,
            instance,
            started: Instant::now(),
        })
    }

    /// Continues a run left waiting for the supplier, or starts a new one.
    pub(crate) async fn resume_run(&self, reference_code: &str) -> Result<SagaRun> {
        let stream = stream_name(reference_code);
        let entries = self.journal.read(&stream).await?;
        let version = entries
            .last()
            .map(|entry| entry.version)
            .unwrap_or(Version::initial());
        let instance = BookingSagaInstance::from_entries(entries);

        if instance.state().is_awaiting_supplier() {
            return Ok(SagaRun {
                stream,
                version,
                instance,
                started: Instant::now(),
            });
        }
        self.start_run(reference_code, SAGA_TYPE_FINALIZATION).await
    }

    pub(crate) async fn record(&self, run: &mut SagaRun, event: SagaEvent) -> Result<()> {
        run.version = self
            .journal
            .append(&run.stream, vec![event.clone()], Some(run.version))
            .await?;
        run.instance.apply(event);
        Ok(())
    }

    async fn complete(&self, run: &mut SagaRun, status: BookingStatus) -> Result<()> {
        self.record(run, SagaEvent::saga_completed(status)).await?;

        let duration = run.started.elapsed().as_secs_f64();
        metrics::histogram!("booking_saga_duration_seconds").record(duration);
        tracing::info!(
            reference_code = run.instance.reference_code().unwrap_or_default(),
            %status,
            duration,
            "booking saga completed"
        );
        Ok(())
    }

    async fn await_supplier(&self, run: &mut SagaRun, reason: &str) -> Result<()> {
        self.record(run, SagaEvent::awaiting_supplier(reason)).await?;

        metrics::histogram!("booking_saga_duration_seconds").record(run.started.elapsed().as_secs_f64());
        tracing::info!(
            reference_code = run.instance.reference_code().unwrap_or_default(),
            last_step = run.instance.last_completed_step().unwrap_or_default(),
            "booking saga waiting for the supplier"
        );
        Ok(())
    }

    async fn fail(&self, run: &mut SagaRun, reason: String) -> Result<()> {
        self.record(run, SagaEvent::saga_failed(&reason)).await?;

        metrics::histogram!("booking_saga_duration_seconds").record(run.started.elapsed().as_secs_f64());
        metrics::counter!("booking_saga_failed_total").increment(1);
        tracing::warn!(
            reference_code = run.instance.reference_code().unwrap_or_default(),
            %reason,
            "booking saga failed"
        );
        Ok(())
    }
}

fn new_booking(
    id: i64,
    reference_code: String,
    itinerary_number: String,
    request: &AccommodationBookingRequest,
    offer: CachedOffer,
    agent: &AgentContext,
    now: DateTime<Utc>,
) -> Booking {
    let set = offer.room_contract_set;
    Booking {
        id,
        reference_code,
        itinerary_number,
        status: BookingStatus::InternalProcessing,
        payment_status: PaymentStatus::NotPaid,
        payment_method: request.payment_method,
        supplier: offer.supplier,
        agent_id: agent.agent_id,
        agency_id: agent.agency_id,
        counterparty_id: agent.counterparty_id,
        accommodation_id: offer.accommodation.id,
        accommodation_name: offer.accommodation.name,
        country_code: offer.accommodation.country_code,
        check_in: offer.check_in,
        check_out: offer.check_out,
        deadline: set.deadline.date,
        is_advance_purchase_rate: set.is_advance_purchase_rate,
        total_price: set.price().gross,
        applied_markups: offer.applied_markups,
        request: StoredBookingRequest::V1(request.clone()),
        details: None,
        created: now,
        booking_date: None,
        cancellation_date: None,
    }
}
