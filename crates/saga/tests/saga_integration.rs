//! Integration tests for the booking saga and the payment controller.
//!
//! Every external system is an in-memory fake with failure toggles.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use common::{
    AgencyId, AgentContext, AgentId, CounterpartyId, Currency, Money, PaymentMethod, ResultId, RoomContractSetId,
    SearchId, Supplier,
};
use domain::{
    AccommodationBookingRequest, Accommodation, AgencyAccount, AprMode, BoardBasis, Booking, BookingSettingsService,
    BookingStatus, DailyRate, Deadline, InMemorySupplierConnector, Occupancy, PassedDeadlineOffersMode, Passenger,
    Payment, PaymentStatus, RoomContract, RoomContractSet, RoomPassengers, ScopeBookingSettings, SupplierBooking,
    SupplierBookingStatus, SupplierConnectorRouter,
};
use saga::booking_registration::{APR_REJECTION, DEADLINE_REJECTION};
use saga::{
    BookingRegistrationSaga, BookingServices, InMemoryAccountPaymentService, InMemoryDocumentsService,
    InMemoryNotificationService, InMemoryPaymentGateway, PaymentResponse, SagaError, SagaEvent, SagaOptions, SagaState,
    SentNotification,
};
use search::{BookingEvaluationCache, CachedOffer, EvaluationKey, SearchError};
use store::{InMemoryJournal, InMemoryNumerator, InMemoryStore};

type TestSaga = BookingRegistrationSaga<
    InMemoryStore<i64, Booking>,
    InMemoryStore<String, Payment>,
    InMemoryJournal<SagaEvent>,
    InMemoryNumerator,
>;

const AGENCY: i32 = 70;

fn agent() -> AgentContext {
    AgentContext::new(AgentId::new(7), AgencyId::new(AGENCY), CounterpartyId::new(700)).with_currency(Currency::Usd)
}

fn other_agency_agent() -> AgentContext {
    AgentContext::new(AgentId::new(8), AgencyId::new(80), CounterpartyId::new(700)).with_currency(Currency::Usd)
}

fn usd(minor: i64) -> Money {
    Money::from_minor(minor, Currency::Usd)
}

fn days_from_now(days: u64) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::days(days as i64)
}

/// Two nights at 100.00 USD.
fn offer(supplier: Supplier, deadline: Option<DateTime<Utc>>, apr: bool) -> CachedOffer {
    let check_in = Utc::now().date_naive() + Days::new(30);
    let daily_rates = (0..2)
        .map(|night| {
            let from = check_in + Days::new(night);
            DailyRate::new(from, from + Days::new(1), usd(10000), usd(9000))
        })
        .collect();
    let room = RoomContract::new("Deluxe", BoardBasis::BedAndBreakfast, Occupancy::adults(2), daily_rates, Currency::Usd);

    CachedOffer {
        agent_id: AgentId::new(7),
        supplier,
        accommodation: Accommodation {
            id: "acc-1".to_string(),
            name: "Creek Hotel".to_string(),
            country_code: "AE".to_string(),
        },
        check_in,
        check_out: check_in + Days::new(2),
        room_contract_set: RoomContractSet::new(
            RoomContractSetId::new(),
            vec![room],
            Deadline {
                date: deadline,
                ..Deadline::default()
            },
            apr,
            Currency::Usd,
        ),
        applied_markups: Vec::new(),
    }
}

fn request(key: EvaluationKey, payment_method: PaymentMethod) -> AccommodationBookingRequest {
    AccommodationBookingRequest {
        search_id: key.search_id,
        result_id: key.result_id,
        room_contract_set_id: key.room_contract_set_id,
        itinerary_number: None,
        payment_method,
        nationality: "GB".to_string(),
        residency: "GB".to_string(),
        rooms: vec![RoomPassengers {
            room_type: "Deluxe".to_string(),
            passengers: vec![Passenger {
                first_name: "Ann".to_string(),
                last_name: "Lee".to_string(),
                age: None,
                is_leader: true,
            }],
        }],
        reject_if_unavailable: true,
    }
}

fn webhook(booking: &Booking, status: SupplierBookingStatus) -> serde_json::Value {
    serde_json::to_value(SupplierBooking {
        reference_code: booking.reference_code.clone(),
        supplier_reference: "NS-HOOK".to_string(),
        status,
        check_in: booking.check_in,
        check_out: booking.check_out,
        deadline: None,
    })
    .unwrap()
}

struct Harness {
    saga: TestSaga,
    netstorming: InMemorySupplierConnector,
    illusions: InMemorySupplierConnector,
    settings: BookingSettingsService,
    cache: BookingEvaluationCache,
    gateway: InMemoryPaymentGateway,
    accounts: InMemoryAccountPaymentService,
    documents: InMemoryDocumentsService,
    notifications: InMemoryNotificationService,
    bookings: InMemoryStore<i64, Booking>,
    journal: InMemoryJournal<SagaEvent>,
}

impl Harness {
    fn new() -> Self {
        let netstorming = InMemorySupplierConnector::new(Supplier::Netstorming);
        let illusions = InMemorySupplierConnector::new(Supplier::Illusions);
        let connectors = SupplierConnectorRouter::new()
            .with(Arc::new(netstorming.clone()))
            .with(Arc::new(illusions.clone()));

        let settings = BookingSettingsService::default();
        let cache = BookingEvaluationCache::new(Duration::from_secs(900));
        let gateway = InMemoryPaymentGateway::new();
        let accounts = InMemoryAccountPaymentService::new();
        accounts.set_account(AgencyAccount::new(AgencyId::new(AGENCY), usd(100000), usd(0)));
        let documents = InMemoryDocumentsService::new();
        let notifications = InMemoryNotificationService::new();
        let bookings = InMemoryStore::new();
        let journal = InMemoryJournal::new();

        let services = BookingServices {
            connectors,
            settings: settings.clone(),
            evaluation_cache: cache.clone(),
            gateway: Arc::new(gateway.clone()),
            accounts: Arc::new(accounts.clone()),
            documents: Arc::new(documents.clone()),
            notifications: Arc::new(notifications.clone()),
        };
        let saga = BookingRegistrationSaga::new(
            bookings.clone(),
            InMemoryStore::new(),
            journal.clone(),
            InMemoryNumerator::new(),
            services,
            SagaOptions::default(),
        );

        Self {
            saga,
            netstorming,
            illusions,
            settings,
            cache,
            gateway,
            accounts,
            documents,
            notifications,
            bookings,
            journal,
        }
    }

    fn cache_offer(&self, offer: CachedOffer) -> EvaluationKey {
        let key = EvaluationKey::new(SearchId::new(), ResultId::new(), offer.room_contract_set.id);
        self.cache.set(key, offer);
        key
    }

    fn allow_passed_deadlines(&self) {
        self.settings.set_agent_settings(
            AgentId::new(7),
            ScopeBookingSettings {
                passed_deadline_offers_mode: Some(PassedDeadlineOffersMode::CardAndAccountPurchases),
                ..Default::default()
            },
        );
    }

    async fn register(&self, offer: CachedOffer, method: PaymentMethod) -> Booking {
        let key = self.cache_offer(offer);
        self.saga.register(request(key, method), &agent()).await.unwrap()
    }

    /// Registers a card booking, authorizes it and books it on Netstorming.
    async fn confirmed_card_booking(&self, deadline: DateTime<Utc>) -> Booking {
        let booking = self
            .register(offer(Supplier::Netstorming, Some(deadline), false), PaymentMethod::CreditCard)
            .await;
        self.saga.payments().authorize(&booking.reference_code).await.unwrap();
        self.saga.finalize(&booking.reference_code, &agent()).await.unwrap()
    }
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn deadline_gate_rejection_creates_no_row() {
        let h = Harness::new();
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(Utc::now() + chrono::Duration::hours(3)), false));

        let error = h
            .saga
            .register(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap_err();

        assert!(matches!(error, SagaError::Rejected(_)));
        assert_eq!(error.to_string(), DEADLINE_REJECTION);
        assert!(h.bookings.is_empty().await);
        assert_eq!(h.journal.entry_count().await, 0);
    }

    #[tokio::test]
    async fn apr_gate_depends_on_payment_method() {
        let h = Harness::new();
        h.settings.set_agent_settings(
            AgentId::new(7),
            ScopeBookingSettings {
                apr_mode: Some(AprMode::CardPurchasesOnly),
                ..Default::default()
            },
        );
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), true));

        let error = h
            .saga
            .register(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), APR_REJECTION);

        let booking = h
            .saga
            .register(request(key, PaymentMethod::CreditCard), &agent())
            .await
            .unwrap();
        assert!(booking.is_advance_purchase_rate);
    }

    #[tokio::test]
    async fn registered_booking_waits_for_payment() {
        let h = Harness::new();
        let booking = h
            .register(offer(Supplier::Netstorming, Some(days_from_now(20)), false), PaymentMethod::CreditCard)
            .await;

        assert_eq!(booking.id, 1);
        assert_eq!(booking.reference_code, "HTL-AE-0000001-01");
        assert_eq!(booking.itinerary_number, "0000001");
        assert_eq!(booking.status, BookingStatus::InternalProcessing);
        assert_eq!(booking.payment_status, PaymentStatus::NotPaid);
        assert_eq!(booking.total_price, usd(20000));
        assert_eq!(h.netstorming.book_calls(), 0);

        let instance = h.saga.saga_instance(&booking.reference_code).await.unwrap();
        assert_eq!(instance.state(), SagaState::Completed);
        assert_eq!(instance.completed_steps(), &["register".to_string()]);
    }

    #[tokio::test]
    async fn expired_offer_is_not_found() {
        let h = Harness::new();
        let key = EvaluationKey::new(SearchId::new(), ResultId::new(), RoomContractSetId::new());

        let error = h
            .saga
            .register(request(key, PaymentMethod::CreditCard), &agent())
            .await
            .unwrap_err();

        assert!(matches!(error, SagaError::Search(SearchError::OfferNotFound)));
    }

    #[tokio::test]
    async fn offer_returned_to_another_agent_is_not_found() {
        let h = Harness::new();
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));

        let error = h
            .saga
            .register(request(key, PaymentMethod::CreditCard), &other_agency_agent())
            .await
            .unwrap_err();

        assert!(matches!(error, SagaError::Search(SearchError::OfferNotFound)));
        assert!(h.bookings.is_empty().await);
        assert_eq!(h.journal.entry_count().await, 0);

        let own = h.saga.register(request(key, PaymentMethod::CreditCard), &agent()).await;
        assert!(own.is_ok());
    }

    #[tokio::test]
    async fn same_offer_can_be_registered_twice() {
        let h = Harness::new();
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));

        let first = h.saga.register(request(key, PaymentMethod::CreditCard), &agent()).await.unwrap();
        let second = h.saga.register(request(key, PaymentMethod::CreditCard), &agent()).await.unwrap();

        assert_ne!(first.reference_code, second.reference_code);
        assert_eq!(h.bookings.len().await, 2);
    }
}

mod itinerary {
    use super::*;

    #[tokio::test]
    async fn agency_itinerary_is_reused() {
        let h = Harness::new();
        let first = h
            .register(offer(Supplier::Netstorming, Some(days_from_now(20)), false), PaymentMethod::CreditCard)
            .await;

        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));
        let mut by_itn = request(key, PaymentMethod::CreditCard);
        by_itn.itinerary_number = Some(first.itinerary_number.clone());
        let second = h.saga.register(by_itn, &agent()).await.unwrap();

        let mut by_reference = request(key, PaymentMethod::CreditCard);
        by_reference.itinerary_number = Some(first.reference_code.clone());
        let third = h.saga.register(by_reference, &agent()).await.unwrap();

        assert_eq!(second.itinerary_number, first.itinerary_number);
        assert_eq!(second.reference_code, "HTL-AE-0000001-02");
        assert_eq!(third.reference_code, "HTL-AE-0000001-03");
    }

    #[tokio::test]
    async fn unknown_or_foreign_itinerary_mints_a_new_one() {
        let h = Harness::new();
        let first = h
            .register(offer(Supplier::Netstorming, Some(days_from_now(20)), false), PaymentMethod::CreditCard)
            .await;

        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));
        let mut unknown = request(key, PaymentMethod::CreditCard);
        unknown.itinerary_number = Some("9999999".to_string());
        let second = h.saga.register(unknown, &agent()).await.unwrap();
        assert_eq!(second.itinerary_number, "0000002");

        let mut foreign_offer = offer(Supplier::Netstorming, Some(days_from_now(20)), false);
        foreign_offer.agent_id = other_agency_agent().agent_id;
        let mut foreign = request(h.cache_offer(foreign_offer), PaymentMethod::CreditCard);
        foreign.itinerary_number = Some(first.itinerary_number.clone());
        let third = h.saga.register(foreign, &other_agency_agent()).await.unwrap();
        assert_eq!(third.itinerary_number, "0000003");
    }
}

mod booking {
    use super::*;

    #[tokio::test]
    async fn account_booking_is_confirmed_and_post_processed() {
        let h = Harness::new();
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));

        let booking = h
            .saga
            .register_and_book(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.booking_date.is_some());
        assert_eq!(booking.supplier_reference(), Some("NETSTORMING-0001"));
        assert_eq!(booking.payment_status, PaymentStatus::NotPaid);
        assert!(h.accounts.charged().is_empty());

        assert_eq!(h.documents.invoices().len(), 1);
        assert_eq!(
            h.notifications.sent(),
            vec![
                SentNotification::Booking {
                    reference_code: booking.reference_code.clone()
                },
                SentNotification::Invoice {
                    reference_code: booking.reference_code.clone(),
                    invoice_number: "INV-0001".to_string()
                },
            ]
        );

        let instance = h.saga.saga_instance(&booking.reference_code).await.unwrap();
        assert_eq!(instance.state(), SagaState::Completed);
        assert_eq!(instance.supplier_reference(), Some("NETSTORMING-0001"));
    }

    #[tokio::test]
    async fn passed_deadline_charges_the_account_first() {
        let h = Harness::new();
        h.allow_passed_deadlines();
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(Utc::now() - chrono::Duration::hours(1)), false));

        let booking = h
            .saga
            .register_and_book(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Captured);
        assert_eq!(h.accounts.balance(AgencyId::new(AGENCY)), Some(usd(80000)));
    }

    #[tokio::test]
    async fn failed_account_charge_invalidates_without_contacting_supplier() {
        let h = Harness::new();
        h.allow_passed_deadlines();
        h.accounts.set_fail_on_charge(true);
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(Utc::now() - chrono::Duration::hours(1)), false));

        let error = h
            .saga
            .register_and_book(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap_err();

        assert!(matches!(error, SagaError::AccountPayment(_)));
        let booking = h.saga.bookings().get(1).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Invalid);
        assert_eq!(booking.payment_status, PaymentStatus::NotPaid);
        assert_eq!(h.netstorming.book_calls(), 0);

        let instance = h.saga.saga_instance(&booking.reference_code).await.unwrap();
        assert_eq!(instance.state(), SagaState::Failed);
    }

    #[tokio::test]
    async fn rejection_after_charge_refunds_the_account() {
        let h = Harness::new();
        h.allow_passed_deadlines();
        h.netstorming.set_book_status(SupplierBookingStatus::Rejected);
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(Utc::now() - chrono::Duration::hours(1)), false));

        let booking = h
            .saga
            .register_and_book(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Rejected);
        assert_eq!(booking.payment_status, PaymentStatus::Refunded);
        assert_eq!(h.accounts.balance(AgencyId::new(AGENCY)), Some(usd(100000)));
        assert!(h.notifications.sent().is_empty());

        let instance = h.saga.saga_instance(&booking.reference_code).await.unwrap();
        assert_eq!(instance.state(), SagaState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn supplier_timeout_leaves_booking_waiting() {
        let h = Harness::new();
        h.netstorming.set_latency(Duration::from_secs(10));
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));

        let booking = h
            .saga
            .register_and_book(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::WaitingForResponse);
        assert_eq!(h.netstorming.cancelled(), vec![booking.reference_code.clone()]);

        let instance = h.saga.saga_instance(&booking.reference_code).await.unwrap();
        assert_eq!(instance.state(), SagaState::AwaitingSupplier);
        assert_eq!(instance.failure_reason(), Some("Supplier Netstorming timed out after 5000 ms"));
    }

    #[tokio::test]
    async fn processing_answer_waits_without_cancelling() {
        let h = Harness::new();
        h.netstorming.set_book_status(SupplierBookingStatus::Processing);
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));

        let booking = h
            .saga
            .register_and_book(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::WaitingForResponse);
        assert!(h.netstorming.cancelled().is_empty());
    }

    #[tokio::test]
    async fn post_processing_failures_are_swallowed() {
        let h = Harness::new();
        h.documents.set_fail_on_invoice(true);
        h.notifications.set_fail_on_send(true);
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));

        let booking = h
            .saga
            .register_and_book(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        let instance = h.saga.saga_instance(&booking.reference_code).await.unwrap();
        assert_eq!(instance.state(), SagaState::Completed);
    }

    #[tokio::test]
    async fn card_bookings_cannot_use_the_one_step_flow() {
        let h = Harness::new();
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));

        let outcome = h
            .saga
            .register_and_book(request(key, PaymentMethod::CreditCard), &agent())
            .await;

        assert!(matches!(outcome, Err(SagaError::Validation(_))));
        assert!(h.bookings.is_empty().await);
    }
}

mod card_payments {
    use super::*;

    #[tokio::test]
    async fn supplier_failure_after_authorization_keeps_the_authorization() {
        let h = Harness::new();
        let booking = h
            .register(offer(Supplier::Netstorming, Some(days_from_now(20)), false), PaymentMethod::CreditCard)
            .await;

        let payment = h.saga.payments().authorize(&booking.reference_code).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Authorized);
        assert_eq!(payment.merchant_reference, booking.reference_code);

        h.netstorming.set_fail_on_book(true);
        let booking = h.saga.finalize(&booking.reference_code, &agent()).await.unwrap();

        assert_eq!(booking.status, BookingStatus::WaitingForResponse);
        assert_eq!(booking.payment_status, PaymentStatus::Authorized);
        assert_eq!(h.gateway.operation_count("void"), 0);
    }

    #[tokio::test]
    async fn finalize_requires_payment() {
        let h = Harness::new();
        let booking = h
            .register(offer(Supplier::Netstorming, Some(days_from_now(20)), false), PaymentMethod::CreditCard)
            .await;

        let outcome = h.saga.finalize(&booking.reference_code, &agent()).await;

        assert!(matches!(outcome, Err(SagaError::Validation(_))));
        assert_eq!(h.netstorming.book_calls(), 0);
    }

    #[tokio::test]
    async fn declined_authorization_is_recorded_and_retry_gets_new_reference() {
        let h = Harness::new();
        let booking = h
            .register(offer(Supplier::Netstorming, Some(days_from_now(20)), false), PaymentMethod::CreditCard)
            .await;

        h.gateway.set_fail_on_authorize(true);
        assert!(h.saga.payments().authorize(&booking.reference_code).await.is_err());
        let stored = h.saga.bookings().find_by_reference(&booking.reference_code).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Failed);

        h.gateway.set_fail_on_authorize(false);
        let retry = h.saga.payments().authorize(&booking.reference_code).await.unwrap();
        assert_eq!(retry.merchant_reference, format!("{}-1", booking.reference_code));

        let payments = h.saga.payments().payments_for(&booking.reference_code).await.unwrap();
        let statuses: Vec<_> = payments.iter().map(|payment| payment.status).collect();
        assert_eq!(statuses, [PaymentStatus::Failed, PaymentStatus::Authorized]);
    }

    #[tokio::test]
    async fn non_card_bookings_reject_card_operations() {
        let h = Harness::new();
        let booking = h
            .register(offer(Supplier::Netstorming, Some(days_from_now(20)), false), PaymentMethod::BankTransfer)
            .await;

        for outcome in [
            h.saga.payments().authorize(&booking.reference_code).await,
            h.saga.payments().capture(&booking.reference_code).await,
            h.saga.payments().void(&booking.reference_code).await,
            h.saga.payments().refund(&booking.reference_code).await,
        ] {
            assert_eq!(outcome.unwrap_err().to_string(), "Invalid payment method");
        }
    }

    #[tokio::test]
    async fn capture_requires_authorization() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;

        h.saga.payments().capture(&booking.reference_code).await.unwrap();
        let again = h.saga.payments().capture(&booking.reference_code).await;

        assert!(matches!(again, Err(SagaError::Validation(_))));
        assert_eq!(h.gateway.operation_count("capture"), 1);
    }
}

mod payment_webhook {
    use super::*;

    #[tokio::test]
    async fn duplicate_update_is_a_no_op() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;
        let update = PaymentResponse {
            reference_code: booking.reference_code.clone(),
            status: PaymentStatus::Captured,
            amount: usd(20000),
            data: serde_json::json!({ "event": "captured" }),
        };

        let first = h.saga.payments().process_payment_response(update.clone()).await.unwrap();
        let mut repeated = update.clone();
        repeated.data = serde_json::json!({ "event": "captured-again" });
        let second = h.saga.payments().process_payment_response(repeated).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.data["event"], "captured");
        let stored = h.saga.bookings().find_by_reference(&booking.reference_code).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Captured);
    }

    #[tokio::test]
    async fn stale_authorization_after_capture_is_ignored() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(5)).await;
        let captured = h.saga.payments().capture(&booking.reference_code).await.unwrap();

        let after = h
            .saga
            .payments()
            .process_payment_response(PaymentResponse {
                reference_code: booking.reference_code.clone(),
                status: PaymentStatus::Authorized,
                amount: usd(20000),
                data: serde_json::json!({ "event": "authorized" }),
            })
            .await
            .unwrap();

        assert_eq!(after, captured);
        let stored = h.saga.bookings().find_by_reference(&booking.reference_code).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Captured);
        assert!(h.saga.get_for_capture(days_from_now(10)).await.unwrap().is_empty());
        assert_eq!(h.gateway.operation_count("capture"), 1);
    }

    #[tokio::test]
    async fn refunded_payment_cannot_be_captured_again() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;
        h.saga.payments().capture(&booking.reference_code).await.unwrap();
        h.saga.payments().refund(&booking.reference_code).await.unwrap();

        let after = h
            .saga
            .payments()
            .process_payment_response(PaymentResponse {
                reference_code: booking.reference_code.clone(),
                status: PaymentStatus::Captured,
                amount: usd(20000),
                data: serde_json::Value::Null,
            })
            .await
            .unwrap();

        assert_eq!(after.status, PaymentStatus::Refunded);
        let stored = h.saga.bookings().find_by_reference(&booking.reference_code).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn amount_mismatch_is_rejected() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;

        let error = h
            .saga
            .payments()
            .process_payment_response(PaymentResponse {
                reference_code: booking.reference_code.clone(),
                status: PaymentStatus::Captured,
                amount: usd(19000),
                data: serde_json::Value::Null,
            })
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Invalid payment amount, expected: 200.00 USD, actual: 190.00 USD"
        );
    }

    #[tokio::test]
    async fn unknown_reference_is_rejected() {
        let h = Harness::new();

        let error = h
            .saga
            .payments()
            .process_payment_response(PaymentResponse {
                reference_code: "HTL-AE-0000404-01".to_string(),
                status: PaymentStatus::Authorized,
                amount: usd(100),
                data: serde_json::Value::Null,
            })
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "Could not find a payment record with the reference code HTL-AE-0000404-01"
        );
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn money_is_voided_only_after_supplier_cancels() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;
        assert_eq!(booking.status, BookingStatus::Confirmed);

        h.netstorming.set_fail_on_cancel(true);
        assert!(h.saga.cancel(&booking.reference_code, &agent()).await.is_err());
        let unchanged = h.saga.bookings().find_by_reference(&booking.reference_code).await.unwrap();
        assert_eq!(unchanged.status, BookingStatus::Confirmed);
        assert_eq!(unchanged.payment_status, PaymentStatus::Authorized);
        assert_eq!(h.gateway.operation_count("void"), 0);

        h.netstorming.set_fail_on_cancel(false);
        let cancelled = h.saga.cancel(&booking.reference_code, &agent()).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Voided);
        assert!(cancelled.cancellation_date.is_some());
    }

    #[tokio::test]
    async fn captured_card_payment_is_refunded() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;
        h.saga.payments().capture(&booking.reference_code).await.unwrap();

        let cancelled = h.saga.cancel(&booking.reference_code, &agent()).await.unwrap();

        assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
        assert_eq!(h.gateway.operation_count("refund"), 1);
    }

    #[tokio::test]
    async fn second_cancellation_fails() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;
        h.saga.cancel(&booking.reference_code, &agent()).await.unwrap();

        let error = h.saga.cancel(&booking.reference_code, &agent()).await.unwrap_err();

        assert_eq!(error.to_string(), "Booking was already cancelled");
        assert_eq!(h.netstorming.cancelled().len(), 1);
    }

    #[tokio::test]
    async fn other_agencies_cannot_cancel() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;

        let outcome = h.saga.cancel(&booking.reference_code, &other_agency_agent()).await;

        assert!(matches!(outcome, Err(SagaError::BookingNotFound(_))));
        assert!(h.netstorming.cancelled().is_empty());
    }

    #[tokio::test]
    async fn unsent_booking_is_cancelled_locally() {
        let h = Harness::new();
        let booking = h
            .register(offer(Supplier::Netstorming, Some(days_from_now(20)), false), PaymentMethod::CreditCard)
            .await;

        let cancelled = h.saga.cancel(&booking.reference_code, &agent()).await.unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(h.netstorming.cancelled().is_empty());
    }
}

mod supplier_webhook {
    use super::*;

    async fn waiting_booking(h: &Harness) -> Booking {
        h.netstorming.set_book_status(SupplierBookingStatus::Processing);
        let key = h.cache_offer(offer(Supplier::Netstorming, Some(days_from_now(20)), false));
        h.saga
            .register_and_book(request(key, PaymentMethod::BankTransfer), &agent())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn synchronous_suppliers_are_rejected() {
        let h = Harness::new();

        let error = h
            .saga
            .process_supplier_webhook(Supplier::Illusions, &serde_json::json!({}))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Illusions isn't asynchronous");
        assert_eq!(h.illusions.book_calls(), 0);
    }

    #[tokio::test]
    async fn confirmation_completes_the_waiting_run() {
        let h = Harness::new();
        let booking = waiting_booking(&h).await;
        assert_eq!(booking.status, BookingStatus::WaitingForResponse);

        let confirmed = h
            .saga
            .process_supplier_webhook(Supplier::Netstorming, &webhook(&booking, SupplierBookingStatus::Confirmed))
            .await
            .unwrap();

        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.supplier_reference(), Some("NS-HOOK"));
        assert_eq!(h.documents.invoices().len(), 1);

        let instance = h.saga.saga_instance(&booking.reference_code).await.unwrap();
        assert_eq!(instance.state(), SagaState::Completed);
        assert_eq!(instance.runs(), 1);
    }

    #[tokio::test]
    async fn repeated_confirmation_has_no_side_effects() {
        let h = Harness::new();
        let booking = waiting_booking(&h).await;
        let payload = webhook(&booking, SupplierBookingStatus::Confirmed);

        h.saga.process_supplier_webhook(Supplier::Netstorming, &payload).await.unwrap();
        h.saga.process_supplier_webhook(Supplier::Netstorming, &payload).await.unwrap();

        assert_eq!(h.documents.invoices().len(), 1);
    }

    #[tokio::test]
    async fn updates_for_terminal_bookings_are_ignored() {
        let h = Harness::new();
        let booking = waiting_booking(&h).await;
        h.saga
            .process_supplier_webhook(Supplier::Netstorming, &webhook(&booking, SupplierBookingStatus::Rejected))
            .await
            .unwrap();

        let after = h
            .saga
            .process_supplier_webhook(Supplier::Netstorming, &webhook(&booking, SupplierBookingStatus::Confirmed))
            .await
            .unwrap();

        assert_eq!(after.status, BookingStatus::Rejected);
        assert!(after.booking_date.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn update_waits_for_a_cancellation_in_progress() {
        let h = Harness::new();
        let booking = waiting_booking(&h).await;
        h.netstorming.set_cancel_latency(Duration::from_secs(2));
        let payload = webhook(&booking, SupplierBookingStatus::Confirmed);

        let agent = agent();
        let (cancelled, updated) = tokio::join!(h.saga.cancel(&booking.reference_code, &agent), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            h.saga.process_supplier_webhook(Supplier::Netstorming, &payload).await
        });

        assert_eq!(cancelled.unwrap().status, BookingStatus::Cancelled);
        assert_eq!(updated.unwrap().status, BookingStatus::Cancelled);
        assert!(h.documents.invoices().is_empty());

        let instance = h.saga.saga_instance(&booking.reference_code).await.unwrap();
        assert_eq!(instance.state(), SagaState::Completed);
        assert_eq!(instance.runs(), 2);
    }

    #[tokio::test]
    async fn supplier_cancellation_voids_card_payment() {
        let h = Harness::new();
        let booking = h.confirmed_card_booking(days_from_now(20)).await;

        let cancelled = h
            .saga
            .process_supplier_webhook(Supplier::Netstorming, &webhook(&booking, SupplierBookingStatus::Cancelled))
            .await
            .unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Voided);
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let h = Harness::new();
        let payload = serde_json::to_value(SupplierBooking {
            reference_code: "HTL-AE-0000404-01".to_string(),
            supplier_reference: String::new(),
            status: SupplierBookingStatus::Confirmed,
            check_in: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 12, 3).unwrap(),
            deadline: None,
        })
        .unwrap();

        let outcome = h.saga.process_supplier_webhook(Supplier::Netstorming, &payload).await;

        assert!(matches!(outcome, Err(SagaError::BookingNotFound(_))));
    }
}

mod capture {
    use super::*;

    #[tokio::test]
    async fn bookings_are_selected_by_deadline() {
        let h = Harness::new();
        let due = h.confirmed_card_booking(days_from_now(5)).await;
        let later = h.confirmed_card_booking(days_from_now(20)).await;

        let ids = h.saga.get_for_capture(days_from_now(10)).await.unwrap();
        assert_eq!(ids, vec![due.id]);

        let ids = h.saga.get_for_capture(days_from_now(25)).await.unwrap();
        assert_eq!(ids, vec![due.id, later.id]);
    }

    #[tokio::test]
    async fn capture_reports_each_booking() {
        let h = Harness::new();
        let due = h.confirmed_card_booking(days_from_now(5)).await;

        let outcomes = h.saga.capture(&[due.id, 404]).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[0].status, Some(PaymentStatus::Captured));
        assert_eq!(outcomes[0].reference_code.as_deref(), Some(due.reference_code.as_str()));
        assert!(!outcomes[1].is_success());

        assert!(h.saga.get_for_capture(days_from_now(10)).await.unwrap().is_empty());
    }
}
