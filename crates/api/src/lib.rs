//! HTTP API server for the accommodation booking core.
//!
//! Provides REST endpoints for availability search, accommodation duplicate
//! reports, booking, payments and supplier/payment webhooks, with structured
//! logging (tracing) and Prometheus metrics.

pub mod agent;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::Supplier;
use domain::{
    Booking, BookingSettingsService, InMemoryCurrencyConverter, InMemorySupplierConnector, MarkupPolicy,
    MarkupPolicyManager, Payment, SupplierConnectorRouter,
};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    BookingRegistrationSaga, BookingServices, InMemoryAccountPaymentService, InMemoryDocumentsService,
    InMemoryNotificationService, InMemoryPaymentGateway, SagaEvent,
};
use search::{DuplicateRegistry, PriceProcessor, WideAvailabilitySearchOrchestrator};
use store::{InMemoryJournal, InMemoryNumerator, InMemoryStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Booking saga over the in-memory stores.
pub type BookingSaga = BookingRegistrationSaga<
    InMemoryStore<i64, Booking>,
    InMemoryStore<String, Payment>,
    InMemoryJournal<SagaEvent>,
    InMemoryNumerator,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub search: WideAvailabilitySearchOrchestrator,
    pub saga: BookingSaga,
    pub settings: BookingSettingsService,
    pub accounts: InMemoryAccountPaymentService,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/search", post(routes::search::start))
        .route("/search/{search_id}/state", get(routes::search::state))
        .route("/search/{search_id}/results", get(routes::search::results))
        .route("/bookings", post(routes::bookings::register))
        .route("/bookings", get(routes::bookings::list))
        .route("/bookings/book", post(routes::bookings::register_and_book))
        .route("/bookings/{reference_code}", get(routes::bookings::get))
        .route("/bookings/{reference_code}/finalize", post(routes::bookings::finalize))
        .route("/bookings/{reference_code}/cancel", post(routes::bookings::cancel))
        .route("/bookings/{reference_code}/saga", get(routes::bookings::saga_status))
        .route("/bookings/{reference_code}/payments", get(routes::payments::list))
        .route("/bookings/{reference_code}/payments/authorize", post(routes::payments::authorize))
        .route("/bookings/{reference_code}/payments/capture", post(routes::payments::capture))
        .route("/bookings/{reference_code}/payments/void", post(routes::payments::void))
        .route("/bookings/{reference_code}/payments/refund", post(routes::payments::refund))
        .route("/capture", get(routes::payments::capture_candidates))
        .route("/capture", post(routes::payments::capture_batch))
        .route("/accommodations/duplicates", post(routes::duplicates::report))
        .route("/accommodations/duplicates/{report_id}", get(routes::duplicates::get))
        .route(
            "/admin/accommodations/duplicates/{report_id}/approve",
            post(routes::duplicates::approve),
        )
        .route(
            "/admin/accommodations/duplicates/{report_id}/disapprove",
            post(routes::duplicates::disapprove),
        )
        .route("/webhooks/suppliers/{supplier}", post(routes::webhooks::supplier))
        .route("/webhooks/payments", post(routes::webhooks::payment))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// One in-memory connector per known supplier, for local runs.
pub fn default_connectors() -> SupplierConnectorRouter {
    Supplier::ALL
        .into_iter()
        .fold(SupplierConnectorRouter::new(), |router, supplier| {
            router.with(Arc::new(InMemorySupplierConnector::new(supplier)))
        })
}

/// Creates the application state over in-memory stores and fake external
/// services.
pub fn create_default_state(config: &Config, connectors: SupplierConnectorRouter) -> Arc<AppState> {
    let settings = BookingSettingsService::new(Supplier::ALL.to_vec(), config.settings_cache_ttl);

    let policies = Arc::new(MarkupPolicyManager::<InMemoryStore<i64, MarkupPolicy>, _>::new(
        InMemoryStore::new(),
        InMemoryNumerator::new(),
    ));
    let pricer = PriceProcessor::new(policies, settings.clone(), InMemoryCurrencyConverter::new());
    let search = WideAvailabilitySearchOrchestrator::new(
        connectors.clone(),
        settings.clone(),
        Arc::new(pricer),
        DuplicateRegistry::new(),
        config.search_options(),
    );

    let accounts = InMemoryAccountPaymentService::new();
    let services = BookingServices {
        connectors,
        settings: settings.clone(),
        evaluation_cache: search.evaluation_cache().clone(),
        gateway: Arc::new(InMemoryPaymentGateway::new()),
        accounts: Arc::new(accounts.clone()),
        documents: Arc::new(InMemoryDocumentsService::new()),
        notifications: Arc::new(InMemoryNotificationService::new()),
    };
    let saga = BookingRegistrationSaga::new(
        InMemoryStore::new(),
        InMemoryStore::new(),
        InMemoryJournal::new(),
        InMemoryNumerator::new(),
        services,
        config.saga_options(),
    );

    Arc::new(AppState {
        search,
        saga,
        settings,
        accounts,
    })
}
