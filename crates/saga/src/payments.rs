//! Card payment authorization, capture, void and refund.

use std::sync::Arc;

use chrono::Utc;
use common::{Money, PaymentMethod};
use domain::{Booking, Payment, PaymentStatus, merchant_reference};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use store::{EntityLocker, KeyedStore, Versioned};

use crate::bookings::BookingRecords;
use crate::error::{Result, SagaError};
use crate::services::PaymentGateway;

/// Entity lock name for payment mutation.
pub const PAYMENT_LOCK_ENTITY: &str = "payment";

/// A status update pushed by the payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResponse {
    /// Merchant reference of the payment, or the booking reference code.
    pub reference_code: String,
    pub status: PaymentStatus,
    pub amount: Money,
    #[serde(default)]
    pub data: Value,
}

/// Gateway operations on an existing payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaymentOperation {
    Capture,
    Void,
    Refund,
}

impl PaymentOperation {
    fn as_str(&self) -> &'static str {
        match self {
            PaymentOperation::Capture => "capture",
            PaymentOperation::Void => "void",
            PaymentOperation::Refund => "refund",
        }
    }

    fn allowed_from(&self, status: PaymentStatus) -> bool {
        match self {
            PaymentOperation::Capture => status.can_capture(),
            PaymentOperation::Void => status.can_void(),
            PaymentOperation::Refund => status.can_refund(),
        }
    }

    fn target(&self) -> PaymentStatus {
        match self {
            PaymentOperation::Capture => PaymentStatus::Captured,
            PaymentOperation::Void => PaymentStatus::Voided,
            PaymentOperation::Refund => PaymentStatus::Refunded,
        }
    }
}

/// Drives card payments through the gateway.
///
/// Payment rows are keyed by merchant reference. Every mutation runs under
/// the payment lock of the booking's reference code and mirrors the new
/// status onto the booking row.
pub struct PaymentAuthorizationController<B, P> {
    bookings: BookingRecords<B>,
    payments: P,
    gateway: Arc<dyn PaymentGateway>,
    locker: EntityLocker,
}

impl<B: Clone, P: Clone> Clone for PaymentAuthorizationController<B, P> {
    fn clone(&self) -> Self {
        Self {
            bookings: self.bookings.clone(),
            payments: self.payments.clone(),
            gateway: Arc::clone(&self.gateway),
            locker: self.locker.clone(),
        }
    }
}

impl<B, P> PaymentAuthorizationController<B, P>
where
    B: KeyedStore<i64, Booking>,
    P: KeyedStore<String, Payment>,
{
    pub fn new(bookings: BookingRecords<B>, payments: P, gateway: Arc<dyn PaymentGateway>, locker: EntityLocker) -> Self {
        Self {
            bookings,
            payments,
            gateway,
            locker,
        }
    }

    /// Authorizes the booking's total on the card.
    ///
    /// A declined authorization is stored as a `Failed` payment and mirrored
    /// onto the booking before the error is returned.
    #[tracing::instrument(skip(self))]
    pub async fn authorize(&self, reference_code: &str) -> Result<Payment> {
        let _guard = self.locker.acquire(PAYMENT_LOCK_ENTITY, reference_code).await?;

        let booking = self.bookings.find_by_reference(reference_code).await?;
        ensure_card(booking.payment_method)?;
        if booking.payment_status.is_committed() {
            return Err(SagaError::Validation(format!(
                "Booking {reference_code} is already paid"
            )));
        }

        let existing = self.payments_for(reference_code).await?.len();
        let now = Utc::now();
        let mut payment = Payment::new(
            reference_code,
            merchant_reference(reference_code, existing),
            booking.total_price,
            PaymentMethod::CreditCard,
            now,
        );

        let outcome = self
            .gateway
            .authorize(&payment.merchant_reference, payment.amount)
            .await;
        match &outcome {
            Ok(data) => {
                payment.status = PaymentStatus::Authorized;
                payment.data = data.clone();
            }
            Err(error) => {
                tracing::warn!(reference_code, %error, "card authorization declined");
                payment.status = PaymentStatus::Failed;
                payment.data = json!({ "error": error.to_string() });
            }
        }

        self.payments
            .insert(payment.merchant_reference.clone(), payment.clone())
            .await?;
        self.bookings
            .set_payment_status(reference_code, payment.status)
            .await?;
        metrics::counter!("payment_operations_total", "operation" => "authorize").increment(1);

        outcome.map(|_| payment)
    }

    pub async fn capture(&self, reference_code: &str) -> Result<Payment> {
        self.run(reference_code, PaymentOperation::Capture).await
    }

    pub async fn void(&self, reference_code: &str) -> Result<Payment> {
        self.run(reference_code, PaymentOperation::Void).await
    }

    pub async fn refund(&self, reference_code: &str) -> Result<Payment> {
        self.run(reference_code, PaymentOperation::Refund).await
    }

    #[tracing::instrument(skip(self), fields(operation = operation.as_str()))]
    async fn run(&self, reference_code: &str, operation: PaymentOperation) -> Result<Payment> {
        let _guard = self.locker.acquire(PAYMENT_LOCK_ENTITY, reference_code).await?;

        let booking = self.bookings.find_by_reference(reference_code).await?;
        ensure_card(booking.payment_method)?;

        let (key, row) = self
            .latest_payment(reference_code)
            .await?
            .ok_or_else(|| payment_not_found(reference_code))?;
        let mut payment = row.value;
        ensure_card(payment.payment_method)?;
        if !operation.allowed_from(payment.status) {
            return Err(SagaError::Validation(format!(
                "Cannot {} a payment in status {}",
                operation.as_str(),
                payment.status
            )));
        }

        let data = match operation {
            PaymentOperation::Capture => self.gateway.capture(&key, payment.amount).await?,
            PaymentOperation::Void => self.gateway.void(&key, payment.amount).await?,
            PaymentOperation::Refund => self.gateway.refund(&key, payment.amount).await?,
        };

        payment.status = operation.target();
        payment.data = data;
        payment.modified = Utc::now();
        self.payments.update(&key, payment.clone(), row.version).await?;
        self.bookings
            .set_payment_status(reference_code, payment.status)
            .await?;

        metrics::counter!("payment_operations_total", "operation" => operation.as_str()).increment(1);
        tracing::info!(reference_code, status = %payment.status, "payment updated");
        Ok(payment)
    }

    /// Applies a provider status update.
    ///
    /// A payload reporting the status the payment already has, or one it has
    /// already moved past, returns the stored payment unchanged.
    #[tracing::instrument(skip(self, response), fields(reference_code = %response.reference_code))]
    pub async fn process_payment_response(&self, response: PaymentResponse) -> Result<Payment> {
        let (key, found) = self.resolve(&response.reference_code).await?;
        let reference_code = found.value.reference_code;

        let _guard = self.locker.acquire(PAYMENT_LOCK_ENTITY, &reference_code).await?;

        let row = self
            .payments
            .get(&key)
            .await?
            .ok_or_else(|| payment_not_found(&response.reference_code))?;
        let mut payment = row.value;

        if payment.amount != response.amount {
            return Err(SagaError::Validation(format!(
                "Invalid payment amount, expected: {}, actual: {}",
                payment.amount, response.amount
            )));
        }

        if payment.status == response.status {
            metrics::counter!("payment_webhook_duplicates_total").increment(1);
            tracing::info!(status = %payment.status, "payment already in reported status");
            return Ok(payment);
        }

        if !payment.status.can_transition_to(response.status) {
            metrics::counter!("payment_webhook_duplicates_total").increment(1);
            tracing::warn!(
                status = %payment.status,
                reported = %response.status,
                "stale payment status ignored"
            );
            return Ok(payment);
        }

        payment.status = response.status;
        payment.data = response.data;
        payment.modified = Utc::now();
        self.payments.update(&key, payment.clone(), row.version).await?;
        self.bookings
            .set_payment_status(&reference_code, payment.status)
            .await?;

        metrics::counter!("payment_operations_total", "operation" => "webhook").increment(1);
        Ok(payment)
    }

    /// Payments made for a booking, oldest first.
    pub async fn payments_for(&self, reference_code: &str) -> Result<Vec<Payment>> {
        let mut payments: Vec<_> = self
            .scan_for(reference_code)
            .await?
            .into_iter()
            .map(|(_, row)| row.value)
            .collect();
        payments.sort_by_key(|payment| payment.created);
        Ok(payments)
    }

    async fn scan_for(&self, reference_code: &str) -> Result<Vec<(String, Versioned<Payment>)>> {
        Ok(self
            .payments
            .scan(&|_, payment: &Payment| payment.reference_code == reference_code)
            .await?)
    }

    async fn latest_payment(&self, reference_code: &str) -> Result<Option<(String, Versioned<Payment>)>> {
        Ok(self
            .scan_for(reference_code)
            .await?
            .into_iter()
            .max_by(|(a_key, a), (b_key, b)| {
                a.value
                    .created
                    .cmp(&b.value.created)
                    .then(a_key.len().cmp(&b_key.len()))
                    .then(a_key.cmp(b_key))
            }))
    }

    /// Finds a payment by merchant reference, falling back to the latest
    /// payment of a booking reference code.
    async fn resolve(&self, reference: &str) -> Result<(String, Versioned<Payment>)> {
        if let Some(row) = self.payments.get(&reference.to_string()).await? {
            return Ok((reference.to_string(), row));
        }
        self.latest_payment(reference)
            .await?
            .ok_or_else(|| payment_not_found(reference))
    }
}

fn ensure_card(method: PaymentMethod) -> Result<()> {
    if method != PaymentMethod::CreditCard {
        return Err(SagaError::Validation("Invalid payment method".to_string()));
    }
    Ok(())
}

fn payment_not_found(reference_code: &str) -> SagaError {
    SagaError::Validation(format!(
        "Could not find a payment record with the reference code {reference_code}"
    ))
}
