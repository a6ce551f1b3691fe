//! Payment records and payment status.

use chrono::{DateTime, Utc};
use common::{Money, PaymentMethod};
use serde::{Deserialize, Serialize};

/// The state of the money behind a booking.
///
/// State transitions:
/// ```text
/// NotPaid ──┬──► Authorized ──┬──► Captured ──► Refunded
///           │        ▲        └──► Voided
///           ├──► PartiallyAuthorized ──► Voided
///           ├──► Captured (account charge)
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    NotPaid,
    Authorized,
    PartiallyAuthorized,
    Captured,
    Voided,
    Refunded,
    Failed,
}

impl PaymentStatus {
    /// Returns true if the money can be captured in this state.
    pub fn can_capture(&self) -> bool {
        matches!(self, PaymentStatus::Authorized)
    }

    /// Returns true if the authorization can be released in this state.
    pub fn can_void(&self) -> bool {
        matches!(self, PaymentStatus::Authorized | PaymentStatus::PartiallyAuthorized)
    }

    /// Returns true if captured money can be returned in this state.
    pub fn can_refund(&self) -> bool {
        matches!(self, PaymentStatus::Captured)
    }

    /// Returns true if a provider may move the payment from this state to
    /// `next`. Anything else is a stale or out-of-order report.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match self {
            PaymentStatus::NotPaid | PaymentStatus::Failed => matches!(
                next,
                PaymentStatus::Authorized | PaymentStatus::PartiallyAuthorized | PaymentStatus::Failed
            ) && *self != next,
            PaymentStatus::Authorized => matches!(next, PaymentStatus::Captured | PaymentStatus::Voided),
            PaymentStatus::PartiallyAuthorized => {
                matches!(next, PaymentStatus::Authorized | PaymentStatus::Voided)
            }
            PaymentStatus::Captured => next == PaymentStatus::Refunded,
            PaymentStatus::Voided | PaymentStatus::Refunded => false,
        }
    }

    /// Returns true if money is held or taken for the booking.
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Authorized | PaymentStatus::PartiallyAuthorized | PaymentStatus::Captured
        )
    }

    /// Status money moves to when its booking is cancelled, if any.
    pub fn on_cancellation(&self) -> Option<PaymentStatus> {
        match self {
            PaymentStatus::Authorized | PaymentStatus::PartiallyAuthorized => Some(PaymentStatus::Voided),
            PaymentStatus::Captured => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::NotPaid => "NotPaid",
            PaymentStatus::Authorized => "Authorized",
            PaymentStatus::PartiallyAuthorized => "PartiallyAuthorized",
            PaymentStatus::Captured => "Captured",
            PaymentStatus::Voided => "Voided",
            PaymentStatus::Refunded => "Refunded",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One payment attempt, keyed by the booking reference code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub reference_code: String,
    /// Reference sent to the gateway. Equal to the reference code for the
    /// first payment of a booking.
    pub merchant_reference: String,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    /// Gateway confirmation payload, stored as received.
    #[serde(default)]
    pub data: serde_json::Value,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        reference_code: impl Into<String>,
        merchant_reference: impl Into<String>,
        amount: Money,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            reference_code: reference_code.into(),
            merchant_reference: merchant_reference.into(),
            amount,
            payment_method,
            status: PaymentStatus::NotPaid,
            data: serde_json::Value::Null,
            created: now,
            modified: now,
        }
    }
}

/// Merchant reference for the next payment of a booking: the reference
/// code itself, then `{code}-{n}` once payments exist.
pub fn merchant_reference(reference_code: &str, existing_payments: usize) -> String {
    if existing_payments == 0 {
        reference_code.to_string()
    } else {
        format!("{reference_code}-{existing_payments}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PaymentStatus; 7] = [
        PaymentStatus::NotPaid,
        PaymentStatus::Authorized,
        PaymentStatus::PartiallyAuthorized,
        PaymentStatus::Captured,
        PaymentStatus::Voided,
        PaymentStatus::Refunded,
        PaymentStatus::Failed,
    ];

    #[test]
    fn capture_void_refund_predicates() {
        for status in ALL {
            assert_eq!(status.can_capture(), status == PaymentStatus::Authorized);
            assert_eq!(status.can_refund(), status == PaymentStatus::Captured);
        }
        assert!(PaymentStatus::Authorized.can_void());
        assert!(PaymentStatus::PartiallyAuthorized.can_void());
        assert!(!PaymentStatus::Captured.can_void());
    }

    #[test]
    fn provider_transitions_only_move_forward() {
        use PaymentStatus::*;

        assert!(NotPaid.can_transition_to(Authorized));
        assert!(NotPaid.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Authorized));
        assert!(PartiallyAuthorized.can_transition_to(Authorized));
        assert!(Authorized.can_transition_to(Captured));
        assert!(Authorized.can_transition_to(Voided));
        assert!(Captured.can_transition_to(Refunded));

        assert!(!Captured.can_transition_to(Authorized));
        assert!(!Refunded.can_transition_to(Captured));
        assert!(!Voided.can_transition_to(Authorized));
        assert!(!Authorized.can_transition_to(NotPaid));
        assert!(!NotPaid.can_transition_to(Captured));
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn cancellation_mapping() {
        assert_eq!(PaymentStatus::Authorized.on_cancellation(), Some(PaymentStatus::Voided));
        assert_eq!(
            PaymentStatus::PartiallyAuthorized.on_cancellation(),
            Some(PaymentStatus::Voided)
        );
        assert_eq!(PaymentStatus::Captured.on_cancellation(), Some(PaymentStatus::Refunded));
        assert_eq!(PaymentStatus::NotPaid.on_cancellation(), None);
        assert_eq!(PaymentStatus::Voided.on_cancellation(), None);
    }

    #[test]
    fn merchant_reference_is_suffixed_for_repeat_payments() {
        assert_eq!(merchant_reference("HTL-AE-0000001-01", 0), "HTL-AE-0000001-01");
        assert_eq!(merchant_reference("HTL-AE-0000001-01", 2), "HTL-AE-0000001-01-2");
    }
}
