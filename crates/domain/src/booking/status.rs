//! Booking status state machine.

use serde::{Deserialize, Serialize};

/// The state of a booking in its lifecycle.
///
/// State transitions:
/// ```text
/// InternalProcessing ──► WaitingForResponse ──┬──► Confirmed ──┬──► Cancelled
///         │                     │             ├──► Pending ────┘
///         │                     │             ├──► Rejected
///         └─────────────────────┴─────────────┴──► Invalid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookingStatus {
    /// Registered, not yet sent to the supplier.
    #[default]
    InternalProcessing,

    /// Sent to the supplier; the answer is expected by webhook.
    WaitingForResponse,

    /// The supplier accepted the booking but has not confirmed it.
    Pending,

    Confirmed,

    /// Cancelled on the supplier (terminal state).
    Cancelled,

    /// Refused by the supplier (terminal state).
    Rejected,

    /// Could not be completed (terminal state).
    Invalid,
}

impl BookingStatus {
    /// Returns true if the booking can be sent to the supplier in this state.
    pub fn can_book(&self) -> bool {
        matches!(self, BookingStatus::InternalProcessing)
    }

    /// Returns true if a supplier answer may still change this state.
    pub fn can_accept_supplier_response(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the booking can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            BookingStatus::InternalProcessing
                | BookingStatus::WaitingForResponse
                | BookingStatus::Pending
                | BookingStatus::Confirmed
        )
    }

    /// Returns true if the supplier holds inventory for the booking.
    pub fn is_definite(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Pending)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Rejected | BookingStatus::Invalid
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::InternalProcessing => "InternalProcessing",
            BookingStatus::WaitingForResponse => "WaitingForResponse",
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Invalid => "Invalid",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
