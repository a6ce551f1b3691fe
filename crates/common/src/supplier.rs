//! Upstream accommodation suppliers.

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// An upstream accommodation supplier.
///
/// Each variant maps to exactly one connector instance registered with the
/// connector router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Supplier {
    Netstorming,
    Illusions,
    Etg,
    DirectContracts,
    Rakuten,
}

impl Supplier {
    /// Every known supplier, in declaration order.
    pub const ALL: [Supplier; 5] = [
        Supplier::Netstorming,
        Supplier::Illusions,
        Supplier::Etg,
        Supplier::DirectContracts,
        Supplier::Rakuten,
    ];

    /// Returns true if the supplier confirms bookings through a webhook
    /// rather than in the booking response.
    pub fn is_asynchronous(&self) -> bool {
        matches!(self, Supplier::Netstorming | Supplier::Etg)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Supplier::Netstorming => "Netstorming",
            Supplier::Illusions => "Illusions",
            Supplier::Etg => "Etg",
            Supplier::DirectContracts => "DirectContracts",
            Supplier::Rakuten => "Rakuten",
        }
    }
}

impl std::fmt::Display for Supplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Supplier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Supplier::ALL
            .into_iter()
            .find(|supplier| supplier.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownSupplier(s.to_string()))
    }
}
