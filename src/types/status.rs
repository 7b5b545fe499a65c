use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lifecycle state of a reservation.
///
/// Serialized with the labels the dashboard reports on. Parsing is
/// case-insensitive and accepts both the Portuguese labels and their
/// English equivalents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ReservationStatus {
    #[default]
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Confirmada")]
    Confirmed,
    #[serde(rename = "Cancelada")]
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 3] = [Self::Pending, Self::Confirmed, Self::Cancelled];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Confirmed => "Confirmada",
            Self::Cancelled => "Cancelada",
        }
    }

    /// An active reservation holds its table.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    pub fn parse(s: &str) -> Option<ReservationStatus> {
        match s.trim().to_lowercase().as_str() {
            "pendente" | "pending" => Some(Self::Pending),
            "confirmada" | "confirmed" => Some(Self::Confirmed),
            "cancelada" | "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            Error::bad_request(format!(
                "invalid status '{s}', expected one of: Pendente, Confirmada, Cancelada"
            ))
        })
    }
}

impl TryFrom<String> for ReservationStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
