use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::Money;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub booking_ref: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub room_type: RoomType,
    pub guests: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub special_requests: Option<String>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Everything the intake handler decides before the store assigns identity
/// and timestamps.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewBooking {
    pub booking_ref: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub room_type: RoomType,
    pub guests: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub special_requests: Option<String>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Studio,
    Executive,
    Vip,
}

impl RoomType {
    pub const DEFAULT: RoomType = RoomType::Studio;

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Studio => "studio",
            RoomType::Executive => "executive",
            RoomType::Vip => "vip",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "studio" => Some(RoomType::Studio),
            "executive" => Some(RoomType::Executive),
            "vip" => Some(RoomType::Vip),
            _ => None,
        }
    }

    /// Unknown categories are booked at the default room's rate.
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!(room_type = %s, "unknown room type, falling back to {}", Self::DEFAULT);
            Self::DEFAULT
        })
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Pay on arrival.
    Manual,
    #[serde(alias = "gateway")]
    Paystack,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Manual => "manual",
            PaymentMethod::Paystack => "paystack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "manual" => Some(PaymentMethod::Manual),
            "paystack" | "gateway" => Some(PaymentMethod::Paystack),
            _ => None,
        }
    }

    pub fn initial_status(&self) -> BookingStatus {
        match self {
            PaymentMethod::Manual => BookingStatus::PendingConfirmation,
            PaymentMethod::Paystack => BookingStatus::PendingPayment,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingConfirmation,
    PendingPayment,
    Confirmed,
    Paid,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::PendingConfirmation,
        BookingStatus::PendingPayment,
        BookingStatus::Confirmed,
        BookingStatus::Paid,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingConfirmation => "pending_confirmation",
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Paid => "paid",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Forward-only transition table. Re-applying the current status is not
    /// a transition; callers treat it as a no-op.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (PendingConfirmation, Confirmed | Paid | Cancelled)
                | (PendingPayment, Paid | Cancelled)
                | (Confirmed, Paid | Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Paid | BookingStatus::Cancelled)
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            BookingStatus::PendingConfirmation | BookingStatus::PendingPayment
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("refunded"), None);
    }

    #[test]
    fn pending_payment_only_moves_to_paid_or_cancelled() {
        let from = BookingStatus::PendingPayment;
        assert!(from.can_transition_to(BookingStatus::Paid));
        assert!(from.can_transition_to(BookingStatus::Cancelled));
        assert!(!from.can_transition_to(BookingStatus::Confirmed));
        assert!(!from.can_transition_to(BookingStatus::PendingConfirmation));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [BookingStatus::Paid, BookingStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in BookingStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} should be illegal");
            }
        }
    }

    #[test]
    fn nothing_moves_back_to_pending() {
        for from in BookingStatus::ALL {
            assert!(!from.can_transition_to(BookingStatus::PendingConfirmation));
            assert!(!from.can_transition_to(BookingStatus::PendingPayment));
        }
    }

    #[test]
    fn payment_method_picks_initial_status() {
        assert_eq!(
            PaymentMethod::Manual.initial_status(),
            BookingStatus::PendingConfirmation
        );
        assert_eq!(
            PaymentMethod::Paystack.initial_status(),
            BookingStatus::PendingPayment
        );
        assert_eq!(PaymentMethod::parse("gateway"), Some(PaymentMethod::Paystack));
    }

    #[test]
    fn room_type_falls_back_to_studio() {
        assert_eq!(RoomType::parse_lenient("Executive"), RoomType::Executive);
        assert_eq!(RoomType::parse_lenient("penthouse"), RoomType::Studio);
    }
}
