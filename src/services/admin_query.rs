use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    BookingRef,
    #[default]
    CreatedAt,
    CheckIn,
    Total,
    Name,
    Status,
}

impl SortKey {
    fn default_dir(self) -> SortDir {
        match self {
            SortKey::Name | SortKey::Status => SortDir::Asc,
            _ => SortDir::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingQuery {
    pub search: Option<String>,
    /// A status name, or `all`.
    pub status: Option<String>,
    pub sort: Option<SortKey>,
    pub dir: Option<SortDir>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingSummary {
    pub total: usize,
    pub pending: usize,
    pub confirmed_or_paid: usize,
    /// Sum of totals over bookings that are not cancelled.
    pub revenue: Money,
}

impl BookingQuery {
    fn status_filter(&self) -> Result<Option<BookingStatus>, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(s) => BookingStatus::parse(s)
                .map(Some)
                .ok_or_else(|| AppError::validation(format!("Unknown status: {s}"), vec!["status"])),
        }
    }

    fn matches(&self, booking: &Booking, needle: &str) -> bool {
        needle.is_empty()
            || booking.name.to_lowercase().contains(needle)
            || booking.email.to_lowercase().contains(needle)
            || booking.booking_ref.to_lowercase().contains(needle)
            || booking.phone.contains(needle)
    }

    /// Filters then sorts. Defaults to newest first.
    pub fn apply(&self, bookings: Vec<Booking>) -> Result<Vec<Booking>, AppError> {
        let status = self.status_filter()?;
        let needle = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();

        let mut list: Vec<Booking> = bookings
            .into_iter()
            .filter(|b| status.map_or(true, |s| b.status == s))
            .filter(|b| self.matches(b, &needle))
            .collect();

        let key = self.sort.unwrap_or_default();
        let dir = self.dir.unwrap_or_else(|| key.default_dir());
        list.sort_by(|a, b| {
            let ord = compare(key, a, b);
            match dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        });
        Ok(list)
    }
}

fn compare(key: SortKey, a: &Booking, b: &Booking) -> Ordering {
    match key {
        SortKey::BookingRef => a.booking_ref.cmp(&b.booking_ref),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::CheckIn => a.check_in.cmp(&b.check_in),
        SortKey::Total => a.total.cmp(&b.total),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

pub fn summarize(bookings: &[Booking]) -> BookingSummary {
    BookingSummary {
        total: bookings.len(),
        pending: bookings.iter().filter(|b| b.status.is_pending()).count(),
        confirmed_or_paid: bookings
            .iter()
            .filter(|b| matches!(b.status, BookingStatus::Confirmed | BookingStatus::Paid))
            .count(),
        revenue: bookings
            .iter()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .map(|b| b.total)
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    use crate::models::{PaymentMethod, RoomType};

    fn booking(n: i64, name: &str, status: BookingStatus, total: i64) -> Booking {
        let created = Utc::now().naive_utc() + Duration::minutes(n);
        Booking {
            id: format!("id-{n}"),
            booking_ref: format!("EBOMI-{n}-ABCDEF"),
            check_in: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap() + Duration::days(n),
            check_out: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap() + Duration::days(n),
            nights: 1,
            room_type: RoomType::Studio,
            guests: 1,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: format!("+23480000000{n}"),
            special_requests: None,
            subtotal: Money::from_major(total),
            tax: Money::default(),
            total: Money::from_major(total),
            payment_method: PaymentMethod::Manual,
            status,
            created_at: created,
            updated_at: created,
        }
    }

    fn sample() -> Vec<Booking> {
        vec![
            booking(1, "Chidi", BookingStatus::PendingConfirmation, 10_500),
            booking(2, "Amaka", BookingStatus::Paid, 37_800),
            booking(3, "Bola", BookingStatus::Cancelled, 21_000),
            booking(4, "Dayo", BookingStatus::PendingPayment, 63_000),
        ]
    }

    fn refs(list: &[Booking]) -> Vec<&str> {
        list.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn default_is_newest_first() {
        let list = BookingQuery::default().apply(sample()).unwrap();
        assert_eq!(refs(&list), vec!["id-4", "id-3", "id-2", "id-1"]);
    }

    #[test]
    fn name_sorts_ascending_by_default() {
        let query = BookingQuery {
            sort: Some(SortKey::Name),
            ..Default::default()
        };
        let list = query.apply(sample()).unwrap();
        assert_eq!(refs(&list), vec!["id-2", "id-3", "id-1", "id-4"]);
    }

    #[test]
    fn filters_by_status_and_search() {
        let query = BookingQuery {
            status: Some("paid".to_string()),
            ..Default::default()
        };
        assert_eq!(refs(&query.apply(sample()).unwrap()), vec!["id-2"]);

        let query = BookingQuery {
            search: Some("DAYO@".to_string()),
            ..Default::default()
        };
        assert_eq!(refs(&query.apply(sample()).unwrap()), vec!["id-4"]);

        let query = BookingQuery {
            status: Some("all".to_string()),
            search: Some("ebomi-1-".to_string()),
            ..Default::default()
        };
        assert_eq!(refs(&query.apply(sample()).unwrap()), vec!["id-1"]);
    }

    #[test]
    fn unknown_status_filter_is_validation_error() {
        let query = BookingQuery {
            status: Some("refunded".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.apply(sample()), Err(AppError::Validation { .. })));
    }

    #[test]
    fn summary_excludes_cancelled_revenue() {
        let summary = summarize(&sample());
        assert_eq!(summary.total, 4);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.confirmed_or_paid, 1);
        assert_eq!(summary.revenue, Money::from_major(10_500 + 37_800 + 63_000));
    }
}
