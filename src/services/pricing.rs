use chrono::NaiveDateTime;

use crate::models::{Money, RoomType};

pub const TAX_PERCENT: i64 = 5;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

pub fn nightly_rate(room: RoomType) -> Money {
    match room {
        RoomType::Studio => Money::from_major(10_000),
        RoomType::Executive => Money::from_major(12_000),
        RoomType::Vip => Money::from_major(20_000),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub nights: i64,
    pub rate: Money,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("check-out must be after check-in")]
    InvalidDateRange,
}

/// Prices a stay. Partial days round up to a whole night.
pub fn quote(
    room: RoomType,
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
) -> Result<Quote, PricingError> {
    let seconds = (check_out - check_in).num_seconds();
    let nights = seconds.div_euclid(SECONDS_PER_DAY)
        + i64::from(seconds.rem_euclid(SECONDS_PER_DAY) != 0);
    if nights <= 0 {
        return Err(PricingError::InvalidDateRange);
    }

    let rate = nightly_rate(room);
    let subtotal = rate.times(nights);
    let tax = subtotal.percent(TAX_PERCENT);

    Ok(Quote {
        nights,
        rate,
        subtotal,
        tax,
        total: subtotal + tax,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn three_executive_nights() {
        let q = quote(RoomType::Executive, midnight(2025, 6, 1), midnight(2025, 6, 4)).unwrap();
        assert_eq!(q.nights, 3);
        assert_eq!(q.subtotal, Money::from_major(36_000));
        assert_eq!(q.tax, Money::from_major(1_800));
        assert_eq!(q.total, Money::from_major(37_800));
    }

    #[test]
    fn n_nights_always_total_subtotal_plus_five_percent() {
        let start = midnight(2025, 1, 1);
        for room in [RoomType::Studio, RoomType::Executive, RoomType::Vip] {
            for n in 1..=60 {
                let q = quote(room, start, start + Duration::days(n)).unwrap();
                assert_eq!(q.nights, n);
                assert_eq!(q.subtotal, nightly_rate(room).times(n));
                assert_eq!(q.total.subunits() * 100, q.subtotal.subunits() * 105);
                assert_eq!(q.total, q.subtotal + q.tax);
            }
        }
    }

    #[test]
    fn partial_day_rounds_up() {
        let check_in = midnight(2025, 6, 1) + Duration::hours(14);
        let check_out = midnight(2025, 6, 3) + Duration::hours(11);
        assert_eq!(quote(RoomType::Vip, check_in, check_out).unwrap().nights, 2);
    }

    #[test]
    fn same_or_earlier_check_out_fails() {
        let day = midnight(2025, 6, 1);
        assert_eq!(
            quote(RoomType::Studio, day, day),
            Err(PricingError::InvalidDateRange)
        );
        assert_eq!(
            quote(RoomType::Studio, day, day - Duration::days(2)),
            Err(PricingError::InvalidDateRange)
        );
    }

    #[test]
    fn quote_is_deterministic() {
        let a = quote(RoomType::Studio, midnight(2025, 2, 1), midnight(2025, 2, 8));
        let b = quote(RoomType::Studio, midnight(2025, 2, 1), midnight(2025, 2, 8));
        assert_eq!(a, b);
    }
}
