//! # Earnings Roll-ups
//!
//! Turns delivered orders into today/week/month summaries.
//!
//! ## Period Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  now = Wed 15 Oct, 14:30 (local)                                        │
//! │                                                                         │
//! │  Today  [ Wed 15 Oct 00:00 ─────────────────────────────► now ]         │
//! │  Week   [ Wed 08 Oct 14:30 ─────────────────────────────► now ]         │
//! │  Month  [ Wed 01 Oct 00:00 ─────────────────────────────► now ]         │
//! │                                                                         │
//! │  Both ends inclusive. Only Delivered orders count.                      │
//! │  total = Σ delivery_fee (the courier's cut, not the order amount)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Local" means the time zone of the `now` argument, so callers decide.
//! Nothing here reads the clock.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

use crate::money::Money;
use crate::types::{EarningsPeriod, EarningsSummary, Order, OrderStatus};

/// The first instant of `period` as seen from `now`.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use courier_core::{period_start, EarningsPeriod};
///
/// let now = Utc.with_ymd_and_hms(2026, 10, 15, 14, 30, 0).unwrap();
/// assert_eq!(
///     period_start(EarningsPeriod::Month, &now),
///     Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()
/// );
/// ```
pub fn period_start<Tz: TimeZone>(period: EarningsPeriod, now: &DateTime<Tz>) -> DateTime<Tz> {
    match period {
        EarningsPeriod::Today => local_midnight(now, now.date_naive()),
        EarningsPeriod::Week => now.clone() - Duration::days(7),
        EarningsPeriod::Month => {
            let today = now.date_naive();
            let first = today.with_day(1).unwrap_or(today);
            local_midnight(now, first)
        }
    }
}

/// Midnight of `date` in `now`'s zone.
///
/// Where midnight does not exist (a DST gap), falls back to midnight UTC
/// mapped into the zone, which is the closest representable instant.
fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>, date: chrono::NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    let tz = now.timezone();
    tz.from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// Summarizes the courier's earnings for `period`.
///
/// Pure: equal inputs always give equal outputs.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use courier_core::{summarize, EarningsPeriod};
///
/// let now = Utc.with_ymd_and_hms(2026, 10, 15, 14, 30, 0).unwrap();
/// let summary = summarize(&[], EarningsPeriod::Today, &now);
/// assert_eq!(summary.deliveries_count, 0);
/// assert!(summary.avg_per_delivery.is_zero());
/// ```
pub fn summarize<Tz: TimeZone>(
    orders: &[Order],
    period: EarningsPeriod,
    now: &DateTime<Tz>,
) -> EarningsSummary {
    let start = period_start(period, now).with_timezone(&Utc);
    let end = now.with_timezone(&Utc);

    let mut total = Money::zero();
    let mut count: u32 = 0;

    for order in orders {
        if order.status != OrderStatus::Delivered {
            continue;
        }
        let Some(completed_at) = order.completed_at else {
            continue;
        };
        if completed_at < start || completed_at > end {
            continue;
        }
        total += order.delivery_fee;
        count += 1;
    }

    EarningsSummary {
        period,
        total_earnings: total,
        deliveries_count: count,
        avg_per_delivery: total.average(u64::from(count)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Customer;
    use chrono::FixedOffset;

    fn delivered(id: &str, fee_paise: i64, completed_at: DateTime<Utc>) -> Order {
        Order {
            id: id.to_string(),
            order_id: format!("#{}", id),
            status: OrderStatus::Delivered,
            customer: Customer {
                name: "Asha".to_string(),
                phone: "9000000000".to_string(),
                address: "12 MG Road".to_string(),
            },
            items: vec![],
            subtotal: Money::from_rupees(200),
            delivery_fee: Money::from_paise(fee_paise),
            amount: Money::from_rupees(200) + Money::from_paise(fee_paise),
            created_at: completed_at - Duration::hours(1),
            completed_at: Some(completed_at),
            distance_km: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_empty_input_gives_zero_summary() {
        for period in [EarningsPeriod::Today, EarningsPeriod::Week, EarningsPeriod::Month] {
            assert_eq!(summarize(&[], period, &now()), EarningsSummary::empty(period));
        }
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let orders = vec![
            delivered("a", 3000, now() - Duration::hours(2)),
            delivered("b", 4550, now() - Duration::days(3)),
        ];
        let first = summarize(&orders, EarningsPeriod::Week, &now());
        let second = summarize(&orders, EarningsPeriod::Week, &now());
        assert_eq!(first, second);
    }

    #[test]
    fn test_sums_delivery_fee_not_amount() {
        let orders = vec![delivered("a", 3000, now() - Duration::hours(1))];
        let summary = summarize(&orders, EarningsPeriod::Today, &now());
        assert_eq!(summary.total_earnings, Money::from_rupees(30));
        assert_eq!(summary.deliveries_count, 1);
        assert_eq!(summary.avg_per_delivery, Money::from_rupees(30));
    }

    #[test]
    fn test_period_windows() {
        let orders = vec![
            delivered("today", 1000, now() - Duration::hours(3)),
            delivered("yesterday", 2000, now() - Duration::days(1)),
            delivered("last-week", 4000, now() - Duration::days(10)),
            delivered("last-month", 8000, Utc.with_ymd_and_hms(2026, 9, 30, 23, 0, 0).unwrap()),
        ];

        let today = summarize(&orders, EarningsPeriod::Today, &now());
        assert_eq!(today.total_earnings.paise(), 1000);

        let week = summarize(&orders, EarningsPeriod::Week, &now());
        assert_eq!(week.total_earnings.paise(), 3000);
        assert_eq!(week.deliveries_count, 2);

        let month = summarize(&orders, EarningsPeriod::Month, &now());
        assert_eq!(month.total_earnings.paise(), 7000);
        assert_eq!(month.deliveries_count, 3);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let start = period_start(EarningsPeriod::Today, &now());
        let orders = vec![delivered("edge", 500, start), delivered("now", 700, now())];
        let summary = summarize(&orders, EarningsPeriod::Today, &now());
        assert_eq!(summary.deliveries_count, 2);
    }

    #[test]
    fn test_ignores_non_delivered_and_future() {
        let mut cancelled = delivered("c", 9999, now() - Duration::hours(1));
        cancelled.status = OrderStatus::Cancelled;
        let mut missing_time = delivered("m", 9999, now());
        missing_time.completed_at = None;
        let future = delivered("f", 9999, now() + Duration::minutes(5));

        let summary = summarize(
            &[cancelled, missing_time, future],
            EarningsPeriod::Month,
            &now(),
        );
        assert_eq!(summary, EarningsSummary::empty(EarningsPeriod::Month));
    }

    #[test]
    fn test_today_uses_local_midnight() {
        // 01:00 on the 15th in IST is 19:30 on the 14th in UTC.
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let local_now = ist.with_ymd_and_hms(2026, 10, 15, 1, 0, 0).unwrap();

        let late_utc_evening = Utc.with_ymd_and_hms(2026, 10, 14, 19, 0, 0).unwrap();
        let orders = vec![delivered("a", 2500, late_utc_evening)];

        // 19:00 UTC is 00:30 IST on the 15th, so it counts as today.
        let summary = summarize(&orders, EarningsPeriod::Today, &local_now);
        assert_eq!(summary.deliveries_count, 1);
    }

    #[test]
    fn test_average_rounds_half_to_even() {
        let orders = vec![
            delivered("a", 1001, now() - Duration::hours(1)),
            delivered("b", 1000, now() - Duration::hours(2)),
        ];
        // 2001 / 2 = 1000.5 → 1000
        let summary = summarize(&orders, EarningsPeriod::Today, &now());
        assert_eq!(summary.avg_per_delivery.paise(), 1000);
    }
}
