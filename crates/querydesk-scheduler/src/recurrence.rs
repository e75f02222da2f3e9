use chrono::{DateTime, Duration, Utc};

use crate::types::Frequency;

/// Compute the next occurrence for `frequency` after the slot at `from`.
///
/// Returns `None` for [`Frequency::Once`] — one-time jobs have no next
/// occurrence. Pure and deterministic: identical inputs always yield the
/// identical instant.
///
/// `Monthly` is a fixed 30-day step, not calendar-month arithmetic — a job
/// anchored on the 31st drifts earlier each cycle. Downstream consumers
/// depend on the fixed offset, so do not switch this to calendar months.
pub fn advance(frequency: Frequency, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match frequency {
        Frequency::Once => None,
        Frequency::Hourly => Some(from + Duration::hours(1)),
        Frequency::Daily => Some(from + Duration::days(1)),
        Frequency::Weekly => Some(from + Duration::days(7)),
        Frequency::Monthly => Some(from + Duration::days(30)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn recurring_frequencies_strictly_increase() {
        for freq in [
            Frequency::Hourly,
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
        ] {
            let next = advance(freq, t0()).unwrap();
            assert!(next > t0(), "{freq} must move forward");
        }
    }

    #[test]
    fn advance_is_deterministic() {
        assert_eq!(advance(Frequency::Daily, t0()), advance(Frequency::Daily, t0()));
    }

    #[test]
    fn once_has_no_next_occurrence() {
        assert_eq!(advance(Frequency::Once, t0()), None);
    }

    #[test]
    fn hourly_and_daily_offsets() {
        assert_eq!(
            advance(Frequency::Hourly, t0()).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()
        );
        assert_eq!(
            advance(Frequency::Daily, t0()).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn monthly_is_a_fixed_thirty_day_step() {
        // Anchored on Jan 31: +30 days lands on Mar 1 (2024 is a leap year),
        // not Feb 29 — the documented drift.
        let anchor = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        assert_eq!(
            advance(Frequency::Monthly, anchor).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
        );
    }
}
