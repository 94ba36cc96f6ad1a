use chrono::{DateTime, Duration, Utc};

/// Outcome of comparing an expiration date against the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Whole days until expiration, negative once expired
    pub days_left: i64,
    /// Certificate expires within the threshold
    pub should_notify: bool,
}

/// Compute remaining days and decide whether to notify
///
/// Fractional days are rounded down, so a certificate that expired an hour
/// ago has `-1` days left.
///
/// ```
/// # use ssl_monitor::evaluate;
/// use chrono::{Duration, Utc};
/// let now = Utc::now();
/// let evaluation = evaluate(&(now + Duration::days(10)), &now, 30);
/// assert_eq!(10, evaluation.days_left);
/// assert!(evaluation.should_notify);
/// ```
pub fn evaluate(not_after: &DateTime<Utc>, now: &DateTime<Utc>, threshold_days: u32) -> Evaluation {
    let remaining = *not_after - *now;
    let mut days_left = remaining.num_days();
    if remaining < Duration::days(days_left) {
        days_left -= 1;
    }
    Evaluation {
        days_left,
        should_notify: days_left < i64::from(threshold_days),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn t_drops_fractional_days() {
        let now = now();
        let not_after = now + Duration::days(29) + Duration::hours(23);
        let e = evaluate(&not_after, &now, 30);
        assert_eq!(29, e.days_left);
        assert!(e.should_notify);
    }

    #[test]
    fn t_threshold_is_exclusive() {
        let now = now();
        let not_after = now + Duration::days(30);
        let e = evaluate(&not_after, &now, 30);
        assert_eq!(30, e.days_left);
        assert!(!e.should_notify);
    }

    #[test]
    fn t_expired_certificate_notifies() {
        let now = now();
        let not_after = now - Duration::days(3) - Duration::hours(1);
        let e = evaluate(&not_after, &now, 0);
        assert_eq!(-4, e.days_left);
        assert!(e.should_notify);
    }

    #[test]
    fn t_expired_hours_ago_notifies_at_zero_threshold() {
        let now = now();
        let e = evaluate(&(now - Duration::hours(5)), &now, 0);
        assert_eq!(-1, e.days_left);
        assert!(e.should_notify);

        let e = evaluate(&(now - Duration::seconds(1)), &now, 0);
        assert_eq!(-1, e.days_left);
        assert!(e.should_notify);
    }

    #[test]
    fn t_zero_threshold_expiring_today() {
        let now = now();
        let not_after = now + Duration::hours(5);
        let e = evaluate(&not_after, &now, 0);
        assert_eq!(0, e.days_left);
        assert!(!e.should_notify);
    }

    #[test]
    fn t_should_notify_matches_comparison() {
        let now = now();
        for days in -5..=40 {
            let not_after = now + Duration::days(days);
            for threshold in [0u32, 1, 7, 30] {
                let e = evaluate(&not_after, &now, threshold);
                assert_eq!(days, e.days_left);
                assert_eq!(days < i64::from(threshold), e.should_notify);
            }
        }
    }

    #[test]
    fn t_far_future_does_not_notify() {
        let now = now();
        let e = evaluate(&(now + Duration::days(400)), &now, 30);
        assert_eq!(400, e.days_left);
        assert!(!e.should_notify);
    }
}
