//! 5-week calendar window arithmetic
//!
//! The rendered grid always shows five full weeks aligned to the configured
//! week-start day, beginning on the nearest elapsed occurrence of that day.
//! All arithmetic is on dates already expressed in the display timezone.

use chrono::{Datelike, Days, NaiveDate};

/// Number of days covered by the grid (5 full weeks)
pub const WINDOW_DAYS: u64 = 35;

/// Inclusive date range backing the calendar grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    /// First day shown; always falls on the configured week-start day
    pub start: NaiveDate,
    /// Last day shown; 34 days after `start`
    pub end: NaiveDate,
}

impl MonthWindow {
    /// All 35 dates of the window in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = self.start;
        (0..WINDOW_DAYS).map(move |offset| start + Days::new(offset))
    }

    /// The window split into 5 rows of 7 days
    #[must_use]
    pub fn weeks(&self) -> Vec<Vec<NaiveDate>> {
        let all: Vec<NaiveDate> = self.days().collect();
        all.chunks(7).map(<[NaiveDate]>::to_vec).collect()
    }
}

/// Compute the 5-week window containing `today`.
///
/// `week_start_day` uses 0 = Monday … 6 = Sunday. The window starts on the
/// nearest elapsed week-start day (possibly `today` itself) and spans
/// exactly 35 days.
#[must_use]
pub fn month_window(today: NaiveDate, week_start_day: u8) -> MonthWindow {
    let offset = (today.weekday().num_days_from_monday() + 7 - u32::from(week_start_day)) % 7;
    let start = today - Days::new(u64::from(offset));
    let end = start + Days::new(WINDOW_DAYS - 1);
    MonthWindow { start, end }
}

/// Column header labels rotated so the configured week-start day comes first
#[must_use]
pub fn day_headers(week_start_day: u8) -> [&'static str; 7] {
    const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    let mut headers = [""; 7];
    for (i, slot) in headers.iter_mut().enumerate() {
        *slot = NAMES[(usize::from(week_start_day) + i) % 7];
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_starts_prior_monday() {
        // A Wednesday with the week starting on Monday
        let window = month_window(date(2023, 11, 15), 0);
        assert_eq!(window.start, date(2023, 11, 13));
        assert_eq!(window.start.weekday(), Weekday::Mon);
        assert_eq!(window.end, date(2023, 12, 17));
        assert_eq!(window.end.weekday(), Weekday::Sun);
    }

    #[test]
    fn test_today_on_week_start_is_window_start() {
        let monday = date(2023, 11, 13);
        let window = month_window(monday, 0);
        assert_eq!(window.start, monday);
    }

    #[rstest]
    #[case(0, Weekday::Mon)]
    #[case(1, Weekday::Tue)]
    #[case(2, Weekday::Wed)]
    #[case(3, Weekday::Thu)]
    #[case(4, Weekday::Fri)]
    #[case(5, Weekday::Sat)]
    #[case(6, Weekday::Sun)]
    fn test_window_invariants_all_week_starts(
        #[case] week_start_day: u8,
        #[case] expected: Weekday,
    ) {
        // Sweep a year's worth of "today" values for each configuration
        let mut today = date(2024, 1, 1);
        for _ in 0..366 {
            let window = month_window(today, week_start_day);

            assert_eq!(window.start.weekday(), expected);
            assert_eq!((window.end - window.start).num_days(), 34);
            // today falls in the first week of the window
            assert!(window.start <= today);
            assert!((today - window.start).num_days() < 7);
            // the window ends the day before the next week-start day
            assert_eq!(window.end.succ_opt().unwrap().weekday(), expected);

            today = today.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_days_and_weeks_shape() {
        let window = month_window(date(2024, 2, 29), 0);
        assert_eq!(window.days().count(), 35);

        let weeks = window.weeks();
        assert_eq!(weeks.len(), 5);
        assert!(weeks.iter().all(|week| week.len() == 7));
        assert_eq!(weeks[0][0], window.start);
        assert_eq!(weeks[4][6], window.end);
    }

    #[test]
    fn test_day_headers_rotation() {
        assert_eq!(day_headers(0)[0], "Mon");
        assert_eq!(day_headers(6), ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);
        assert_eq!(day_headers(2)[6], "Mon");
    }
}
