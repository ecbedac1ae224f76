use chrono::{Datelike, Duration, NaiveDate, Weekday};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use shiftboard_model::{start_of_week, week_dates, week_key, Week};

fn any_date() -> impl Strategy<Value = NaiveDate> {
    // 1990-01-01 through roughly 2070
    (0i64..29_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + Duration::days(offset)
    })
}

#[test]
fn scenario_week_of_2024_06_12() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
    let week = Week::containing(date);
    assert_eq!(week.key.as_str(), "2024-W24");
    assert_eq!(week.start, NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
    assert_eq!(week.dates()[6], NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
}

#[test]
fn consecutive_weeks_across_new_year_are_distinct() {
    let dec = NaiveDate::from_ymd_opt(2023, 12, 30).unwrap();
    let jan = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    assert_eq!(week_key(dec).as_str(), "2023-W52");
    assert_eq!(week_key(jan).as_str(), "2023-W53");
}

proptest! {
    #[test]
    fn prop_key_is_stable_within_a_week(date in any_date(), shift in 0i64..7) {
        let start = start_of_week(date);
        prop_assert_eq!(week_key(date), week_key(start + Duration::days(shift)));
    }

    #[test]
    fn prop_week_dates_are_seven_consecutive_from_sunday(date in any_date()) {
        let dates = week_dates(start_of_week(date));
        prop_assert_eq!(dates.len(), 7);
        prop_assert_eq!(dates[0].weekday(), Weekday::Sun);
        for pair in dates.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
        prop_assert!(dates.contains(&date));
    }

    #[test]
    fn prop_adjacent_weeks_have_different_keys(date in any_date()) {
        let next = start_of_week(date) + Duration::days(7);
        prop_assert_ne!(week_key(date), week_key(next));
    }
}
