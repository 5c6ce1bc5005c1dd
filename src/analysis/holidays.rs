use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Juneteenth became a federal holiday in 2021.
const JUNETEENTH_FROM: i32 = 2021;

/// Saturday holidays are observed the Friday before, Sunday ones the Monday after.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut day = first_of_next.pred_opt()?;
    while day.weekday() != weekday {
        day = day.pred_opt()?;
    }
    Some(day)
}

/// US federal holidays of `year`, actual and observed dates.
pub fn us_federal_holidays(year: i32) -> Vec<NaiveDate> {
    let mut fixed = vec![(1, 1), (7, 4), (11, 11), (12, 25)];
    if year >= JUNETEENTH_FROM {
        fixed.push((6, 19));
    }

    let mut days: Vec<NaiveDate> = Vec::with_capacity(16);
    for (month, day) in fixed {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            days.push(date);
            let obs = observed(date);
            if obs != date {
                days.push(obs);
            }
        }
    }

    days.extend(
        [
            nth_weekday(year, 1, Weekday::Mon, 3),  // Martin Luther King Jr. Day
            nth_weekday(year, 2, Weekday::Mon, 3),  // Washington's Birthday
            last_weekday(year, 5, Weekday::Mon),    // Memorial Day
            nth_weekday(year, 9, Weekday::Mon, 1),  // Labor Day
            nth_weekday(year, 10, Weekday::Mon, 2), // Columbus Day
            nth_weekday(year, 11, Weekday::Thu, 4), // Thanksgiving
        ]
        .into_iter()
        .flatten(),
    );

    days.sort_unstable();
    days
}

pub fn is_us_federal_holiday(date: NaiveDate) -> bool {
    // A Saturday New Year's Day is observed on Dec 31 of the previous year.
    [date.year(), date.year() + 1]
        .into_iter()
        .any(|y| us_federal_holidays(y).contains(&date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fixed_and_floating_holidays() {
        assert!(is_us_federal_holiday(d(2024, 7, 4)));
        assert!(is_us_federal_holiday(d(2024, 1, 15))); // MLK
        assert!(is_us_federal_holiday(d(2024, 5, 27))); // Memorial
        assert!(is_us_federal_holiday(d(2024, 9, 2))); // Labor
        assert!(is_us_federal_holiday(d(2024, 11, 28))); // Thanksgiving
        assert!(!is_us_federal_holiday(d(2024, 3, 12)));
        assert!(!is_us_federal_holiday(d(2024, 11, 21)));
    }

    #[test]
    fn observed_dates() {
        // Jan 1 2023 was a Sunday
        assert!(is_us_federal_holiday(d(2023, 1, 2)));
        // Jan 1 2022 was a Saturday
        assert!(is_us_federal_holiday(d(2021, 12, 31)));
        // Jul 4 2020 was a Saturday
        assert!(is_us_federal_holiday(d(2020, 7, 3)));
    }

    #[test]
    fn juneteenth_starts_in_2021() {
        assert!(!is_us_federal_holiday(d(2020, 6, 19)));
        assert!(is_us_federal_holiday(d(2023, 6, 19)));
    }
}
