//! Government of Canada fiscal calendar.
//!
//! A fiscal year runs April 1 to March 31 and is identified by the calendar
//! year it starts in (the "short code").

use chrono::{Datelike, Local, NaiveDate};

/// First month of the fiscal year.
const FISCAL_YEAR_START_MONTH: u32 = 4;

/// Display label for a fiscal-year short code: 2021 -> "2021-2022".
pub fn fiscal_year_label(short: i64) -> String {
    format!("{}-{}", short, short + 1)
}

/// Short code of the fiscal year containing `date`.
pub fn fiscal_year_of(date: NaiveDate) -> i64 {
    let year = i64::from(date.year());
    if date.month() >= FISCAL_YEAR_START_MONTH {
        year
    } else {
        year - 1
    }
}

/// Short code of the most recently completed fiscal year as of today.
pub fn last_completed_fiscal_year() -> i64 {
    fiscal_year_of(Local::now().date_naive()) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_spans_two_calendar_years() {
        assert_eq!(fiscal_year_label(2021), "2021-2022");
        assert_eq!(fiscal_year_label(1999), "1999-2000");
    }

    #[test]
    fn fiscal_year_turns_over_in_april() {
        let march = NaiveDate::from_ymd_opt(2022, 3, 31).unwrap();
        let april = NaiveDate::from_ymd_opt(2022, 4, 1).unwrap();
        assert_eq!(fiscal_year_of(march), 2021);
        assert_eq!(fiscal_year_of(april), 2022);
    }
}
