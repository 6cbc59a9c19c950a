//! Next-payment calculation
//!
//! A record stores a single anchor date (`nextPayment`). The next occurrence
//! is always recomputed relative to "today" so a stale anchor still yields a
//! sensible due date.

use chrono::{Datelike, Days, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Period;

/// How a day-of-month that does not exist in the target month is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthEndPolicy {
    /// Use the last day of the month (Jan 31 -> Feb 29)
    #[default]
    Clamp,
    /// Spill the surplus days into the next month (Jan 31 -> Mar 2 in 2024)
    Overflow,
}

impl MonthEndPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clamp => "clamp",
            Self::Overflow => "overflow",
        }
    }

    /// Next occurrence of `anchor` on or after `today` under this policy
    pub fn next_occurrence(
        &self,
        anchor: NaiveDate,
        period: Option<Period>,
        today: NaiveDate,
    ) -> NaiveDate {
        let next = match period {
            Some(Period::Monthly) => self.next_monthly(anchor, today),
            Some(Period::Yearly) => self.next_yearly(anchor, today),
            Some(Period::Weekly) => next_weekly(anchor, today),
            None => Some(anchor),
        };
        // Only reachable at the edges of chrono's date range
        next.unwrap_or(anchor)
    }

    /// Day on which an anchor day-of-month lands in the given month, if any
    ///
    /// Used by the calendar: with `Clamp` a day past the month end lands on
    /// the last day; with `Overflow` it matches only exactly.
    pub fn day_in_month(&self, anchor_day: u32, year: i32, month: u32) -> Option<u32> {
        let last = last_day_of_month(year, month)?;
        match self {
            Self::Clamp => Some(anchor_day.min(last)),
            Self::Overflow => (anchor_day <= last).then_some(anchor_day),
        }
    }

    fn date_in_month(&self, year: i32, month: u32, day: u32) -> Option<NaiveDate> {
        match self {
            Self::Clamp => {
                let last = last_day_of_month(year, month)?;
                NaiveDate::from_ymd_opt(year, month, day.min(last))
            }
            Self::Overflow => NaiveDate::from_ymd_opt(year, month, 1)?
                .checked_add_days(Days::new(u64::from(day.saturating_sub(1)))),
        }
    }

    fn next_monthly(&self, anchor: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
        let candidate = self.date_in_month(today.year(), today.month(), anchor.day())?;
        if candidate >= today {
            return Some(candidate);
        }
        match self {
            // Recompute from the anchor day so Jan 31 -> Feb 29 -> Mar 31
            Self::Clamp => {
                let (year, month) = following_month(today.year(), today.month());
                self.date_in_month(year, month, anchor.day())
            }
            // Shift the already rolled date by one month
            Self::Overflow => {
                let (year, month) = following_month(candidate.year(), candidate.month());
                self.date_in_month(year, month, candidate.day())
            }
        }
    }

    fn next_yearly(&self, anchor: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
        let candidate = self.date_in_month(today.year(), anchor.month(), anchor.day())?;
        if candidate >= today {
            return Some(candidate);
        }
        match self {
            Self::Clamp => self.date_in_month(today.year() + 1, anchor.month(), anchor.day()),
            Self::Overflow => {
                self.date_in_month(candidate.year() + 1, candidate.month(), candidate.day())
            }
        }
    }
}

impl std::str::FromStr for MonthEndPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "overflow" => Ok(Self::Overflow),
            other => Err(format!(
                "Unknown month-end policy: {}. Available: clamp, overflow",
                other
            )),
        }
    }
}

impl std::fmt::Display for MonthEndPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Next occurrence using the default month-end policy
pub fn next_occurrence(anchor: NaiveDate, period: Option<Period>, today: NaiveDate) -> NaiveDate {
    MonthEndPolicy::default().next_occurrence(anchor, period, today)
}

/// Whole days from `today` to `date` (negative when `date` is past)
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Weekly recurrence lands strictly after today, within the next seven days
fn next_weekly(anchor: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let weeks = (today - anchor).num_days().div_euclid(7);
    anchor.checked_add_signed(Duration::days((weeks + 1) * 7))
}

fn following_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Number of days in a month
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = following_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|d| d.day())
}
