//! Month calendar grid
//!
//! Six weeks of seven days starting on Sunday, so every month fits and the
//! grid size never changes.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Period, Subscription};
use crate::recurrence::MonthEndPolicy;

pub const GRID_DAYS: usize = 42;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Move by `delta` months, wrapping the year
    pub fn shift(&self, delta: i32) -> Self {
        let months = Months::new(delta.unsigned_abs());
        let shifted = if delta >= 0 {
            self.first.checked_add_months(months)
        } else {
            self.first.checked_sub_months(months)
        };
        shifted.map(|first| Self { first }).unwrap_or(*self)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// "March 2024"
    pub fn label(&self) -> String {
        let name = MONTH_NAMES
            .get(self.first.month0() as usize)
            .copied()
            .unwrap_or_default();
        format!("{} {}", name, self.year())
    }
}

impl std::str::FromStr for YearMonth {
    type Err = Error;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidData(format!("invalid month {:?}, expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// A payment shown on a calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub period: Option<Period>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// False for the padding days of the previous/next month
    pub in_month: bool,
    pub is_today: bool,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub days: Vec<CalendarDay>,
}

impl MonthCalendar {
    pub fn build(
        month: YearMonth,
        records: &[Subscription],
        today: NaiveDate,
        policy: MonthEndPolicy,
    ) -> Self {
        let first = month.first_day();
        let lead = u64::from(first.weekday().num_days_from_sunday());
        let start = first.checked_sub_days(Days::new(lead)).unwrap_or(first);

        let days = start
            .iter_days()
            .take(GRID_DAYS)
            .map(|date| {
                let in_month = month.contains(date);
                let events = if in_month {
                    records
                        .iter()
                        .filter(|s| s.is_active && falls_on(s, date, policy))
                        .map(|s| CalendarEvent {
                            id: s.id.clone(),
                            name: s.name.clone(),
                            price: s.price,
                            period: s.period,
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                CalendarDay {
                    date,
                    in_month,
                    is_today: in_month && date == today,
                    events,
                }
            })
            .collect();

        Self {
            year: month.year(),
            month: month.month(),
            label: month.label(),
            days,
        }
    }

    /// Rows of seven days, Sunday first
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay]> {
        self.days.chunks(7)
    }

    /// Total of all payments falling in the month
    pub fn month_total(&self) -> f64 {
        self.days
            .iter()
            .flat_map(|d| d.events.iter())
            .map(|e| e.price)
            .sum()
    }
}

/// Whether a record's payment lands on `date`
fn falls_on(sub: &Subscription, date: NaiveDate, policy: MonthEndPolicy) -> bool {
    let anchor = sub.next_payment;
    match sub.period {
        Some(Period::Monthly) => {
            policy.day_in_month(anchor.day(), date.year(), date.month()) == Some(date.day())
        }
        Some(Period::Yearly) => {
            anchor.month() == date.month()
                && policy.day_in_month(anchor.day(), date.year(), date.month()) == Some(date.day())
        }
        Some(Period::Weekly) => {
            let diff = (date - anchor).num_days();
            diff >= 0 && diff % 7 == 0
        }
        None => false,
    }
}

/// Column headers matching the grid order
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];
