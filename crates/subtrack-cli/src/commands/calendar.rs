//! Calendar command implementation

use anyhow::{Context, Result};
use chrono::NaiveDate;
use subtrack_core::{calendar::YearMonth, RecordStore, Tracker};

use crate::render;

/// Month to show: `--month` (or today's month) moved by `offset`
pub fn resolve_month(month: Option<&str>, offset: i32, today: NaiveDate) -> Result<YearMonth> {
    let base = match month {
        Some(s) => s
            .parse::<YearMonth>()
            .context("Invalid --month format (use YYYY-MM)")?,
        None => YearMonth::of(today),
    };
    Ok(base.shift(offset))
}

pub fn cmd_calendar<S: RecordStore>(
    tracker: &Tracker<S>,
    month: YearMonth,
    today: NaiveDate,
    symbol: &str,
) -> Result<()> {
    let calendar = tracker.calendar(month, today);
    print!("{}", render::render_calendar(&calendar, symbol));
    Ok(())
}
