//! Text rendering for terminal output
//!
//! Every function here is pure: it turns engine output into a `String` and
//! leaves printing to the commands.

use std::fmt::Write;

use chrono::{Datelike, NaiveDate};
use subtrack_core::calendar::{MonthCalendar, WEEKDAYS};
use subtrack_core::models::Subscription;
use subtrack_core::reminders::Reminder;
use subtrack_core::sort::SortState;
use subtrack_core::stats::{
    format_amount, CategoryBreakdown, ExpensiveEntry, PeriodShare, SpendingReport, SpendingStats,
};
use subtrack_core::tracker::Dashboard;

/// Width of a 100% bar in characters
pub const BAR_WIDTH: usize = 30;

const DIVIDER: &str = "   ─────────────────────────────────────────────────────────────";

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Horizontal bar for a height given in percent
pub fn bar(percent: f64) -> String {
    let cells = (percent.clamp(0.0, 100.0) / 100.0 * BAR_WIDTH as f64).round() as usize;
    "█".repeat(cells.max(1))
}

/// "in 3 days" style description of a due date
pub fn due_label(days_until: i64) -> String {
    match days_until {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n if n < 0 => format!("{} days ago", -n),
        n => format!("in {} days", n),
    }
}

pub fn render_list(dashboard: &Dashboard, sort: &SortState, symbol: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    match sort.column {
        Some(ref column) => {
            let _ = writeln!(
                out,
                "📋 Subscriptions (sorted by {} {})",
                column,
                sort.direction.arrow()
            );
        }
        None => {
            let _ = writeln!(out, "📋 Subscriptions (newest first)");
        }
    }
    let _ = writeln!(out, "{}", DIVIDER);

    if dashboard.rows.is_empty() {
        let _ = writeln!(out, "   No subscriptions match.");
    }

    for row in &dashboard.rows {
        let sub = &row.subscription;
        let icon = if sub.is_active { "✅" } else { "⏸️ " };
        let _ = writeln!(
            out,
            "   {} {:20} │ {:>12}/{:<7} │ {:14} │ {} ({})",
            icon,
            truncate(&sub.name, 20),
            format_amount(sub.price, symbol),
            sub.period_label(),
            truncate(&sub.category, 14),
            row.due_date,
            due_label(row.days_until)
        );
        let _ = writeln!(out, "      id: {}", sub.id);
    }

    let _ = writeln!(out);
    let _ = write!(out, "{}", render_totals(&dashboard.totals, symbol));
    out
}

pub fn render_subscription(
    sub: &Subscription,
    due_date: NaiveDate,
    days_until: i64,
    symbol: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "📄 {}", sub.name);
    let _ = writeln!(out, "   ─────────────────────────────");
    let _ = writeln!(out, "   ID:           {}", sub.id);
    let _ = writeln!(
        out,
        "   Price:        {} / {}",
        format_amount(sub.price, symbol),
        sub.period_label()
    );
    let _ = writeln!(
        out,
        "   Per month:    {}",
        format_amount(sub.monthly_cost(), symbol)
    );
    let _ = writeln!(out, "   Category:     {}", sub.category);
    let _ = writeln!(out, "   Anchor date:  {}", sub.next_payment);
    let _ = writeln!(
        out,
        "   Next payment: {} ({})",
        due_date,
        due_label(days_until)
    );
    if let Some(ref method) = sub.payment_method {
        let _ = writeln!(out, "   Method:       {}", method);
    }
    let _ = writeln!(
        out,
        "   Status:       {}",
        if sub.is_active { "active" } else { "inactive" }
    );
    if let Some(ref notes) = sub.notes {
        let _ = writeln!(out, "   Notes:        {}", notes);
    }
    let _ = writeln!(
        out,
        "   Created:      {}",
        sub.created_at.format("%Y-%m-%d %H:%M")
    );
    out
}

pub fn render_totals(totals: &SpendingStats, symbol: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "   Active subscriptions: {}", totals.active_count);
    let _ = writeln!(
        out,
        "   Monthly total:        {}",
        format_amount(totals.monthly_total, symbol)
    );
    let _ = writeln!(
        out,
        "   Yearly total:         {}",
        format_amount(totals.yearly_total, symbol)
    );
    let _ = writeln!(
        out,
        "   Average per service:  {}",
        format_amount(totals.average_monthly, symbol)
    );
    out
}

pub fn render_categories(breakdown: &CategoryBreakdown, symbol: &str) -> String {
    let mut out = String::new();
    if breakdown.categories.is_empty() {
        let _ = writeln!(out, "   No active subscriptions.");
        return out;
    }

    for cat in breakdown.by_amount_desc() {
        let _ = writeln!(
            out,
            "   {:16} │ {:>12} │ {:>5.1}% │ {}",
            truncate(&cat.category, 16),
            format_amount(cat.monthly_total, symbol),
            cat.share_percent,
            bar(breakdown.bar_height(cat.monthly_total))
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "   {:16} │ {:>5} │ {:>12}",
        "Category", "Count", "Avg/month"
    );
    let _ = writeln!(out, "   ─────────────────┼───────┼──────────────");
    for cat in &breakdown.categories {
        let _ = writeln!(
            out,
            "   {:16} │ {:>5} │ {:>12}",
            truncate(&cat.category, 16),
            cat.count,
            format_amount(cat.average, symbol)
        );
    }
    out
}

pub fn render_periods(periods: &[PeriodShare]) -> String {
    let mut out = String::new();
    for share in periods {
        let _ = writeln!(
            out,
            "   {:8} │ {:>3} │ {:>5.1}% │ {}",
            share.label(),
            share.count,
            share.percent,
            bar(share.percent)
        );
    }
    out
}

pub fn render_top(entries: &[ExpensiveEntry], symbol: &str) -> String {
    let mut out = String::new();
    for (rank, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "   {}. {:20} │ {:>12}/month │ {:>14}/year",
            rank + 1,
            truncate(&entry.name, 20),
            format_amount(entry.monthly_cost, symbol),
            format_amount(entry.yearly_cost, symbol)
        );
    }
    out
}

pub fn render_report(report: &SpendingReport, symbol: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "📊 Spending Report");
    let _ = writeln!(out, "{}", DIVIDER);
    out.push_str(&render_totals(&report.totals, symbol));

    let _ = writeln!(out);
    let _ = writeln!(out, "🗂️  By Category (per month)");
    let _ = writeln!(out, "{}", DIVIDER);
    out.push_str(&render_categories(&report.categories, symbol));

    if !report.periods.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "🔁 By Billing Period");
        let _ = writeln!(out, "{}", DIVIDER);
        out.push_str(&render_periods(&report.periods));
    }

    if !report.top.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "💸 Most Expensive");
        let _ = writeln!(out, "{}", DIVIDER);
        out.push_str(&render_top(&report.top, symbol));
    }

    out
}

/// One five-character grid cell: `[dd]` marks today, `•` marks payments
fn calendar_cell(day: &subtrack_core::calendar::CalendarDay) -> String {
    let (left, right) = if day.is_today { ("[", "]") } else { (" ", " ") };
    let flag = if day.events.is_empty() { " " } else { "•" };
    let cell = format!("{}{:>2}{}{}", left, day.date.day(), right, flag);
    if day.in_month {
        cell
    } else {
        format!("\x1b[2m{}\x1b[0m", cell)
    }
}

pub fn render_calendar(calendar: &MonthCalendar, symbol: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "📅 {}", calendar.label);
    let _ = writeln!(out, "   ───────────────────────────────────────");

    let header: Vec<String> = WEEKDAYS.iter().map(|d| format!("{:^5}", d.to_string())).collect();
    let _ = writeln!(out, "   {}", header.join(" "));

    for week in calendar.weeks() {
        let cells: Vec<String> = week.iter().map(calendar_cell).collect();
        let _ = writeln!(out, "   {}", cells.join(" "));
    }

    let payment_days: Vec<_> = calendar
        .days
        .iter()
        .filter(|d| d.in_month && !d.events.is_empty())
        .collect();

    let _ = writeln!(out);
    if payment_days.is_empty() {
        let _ = writeln!(out, "   No payments this month.");
        return out;
    }

    let _ = writeln!(out, "   Payments:");
    for day in payment_days {
        for event in &day.events {
            let _ = writeln!(
                out,
                "   {} │ {:20} │ {:>12} ({})",
                day.date.format("%b %d"),
                truncate(&event.name, 20),
                format_amount(event.price, symbol),
                event
                    .period
                    .map(|p| p.as_str())
                    .unwrap_or(subtrack_core::models::NO_PERIOD_LABEL)
            );
        }
    }
    let _ = writeln!(
        out,
        "   Total this month: {}",
        format_amount(calendar.month_total(), symbol)
    );
    out
}

pub fn render_reminders(reminders: &[Reminder], symbol: &str) -> String {
    let mut out = String::new();
    if reminders.is_empty() {
        let _ = writeln!(out, "✅ No payments due soon.");
        return out;
    }

    let _ = writeln!(out, "🔔 Upcoming payments");
    let _ = writeln!(out, "   ─────────────────────────────");
    for reminder in reminders {
        let _ = writeln!(
            out,
            "   {} ({})",
            reminder.message(symbol),
            reminder.due_date
        );
    }
    out
}
