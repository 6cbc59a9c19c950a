//! Report command implementations

use anyhow::Result;
use subtrack_core::{
    stats::{top_expensive, SpendingReport},
    RecordStore, Tracker,
};

use crate::render;

pub fn cmd_stats<S: RecordStore>(tracker: &Tracker<S>, json: bool, symbol: &str) -> Result<()> {
    let totals = tracker.report().totals;

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    println!();
    println!("💰 Spending Totals");
    println!("   ─────────────────────────────");
    print!("{}", render::render_totals(&totals, symbol));
    Ok(())
}

/// Full report with the most-expensive list cut to `top` entries
pub fn build_report<S: RecordStore>(tracker: &Tracker<S>, top: usize) -> SpendingReport {
    let mut report = tracker.report();
    if top != report.top.len() {
        report.top = top_expensive(tracker.snapshot().records(), top);
    }
    report
}

pub fn cmd_report<S: RecordStore>(
    tracker: &Tracker<S>,
    top: usize,
    json: bool,
    symbol: &str,
) -> Result<()> {
    let report = build_report(tracker, top);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.totals.active_count == 0 {
        println!("No active subscriptions to report on.");
        return Ok(());
    }

    print!("{}", render::render_report(&report, symbol));
    Ok(())
}
