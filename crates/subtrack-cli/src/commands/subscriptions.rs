//! Subscription command implementations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use subtrack_core::{
    models::{parse_anchor_date, parse_price, NewSubscription, Period, Subscription, SubscriptionUpdate},
    sort::{SortColumn, SortDirection, SortState, SubscriptionFilter},
    RecordStore, Tracker,
};

use super::confirm;
use crate::cli::{AddArgs, EditArgs};
use crate::render;

/// Parse a `--period` value; "none" (or empty) means a one-off payment
pub fn parse_period_arg(s: &str) -> Result<Option<Period>> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    trimmed
        .parse::<Period>()
        .map(Some)
        .map_err(|e| anyhow::anyhow!("{}. Use none for a one-off payment", e))
}

fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    parse_anchor_date(s).context("Invalid --next date (use YYYY-MM-DD)")
}

/// Build a new record from `add` arguments
pub fn new_subscription_from_args(args: &AddArgs) -> Result<NewSubscription> {
    let new = NewSubscription {
        name: args.name.trim().to_string(),
        price: parse_price(&args.price).context("Invalid --price")?,
        period: parse_period_arg(&args.period)?,
        category: args.category.trim().to_string(),
        next_payment: parse_date_arg(&args.next)?,
        payment_method: args.method.clone().filter(|m| !m.trim().is_empty()),
        is_active: !args.inactive,
        notes: args.notes.clone().filter(|n| !n.trim().is_empty()),
    };
    new.validate()?;
    Ok(new)
}

/// Build a partial update from `edit` arguments
pub fn update_from_args(args: &EditArgs) -> Result<SubscriptionUpdate> {
    let is_active = match (args.activate, args.deactivate) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    let update = SubscriptionUpdate {
        name: args.name.as_ref().map(|n| n.trim().to_string()),
        price: args
            .price
            .as_deref()
            .map(parse_price)
            .transpose()
            .context("Invalid --price")?,
        period: args.period.as_deref().map(parse_period_arg).transpose()?,
        category: args.category.as_ref().map(|c| c.trim().to_string()),
        next_payment: args.next.as_deref().map(parse_date_arg).transpose()?,
        payment_method: args.method.clone(),
        is_active,
        notes: args.notes.clone(),
    };
    update.validate()?;
    Ok(update)
}

fn find<'a, S: RecordStore>(tracker: &'a Tracker<S>, id: &str) -> Result<&'a Subscription> {
    tracker
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Subscription not found: {}", id))
}

pub fn cmd_list<S: RecordStore>(
    tracker: &mut Tracker<S>,
    today: NaiveDate,
    filter: &SubscriptionFilter,
    sort: SortState,
    json: bool,
    symbol: &str,
) -> Result<()> {
    if let Some(SortColumn::Unknown(ref column)) = sort.column {
        anyhow::bail!("Unknown sort column: {}. Available: name, price, date", column);
    }
    tracker.set_sort(sort);

    let dashboard = tracker.dashboard(today, filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    if tracker.snapshot().is_empty() {
        println!("No subscriptions yet. Add one with:");
        println!("  subtrack add --name Netflix --price 17000 --category Video --next 2024-07-15");
        return Ok(());
    }

    print!("{}", render::render_list(&dashboard, tracker.sort_state(), symbol));
    Ok(())
}

/// Sort state from `--sort`/`--desc`; no `--sort` keeps store order
pub fn sort_from_args(column: Option<&str>, desc: bool) -> SortState {
    match column {
        Some(column) => SortState::by(
            SortColumn::parse(column),
            if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        ),
        None => SortState::default(),
    }
}

pub fn cmd_show<S: RecordStore>(
    tracker: &Tracker<S>,
    id: &str,
    today: NaiveDate,
    json: bool,
    symbol: &str,
) -> Result<()> {
    let sub = find(tracker, id)?;
    let due = tracker.policy().next_occurrence(sub.next_payment, sub.period, today);
    let days = subtrack_core::days_until(due, today);

    if json {
        println!("{}", serde_json::to_string_pretty(sub)?);
    } else {
        print!("{}", render::render_subscription(sub, due, days, symbol));
    }
    Ok(())
}

pub async fn cmd_add<S: RecordStore>(
    tracker: &mut Tracker<S>,
    args: &AddArgs,
    symbol: &str,
) -> Result<Subscription> {
    let new = new_subscription_from_args(args)?;

    let created = tracker
        .add(new)
        .await
        .context("Failed to save subscription (see log for details)")?;

    println!(
        "✅ Added {} ({} / {})",
        created.name,
        subtrack_core::format_amount(created.price, symbol),
        created.period_label()
    );
    println!("   ID: {}", created.id);
    Ok(created)
}

pub async fn cmd_edit<S: RecordStore>(tracker: &mut Tracker<S>, args: &EditArgs) -> Result<Subscription> {
    let update = update_from_args(args)?;
    if update.is_empty() {
        anyhow::bail!("Nothing to change. Pass at least one field (see subtrack edit --help)");
    }
    find(tracker, &args.id)?;

    let updated = tracker
        .update(&args.id, &update)
        .await
        .with_context(|| format!("Failed to update subscription {}", args.id))?;

    println!("✅ Updated {} (ID: {})", updated.name, updated.id);
    Ok(updated)
}

pub async fn cmd_delete<S: RecordStore>(tracker: &mut Tracker<S>, id: &str, yes: bool) -> Result<()> {
    let name = find(tracker, id)?.name.clone();

    if !yes {
        println!("⚠️  This will delete {} (ID: {}).", name, id);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if !tracker.delete(id).await {
        anyhow::bail!("Failed to delete subscription {} (see log for details)", id);
    }

    println!("🗑️  Deleted {}", name);
    Ok(())
}
