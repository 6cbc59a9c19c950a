//! Spending aggregation over the active record set
//!
//! Every figure is normalized to a monthly basis first. Values stay unrounded
//! here; rounding to whole currency units happens when they are displayed.

use serde::Serialize;

use crate::models::{Period, Subscription};

/// Minimum bar height (percent) so small categories stay visible
pub const MIN_BAR_PERCENT: f64 = 5.0;

/// Default number of entries in the most-expensive list
pub const TOP_N: usize = 5;

/// Price expressed per month
pub fn monthly_equivalent(price: f64, period: Option<Period>) -> f64 {
    match period {
        Some(Period::Monthly) => price,
        Some(Period::Yearly) => price / 12.0,
        Some(Period::Weekly) => price * 4.0,
        None => price,
    }
}

fn active(records: &[Subscription]) -> impl Iterator<Item = &Subscription> {
    records.iter().filter(|s| s.is_active)
}

/// Headline totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingStats {
    pub active_count: usize,
    pub monthly_total: f64,
    pub yearly_total: f64,
    pub average_monthly: f64,
}

impl SpendingStats {
    pub fn compute(records: &[Subscription]) -> Self {
        let (count, monthly_total) = active(records)
            .fold((0usize, 0.0f64), |(n, sum), s| (n + 1, sum + s.monthly_cost()));

        let average_monthly = if count > 0 {
            monthly_total / count as f64
        } else {
            0.0
        };

        Self {
            active_count: count,
            monthly_total,
            yearly_total: monthly_total * 12.0,
            average_monthly,
        }
    }
}

/// Monthly spend for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub monthly_total: f64,
    pub count: usize,
    pub average: f64,
    /// Share of the overall monthly total, 0-100
    pub share_percent: f64,
}

/// Per-category spend in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub categories: Vec<CategorySpend>,
    pub total: f64,
}

impl CategoryBreakdown {
    pub fn compute(records: &[Subscription]) -> Self {
        let mut categories: Vec<CategorySpend> = Vec::new();

        for sub in active(records) {
            let amount = sub.monthly_cost();
            match categories.iter_mut().find(|c| c.category == sub.category) {
                Some(entry) => {
                    entry.monthly_total += amount;
                    entry.count += 1;
                }
                None => categories.push(CategorySpend {
                    category: sub.category.clone(),
                    monthly_total: amount,
                    count: 1,
                    average: 0.0,
                    share_percent: 0.0,
                }),
            }
        }

        let total: f64 = categories.iter().map(|c| c.monthly_total).sum();
        for entry in &mut categories {
            entry.average = entry.monthly_total / entry.count as f64;
            entry.share_percent = if total > 0.0 {
                entry.monthly_total / total * 100.0
            } else {
                0.0
            };
        }

        Self { categories, total }
    }

    /// Largest category amount (0 when empty)
    pub fn max_amount(&self) -> f64 {
        self.categories
            .iter()
            .map(|c| c.monthly_total)
            .fold(0.0, f64::max)
    }

    /// Categories ordered by amount, largest first (stable for ties)
    pub fn by_amount_desc(&self) -> Vec<&CategorySpend> {
        let mut sorted: Vec<&CategorySpend> = self.categories.iter().collect();
        sorted.sort_by(|a, b| b.monthly_total.total_cmp(&a.monthly_total));
        sorted
    }

    /// Bar height for a category relative to the largest one
    pub fn bar_height(&self, value: f64) -> f64 {
        bar_height(value, self.max_amount())
    }
}

/// `max(5, value / max * 100)`; the floor applies when `max` is 0 too
pub fn bar_height(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return MIN_BAR_PERCENT;
    }
    (value / max * 100.0).max(MIN_BAR_PERCENT)
}

/// Count of active records per billing period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodShare {
    pub period: Option<Period>,
    pub count: usize,
    pub percent: f64,
}

impl PeriodShare {
    pub fn label(&self) -> &'static str {
        self.period
            .map(|p| p.as_str())
            .unwrap_or(crate::models::NO_PERIOD_LABEL)
    }
}

/// Period distribution in first-appearance order
pub fn period_distribution(records: &[Subscription]) -> Vec<PeriodShare> {
    let mut shares: Vec<PeriodShare> = Vec::new();
    let mut total = 0usize;

    for sub in active(records) {
        total += 1;
        match shares.iter_mut().find(|p| p.period == sub.period) {
            Some(entry) => entry.count += 1,
            None => shares.push(PeriodShare {
                period: sub.period,
                count: 1,
                percent: 0.0,
            }),
        }
    }

    for entry in &mut shares {
        entry.percent = entry.count as f64 / total as f64 * 100.0;
    }
    shares
}

/// Entry of the most-expensive list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpensiveEntry {
    pub id: String,
    pub name: String,
    pub category: String,
    pub period: Option<Period>,
    pub monthly_cost: f64,
    pub yearly_cost: f64,
}

/// The `n` most expensive active records by monthly equivalent
pub fn top_expensive(records: &[Subscription], n: usize) -> Vec<ExpensiveEntry> {
    let mut ranked: Vec<&Subscription> = active(records).collect();
    ranked.sort_by(|a, b| b.monthly_cost().total_cmp(&a.monthly_cost()));

    ranked
        .into_iter()
        .take(n)
        .map(|s| {
            let monthly = s.monthly_cost();
            ExpensiveEntry {
                id: s.id.clone(),
                name: s.name.clone(),
                category: s.category.clone(),
                period: s.period,
                monthly_cost: monthly,
                yearly_cost: monthly * 12.0,
            }
        })
        .collect()
}

/// Whole currency units with thousands separators ("₩1,234,568")
pub fn format_amount(amount: f64, symbol: &str) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, symbol, grouped)
}

/// Everything the statistics view shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingReport {
    pub totals: SpendingStats,
    pub categories: CategoryBreakdown,
    pub periods: Vec<PeriodShare>,
    pub top: Vec<ExpensiveEntry>,
}

impl SpendingReport {
    pub fn compute(records: &[Subscription]) -> Self {
        Self {
            totals: SpendingStats::compute(records),
            categories: CategoryBreakdown::compute(records),
            periods: period_distribution(records),
            top: top_expensive(records, TOP_N),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn sub(name: &str, price: f64, period: Option<Period>, category: &str) -> Subscription {
        Subscription {
            id: name.to_lowercase(),
            name: name.to_string(),
            price,
            period,
            category: category.to_string(),
            next_payment: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            payment_method: None,
            is_active: true,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Subscription> {
        vec![
            sub("Netflix", 10000.0, Some(Period::Monthly), "Entertainment"),
            sub("Cloud", 120000.0, Some(Period::Yearly), "Software"),
            sub("Paper", 2500.0, Some(Period::Weekly), "News"),
        ]
    }

    #[test]
    fn test_monthly_equivalent() {
        assert_eq!(monthly_equivalent(1200.0, Some(Period::Yearly)), 100.0);
        assert_eq!(monthly_equivalent(100.0, Some(Period::Weekly)), 400.0);
        assert_eq!(monthly_equivalent(100.0, Some(Period::Monthly)), 100.0);
        assert_eq!(monthly_equivalent(100.0, None), 100.0);
    }

    #[test]
    fn test_totals() {
        let stats = SpendingStats::compute(&sample());
        assert_eq!(stats.active_count, 3);
        assert_eq!(stats.monthly_total, 30000.0);
        assert_eq!(stats.yearly_total, 360000.0);
        assert_eq!(stats.average_monthly, 10000.0);
    }

    #[test]
    fn test_totals_ignore_inactive() {
        let mut records = sample();
        records[1].is_active = false;
        let stats = SpendingStats::compute(&records);
        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.monthly_total, 20000.0);
    }

    #[test]
    fn test_empty_set() {
        let report = SpendingReport::compute(&[]);
        assert_eq!(report.totals, SpendingStats::default());
        assert!(report.categories.categories.is_empty());
        assert!(report.periods.is_empty());
        assert!(report.top.is_empty());
    }

    #[test]
    fn test_category_shares_sum_to_100() {
        let mut records = sample();
        records.push(sub("Disney", 9900.0, Some(Period::Monthly), "Entertainment"));
        let breakdown = CategoryBreakdown::compute(&records);

        let sum: f64 = breakdown.categories.iter().map(|c| c.share_percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);

        let ent = &breakdown.categories[0];
        assert_eq!(ent.category, "Entertainment");
        assert_eq!(ent.count, 2);
        assert_eq!(ent.monthly_total, 19900.0);
        assert_eq!(ent.average, 9950.0);
    }

    #[test]
    fn test_category_order() {
        let mut records = sample();
        records.push(sub("Newsletter", 3000.0, Some(Period::Monthly), "News"));
        records.push(sub("Editor", 6000.0, Some(Period::Monthly), "Software"));
        let breakdown = CategoryBreakdown::compute(&records);
        let names: Vec<&str> = breakdown
            .categories
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(names, vec!["Entertainment", "Software", "News"]);

        let desc: Vec<&str> = breakdown
            .by_amount_desc()
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(desc, vec!["Software", "News", "Entertainment"]);
        assert_eq!(breakdown.max_amount(), 16000.0);
        assert_eq!(breakdown.bar_height(13000.0), 81.25);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0, "₩"), "₩0");
        assert_eq!(format_amount(999.4, "₩"), "₩999");
        assert_eq!(format_amount(1234567.5, "₩"), "₩1,234,568");
        assert_eq!(format_amount(10000.0 / 3.0, "$"), "$3,333");
        assert_eq!(format_amount(-2500.0, "₩"), "-₩2,500");
    }

    #[test]
    fn test_bar_height() {
        assert_eq!(bar_height(100.0, 100.0), 100.0);
        assert_eq!(bar_height(50.0, 100.0), 50.0);
        assert_eq!(bar_height(1.0, 100.0), MIN_BAR_PERCENT);
        assert_eq!(bar_height(0.0, 0.0), MIN_BAR_PERCENT);
    }

    #[test]
    fn test_period_distribution() {
        let mut records = sample();
        records.push(sub("Gym", 50000.0, Some(Period::Monthly), "Health"));
        records.push(sub("Domain", 15000.0, None, "Software"));
        let dist = period_distribution(&records);

        assert_eq!(dist.len(), 4);
        assert_eq!(dist[0].period, Some(Period::Monthly));
        assert_eq!(dist[0].count, 2);
        assert_eq!(dist[0].percent, 40.0);
        assert_eq!(dist[3].label(), "none");

        let sum: f64 = dist.iter().map(|p| p.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_expensive_stable_and_limited() {
        let records = vec![
            sub("A", 1000.0, Some(Period::Monthly), "x"),
            sub("B", 12000.0, Some(Period::Yearly), "x"),
            sub("C", 5000.0, Some(Period::Monthly), "x"),
            sub("D", 250.0, Some(Period::Weekly), "x"),
            sub("E", 3000.0, Some(Period::Monthly), "x"),
            sub("F", 100.0, Some(Period::Monthly), "x"),
        ];
        let top = top_expensive(&records, TOP_N);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        // A, B and D all cost 1000/month and keep their input order
        assert_eq!(names, vec!["C", "E", "A", "B", "D"]);
        assert_eq!(top[0].yearly_cost, 60000.0);
    }
}
