//! Ordering and filtering for the list view

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::Subscription;

/// Column a list can be sorted by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Price,
    /// Stored anchor date, not the computed next occurrence
    Date,
    /// Unrecognized column; sorting by it leaves the order unchanged
    Unknown(String),
}

impl SortColumn {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "name" => Self::Name,
            "price" => Self::Price,
            "date" | "nextpayment" | "next_payment" => Self::Date,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Date => "date",
            Self::Unknown(s) => s,
        }
    }

    fn compare(&self, a: &Subscription, b: &Subscription) -> Ordering {
        match self {
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Price => a.price.total_cmp(&b.price),
            Self::Date => a.next_payment.cmp(&b.next_payment),
            Self::Unknown(_) => Ordering::Equal,
        }
    }
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Asc => "↑",
            Self::Desc => "↓",
        }
    }
}

/// Return a sorted copy; records with equal keys keep their input order
pub fn sort_subscriptions(
    records: &[Subscription],
    column: &SortColumn,
    direction: SortDirection,
) -> Vec<Subscription> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ord = column.compare(a, b);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Current list ordering
///
/// With no column chosen the list keeps store order (newest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            column: Some(column),
            direction,
        }
    }

    /// Same column flips the direction; a new column starts ascending
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column.as_ref() == Some(&column) {
            self.direction = self.direction.flipped();
        } else {
            self.column = Some(column);
            self.direction = SortDirection::Asc;
        }
    }

    pub fn apply(&self, records: &[Subscription]) -> Vec<Subscription> {
        match self.column {
            Some(ref column) => sort_subscriptions(records, column, self.direction),
            None => records.to_vec(),
        }
    }
}

/// Which records the list view shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    /// `Some(true)` keeps active records only, `Some(false)` inactive only
    pub active: Option<bool>,
    pub category: Option<String>,
    /// Case-insensitive substring of the name
    pub search: Option<String>,
}

impl SubscriptionFilter {
    pub fn matches(&self, sub: &Subscription) -> bool {
        if let Some(active) = self.active {
            if sub.is_active != active {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if !sub.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            if !sub.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, records: &[Subscription]) -> Vec<Subscription> {
        records.iter().filter(|s| self.matches(s)).cloned().collect()
    }
}
