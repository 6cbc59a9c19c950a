//! Domain models for Subtrack
//!
//! Field names follow the JSON interchange format (camelCase), so the same
//! types are used for export files, import payloads and remote documents.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Billing period of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parse a stored period value; anything unrecognized is non-recurring
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown period: {}. Available: weekly, monthly, yearly",
                s
            )
        })
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Label used wherever a missing period has to be shown or grouped
pub const NO_PERIOD_LABEL: &str = "none";

/// A stored subscription record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "de_price")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_period")]
    pub period: Option<Period>,
    pub category: String,
    /// Anchor date for recurrence math (not necessarily in the future)
    #[serde(deserialize_with = "de_date")]
    pub next_payment: NaiveDate,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default = "default_active", deserialize_with = "de_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Price normalized to a per-month basis
    pub fn monthly_cost(&self) -> f64 {
        crate::stats::monthly_equivalent(self.price, self.period)
    }

    /// Period label for display and grouping
    pub fn period_label(&self) -> &'static str {
        self.period.map(|p| p.as_str()).unwrap_or(NO_PERIOD_LABEL)
    }
}

/// Fields for creating a subscription; id and creation time come from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    pub name: String,
    #[serde(deserialize_with = "de_price")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_period")]
    pub period: Option<Period>,
    pub category: String,
    #[serde(deserialize_with = "de_date")]
    pub next_payment: NaiveDate,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default = "default_active", deserialize_with = "de_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewSubscription {
    /// Check required fields before the record reaches a store
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, self.price, &self.category)
    }

    /// Attach an id and creation time
    pub fn into_subscription(self, id: String, created_at: DateTime<Utc>) -> Subscription {
        Subscription {
            id,
            name: self.name,
            price: self.price,
            period: self.period,
            category: self.category,
            next_payment: self.next_payment,
            payment_method: self.payment_method,
            is_active: self.is_active,
            notes: self.notes,
            created_at,
        }
    }
}

/// One element of an import payload or bulk replace
///
/// `id` and `createdAt` are preserved when present and assigned otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(deserialize_with = "de_price")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_period")]
    pub period: Option<Period>,
    pub category: String,
    #[serde(deserialize_with = "de_date")]
    pub next_payment: NaiveDate,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default = "default_active", deserialize_with = "de_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "de_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SubscriptionRecord {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, self.price, &self.category)
    }

    /// Resolve missing id/creation time with the given fallbacks
    pub fn into_subscription(
        self,
        fallback_id: impl FnOnce() -> String,
        fallback_created_at: DateTime<Utc>,
    ) -> Subscription {
        Subscription {
            id: self.id.unwrap_or_else(fallback_id),
            name: self.name,
            price: self.price,
            period: self.period,
            category: self.category,
            next_payment: self.next_payment,
            payment_method: self.payment_method,
            is_active: self.is_active,
            notes: self.notes,
            created_at: self.created_at.unwrap_or(fallback_created_at),
        }
    }
}

impl From<Subscription> for SubscriptionRecord {
    fn from(sub: Subscription) -> Self {
        Self {
            id: Some(sub.id),
            name: sub.name,
            price: sub.price,
            period: sub.period,
            category: sub.category,
            next_payment: sub.next_payment,
            payment_method: sub.payment_method,
            is_active: sub.is_active,
            notes: sub.notes,
            created_at: Some(sub.created_at),
        }
    }
}

/// Partial update; `None` leaves a field untouched
///
/// An empty `payment_method` or `notes` clears the field, and
/// `period: Some(None)` makes the record non-recurring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub period: Option<Option<Period>>,
    pub category: Option<String>,
    pub next_payment: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl SubscriptionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the fields that are set
    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::InvalidData("name is required".to_string()));
        }
        if self.category.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(Error::InvalidData("category is required".to_string()));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::InvalidData(format!(
                    "price must be a non-negative number, got {}",
                    price
                )));
            }
        }
        Ok(())
    }

    /// Merge the set fields into a record, validating the result
    pub fn apply(&self, sub: &mut Subscription) -> Result<()> {
        if let Some(ref name) = self.name {
            sub.name = name.clone();
        }
        if let Some(price) = self.price {
            sub.price = price;
        }
        if let Some(period) = self.period {
            sub.period = period;
        }
        if let Some(ref category) = self.category {
            sub.category = category.clone();
        }
        if let Some(date) = self.next_payment {
            sub.next_payment = date;
        }
        if let Some(ref method) = self.payment_method {
            sub.payment_method = non_empty(method);
        }
        if let Some(active) = self.is_active {
            sub.is_active = active;
        }
        if let Some(ref notes) = self.notes {
            sub.notes = non_empty(notes);
        }
        validate_fields(&sub.name, sub.price, &sub.category)
    }

    /// JSON object holding only the set fields (remote PATCH body)
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        if let Some(ref name) = self.name {
            doc.insert("name".into(), Value::from(name.as_str()));
        }
        if let Some(price) = self.price {
            doc.insert("price".into(), Value::from(price));
        }
        if let Some(period) = self.period {
            doc.insert(
                "period".into(),
                period.map(|p| Value::from(p.as_str())).unwrap_or(Value::Null),
            );
        }
        if let Some(ref category) = self.category {
            doc.insert("category".into(), Value::from(category.as_str()));
        }
        if let Some(date) = self.next_payment {
            doc.insert("nextPayment".into(), Value::from(date.to_string()));
        }
        if let Some(ref method) = self.payment_method {
            doc.insert("paymentMethod".into(), Value::from(method.as_str()));
        }
        if let Some(active) = self.is_active {
            doc.insert("isActive".into(), Value::from(active));
        }
        if let Some(ref notes) = self.notes {
            doc.insert("notes".into(), Value::from(notes.as_str()));
        }
        doc
    }
}

fn validate_fields(name: &str, price: f64, category: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidData("name is required".to_string()));
    }
    if category.trim().is_empty() {
        return Err(Error::InvalidData("category is required".to_string()));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidData(format!(
            "price must be a non-negative number, got {}",
            price
        )));
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a price given as text
pub fn parse_price(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| Error::InvalidData(format!("invalid price: {:?}", s)))
}

/// Parse an anchor date: `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_anchor_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.date());
    }
    Err(Error::InvalidData(format!("invalid date: {:?}", s)))
}

/// Parse a creation timestamp (RFC 3339, or SQLite's `YYYY-MM-DD HH:MM:SS`)
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s.trim()) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

// ========== Serde helpers ==========

fn default_active() -> bool {
    true
}

fn de_price<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    use serde::de::Error as _;
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("price out of range")),
        Value::String(s) => parse_price(&s).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "price must be a number or numeric string, got {}",
            other
        ))),
    }
}

fn de_period<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Period>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Period::parse(&s),
        _ => None,
    })
}

fn de_date<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NaiveDate, D::Error> {
    use serde::de::Error as _;
    match Value::deserialize(d)? {
        Value::String(s) => parse_anchor_date(&s).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!(
            "date must be a string, got {}",
            other
        ))),
    }
}

/// Only an explicit `false` deactivates a record
fn de_active<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    Ok(!matches!(Value::deserialize(d)?, Value::Bool(false)))
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => non_empty(&s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn de_timestamp<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => parse_timestamp(&s),
        _ => None,
    })
}
