use chrono::{DateTime, TimeZone};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::util::{parse_amount, parse_timestamp_millis, parse_timestamp_text};

pub const ALL_CITIES: &str = "ALL";
pub const STATUS_CANCELLED: &str = "CANCELLED";
pub const STATUS_RESCHEDULED: &str = "RESCHEDULED";

/// Top-level dataset element. Only `documents` is read; a missing or
/// non-array value yields an empty list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Container {
    #[serde(default, deserialize_with = "lenient_documents")]
    pub documents: Vec<BookingDocument>,
}

/// One booking event as found in the raw export.
///
/// Every field the dashboard reads is optional and deserializes leniently:
/// a value of the wrong JSON type becomes `None` instead of failing the
/// whole document. Everything else is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDocument {
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub order_amount: Option<OrderAmount>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub booking_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_time: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `orderAmount` exactly as it appeared: a JSON number or a string.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderAmount {
    Number(f64),
    Text(String),
}

impl OrderAmount {
    /// Numeric value, or `None` when the amount does not coerce to a finite number.
    pub fn value(&self) -> Option<f64> {
        match self {
            OrderAmount::Number(n) => n.is_finite().then_some(*n),
            OrderAmount::Text(s) => parse_amount(s),
        }
    }
}

/// The value inside the `dateTime` wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    Text(String),
    Millis(i64),
}

impl Timestamp {
    /// Resolve to an instant in `tz`. `None` means the timestamp is not a valid date.
    pub fn resolve<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        match self {
            Timestamp::Text(s) => parse_timestamp_text(s, tz),
            Timestamp::Millis(ms) => parse_timestamp_millis(*ms, tz),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<OrderAmount>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().map(OrderAmount::Number),
        Some(Value::String(s)) => Some(OrderAmount::Text(s)),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Object(wrapper)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    // Exports use MongoDB extended JSON (`$date`); plain `date` is accepted too.
    let inner = wrapper.get("$date").or_else(|| wrapper.get("date"));
    Ok(match inner {
        Some(Value::String(s)) => Some(Timestamp::Text(s.clone())),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .map(Timestamp::Millis),
        Some(Value::Object(long)) => match long.get("$numberLong") {
            Some(Value::String(s)) => s.trim().parse::<i64>().ok().map(Timestamp::Millis),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_documents<'de, D>(deserializer: D) -> Result<Vec<BookingDocument>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// The active city constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    All,
    City(String),
}

impl Filter {
    pub fn matches(&self, doc: &BookingDocument) -> bool {
        match self {
            Filter::All => true,
            Filter::City(city) => doc.city.as_deref() == Some(city.as_str()),
        }
    }
}

impl FromStr for Filter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == ALL_CITIES {
            Filter::All
        } else {
            Filter::City(s.to_string())
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str(ALL_CITIES),
            Filter::City(city) => f.write_str(city),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_orders: u64,
    pub profit: f64,
    pub cancelled: u64,
    pub rescheduled: u64,
}

/// Key to count mapping that remembers the order keys were first seen in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupedCount(IndexMap<String, u64>);

impl GroupedCount {
    pub fn increment(&mut self, key: &str) {
        match self.0.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.0.insert(key.to_string(), 1);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub type CityCountTable = GroupedCount;

/// Everything one recomputation produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summaries {
    pub kpi: KpiSummary,
    pub by_year: GroupedCount,
    pub by_status: GroupedCount,
    pub by_payment: GroupedCount,
    pub by_month: GroupedCount,
    pub by_city: CityCountTable,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
}

impl GroupRow {
    pub fn rows(grouping: &GroupedCount) -> Vec<GroupRow> {
        grouping
            .iter()
            .map(|(group, orders)| GroupRow {
                group: group.to_string(),
                orders,
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MarkerRow {
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "Latitude")]
    #[tabled(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    #[tabled(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: u64,
    #[serde(rename = "Radius")]
    #[tabled(rename = "Radius")]
    pub radius: String,
}
