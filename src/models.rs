use crate::errors::CalendarError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_DATE_FIELD_ID: u64 = 885453;
pub const UNTITLED_DEAL: &str = "Untitled deal";

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

/// A lead as delivered by the host (or the mock source). Every field is
/// optional so that partial records still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDealRecord {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(alias = "status_id")]
    pub status_id: Option<i64>,
    pub price: Option<f64>,
    #[serde(alias = "custom_fields_values")]
    pub custom_fields: Option<Vec<CustomField>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomField {
    #[serde(alias = "field_id")]
    pub field_id: Option<u64>,
    pub values: Option<Vec<FieldValue>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldValue {
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: i64,
    pub name: String,
    pub status_id: i64,
    pub price: f64,
}

impl Deal {
    pub fn from_raw(raw: &RawDealRecord) -> Self {
        let name = raw
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNTITLED_DEAL);

        Self {
            id: raw.id.unwrap_or_default(),
            name: name.to_string(),
            status_id: raw.status_id.unwrap_or_default(),
            price: raw.price.filter(|price| price.is_finite()).unwrap_or_default(),
        }
    }
}

/// Deals keyed by local `YYYY-MM-DD`, each bucket in input order.
pub type DealsByDate = BTreeMap<String, Vec<Deal>>;

/// A calendar month with a zero-based `month` (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        let candidate = Self { year, month };
        candidate.first_day()?;
        Ok(candidate)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    pub fn first_day(&self) -> Result<NaiveDate, CalendarError> {
        let invalid = || CalendarError::InvalidDate {
            year: self.year,
            month: self.month,
        };
        if self.month > 11 {
            return Err(invalid());
        }
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1).ok_or_else(invalid)
    }

    /// Last day of the month: the day before the first of the next month.
    pub fn last_day(&self) -> Result<NaiveDate, CalendarError> {
        let invalid = || CalendarError::InvalidDate {
            year: self.year,
            month: self.month,
        };
        self.first_day()?;
        self.next()
            .first_day()
            .ok()
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)
    }

    pub fn prev(&self) -> Self {
        if self.month == 0 {
            Self {
                year: self.year.saturating_sub(1),
                month: 11,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month >= 11 {
            Self {
                year: self.year.saturating_add(1),
                month: 0,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn label(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month as usize)
            .copied()
            .unwrap_or("Unknown");
        format!("{name} {}", self.year)
    }

    /// Common prefix of every bucket key in this month, as written by chrono's `%Y`.
    pub fn key_prefix(&self) -> Result<String, CalendarError> {
        Ok(self.first_day()?.format("%Y-%m-").to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GridCell {
    Blank,
    Day {
        day: u32,
        date: String,
        #[serde(rename = "isToday")]
        is_today: bool,
        #[serde(rename = "dealCount")]
        deal_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDescription {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub weekdays: [&'static str; 7],
    pub leading_blanks: u32,
    pub days_in_month: u32,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSettings {
    #[serde(rename = "dealDateFieldId", default = "default_date_field_id")]
    pub deal_date_field_id: u64,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            deal_date_field_id: DEFAULT_DATE_FIELD_ID,
        }
    }
}

fn default_date_field_id() -> u64 {
    DEFAULT_DATE_FIELD_ID
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthRequest {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct DealsQuery {
    pub date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub grid: GridDescription,
    pub date_field_id: u64,
    pub total_deals: usize,
}

#[derive(Debug, Serialize)]
pub struct DealsResponse {
    pub date: String,
    pub deals: Vec<Deal>,
}
