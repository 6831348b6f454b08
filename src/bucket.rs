use crate::models::{Deal, DealsByDate, RawDealRecord};
use chrono::{Local, NaiveDate, TimeZone};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateSkip {
    #[error("custom field {0} is missing")]
    NoField(u64),
    #[error("custom field {0} has no value")]
    NoValue(u64),
    #[error("value of custom field {0} is not a unix timestamp")]
    NotATimestamp(u64),
    #[error("timestamp {0} is out of range")]
    OutOfRange(i64),
}

pub fn bucket(records: &[RawDealRecord], date_field_id: u64) -> DealsByDate {
    bucket_in(records, date_field_id, &Local)
}

pub fn bucket_in<Tz: TimeZone>(
    records: &[RawDealRecord],
    date_field_id: u64,
    tz: &Tz,
) -> DealsByDate {
    let mut deals_by_date = DealsByDate::new();

    for record in records {
        match resolve_order_date(record, date_field_id, tz) {
            Ok(date) => deals_by_date
                .entry(date_key(date))
                .or_default()
                .push(Deal::from_raw(record)),
            Err(reason) => {
                warn!(deal_id = ?record.id, "skipping deal without order date: {reason}");
            }
        }
    }

    deals_by_date
}

pub fn resolve_order_date<Tz: TimeZone>(
    record: &RawDealRecord,
    date_field_id: u64,
    tz: &Tz,
) -> Result<NaiveDate, DateSkip> {
    let field = record
        .custom_fields
        .iter()
        .flatten()
        .find(|field| field.field_id == Some(date_field_id))
        .ok_or(DateSkip::NoField(date_field_id))?;

    let value = field
        .values
        .iter()
        .flatten()
        .next()
        .map(|entry| &entry.value)
        .filter(|value| !value.is_null())
        .ok_or(DateSkip::NoValue(date_field_id))?;

    let seconds = timestamp_seconds(value).ok_or(DateSkip::NotATimestamp(date_field_id))?;

    tz.timestamp_opt(seconds, 0)
        .single()
        .map(|moment| moment.date_naive())
        .ok_or(DateSkip::OutOfRange(seconds))
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn timestamp_seconds(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(float_seconds)),
        serde_json::Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(float_seconds))
        }
        _ => None,
    }
}

fn float_seconds(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9.0e15;
    (value.is_finite() && value.abs() < LIMIT).then(|| value.trunc() as i64)
}
