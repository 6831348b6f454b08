use crate::errors::CalendarError;
use crate::models::{CustomField, FieldValue, RawDealRecord, YearMonth};
use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate, TimeZone};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const PAGE_LIMIT: usize = 250;
const HOST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub date_field_id: u64,
}

impl DealQuery {
    pub fn for_month(month: YearMonth, date_field_id: u64) -> Result<Self, CalendarError> {
        Ok(Self {
            from: month.first_day()?,
            to: month.last_day()?,
            date_field_id,
        })
    }
}

#[async_trait]
pub trait DealSource: Send + Sync {
    async fn fetch_deals(&self, query: &DealQuery) -> Result<Vec<RawDealRecord>, CalendarError>;
}

/// One synthetic deal on the 1st and on every day divisible by five.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDealSource;

impl MockDealSource {
    pub fn generate<Tz: TimeZone>(query: &DealQuery, tz: &Tz) -> Vec<RawDealRecord> {
        let mut records = Vec::new();
        let mut date = query.from;

        while date <= query.to {
            let day = date.day();
            if day == 1 || day % 5 == 0 {
                let noon = date.and_hms_opt(12, 0, 0).and_then(|moment| {
                    tz.from_local_datetime(&moment)
                        .earliest()
                        .map(|local| local.timestamp())
                });
                if let Some(timestamp) = noon {
                    records.push(mock_record(date, records.len(), query.date_field_id, timestamp));
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        records
    }
}

#[async_trait]
impl DealSource for MockDealSource {
    async fn fetch_deals(&self, query: &DealQuery) -> Result<Vec<RawDealRecord>, CalendarError> {
        let records = Self::generate(query, &Local);
        debug!(count = records.len(), from = %query.from, "generated mock deals");
        Ok(records)
    }
}

fn mock_record(date: NaiveDate, index: usize, date_field_id: u64, timestamp: i64) -> RawDealRecord {
    let ordinal = index as i64 + 1;
    let id = i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day());

    RawDealRecord {
        id: Some(id),
        name: Some(format!("Demo deal #{ordinal}")),
        status_id: Some(142 + ordinal % 3),
        price: Some((ordinal * 1_000) as f64),
        custom_fields: Some(vec![CustomField {
            field_id: Some(date_field_id),
            values: Some(vec![FieldValue {
                value: serde_json::json!(timestamp),
            }]),
        }]),
    }
}

#[derive(Debug, Clone)]
pub struct AmoCrmSource {
    client: Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct LeadsPage {
    #[serde(rename = "_embedded", default)]
    embedded: Embedded,
}

#[derive(Debug, Default, Deserialize)]
struct Embedded {
    #[serde(default)]
    leads: Vec<serde_json::Value>,
}

impl AmoCrmSource {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self, CalendarError> {
        let client = Client::builder().timeout(HOST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn query_params(query: &DealQuery) -> Vec<(String, String)> {
        let bound = |date: NaiveDate, hour: u32, minute: u32, second: u32| {
            date.and_hms_opt(hour, minute, second)
                .and_then(|moment| Local.from_local_datetime(&moment).earliest())
                .map(|local| local.timestamp())
        };
        let field = query.date_field_id;

        let mut params = vec![("limit".to_string(), PAGE_LIMIT.to_string())];
        if let Some(from) = bound(query.from, 0, 0, 0) {
            params.push((format!("filter[custom_fields_values][{field}][from]"), from.to_string()));
        }
        if let Some(to) = bound(query.to, 23, 59, 59) {
            params.push((format!("filter[custom_fields_values][{field}][to]"), to.to_string()));
        }
        params
    }
}

#[async_trait]
impl DealSource for AmoCrmSource {
    async fn fetch_deals(&self, query: &DealQuery) -> Result<Vec<RawDealRecord>, CalendarError> {
        let response = self
            .client
            .get(format!("{}/api/v4/leads", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&Self::query_params(query))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(CalendarError::HostStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let page: LeadsPage = serde_json::from_slice(&body)?;
        Ok(decode_leads(page.embedded.leads))
    }
}

pub fn decode_leads(leads: Vec<serde_json::Value>) -> Vec<RawDealRecord> {
    leads
        .into_iter()
        .filter_map(|lead| {
            let id = lead.get("id").cloned();
            match serde_json::from_value::<RawDealRecord>(lead) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(lead_id = ?id, "skipping undecodable lead: {err}");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::bucket_in;
    use axum::extract::Query;
    use axum::http::{header::AUTHORIZATION, HeaderMap};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::Utc;
    use std::collections::HashMap;

    fn november_2023() -> DealQuery {
        DealQuery::for_month(YearMonth::new(2023, 10).unwrap(), 885453).unwrap()
    }

    #[test]
    fn query_spans_the_whole_month() {
        let query = november_2023();
        assert_eq!(query.from.to_string(), "2023-11-01");
        assert_eq!(query.to.to_string(), "2023-11-30");
    }

    #[test]
    fn mock_deals_on_first_and_every_fifth_day() {
        let records = MockDealSource::generate(&november_2023(), &Utc);
        let buckets = bucket_in(&records, 885453, &Utc);
        let days: Vec<&str> = buckets.keys().map(String::as_str).collect();
        assert_eq!(
            days,
            vec![
                "2023-11-01",
                "2023-11-05",
                "2023-11-10",
                "2023-11-15",
                "2023-11-20",
                "2023-11-25",
                "2023-11-30",
            ]
        );
        assert!(buckets.values().all(|deals| deals.len() == 1));
    }

    #[test]
    fn mock_deals_use_the_queried_field() {
        let mut query = november_2023();
        query.date_field_id = 42;
        let records = MockDealSource::generate(&query, &Utc);
        assert!(bucket_in(&records, 885453, &Utc).is_empty());
        assert_eq!(bucket_in(&records, 42, &Utc).len(), 7);
    }

    #[test]
    fn mock_output_is_deterministic() {
        let a = serde_json::to_value(MockDealSource::generate(&november_2023(), &Utc)).unwrap();
        let b = serde_json::to_value(MockDealSource::generate(&november_2023(), &Utc)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn undecodable_lead_is_dropped_alone() {
        let leads = vec![
            serde_json::json!({ "id": 1, "name": "ok", "price": 10 }),
            serde_json::json!({ "id": 2, "price": "lots" }),
            serde_json::json!({ "id": 3 }),
        ];
        let ids: Vec<Option<i64>> = decode_leads(leads).iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);
    }

    #[test]
    fn host_params_carry_limit_and_field_filter() {
        let params = AmoCrmSource::query_params(&november_2023());
        assert_eq!(params[0], ("limit".to_string(), "250".to_string()));
        assert!(
            params
                .iter()
                .any(|(key, _)| key == "filter[custom_fields_values][885453][from]")
        );
        assert!(
            params
                .iter()
                .any(|(key, _)| key == "filter[custom_fields_values][885453][to]")
        );
    }

    async fn leads(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        let authorized = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            == Some("Bearer secret");
        let filtered = params.get("limit").map(String::as_str) == Some("250")
            && params.contains_key("filter[custom_fields_values][885453][from]")
            && params.contains_key("filter[custom_fields_values][885453][to]");
        if !authorized || !filtered {
            return axum::http::StatusCode::UNAUTHORIZED.into_response();
        }

        Json(serde_json::json!({
            "_page": 1,
            "_embedded": {
                "leads": [
                    {
                        "id": 11,
                        "name": "Kitchen order",
                        "status_id": 142,
                        "price": 5000,
                        "custom_fields_values": [
                            { "field_id": 885453, "values": [{ "value": 1_700_000_000 }] }
                        ]
                    },
                    { "id": 12, "price": "lots" },
                    { "id": 13, "custom_fields_values": null }
                ]
            }
        }))
        .into_response()
    }

    async fn serve_host() -> String {
        let app = Router::new()
            .route("/ok/api/v4/leads", get(leads))
            .route(
                "/empty/api/v4/leads",
                get(|| async { axum::http::StatusCode::NO_CONTENT }),
            )
            .route(
                "/broken/api/v4/leads",
                get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn host_page_is_decoded_lead_by_lead() {
        let base = serve_host().await;
        let source = AmoCrmSource::new(format!("{base}/ok/"), "secret").unwrap();

        let records = source.fetch_deals(&november_2023()).await.unwrap();
        let ids: Vec<Option<i64>> = records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![Some(11), Some(13)]);
        assert_eq!(records[0].status_id, Some(142));

        let buckets = bucket_in(&records, 885453, &Utc);
        assert_eq!(buckets["2023-11-14"][0].name, "Kitchen order");
    }

    #[tokio::test]
    async fn host_without_token_is_rejected() {
        let base = serve_host().await;
        let source = AmoCrmSource::new(format!("{base}/ok"), "wrong").unwrap();

        let err = source.fetch_deals(&november_2023()).await.unwrap_err();
        assert!(matches!(err, CalendarError::HostStatus(401)));
    }

    #[tokio::test]
    async fn host_no_content_is_an_empty_month() {
        let base = serve_host().await;
        let source = AmoCrmSource::new(format!("{base}/empty"), "secret").unwrap();
        assert!(source.fetch_deals(&november_2023()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn host_failure_surfaces_status_and_falls_back() {
        let base = serve_host().await;
        let source = AmoCrmSource::new(format!("{base}/broken"), "secret").unwrap();

        let err = source.fetch_deals(&november_2023()).await.unwrap_err();
        assert!(matches!(err, CalendarError::HostStatus(500)));

        let mut path = std::env::temp_dir();
        path.push(format!("deal_calendar_broken_host_{}.json", std::process::id()));
        let state = crate::state::AppState::new(
            path,
            std::sync::Arc::new(source),
            YearMonth::new(2023, 10).unwrap(),
            crate::models::WidgetSettings::default(),
        );
        state.reload().await.unwrap();
        assert_eq!(state.view.lock().await.total_deals(), 7);
    }
}
