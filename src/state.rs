use crate::bucket::bucket;
use crate::errors::{AppError, CalendarError};
use crate::models::{DealsByDate, WidgetSettings, YearMonth};
use crate::source::{DealQuery, DealSource, MockDealSource};
use crate::storage::persist_settings;
use chrono::NaiveDate;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, info};

/// What the widget is currently showing.
#[derive(Debug, Clone)]
pub struct CalendarViewState {
    pub current_month: YearMonth,
    pub deals_by_date: DealsByDate,
    pub date_field_id: u64,
}

impl CalendarViewState {
    pub fn new(current_month: YearMonth, date_field_id: u64) -> Self {
        Self {
            current_month,
            deals_by_date: DealsByDate::new(),
            date_field_id,
        }
    }

    pub fn total_deals(&self) -> usize {
        self.deals_by_date.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Prev,
    Next,
    Today(NaiveDate),
}

impl Navigation {
    pub fn parse(direction: &str, today: NaiveDate) -> Option<Self> {
        match direction.trim() {
            "prev" => Some(Self::Prev),
            "next" => Some(Self::Next),
            "today" => Some(Self::Today(today)),
            _ => None,
        }
    }

    fn apply(self, month: YearMonth) -> YearMonth {
        match self {
            Self::Prev => month.prev(),
            Self::Next => month.next(),
            Self::Today(today) => YearMonth::containing(today),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings_path: PathBuf,
    pub view: Arc<Mutex<CalendarViewState>>,
    source: Arc<dyn DealSource>,
}

impl AppState {
    pub fn new(
        settings_path: PathBuf,
        source: Arc<dyn DealSource>,
        current_month: YearMonth,
        settings: WidgetSettings,
    ) -> Self {
        Self {
            settings_path,
            view: Arc::new(Mutex::new(CalendarViewState::new(
                current_month,
                settings.deal_date_field_id,
            ))),
            source,
        }
    }

    /// Refetches the month on display.
    pub async fn reload(&self) -> Result<(), CalendarError> {
        let mut view = self.view.lock().await;
        let month = view.current_month;
        self.load_into(&mut view, month).await
    }

    pub async fn navigate(&self, navigation: Navigation) -> Result<YearMonth, CalendarError> {
        let mut view = self.view.lock().await;
        let target = navigation.apply(view.current_month);
        self.load_into(&mut view, target).await?;
        Ok(target)
    }

    pub async fn jump(&self, year: i32, month: u32) -> Result<YearMonth, CalendarError> {
        let target = YearMonth::new(year, month)?;
        let mut view = self.view.lock().await;
        self.load_into(&mut view, target).await?;
        Ok(target)
    }

    /// Stores new settings. Only the field id changes; the current buckets are
    /// kept until the next navigation.
    pub async fn save_settings(&self, settings: WidgetSettings) -> Result<(), AppError> {
        let mut view = self.view.lock().await;
        persist_settings(&self.settings_path, &settings).await?;
        view.date_field_id = settings.deal_date_field_id;
        info!(field_id = settings.deal_date_field_id, "settings saved");
        Ok(())
    }

    pub async fn settings(&self) -> WidgetSettings {
        WidgetSettings {
            deal_date_field_id: self.view.lock().await.date_field_id,
        }
    }

    // The view stays locked for the whole fetch, so navigations run one at a
    // time and never interleave their results.
    async fn load_into(
        &self,
        view: &mut CalendarViewState,
        month: YearMonth,
    ) -> Result<(), CalendarError> {
        let query = DealQuery::for_month(month, view.date_field_id)?;
        let records = match self.source.fetch_deals(&query).await {
            Ok(records) => records,
            Err(err) => {
                error!("deal fetch failed, using demo data: {err}");
                MockDealSource.fetch_deals(&query).await?
            }
        };

        let prefix = month.key_prefix()?;
        let mut deals_by_date = bucket(&records, query.date_field_id);
        deals_by_date.retain(|date, _| date.starts_with(&prefix));

        info!(
            month = %month.label(),
            fetched = records.len(),
            days = deals_by_date.len(),
            "calendar month loaded"
        );

        view.current_month = month;
        view.deals_by_date = deals_by_date;
        Ok(())
    }
}
