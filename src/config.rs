use crate::models::WidgetSettings;
use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SETTINGS_PATH: &str = "data/settings.json";

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub base_url: String,
    pub access_token: String,
}

/// Process configuration, taken from the environment.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub port: u16,
    pub settings_path: PathBuf,
    pub host: Option<HostConfig>,
    pub initial_settings: WidgetSettings,
}

impl WidgetConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = non_empty("PORT")
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let settings_path = non_empty("WIDGET_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

        let host = match (non_empty("AMOCRM_BASE_URL"), non_empty("AMOCRM_ACCESS_TOKEN")) {
            (Some(base_url), Some(access_token)) => Some(HostConfig {
                base_url,
                access_token,
            }),
            _ => None,
        };

        let mut initial_settings = WidgetSettings::default();
        if let Some(field_id) =
            non_empty("DEAL_DATE_FIELD_ID").and_then(|value| value.trim().parse::<u64>().ok())
        {
            initial_settings.deal_date_field_id = field_id;
        }

        Self {
            port,
            settings_path,
            host,
            initial_settings,
        }
    }
}
