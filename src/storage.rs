use crate::errors::AppError;
use crate::models::WidgetSettings;
use std::path::Path;
use tokio::fs;
use tracing::error;

/// Reads the settings the host saved for this widget. A missing file yields
/// `fallback`; unreadable or unparsable files are logged and also yield it.
pub async fn load_settings(path: &Path, fallback: WidgetSettings) -> WidgetSettings {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(settings) => settings,
            Err(err) => {
                error!("failed to parse settings file: {err}");
                fallback
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => fallback,
        Err(err) => {
            error!("failed to read settings file: {err}");
            fallback
        }
    }
}

pub async fn persist_settings(path: &Path, settings: &WidgetSettings) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(settings).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
