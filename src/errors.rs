use axum::http::StatusCode;
use thiserror::Error;

/// Failures raised by the calendar core and the deal sources.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("invalid calendar month: year {year}, month {month} (expected 0..=11)")]
    InvalidDate { year: i32, month: u32 },

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDateString(String),

    #[error("deal fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("host API responded with status {0}")]
    HostStatus(u16),

    #[error("failed to decode host response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CalendarError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidDate { .. } | Self::InvalidDateString(_))
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        if err.is_invalid_input() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(err)
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
