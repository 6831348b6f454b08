use crate::errors::{AppError, CalendarError};
use crate::grid::build_grid;
use crate::models::{
    CalendarResponse, DealsQuery, DealsResponse, MonthRequest, NavigateRequest, WidgetSettings,
};
use crate::state::{AppState, Navigation};
use crate::ui::{render_error, render_index};
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form, Json,
};
use chrono::{Local, NaiveDate};
use tracing::error;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let view = state.view.lock().await;
    let month = view.current_month;
    match build_grid(month.year, month.month, &view.deals_by_date, today()) {
        Ok(grid) => Html(render_index(&grid, &view.deals_by_date, view.date_field_id)),
        Err(err) => {
            error!("failed to build calendar grid: {err}");
            Html(render_error(&err.to_string()))
        }
    }
}

pub async fn get_calendar(State(state): State<AppState>) -> Result<Json<CalendarResponse>, AppError> {
    Ok(Json(calendar_response(&state).await?))
}

pub async fn navigate(
    State(state): State<AppState>,
    Json(payload): Json<NavigateRequest>,
) -> Result<Json<CalendarResponse>, AppError> {
    let navigation = Navigation::parse(&payload.direction, today())
        .ok_or_else(|| AppError::bad_request("direction must be 'prev', 'next' or 'today'"))?;

    state.navigate(navigation).await?;
    Ok(Json(calendar_response(&state).await?))
}

pub async fn set_month(
    State(state): State<AppState>,
    Json(payload): Json<MonthRequest>,
) -> Result<Json<CalendarResponse>, AppError> {
    state.jump(payload.year, payload.month).await?;
    Ok(Json(calendar_response(&state).await?))
}

pub async fn nav_prev(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.navigate(Navigation::Prev).await?;
    Ok(Redirect::to("/"))
}

pub async fn nav_next(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.navigate(Navigation::Next).await?;
    Ok(Redirect::to("/"))
}

pub async fn nav_today(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.navigate(Navigation::Today(today())).await?;
    Ok(Redirect::to("/"))
}

pub async fn get_deals(
    State(state): State<AppState>,
    Query(query): Query<DealsQuery>,
) -> Result<Json<DealsResponse>, AppError> {
    let date = NaiveDate::parse_from_str(query.date.trim(), "%Y-%m-%d")
        .map_err(|_| CalendarError::InvalidDateString(query.date.clone()))?;
    let key = date.format("%Y-%m-%d").to_string();

    let view = state.view.lock().await;
    let deals = view.deals_by_date.get(&key).cloned().unwrap_or_default();
    Ok(Json(DealsResponse { date: key, deals }))
}

pub async fn get_settings(State(state): State<AppState>) -> Json<WidgetSettings> {
    Json(state.settings().await)
}

pub async fn save_settings(
    State(state): State<AppState>,
    Json(settings): Json<WidgetSettings>,
) -> Result<Json<WidgetSettings>, AppError> {
    state.save_settings(settings).await?;
    Ok(Json(settings))
}

pub async fn save_settings_form(
    State(state): State<AppState>,
    Form(settings): Form<WidgetSettings>,
) -> Result<Redirect, AppError> {
    state.save_settings(settings).await?;
    Ok(Redirect::to("/"))
}

async fn calendar_response(state: &AppState) -> Result<CalendarResponse, AppError> {
    let view = state.view.lock().await;
    let month = view.current_month;
    let grid = build_grid(month.year, month.month, &view.deals_by_date, today())?;

    Ok(CalendarResponse {
        grid,
        date_field_id: view.date_field_id,
        total_deals: view.total_deals(),
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
