use crate::errors::AppError;
use crate::format::{format_aed, format_caption, format_percent};
use crate::models::{
    ChannelsResponse, Dashboard, DashboardQuery, DashboardResponse, FilterSelection,
    MetricsResponse, Period, Snapshot,
};
use crate::state::{AppState, today};
use crate::stats::{build_dashboard_at, distinct_channels};
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, AppError> {
    let response = dashboard_response(&state, query).await?;
    Ok(Html(render_index(&response)))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    Ok(Json(dashboard_response(&state, query).await?))
}

pub async fn get_channels(State(state): State<AppState>) -> Json<ChannelsResponse> {
    let snapshot = state.snapshot().await;
    Json(ChannelsResponse {
        channels: distinct_channels(&snapshot.records),
    })
}

async fn dashboard_response(
    state: &AppState,
    query: DashboardQuery,
) -> Result<DashboardResponse, AppError> {
    let snapshot = state.snapshot().await;
    let available = distinct_channels(&snapshot.records);
    let selection = parse_selection(query, &available)?;

    let date = today();
    let dashboard = build_dashboard_at(date, &snapshot.records, &selection);
    Ok(to_response(date, &snapshot, selection, available, dashboard))
}

/// Missing or empty channel lists select every channel in the table.
pub fn parse_selection(
    query: DashboardQuery,
    available: &[String],
) -> Result<FilterSelection, AppError> {
    let period = match query.period.as_deref().map(str::trim) {
        None | Some("") => Period::default(),
        Some(raw) => raw.parse::<Period>().map_err(AppError::bad_request)?,
    };

    let mut channels: Vec<String> = query
        .channels
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .map(str::to_string)
        .collect();
    let mut seen = BTreeSet::new();
    channels.retain(|channel| seen.insert(channel.clone()));
    if channels.is_empty() {
        channels = available.to_vec();
    }

    Ok(FilterSelection { period, channels })
}

fn to_response(
    date: NaiveDate,
    snapshot: &Snapshot,
    selection: FilterSelection,
    available_channels: Vec<String>,
    dashboard: Dashboard,
) -> DashboardResponse {
    let metrics = dashboard.metrics;
    DashboardResponse {
        as_of: date.to_string(),
        caption: format_caption(date),
        period: selection.period,
        channels: selection.channels,
        available_channels,
        source: snapshot.source,
        notices: snapshot.notices.clone(),
        row_count: dashboard.row_count,
        metrics: MetricsResponse {
            revenue_label: format_aed(metrics.total_revenue),
            orders_label: metrics.total_orders.to_string(),
            margin_label: format_percent(metrics.gross_margin_pct),
            total_revenue: metrics.total_revenue,
            total_orders: metrics.total_orders,
            gross_margin_pct: metrics.gross_margin_pct,
        },
        trend: dashboard.trend,
        channel_split: dashboard.channel_split,
    }
}
