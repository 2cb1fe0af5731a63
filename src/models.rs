use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of the daily sales facts table.
#[derive(Debug, Clone, PartialEq, Deserialize, sqlx::FromRow)]
pub struct SalesRecord {
    #[serde(deserialize_with = "deserialize_calendar_date")]
    pub date: NaiveDate,
    pub channel: String,
    pub revenue: f64,
    pub orders: i64,
    pub gross_margin: f64,
}

impl SalesRecord {
    pub fn new(
        date: NaiveDate,
        channel: impl Into<String>,
        revenue: f64,
        orders: i64,
        gross_margin: f64,
    ) -> Self {
        Self {
            date,
            channel: channel.into(),
            revenue,
            orders,
            gross_margin,
        }
    }
}

/// Accepts `YYYY-MM-DD` or an ISO date-time, keeping only the date part.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| chrono::NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|datetime| datetime.date())
}

fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

/// Lookback window offered by the period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Period {
    #[default]
    #[serde(rename = "30 D")]
    Days30,
    #[serde(rename = "90 D")]
    Days90,
    #[serde(rename = "12 M")]
    Months12,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Days30, Period::Days90, Period::Months12];

    pub fn lookback_days(self) -> i64 {
        match self {
            Period::Days30 => 30,
            Period::Days90 => 90,
            Period::Months12 => 365,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Days30 => "30 D",
            Period::Days90 => "90 D",
            Period::Months12 => "12 M",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        match compact.as_str() {
            "30D" => Ok(Period::Days30),
            "90D" => Ok(Period::Days90),
            "12M" => Ok(Period::Months12),
            _ => Err(format!("period must be one of '30 D', '90 D', '12 M' (got '{value}')")),
        }
    }
}

/// Viewer input for one dashboard evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub period: Period,
    pub channels: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    pub period: Option<String>,
    /// Comma-separated channel labels.
    pub channels: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Database,
    Csv,
    Demo,
}

impl SourceKind {
    pub fn description(self) -> &'static str {
        match self {
            SourceKind::Database => "database",
            SourceKind::Csv => "CSV file",
            SourceKind::Demo => "demo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Error,
    Warning,
}

/// Inline message shown above the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Resolved table plus where it came from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<SalesRecord>,
    pub source: SourceKind,
    pub notices: Vec<Notice>,
    pub loaded_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub gross_margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelPoint {
    pub channel: String,
    pub revenue: f64,
}

/// Output of the filter and aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub row_count: usize,
    pub metrics: Metrics,
    pub trend: Vec<TrendPoint>,
    pub channel_split: Vec<ChannelPoint>,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub gross_margin_pct: f64,
    pub revenue_label: String,
    pub orders_label: String,
    pub margin_label: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub as_of: String,
    pub caption: String,
    pub period: Period,
    pub channels: Vec<String>,
    pub available_channels: Vec<String>,
    pub source: SourceKind,
    pub notices: Vec<Notice>,
    pub row_count: usize,
    pub metrics: MetricsResponse,
    pub trend: Vec<TrendPoint>,
    pub channel_split: Vec<ChannelPoint>,
}

#[derive(Debug, Serialize)]
pub struct ChannelsResponse {
    pub channels: Vec<String>,
}
