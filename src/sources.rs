//! Sales data sources and the fallback chain that picks between them.
//!
//! Sources are tried in order; the first one that yields rows wins. The demo
//! source never fails, so resolution always ends with a renderable table.

use crate::config::Config;
use crate::errors::SourceError;
use crate::models::{Notice, SalesRecord, Snapshot, SourceKind};
use async_trait::async_trait;
use chrono::{Duration, Months, NaiveDate};
use sqlx::{Connection, PgConnection};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

pub const DEMO_WARNING: &str = "No data found - displaying demo figures.";

const OVERVIEW_QUERY: &str = "SELECT date, channel, \
     revenue::float8 AS revenue, orders::int8 AS orders, gross_margin::float8 AS gross_margin \
     FROM fact_sales_daily WHERE date >= $1";

const DEMO_DAYS: i64 = 30;
const DEMO_CHANNELS: [&str; 2] = ["Store", "E-Com"];

#[async_trait]
pub trait SalesSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn load(&self, today: NaiveDate) -> Result<Vec<SalesRecord>, SourceError>;
}

/// Trailing twelve months from `fact_sales_daily`.
pub struct DatabaseSource {
    uri: String,
}

impl DatabaseSource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[async_trait]
impl SalesSource for DatabaseSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Database
    }

    async fn load(&self, today: NaiveDate) -> Result<Vec<SalesRecord>, SourceError> {
        let since = today
            .checked_sub_months(Months::new(12))
            .unwrap_or(NaiveDate::MIN);

        let mut conn = PgConnection::connect(&self.uri).await?;
        let records = sqlx::query_as::<_, SalesRecord>(OVERVIEW_QUERY)
            .bind(since)
            .fetch_all(&mut conn)
            .await?;

        if let Err(err) = conn.close().await {
            debug!("closing database connection failed: {err}");
        }

        Ok(records)
    }
}

pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SalesSource for CsvSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Csv
    }

    async fn load(&self, _today: NaiveDate) -> Result<Vec<SalesRecord>, SourceError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::Missing(self.path.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        parse_csv(&bytes)
    }
}

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<SalesRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let records = reader
        .deserialize::<SalesRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Placeholder series used when no real data is reachable.
pub struct DemoSource;

#[async_trait]
impl SalesSource for DemoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Demo
    }

    async fn load(&self, today: NaiveDate) -> Result<Vec<SalesRecord>, SourceError> {
        Ok(demo_records(today))
    }
}

/// Thirty days ending today, alternating channels, oldest day first.
pub fn demo_records(today: NaiveDate) -> Vec<SalesRecord> {
    (0..DEMO_DAYS)
        .map(|index| {
            let date = today - Duration::days(DEMO_DAYS - 1 - index);
            let channel = DEMO_CHANNELS[index as usize % DEMO_CHANNELS.len()];
            SalesRecord::new(date, channel, 20_000.0, 150, 8_000.0)
        })
        .collect()
}

pub struct SourceResolver {
    sources: Vec<Box<dyn SalesSource>>,
}

impl SourceResolver {
    pub fn new(sources: Vec<Box<dyn SalesSource>>) -> Self {
        Self { sources }
    }

    /// Database (when configured), then the CSV file, then demo data.
    pub fn from_config(config: &Config) -> Self {
        let mut sources: Vec<Box<dyn SalesSource>> = Vec::with_capacity(3);
        if let Some(uri) = &config.db_uri {
            sources.push(Box::new(DatabaseSource::new(uri.clone())));
        }
        sources.push(Box::new(CsvSource::new(config.csv_path())));
        sources.push(Box::new(DemoSource));
        Self::new(sources)
    }

    pub fn kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|source| source.kind()).collect()
    }

    pub async fn resolve(&self, today: NaiveDate) -> Snapshot {
        let mut notices = Vec::new();

        for source in &self.sources {
            let kind = source.kind();
            match source.load(today).await {
                Ok(records) if records.is_empty() => {
                    let err = SourceError::Empty(kind.description());
                    warn!("{err}");
                    notices.push(Notice::error(err.to_string()));
                }
                Ok(records) => return finish(kind, records, notices, today),
                Err(err) if !err.is_reportable() => {
                    debug!("skipping {} source: {err}", kind.description());
                }
                Err(err) => {
                    warn!("{} source failed: {err}", kind.description());
                    notices.push(Notice::error(err.to_string()));
                }
            }
        }

        finish(SourceKind::Demo, demo_records(today), notices, today)
    }
}

fn finish(
    source: SourceKind,
    records: Vec<SalesRecord>,
    mut notices: Vec<Notice>,
    today: NaiveDate,
) -> Snapshot {
    if source == SourceKind::Demo {
        notices.push(Notice::warning(DEMO_WARNING));
    }
    info!(
        "loaded {} sales rows from {} source",
        records.len(),
        source.description()
    );
    Snapshot {
        records,
        source,
        notices,
        loaded_on: today,
    }
}
