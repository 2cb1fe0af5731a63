use crate::cache::TtlCache;
use crate::models::Snapshot;
use crate::sources::SourceResolver;
use chrono::{Local, NaiveDate};
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<SourceResolver>,
    pub cache: Arc<TtlCache<Snapshot>>,
}

impl AppState {
    pub fn new(resolver: SourceResolver, cache_ttl: Duration) -> Self {
        Self {
            resolver: Arc::new(resolver),
            cache: Arc::new(TtlCache::new(cache_ttl)),
        }
    }

    /// Current table, resolved again only after the cache TTL has passed.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.cache
            .get_or_refresh(self.resolver.resolve(today()))
            .await
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
