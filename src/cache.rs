use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Single-slot snapshot cache; the value expires `ttl` after it was stored.
///
/// Callers that miss at the same time share one refresh.
pub struct TtlCache<T> {
    slot: Cache<(), Arc<T>>,
}

impl<T: Send + Sync + 'static> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    pub async fn get_or_refresh<Fut>(&self, refresh: Fut) -> Arc<T>
    where
        Fut: Future<Output = T>,
    {
        self.slot
            .get_with((), async move {
                info!("snapshot cache miss, refreshing");
                Arc::new(refresh.await)
            })
            .await
    }
}
