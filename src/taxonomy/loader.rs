//! Fail-soft taxonomy loading and the per-page taxonomy store

use std::sync::Arc;
use tokio::sync::RwLock;

use super::index::TaxonomyIndex;
use super::source::TaxonomySource;

/// Loads a [`TaxonomyIndex`] from a source without ever failing.
///
/// Tags and buildings are fetched concurrently and degrade independently:
/// a failed fetch is logged and contributes an empty list.
#[derive(Clone)]
pub struct TaxonomyLoader {
    source: Arc<dyn TaxonomySource>,
}

/// Result of a load, with whether every fetch succeeded
#[derive(Debug)]
pub struct LoadOutcome {
    pub index: TaxonomyIndex,
    pub complete: bool,
}

impl TaxonomyLoader {
    pub fn new(source: Arc<dyn TaxonomySource>) -> Self {
        Self { source }
    }

    /// Load the taxonomy; transport failures yield empty option lists
    pub async fn load(&self) -> TaxonomyIndex {
        self.load_outcome().await.index
    }

    pub async fn load_outcome(&self) -> LoadOutcome {
        let (tags, buildings) =
            tokio::join!(self.source.fetch_tags(), self.source.fetch_buildings());

        let mut complete = true;

        let tags = tags.unwrap_or_else(|e| {
            complete = false;
            tracing::warn!(
                error = %e,
                code = e.code(),
                "Taxonomy fetch failed, continuing with empty option lists"
            );
            Vec::new()
        });

        let buildings = buildings.unwrap_or_else(|e| {
            complete = false;
            tracing::warn!(
                error = %e,
                code = e.code(),
                "Buildings fetch failed, continuing with empty lookup"
            );
            Vec::new()
        });

        let index = TaxonomyIndex::build(tags, buildings);

        for issue in index.structural_issues() {
            tracing::warn!(?issue, "Taxonomy tag breaks the tree layout");
        }

        tracing::info!(
            tags = index.len(),
            buildings = index.buildings().len(),
            complete,
            "Taxonomy loaded"
        );
        for (kind, count) in index.kind_counts() {
            tracing::debug!(kind = %kind, count, "Taxonomy partition");
        }

        LoadOutcome { index, complete }
    }
}

/// Load-once cache of the taxonomy for one page lifetime.
///
/// `get` loads on first use and shares the index afterwards. `invalidate`
/// drops it when the page is left. Degraded loads are handed out but not
/// cached, so the next `get` retries.
pub struct TaxonomyStore {
    loader: TaxonomyLoader,
    cached: RwLock<Option<Arc<TaxonomyIndex>>>,
}

impl TaxonomyStore {
    pub fn new(loader: TaxonomyLoader) -> Self {
        Self {
            loader,
            cached: RwLock::new(None),
        }
    }

    pub fn from_source(source: Arc<dyn TaxonomySource>) -> Self {
        Self::new(TaxonomyLoader::new(source))
    }

    /// Shared index, loading it if nothing is cached
    pub async fn get(&self) -> Arc<TaxonomyIndex> {
        if let Some(index) = self.cached.read().await.as_ref() {
            return index.clone();
        }

        let mut cached = self.cached.write().await;
        // Another caller may have loaded while we waited for the lock
        if let Some(index) = cached.as_ref() {
            return index.clone();
        }

        let outcome = self.loader.load_outcome().await;
        let index = Arc::new(outcome.index);
        if outcome.complete {
            *cached = Some(index.clone());
        }
        index
    }

    /// Currently cached index, without loading
    pub async fn cached(&self) -> Option<Arc<TaxonomyIndex>> {
        self.cached.read().await.clone()
    }

    /// Drop the cached index
    pub async fn invalidate(&self) {
        if self.cached.write().await.take().is_some() {
            tracing::debug!("Taxonomy cache invalidated");
        }
    }
}
