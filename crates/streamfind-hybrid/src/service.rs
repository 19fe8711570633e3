use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use streamfind_core::RankingStrategy;

use crate::context::SearchContext;
use crate::result::EntityResult;

/// Shared handle to the current index generation.
///
/// Queries clone the `Arc` under a short read lock and run against that
/// snapshot; `swap` installs a rebuilt context without disturbing them.
pub struct SearchService {
    current: RwLock<Arc<SearchContext>>,
}

impl SearchService {
    pub fn new(context: SearchContext) -> Self {
        announce(&context);
        Self { current: RwLock::new(Arc::new(context)) }
    }

    pub fn snapshot(&self) -> Arc<SearchContext> { Arc::clone(&self.current.read()) }

    /// Replace the served generation and hand back the previous one.
    pub fn swap(&self, context: SearchContext) -> Arc<SearchContext> {
        announce(&context);
        std::mem::replace(&mut *self.current.write(), Arc::new(context))
    }

    pub async fn search(&self, query: &str) -> Vec<EntityResult> {
        let context = self.snapshot();
        context.search(query).await
    }

    pub async fn search_with(&self, query: &str, strategy: RankingStrategy) -> Vec<EntityResult> {
        let context = self.snapshot();
        context.search_with(query, strategy).await
    }
}

fn announce(context: &SearchContext) {
    info!(
        strategy = ?context.strategy(),
        documents = context.corpus().len(),
        vectors = context.has_vectors(),
        latent = context.has_latent(),
        "search context ready"
    );
    for backend in context.missing_backends() {
        warn!(strategy = ?context.strategy(), backend, "backend unavailable; that pass will return nothing");
    }
}
