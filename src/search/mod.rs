//! # Search
//!
//! Unified search across products, ventures and vendors.
//!
//! ## Flow
//! 1. Reject an empty term before touching the store
//! 2. Build one [`Pattern`] for the whole request
//! 3. Spawn one task per requested entity type, each running a page query and a
//!    count query against the [`Catalog`]
//! 4. Wait for every task; the first failure fails the request
//!
//! Sections that were not requested are absent from `results` and `counts`,
//! so an empty list always means "no matches" and never "not searched".
//!
//! ## Suggestions
//! Autocomplete always runs all three entity types in prefix mode, capped at
//! [`SUGGESTION_LIMIT`] rows each, with no pagination and no counts.
use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::debug;

pub mod error;
pub mod memory;
pub mod mongo;

pub use error::{SearchError, SearchResult, StoreError};

use crate::{
    models::{
        ProductHit, ProductSuggestion, VendorHit, VendorSuggestion, VentureHit, VentureSuggestion,
    },
    pattern::{Pattern, PatternBuilder},
    query::{EntityType, MatchMode, SearchQuery, Window},
};

pub const SUGGESTION_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Read access to the three collections, with joins already applied.
///
/// Every page method must compute `total` with the exact filter used for `items`.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn products(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<ProductHit>, StoreError>;

    async fn ventures(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<VentureHit>, StoreError>;

    async fn vendors(
        &self,
        pattern: &Pattern,
        window: Window,
    ) -> Result<SearchPage<VendorHit>, StoreError>;

    async fn product_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<ProductSuggestion>, StoreError>;

    async fn venture_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<VentureSuggestion>, StoreError>;

    async fn vendor_suggestions(
        &self,
        pattern: &Pattern,
        limit: u32,
    ) -> Result<Vec<VendorSuggestion>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Hits {
    Products(Vec<ProductHit>),
    Ventures(Vec<VentureHit>),
    Vendors(Vec<VendorHit>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedResult {
    pub q: String,
    pub page: u32,
    pub limit: u32,
    pub results: BTreeMap<EntityType, Hits>,
    pub counts: BTreeMap<EntityType, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityResult {
    pub q: String,
    pub page: u32,
    pub limit: u32,
    pub results: Hits,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionLists {
    pub productos: Vec<ProductSuggestion>,
    pub emprendimientos: Vec<VentureSuggestion>,
    pub emprendedores: Vec<VendorSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestions {
    pub q: String,
    pub sugerencias: SuggestionLists,
}

#[derive(Clone)]
pub struct Searcher {
    catalog: Arc<dyn Catalog>,
    patterns: PatternBuilder,
}

impl Searcher {
    pub fn new(catalog: Arc<dyn Catalog>, patterns: PatternBuilder) -> Self {
        Self { catalog, patterns }
    }

    pub async fn search(&self, query: &SearchQuery) -> SearchResult<UnifiedResult> {
        let term = require_term(&query.term)?;
        let pattern = Arc::new(self.patterns.build(term, query.mode));

        debug!(
            term,
            pattern = pattern.source(),
            types = ?query.entity_types,
            page = query.window.page,
            limit = query.window.limit,
            "Unified search"
        );

        let mut tasks = JoinSet::new();
        for &entity in &query.entity_types {
            let catalog = self.catalog.clone();
            let pattern = pattern.clone();
            let window = query.window;

            tasks.spawn(async move {
                let (hits, total) = run_section(catalog.as_ref(), entity, &pattern, window).await?;
                Ok::<_, StoreError>((entity, hits, total))
            });
        }

        let mut results = BTreeMap::new();
        let mut counts = BTreeMap::new();

        // Returning early drops the set, which aborts whatever is still running.
        while let Some(joined) = tasks.join_next().await {
            let (entity, hits, total) = joined.map_err(StoreError::from)??;
            results.insert(entity, hits);
            counts.insert(entity, total);
        }

        Ok(UnifiedResult {
            q: term.to_string(),
            page: query.window.page,
            limit: query.window.limit,
            results,
            counts,
        })
    }

    pub async fn search_entity(
        &self,
        entity: EntityType,
        query: &SearchQuery,
    ) -> SearchResult<EntityResult> {
        let term = require_term(&query.term)?;
        let pattern = self.patterns.build(term, query.mode);

        debug!(term, pattern = pattern.source(), %entity, "Entity search");

        let (results, total) =
            run_section(self.catalog.as_ref(), entity, &pattern, query.window).await?;

        Ok(EntityResult {
            q: term.to_string(),
            page: query.window.page,
            limit: query.window.limit,
            results,
            total,
        })
    }

    pub async fn suggest(&self, term: &str) -> SearchResult<Suggestions> {
        let term = require_term(term.trim())?;
        let pattern = self.patterns.build(term, MatchMode::Prefix);

        debug!(term, pattern = pattern.source(), "Suggestions");

        let (productos, emprendimientos, emprendedores) = tokio::try_join!(
            self.catalog.product_suggestions(&pattern, SUGGESTION_LIMIT),
            self.catalog.venture_suggestions(&pattern, SUGGESTION_LIMIT),
            self.catalog.vendor_suggestions(&pattern, SUGGESTION_LIMIT),
        )?;

        Ok(Suggestions {
            q: term.to_string(),
            sugerencias: SuggestionLists {
                productos,
                emprendimientos,
                emprendedores,
            },
        })
    }
}

fn require_term(term: &str) -> SearchResult<&str> {
    if term.is_empty() {
        return Err(SearchError::EmptyTerm);
    }

    Ok(term)
}

async fn run_section(
    catalog: &dyn Catalog,
    entity: EntityType,
    pattern: &Pattern,
    window: Window,
) -> Result<(Hits, u64), StoreError> {
    let section = match entity {
        EntityType::Product => {
            let page = catalog.products(pattern, window).await?;
            (Hits::Products(page.items), page.total)
        }
        EntityType::Venture => {
            let page = catalog.ventures(pattern, window).await?;
            (Hits::Ventures(page.items), page.total)
        }
        EntityType::Vendor => {
            let page = catalog.vendors(pattern, window).await?;
            (Hits::Vendors(page.items), page.total)
        }
    };

    Ok(section)
}

#[cfg(test)]
mod tests {
    use super::{memory::MemoryCatalog, *};
    use crate::query::RawSearchParams;

    fn marketplace() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();

        let maria = catalog.add_vendor("Maria", "Lopez", "maria@example.com");
        let jose = catalog.add_vendor("José", "Pérez", "jose@example.com");

        let panaderia = catalog.add_venture(maria, "Panaderia Maria", "Pan artesanal", "Quito");
        let taller = catalog.add_venture(jose, "Taller Textil", "Ropa tejida", "Cuenca");

        catalog.add_product(panaderia, "Pan Integral", "Masa madre", 2.5, 20);
        for i in 0..7 {
            catalog.add_product(panaderia, &format!("Pan de yuca {i}"), "Horneado", 0.5, 100);
        }
        catalog.add_product(taller, "Poncho", "Lana de alpaca", 45.0, 3);

        catalog
    }

    fn searcher(catalog: MemoryCatalog) -> (Searcher, Arc<MemoryCatalog>) {
        let catalog = Arc::new(catalog);
        (
            Searcher::new(catalog.clone(), PatternBuilder::default()),
            catalog,
        )
    }

    fn query(q: &str, types: Option<&str>, page: &str, limit: &str) -> SearchQuery {
        SearchQuery::from_params(&RawSearchParams {
            q: Some(q.to_string()),
            types: types.map(str::to_string),
            page: Some(page.to_string()),
            limit: Some(limit.to_string()),
            mode: None,
        })
    }

    #[tokio::test]
    async fn test_empty_term_issues_no_queries() {
        let (searcher, catalog) = searcher(marketplace());

        let err = searcher.search(&query("   ", None, "1", "10")).await.unwrap_err();
        assert!(matches!(err, SearchError::EmptyTerm));

        let err = searcher.suggest("").await.unwrap_err();
        assert!(matches!(err, SearchError::EmptyTerm));

        assert_eq!(catalog.queries_issued(), 0);
    }

    #[tokio::test]
    async fn test_only_requested_sections_are_present() {
        let (searcher, _) = searcher(marketplace());

        let result = searcher
            .search(&query("pan", Some("productos"), "1", "10"))
            .await
            .unwrap();

        assert_eq!(result.results.keys().copied().collect::<Vec<_>>(), [EntityType::Product]);
        assert_eq!(result.counts.keys().copied().collect::<Vec<_>>(), [EntityType::Product]);
        assert_eq!(result.counts[&EntityType::Product], 8);
    }

    #[tokio::test]
    async fn test_owner_join_reaches_every_bucket() {
        let (searcher, _) = searcher(marketplace());

        let result = searcher
            .search(&query("maria", None, "1", "50"))
            .await
            .unwrap();

        assert_eq!(result.counts[&EntityType::Vendor], 1);
        assert_eq!(result.counts[&EntityType::Venture], 1);
        assert_eq!(result.counts[&EntityType::Product], 8);
    }

    #[tokio::test]
    async fn test_counts_ignore_pagination() {
        let (searcher, _) = searcher(marketplace());

        let mut seen = Vec::new();
        for (page, limit) in [("1", "1"), ("2", "3"), ("9", "50")] {
            let result = searcher
                .search(&query("pan", Some("productos"), page, limit))
                .await
                .unwrap();
            seen.push(result.counts[&EntityType::Product]);
        }

        assert_eq!(seen, [8, 8, 8]);
    }

    #[tokio::test]
    async fn test_pages_do_not_overlap() {
        let (searcher, _) = searcher(marketplace());

        let first = searcher
            .search_entity(EntityType::Product, &query("pan", None, "1", "5"))
            .await
            .unwrap();
        let second = searcher
            .search_entity(EntityType::Product, &query("pan", None, "2", "5"))
            .await
            .unwrap();

        let (Hits::Products(first), Hits::Products(second)) = (first.results, second.results) else {
            panic!("expected product hits");
        };

        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 3);
        assert!(first.iter().all(|a| second.iter().all(|b| a.id != b.id)));
    }

    #[tokio::test]
    async fn test_repeated_search_is_identical() {
        let (searcher, _) = searcher(marketplace());
        let query = query("pan", None, "1", "4");

        let first = searcher.search(&query).await.unwrap();
        let second = searcher.search(&query).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_one_failing_section_fails_everything() {
        let mut catalog = marketplace();
        catalog.fail_on(EntityType::Venture);
        let (searcher, _) = searcher(catalog);

        let err = searcher.search(&query("pan", None, "1", "10")).await.unwrap_err();
        assert!(matches!(err, SearchError::Store(StoreError::Unavailable(_))));

        let ok = searcher
            .search(&query("pan", Some("productos,emprendedores"), "1", "10"))
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_suggestions_are_prefix_and_capped() {
        let (searcher, _) = searcher(marketplace());

        let suggestions = searcher.suggest(" pan ").await.unwrap();

        assert_eq!(suggestions.q, "pan");
        assert_eq!(suggestions.sugerencias.productos.len(), SUGGESTION_LIMIT as usize);
        assert_eq!(suggestions.sugerencias.emprendimientos.len(), 1);
        assert!(suggestions.sugerencias.emprendedores.is_empty());

        // "oncho" is inside "Poncho" but suggestions never match mid-word.
        let suggestions = searcher.suggest("oncho").await.unwrap();
        assert!(suggestions.sugerencias.productos.is_empty());
    }

    #[tokio::test]
    async fn test_suggestion_failure_fails_request() {
        let mut catalog = marketplace();
        catalog.fail_on(EntityType::Vendor);
        let (searcher, _) = searcher(catalog);

        assert!(searcher.suggest("pan").await.is_err());
    }
}
