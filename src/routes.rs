use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State as AxumState},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    query::{EntityType, RawSearchParams, SearchQuery},
    search::{EntityResult, Suggestions, UnifiedResult},
    state::State,
};

pub async fn search_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<UnifiedResult>, AppError> {
    let query = SearchQuery::from_params(&params);

    Ok(Json(state.searcher.search(&query).await?))
}

pub async fn suggest_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<Suggestions>, AppError> {
    let term = params.q.as_deref().unwrap_or_default();

    Ok(Json(state.searcher.suggest(term).await?))
}

pub async fn products_handler(
    state: AxumState<Arc<State>>,
    params: Query<RawSearchParams>,
) -> Result<Json<EntityResult>, AppError> {
    entity_search(EntityType::Product, state, params).await
}

pub async fn ventures_handler(
    state: AxumState<Arc<State>>,
    params: Query<RawSearchParams>,
) -> Result<Json<EntityResult>, AppError> {
    entity_search(EntityType::Venture, state, params).await
}

pub async fn vendors_handler(
    state: AxumState<Arc<State>>,
    params: Query<RawSearchParams>,
) -> Result<Json<EntityResult>, AppError> {
    entity_search(EntityType::Vendor, state, params).await
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn entity_search(
    entity: EntityType,
    AxumState(state): AxumState<Arc<State>>,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<EntityResult>, AppError> {
    let query = SearchQuery::from_params(&params);

    Ok(Json(state.searcher.search_entity(entity, &query).await?))
}
