//! # Query Parameters
//!
//! Turns the raw, string-typed query string of a search request into bounded values.
//!
//! - `q`: trimmed, may end up empty (rejected later by the searcher)
//! - `types`: comma-separated entity tags, defaults to all three
//! - `page`: floor-clamped to 1
//! - `limit`: clamped to `[1, 50]`
//! - `mode`: `smart` | `prefix` | `contains`, anything else falls back to `smart`
//!
//! Nothing here fails. Malformed input is absorbed by the defaults.
use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "productos")]
    Product,

    #[serde(rename = "emprendimientos")]
    Venture,

    #[serde(rename = "emprendedores")]
    Vendor,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [EntityType::Product, EntityType::Venture, EntityType::Vendor];

    pub fn tag(self) -> &'static str {
        match self {
            EntityType::Product => "productos",
            EntityType::Venture => "emprendimientos",
            EntityType::Vendor => "emprendedores",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|entity| entity.tag() == tag)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Smart,
    Prefix,
    Contains,
}

impl MatchMode {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match raw.trim().to_lowercase().as_str() {
            "prefix" => MatchMode::Prefix,
            "contains" => MatchMode::Contains,
            "smart" | "" => MatchMode::Smart,
            other => {
                tracing::debug!("Unrecognized search mode {other:?}, using smart");
                MatchMode::Smart
            }
        }
    }
}

/// Query string exactly as received. Every field stays a string so a bad
/// `page=abc` never turns into an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RawSearchParams {
    pub q: Option<String>,
    pub types: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub page: u32,
    pub limit: u32,
}

impl Window {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.clamp(1, u32::MAX as i64) as u32,
            limit: limit.clamp(1, MAX_LIMIT as i64) as u32,
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub entity_types: Vec<EntityType>,
    pub window: Window,
    pub mode: MatchMode,
}

impl SearchQuery {
    pub fn from_params(params: &RawSearchParams) -> Self {
        let term = params.q.as_deref().unwrap_or_default().trim().to_string();

        let page = parse_int(params.page.as_deref()).unwrap_or(DEFAULT_PAGE as i64);
        let limit = parse_int(params.limit.as_deref()).unwrap_or(DEFAULT_LIMIT as i64);

        Self {
            term,
            entity_types: parse_entity_types(params.types.as_deref()),
            window: Window::new(page, limit),
            mode: MatchMode::parse(params.mode.as_deref()),
        }
    }
}

pub fn parse_entity_types(raw: Option<&str>) -> Vec<EntityType> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return EntityType::ALL.to_vec(),
    };

    let mut entity_types = Vec::with_capacity(EntityType::ALL.len());
    for token in raw.split(',') {
        let token = token.trim().to_lowercase();
        if token.is_empty() {
            continue;
        }

        match EntityType::from_tag(&token) {
            Some(entity) if !entity_types.contains(&entity) => entity_types.push(entity),
            Some(_) => {}
            None => tracing::debug!("Ignoring unknown entity type {token:?}"),
        }
    }

    entity_types
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
}
