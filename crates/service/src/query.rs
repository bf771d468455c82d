//! List query parameters and the in-memory filters they translate into.

use models::document::is_truthy;
use models::Document;
use serde::Deserialize;

/// Predicate applied to every scanned document.
pub trait RecordFilter: Send + Sync {
    fn matches(&self, doc: &Document) -> bool;
}

/// Accepts everything.
pub struct NoFilter;

impl RecordFilter for NoFilter {
    fn matches(&self, _doc: &Document) -> bool { true }
}

/// Raw `GET /services` query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServiceListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub categoria: Option<String>,
    pub segmento: Option<String>,
}

/// Raw `GET /prices` query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PriceListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub env: Option<String>,
}

/// Services: `search` over id/tipo/servico, exact `categoria` and `segmento`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceFilter {
    search: Option<String>,
    pub categoria: Option<String>,
    pub segmento: Option<String>,
}

impl ServiceFilter {
    pub const SEARCH_FIELDS: [&'static str; 3] = ["id", "tipo", "servico"];

    pub fn new(search: Option<&str>, categoria: Option<&str>, segmento: Option<&str>) -> Self {
        Self {
            search: non_empty(search).map(str::to_lowercase),
            categoria: non_empty(categoria).map(str::to_string),
            segmento: non_empty(segmento).map(str::to_string),
        }
    }

    pub fn from_query(q: &ServiceListQuery) -> Self {
        Self::new(q.search.as_deref(), q.categoria.as_deref(), q.segmento.as_deref())
    }
}

impl RecordFilter for ServiceFilter {
    fn matches(&self, doc: &Document) -> bool {
        if let Some(needle) = &self.search {
            if !contains_ci(doc, &Self::SEARCH_FIELDS, needle) {
                return false;
            }
        }
        if let Some(cat) = &self.categoria {
            if doc.str_field("categoria") != Some(cat.as_str()) {
                return false;
            }
        }
        if let Some(seg) = &self.segmento {
            if doc.str_field("segmento") != Some(seg.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Prices: `search` over id/code, `env` keeps documents priced in that tier.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PriceFilter {
    search: Option<String>,
    pub env: Option<String>,
}

impl PriceFilter {
    pub const SEARCH_FIELDS: [&'static str; 2] = ["id", "code"];

    pub fn new(search: Option<&str>, env: Option<&str>) -> Self {
        Self {
            search: non_empty(search).map(str::to_lowercase),
            env: non_empty(env).map(str::to_string),
        }
    }

    pub fn from_query(q: &PriceListQuery) -> Self {
        Self::new(q.search.as_deref(), q.env.as_deref())
    }
}

impl RecordFilter for PriceFilter {
    fn matches(&self, doc: &Document) -> bool {
        if let Some(needle) = &self.search {
            if !contains_ci(doc, &Self::SEARCH_FIELDS, needle) {
                return false;
            }
        }
        if let Some(env) = &self.env {
            let priced = doc
                .get("prices")
                .and_then(|p| p.get(env.as_str()))
                .map(is_truthy)
                .unwrap_or(false);
            if !priced {
                return false;
            }
        }
        true
    }
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.is_empty())
}

/// Case-insensitive substring match over string fields; missing or
/// non-string fields never match. `needle` must already be lowercase.
fn contains_ci(doc: &Document, fields: &[&str], needle: &str) -> bool {
    fields
        .iter()
        .filter_map(|f| doc.str_field(f))
        .any(|value| value.to_lowercase().contains(needle))
}
