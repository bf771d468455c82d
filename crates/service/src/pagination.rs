//! Pagination utilities for service layer
//!
//! Turns raw `page`/`limit` query strings into a normalized `Pagination` and
//! slices in-memory result sets into a `Paginated` envelope.

use configs::PaginationConfig;
use models::{Paginated, PaginationMeta};

/// Defaults and bounds applied to incoming page requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagePolicy {
    pub default_limit: u32,
    /// `None` leaves `limit` unbounded.
    pub max_limit: Option<u32>,
}

impl Default for PagePolicy {
    fn default() -> Self { Self { default_limit: 20, max_limit: Some(1000) } }
}

impl From<&PaginationConfig> for PagePolicy {
    fn from(cfg: &PaginationConfig) -> Self {
        Self { default_limit: cfg.default_limit, max_limit: cfg.max_limit() }
    }
}

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub limit: u32,
}

impl Pagination {
    /// Parse raw query values. Absent, non-numeric, zero or negative values
    /// fall back to page 1 and the policy's default limit; `limit` is then
    /// clamped to the policy maximum.
    pub fn from_query(page: Option<&str>, limit: Option<&str>, policy: &PagePolicy) -> Self {
        let page = page
            .and_then(parse_leading_int)
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(1);
        let mut limit = limit
            .and_then(parse_leading_int)
            .filter(|l| *l >= 1)
            .map(|l| l.min(u32::MAX as i64) as u32)
            .unwrap_or(policy.default_limit.max(1));
        if let Some(max) = policy.max_limit {
            limit = limit.min(max.max(1));
        }
        Self { page, limit }
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1).saturating_mul(self.limit as usize)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, limit: 20 } }
}

/// Integer prefix of `raw`, the way a lenient form parser reads "12abc" as 12.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

/// Slice `items` (already filtered) down to the requested page.
pub fn paginate<T>(items: Vec<T>, req: Pagination) -> Paginated<T> {
    let total = items.len() as u64;
    let data: Vec<T> = items.into_iter().skip(req.offset()).take(req.limit as usize).collect();
    Paginated { data, pagination: PaginationMeta::compute(req.page, req.limit, total) }
}
