use serde::{Deserialize, Serialize};

/// Page metadata returned next to every paginated listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Derive the metadata for `total` items cut into pages of `limit`.
    pub fn compute(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit as u64);
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: (page as u64) < total_pages,
            has_prev: page > 1,
        }
    }

    /// Offset of the first item of this page.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.limit as u64
    }

    /// 1-based position of the first item shown ("showing X-Y of Z").
    pub fn start_item(&self) -> u64 {
        self.offset() + 1
    }

    /// 1-based position of the last item shown.
    pub fn end_item(&self) -> u64 {
        (self.page as u64 * self.limit as u64).min(self.total)
    }
}

/// `{data, pagination}` envelope for list endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated { data: self.data.into_iter().map(f).collect(), pagination: self.pagination }
    }
}
