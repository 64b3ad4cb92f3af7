use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

/// Hard ceiling on page size, shared by every listing endpoint.
pub const MAX_LIMIT: i64 = 100;
/// Default page size for post listings (feed, search, per-user).
pub const DEFAULT_POST_LIMIT: i64 = 10;
/// Default page size for the user discovery listing.
pub const DEFAULT_USER_LIMIT: i64 = 20;

/// PageQuery
///
/// The accepted pagination query parameters. Both are optional; out-of-range
/// values are clamped into the legal window rather than rejected, so a page
/// request never fails on its numbers alone.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, Default)]
pub struct PageQuery {
    /// 1-based page number. Values below 1 are treated as 1.
    pub page: Option<i64>,
    /// Page size, clamped to 1..=100. The default depends on the resource.
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Clamp the raw parameters into a concrete window. The offset is always
    /// `(page - 1) * limit`, so page 1 starts at the first row.
    pub fn resolve(self, default_limit: i64) -> ResolvedPage {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);
        ResolvedPage {
            page,
            limit,
            offset: (page - 1) * limit,
        }
    }
}

/// ResolvedPage
///
/// A sanitized pagination window, ready to be passed straight to the
/// repository as LIMIT/OFFSET.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPage {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

/// PageMeta
///
/// The pagination summary every listing response carries. Serialized in
/// camelCase: this block is wire contract, clients page on it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    /// Derive the summary from the resolved window and the filtered total.
    /// An empty result set has zero pages, so `has_next` is false even on
    /// page 1, and a request past the end reports `has_next = false` too.
    pub fn new(window: &ResolvedPage, total_count: i64) -> Self {
        let total_pages = (total_count + window.limit - 1) / window.limit;
        Self {
            current_page: window.page,
            total_pages,
            total_count,
            has_next: window.page < total_pages,
            has_previous: window.page > 1,
        }
    }
}
