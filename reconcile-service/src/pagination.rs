//! Offset/limit pagination for `GET /payments/`.
//!
//! Clamps rather than rejects out-of-range query parameters: a negative
//! or absurdly large `limit` is clamped to `[1, MAX_LIMIT]`, a negative
//! `offset` is clamped to zero. This mirrors the resolved behavior for
//! out-of-range pagination inputs — a malformed offset/limit should not
//! fail the request, just return a sane page.

use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PageParams {
    /// Clamps raw query values into a usable `(offset, limit)` pair.
    pub fn clamp(self) -> (usize, usize) {
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let limit = self
            .limit
            .unwrap_or(DEFAULT_LIMIT as i64)
            .clamp(1, MAX_LIMIT as i64) as usize;
        (offset, limit)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Slices `items` to the requested page, reporting the pre-slice total.
pub fn paginate<T: Clone>(items: &[T], params: PageParams) -> Page<T> {
    let (offset, limit) = params.clamp();
    let total = items.len();
    let page = items
        .iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect::<Vec<_>>();
    Page {
        items: page,
        total,
        offset,
        limit,
    }
}
