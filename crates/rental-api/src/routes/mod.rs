//! # API Route Modules
//!
//! - `loans` — inquiry, listing, lookup, status transitions, and
//!   capability queries.
//! - `protocols` — pickup and return protocols attached to a loan.

pub mod loans;
pub mod protocols;

use serde::Deserialize;

/// Pagination parameters for list endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct PaginationParams {
    /// Maximum number of items to return (default: 100, max: 1000).
    pub limit: Option<usize>,
    /// Number of items to skip (default: 0).
    pub offset: Option<usize>,
}

impl PaginationParams {
    const DEFAULT_LIMIT: usize = 100;
    const MAX_LIMIT: usize = 1000;

    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Slice `items` to the requested page.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.effective_offset())
            .take(self.effective_limit())
            .collect()
    }
}
