use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub limit: u64,
    /// Total number of items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Resolve optional `page`/`limit` query values, rejecting out-of-range ones.
pub fn page_params(page: Option<u64>, limit: Option<u64>) -> Result<(u64, u64), AppError> {
    let page = page.unwrap_or(1);
    if page == 0 {
        return Err(AppError::Validation("page must be >= 1".into()));
    }
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    if page_offset(page, limit).is_none() {
        return Err(AppError::Validation("page is out of range".into()));
    }
    Ok((page, limit))
}

/// Row offset of a 1-based page, `None` if it does not fit a signed 64-bit OFFSET.
pub fn page_offset(page: u64, limit: u64) -> Option<u64> {
    page.checked_sub(1)?
        .checked_mul(limit)
        .filter(|offset| i64::try_from(*offset).is_ok())
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}
