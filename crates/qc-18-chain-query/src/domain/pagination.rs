//! Page boundary computation for list results.

use thiserror::Error;

/// Bounds of one page within a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBounds {
    pub start: usize,
    pub end: usize,
    /// Empty when this is the last page
    pub next_page_token: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("could not convert page token {0:?}")]
    BadToken(String),

    #[error("page start {start} >= list {total}")]
    OutOfRange { start: usize, total: usize },
}

/// Compute `[start, end)` for the page named by `page_token`.
///
/// An empty token means the first page. The token of the last page's
/// successor is empty. Asking for a page that starts at or past
/// `total_size` is an error, not an empty page.
pub fn start_and_end_page(
    page_token: &str,
    page_size: usize,
    total_size: usize,
) -> Result<PageBounds, PaginationError> {
    let token: usize = if page_token.is_empty() {
        0
    } else {
        page_token
            .parse()
            .map_err(|_| PaginationError::BadToken(page_token.to_string()))?
    };

    let start = token
        .checked_mul(page_size)
        .ok_or_else(|| PaginationError::BadToken(page_token.to_string()))?;
    if start >= total_size {
        return Err(PaginationError::OutOfRange {
            start,
            total: total_size,
        });
    }

    let end = start.saturating_add(page_size);
    if end >= total_size {
        return Ok(PageBounds {
            start,
            end: total_size,
            next_page_token: String::new(),
        });
    }

    Ok(PageBounds {
        start,
        end,
        next_page_token: (token + 1).to_string(),
    })
}
