//! Pagination of execution history.

use serde::Serialize;

use crate::model::JobExecution;

/// A normalised page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    size: usize,
}

impl PageRequest {
    pub const DEFAULT_SIZE: usize = 20;
    pub const MAX_SIZE: usize = 100;

    /// Build a request from untrusted input.
    ///
    /// Negative pages become 0, non-positive sizes become the default and
    /// oversized requests are capped.
    pub fn new(page: i64, size: i64) -> Self {
        let page = usize::try_from(page).unwrap_or(0);
        let size = match usize::try_from(size) {
            Ok(0) | Err(_) => Self::DEFAULT_SIZE,
            Ok(size) => size.min(Self::MAX_SIZE),
        };
        Self { page, size }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub page_size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl Pagination {
    pub fn new(request: PageRequest, total_elements: u64) -> Self {
        let size = request.size() as u64;
        let total_pages = total_elements.div_ceil(size);
        Self {
            current_page: request.page(),
            page_size: request.size(),
            total_elements,
            total_pages,
            first: request.page() == 0,
            last: request.page() as u64 + 1 >= total_pages,
        }
    }
}

/// One page of executions.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPage {
    pub executions: Vec<JobExecution>,
    pub pagination: Pagination,
}

impl ExecutionPage {
    /// Cut a page out of an already ordered history.
    pub fn slice(ordered: Vec<JobExecution>, request: PageRequest) -> Self {
        let total = ordered.len() as u64;
        let executions = ordered
            .into_iter()
            .skip(request.offset())
            .take(request.size())
            .collect();

        Self {
            executions,
            pagination: Pagination::new(request, total),
        }
    }
}
