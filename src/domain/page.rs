//! Pagination types shared by all repository search operations

use serde::{Deserialize, Serialize};

/// A page request: 0-based page number and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pageable {
    pub page: usize,
    pub size: usize,
}

impl Pageable {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// First page with the given size
    pub fn first(size: usize) -> Self {
        Self::new(0, size)
    }

    /// The request for the page after this one
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            size: self.size,
        }
    }

    pub fn offset(&self) -> usize {
        self.page * self.size
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: Pageable, total_elements: usize) -> Self {
        Self {
            content,
            page: pageable.page,
            size: pageable.size,
            total_elements,
        }
    }

    /// Whether another page follows this one
    pub fn has_next(&self) -> bool {
        (self.page + 1) * self.size < self.total_elements
    }
}
