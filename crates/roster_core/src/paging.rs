//! Page requests, sort specifications and page results.
//!
//! # Responsibility
//! - Describe a bounded, ordered slice of a query result (`PageRequest`).
//! - Carry the slice together with total-count metadata (`Page`).
//!
//! # Invariants
//! - Page index is zero-based; page size is always in `1..=MAX_PAGE_SIZE`.
//! - Sorting is applied before slicing, and an identity tie-breaker is always
//!   appended so page boundaries are deterministic.
//! - `total_elements` describes the filtered result, never just the page.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Largest accepted page size; larger requests are clamped.
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PagingError {
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// A sortable property that maps onto a qualified SQL column.
pub trait SortField: Copy + Eq + Debug {
    /// Qualified column expression used in `ORDER BY`.
    fn column(self) -> &'static str;
    /// The identity field, used as the final tie-breaker.
    fn identity() -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order<F> {
    pub field: F,
    pub direction: Direction,
}

impl<F: SortField> Order<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

/// Ordered list of sort keys; earlier keys take precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort<F> {
    orders: Vec<Order<F>>,
}

impl<F: SortField> Sort<F> {
    pub fn unsorted() -> Self {
        Self { orders: Vec::new() }
    }

    pub fn by(direction: Direction, field: F) -> Self {
        Self {
            orders: vec![Order { field, direction }],
        }
    }

    /// Appends a lower-precedence key.
    pub fn and(mut self, order: Order<F>) -> Self {
        self.orders.push(order);
        self
    }

    pub fn orders(&self) -> &[Order<F>] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Renders ` ORDER BY ...`, always ending with the identity column unless
    /// it is already one of the keys.
    pub(crate) fn to_order_by_sql(&self) -> String {
        let identity = F::identity();
        let mut terms: Vec<String> = self
            .orders
            .iter()
            .map(|order| format!("{} {}", order.field.column(), order.direction.as_sql()))
            .collect();
        if !self.orders.iter().any(|order| order.field == identity) {
            terms.push(format!("{} ASC", identity.column()));
        }
        format!(" ORDER BY {}", terms.join(", "))
    }
}

impl<F: SortField> Default for Sort<F> {
    fn default() -> Self {
        Self::unsorted()
    }
}

/// Zero-based page index, page size and sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<F> {
    page: u32,
    size: u32,
    sort: Sort<F>,
}

impl<F: SortField> PageRequest<F> {
    /// Builds a request. `size` above [`MAX_PAGE_SIZE`] is clamped.
    ///
    /// # Errors
    /// - `PagingError::ZeroPageSize` when `size == 0`.
    pub fn of(page: u32, size: u32, sort: Sort<F>) -> Result<Self, PagingError> {
        if size == 0 {
            return Err(PagingError::ZeroPageSize);
        }
        Ok(Self {
            page,
            size: size.min(MAX_PAGE_SIZE),
            sort,
        })
    }

    pub fn unsorted(page: u32, size: u32) -> Result<Self, PagingError> {
        Self::of(page, size, Sort::unsorted())
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &Sort<F> {
        &self.sort
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    pub fn previous_or_first(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    pub fn first(&self) -> Self {
        Self {
            page: 0,
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

/// One slice of a result set plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, number: u32, size: u32, total_elements: u64) -> Self {
        Self {
            content,
            number,
            size,
            total_elements,
        }
    }

    pub fn empty<F: SortField>(request: &PageRequest<F>) -> Self {
        Self::new(Vec::new(), request.page(), request.size(), 0)
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Zero-based index of this page.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Requested page size.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 1;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Converts the content, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

/// Derives the total element count, running `count` only when the page
/// content alone cannot determine it.
///
/// - First page, not full: the content is the whole result.
/// - Later page, non-empty and not full: this is the last page.
pub(crate) fn resolve_total<E>(
    offset: u64,
    size: u32,
    content_len: usize,
    count: impl FnOnce() -> Result<u64, E>,
) -> Result<u64, E> {
    let len = content_len as u64;
    let size = u64::from(size);
    if offset == 0 {
        if len < size {
            return Ok(len);
        }
    } else if len != 0 && len < size {
        return Ok(offset + len);
    }
    count()
}
