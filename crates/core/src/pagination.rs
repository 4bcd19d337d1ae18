//! Feed pagination.
//!
//! A feed is cut into fixed-size pages numbered from 1. Page numbers come
//! straight from the query string, so parsing never fails: anything that
//! is not a positive integer means the first page. Asking for a page past
//! the end yields an empty page that still reports the total count.

use serde::Serialize;

/// A requested page number, always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageNumber(u64);

impl PageNumber {
    /// The first page.
    pub const FIRST: Self = Self(1);

    /// Create a page number, mapping 0 to the first page.
    #[must_use]
    pub const fn new(number: u64) -> Self {
        if number == 0 { Self::FIRST } else { Self(number) }
    }

    /// Parse the `page` query parameter.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse::<u64>().ok())
            .map_or(Self::FIRST, Self::new)
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Where a requested page falls within a sequence of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    number: u64,
    page_size: u64,
    count: u64,
}

impl PageWindow {
    /// Locate `number` in a sequence of `count` items.
    #[must_use]
    pub fn new(number: PageNumber, page_size: u64, count: u64) -> Self {
        Self {
            number: number.get(),
            page_size: page_size.max(1),
            count,
        }
    }

    /// Zero-based page index.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.number - 1
    }

    /// Offset of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.index().saturating_mul(self.page_size)
    }

    /// Number of pages; an empty sequence still has one (empty) page.
    #[must_use]
    pub const fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.page_size)
        }
    }

    /// Whether the requested page lies beyond the last one.
    #[must_use]
    pub const fn is_past_end(&self) -> bool {
        self.number > self.num_pages()
    }

    /// Wrap the items fetched for this window.
    #[must_use]
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            page_size: self.page_size,
            num_pages: self.num_pages(),
            count: self.count,
            has_next: self.number < self.num_pages(),
            has_previous: self.number > 1,
        }
    }
}

/// One page of a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in feed order.
    pub items: Vec<T>,
    /// 1-based page number.
    pub number: u64,
    /// Maximum number of items per page.
    pub page_size: u64,
    /// Total number of pages.
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub count: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Slice an in-memory sequence.
    #[must_use]
    pub fn from_slice(all: &[T], number: PageNumber, page_size: u64) -> Self
    where
        T: Clone,
    {
        let window = PageWindow::new(number, page_size, all.len() as u64);
        let items = all
            .iter()
            .skip(usize::try_from(window.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(window.page_size).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        window.into_page(items)
    }

    /// Transform every item, keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            page_size: self.page_size,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}
