//! Pagination
//!
//! Page math over an already sorted/filtered list, and the view controls
//! (sort, search, page) a front end keeps between fetches.

use crate::domain::{SortDirection, SortField, ViewOptions};

pub const DEFAULT_PAGE_SIZE: usize = 15;

/// One page of a list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based, already clamped
    pub current_page: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// `ceil(count / page_size)`, never less than 1
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slice out `page` (1-based, clamped) of `items`
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let current_page = clamp_page(page, total_pages);

    let start = ((current_page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());

    Page {
        items: &items[start..end],
        current_page,
        total_pages,
    }
}

/// Sort/search/page settings held by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewControls {
    view: ViewOptions,
    current_page: usize,
    page_size: usize,
}

impl Default for ViewControls {
    fn default() -> Self {
        Self {
            view: ViewOptions::default(),
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewControls {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn view(&self) -> &ViewOptions {
        &self.view
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_sort_field(&mut self, field: SortField) {
        self.view.sort_field = field;
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.view.sort_direction = direction;
    }

    /// New search text; always goes back to page 1
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.query = query.into();
        self.current_page = 1;
    }

    /// Jump to a page, clamped to `[1, total_pages]`
    pub fn go_to(&mut self, page: usize, total_pages: usize) {
        self.current_page = clamp_page(page, total_pages);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.go_to(self.current_page + 1, total_pages);
    }

    pub fn previous_page(&mut self, total_pages: usize) {
        self.go_to(self.current_page.saturating_sub(1), total_pages);
    }

    /// Page of `items` for the current settings
    pub fn page<'a, T>(&self, items: &'a [T]) -> Page<'a, T> {
        paginate(items, self.page_size, self.current_page)
    }

    /// Parse a `page` parameter; anything invalid means page 1
    pub fn page_from_param(param: Option<&str>) -> usize {
        param
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }
}
