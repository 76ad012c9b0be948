// ── View models ──
//
// Presentation state for list screens: search, kind filter and paging
// over a store snapshot. Renderers (the CLI) only format what these
// produce.

mod filter;
mod paginate;

use std::sync::Arc;

pub use filter::{KindFilter, ListFilter, Listable};
pub use paginate::{DEFAULT_PAGE_SIZE, PagePolicy, Paginator};

/// Shown when the trigger list loads but is empty.
pub const EMPTY_TRIGGERS_MESSAGE: &str =
    "No triggers found. Create your first trigger to get started.";

/// Shown when the trigger list fails to load.
pub const TRIGGERS_ERROR_MESSAGE: &str = "Error loading triggers. Please try again later.";

/// Shown while a list has no data yet.
pub const LOADING_MESSAGE: &str = "Loading...";

/// One rendered page of a filtered list.
#[derive(Debug, Clone)]
pub struct ListPage<T> {
    pub items: Vec<Arc<T>>,
    /// 1-based page actually shown.
    pub page: usize,
    pub page_count: usize,
    /// Items matching the filter across all pages.
    pub total_matches: usize,
}

impl<T> ListPage<T> {
    /// A pager is only worth drawing with more than one page.
    pub fn shows_pager(&self) -> bool {
        self.page_count > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Filter + page state for one list screen.
///
/// Changing the search text or the kind filter jumps back to page 1.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    filter: ListFilter,
    page: usize,
    paginator: Paginator,
    policy: PagePolicy,
}

impl ListView {
    pub fn new(paginator: Paginator, policy: PagePolicy) -> Self {
        Self {
            filter: ListFilter::default(),
            page: 1,
            paginator,
            policy,
        }
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search != self.filter.search {
            self.filter.search = search;
            self.page = 1;
        }
    }

    pub fn set_kind(&mut self, kind: KindFilter) {
        if kind != self.filter.kind {
            self.filter.kind = kind;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Filter `items`, then cut out the current page.
    pub fn render<T: Listable>(&self, items: &[Arc<T>]) -> ListPage<T> {
        let matches = self.filter.apply(items);
        let page = self.paginator.resolve(self.page(), matches.len(), self.policy);
        ListPage {
            items: self.paginator.slice(&matches, page).to_vec(),
            page,
            page_count: self.paginator.page_count(matches.len()),
            total_matches: matches.len(),
        }
    }
}
