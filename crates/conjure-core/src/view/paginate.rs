// ── Pagination ──

/// Effects list page size.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// What to do with a requested page outside `1..=page_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PagePolicy {
    /// Pull the page back into range.
    #[default]
    Clamp,
    /// Slice exactly as asked; an out-of-range page is simply empty.
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

impl Paginator {
    /// A zero page size is treated as 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(len / page_size)`; zero for an empty list.
    pub fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// The page actually shown for `requested` (1-based) under `policy`.
    pub fn resolve(&self, requested: usize, len: usize, policy: PagePolicy) -> usize {
        match policy {
            PagePolicy::Clamp => requested.clamp(1, self.page_count(len).max(1)),
            PagePolicy::Literal => requested.max(1),
        }
    }

    /// Items on 1-based `page`: `[(page - 1) * size, page * size)`,
    /// truncated to the slice.
    pub fn slice<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        let start = page.saturating_sub(1).saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size).min(items.len());
        items.get(start..end).unwrap_or(&[])
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        let p = Paginator::default();
        assert_eq!(p.page_count(0), 0);
        assert_eq!(p.page_count(12), 1);
        assert_eq!(p.page_count(13), 2);
        assert_eq!(p.page_count(25), 3);
    }

    #[test]
    fn slices_follow_page_boundaries() {
        let items: Vec<u32> = (1..=25).collect();
        let p = Paginator::default();
        assert_eq!(p.slice(&items, 1), &items[..12]);
        assert_eq!(p.slice(&items, 3), &[25]);
        assert!(p.slice(&items, 4).is_empty());
    }

    #[test]
    fn clamp_pulls_out_of_range_pages_back() {
        let p = Paginator::new(10);
        assert_eq!(p.resolve(9, 25, PagePolicy::Clamp), 3);
        assert_eq!(p.resolve(0, 25, PagePolicy::Clamp), 1);
        assert_eq!(p.resolve(4, 0, PagePolicy::Clamp), 1);
    }

    #[test]
    fn literal_keeps_out_of_range_pages() {
        let p = Paginator::new(10);
        assert_eq!(p.resolve(9, 25, PagePolicy::Literal), 9);
        assert!(p.slice(&[1, 2, 3], 9).is_empty());
    }
}
