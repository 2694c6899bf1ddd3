use std::ops::Range;

/// Default number of cards added per page.
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Slices the filtered article view into fixed-size pages and tracks how far
/// the user has read.
///
/// The cursor is the number of filtered articles currently rendered; it is
/// reset whenever the filter changes and never exceeds the filtered length.
#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    cursor: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            cursor: 0,
        }
    }

    /// Reset to the first page of a view with `len` items and return its
    /// range. The cursor becomes the returned length.
    pub fn first_page(&mut self, len: usize) -> Range<usize> {
        self.cursor = self.page_size.min(len);
        0..self.cursor
    }

    /// Advance by one page and return its range, or `None` when the view is
    /// exhausted (the cursor is then left unchanged).
    ///
    /// The final page may be shorter than the page size; the cursor advances
    /// by the returned length.
    pub fn next_page(&mut self, len: usize) -> Option<Range<usize>> {
        let start = self.cursor.min(len);
        let end = (start + self.page_size).min(len);
        if start >= end {
            return None;
        }
        self.cursor = end;
        Some(start..end)
    }

    /// How many filtered articles are currently rendered.
    pub fn rendered(&self) -> usize {
        self.cursor
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Whether the load-more control should be visible for a view with `len`
    /// items.
    pub fn more_available(&self, len: usize) -> bool {
        self.cursor < len
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
