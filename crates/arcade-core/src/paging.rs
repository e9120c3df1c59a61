//! Page windows and navigation indicators.
//!
//! Pages carry no continuation token. The caller supplies a page number and
//! derives the neighbouring page numbers from how many rows came back.

use serde::Serialize;

/// Rows per catalog and library page.
pub const CATALOG_PAGE_SIZE: u32 = 10;

/// Rows per admin roster page.
pub const ADMIN_PAGE_SIZE: u32 = 10;

/// A `LIMIT`/`OFFSET` window over an ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Zero-based page number.
    pub page: u32,
    /// Rows per page.
    pub size: u32,
}

impl PageWindow {
    /// A window of `size` rows at `page`.
    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// A catalog-sized window at `page`.
    #[must_use]
    pub const fn catalog(page: u32) -> Self {
        Self::new(page, CATALOG_PAGE_SIZE)
    }

    /// Row limit.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.size)
    }

    /// Rows to skip: `page * size`.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// Navigation for a page that returned `returned` rows.
    #[must_use]
    pub fn nav(self, returned: usize) -> PageNav {
        PageNav::after(self, returned)
    }
}

/// Previous/next page indicators for one served page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageNav {
    /// The page that was served.
    pub page: u32,
    /// The previous page, floored at 0.
    pub prev_page: u32,
    /// The next page, or `page` itself when the served page was short.
    pub next_page: u32,
}

impl PageNav {
    /// Compute indicators for `window` after it returned `returned` rows.
    ///
    /// A full page is taken as a hint that more rows exist; a short page
    /// offers no further pages.
    #[must_use]
    pub fn after(window: PageWindow, returned: usize) -> Self {
        let full = u32::try_from(returned).is_ok_and(|n| n >= window.size) && window.size > 0;
        Self {
            page: window.page,
            prev_page: window.page.saturating_sub(1),
            next_page: if full {
                window.page.saturating_add(1)
            } else {
                window.page
            },
        }
    }
}
