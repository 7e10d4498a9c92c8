//! Pager bar derived from the current page and page count.

use serde::Serialize;

/// Most page numbers shown at once.
pub const PAGE_WINDOW: i64 = 5;

/// Clamp a requested page into `[1, total_pages]`.
pub fn clamp_page(page: i64, total_pages: u32) -> u32 {
    let total = i64::from(total_pages.max(1));
    page.clamp(1, total) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageButton {
    pub number: u32,
    pub current: bool,
}

/// Button states of the pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub total_pages: u32,
    pub first_enabled: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub last_enabled: bool,
    pub pages: Vec<PageButton>,
}

impl Pagination {
    pub fn new(current: u32, total_pages: u32) -> Self {
        let total = i64::from(total_pages.max(1));
        let p = i64::from(clamp_page(i64::from(current), total_pages));

        let mut start = (p - 2).max(1);
        let mut end = (p + 2).min(total);
        if p <= 3 {
            end = PAGE_WINDOW.min(total);
        }
        if p > total - 2 {
            start = (total - (PAGE_WINDOW - 1)).max(1);
        }

        let pages = (start..=end)
            .map(|n| PageButton {
                number: n as u32,
                current: n == p,
            })
            .collect();

        Self {
            current: p as u32,
            total_pages: total as u32,
            first_enabled: p > 1,
            prev_enabled: p > 1,
            next_enabled: p < total,
            last_enabled: p < total,
            pages,
        }
    }

    pub fn numbers(&self) -> Vec<u32> {
        self.pages.iter().map(|b| b.number).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 10), 1);
        assert_eq!(clamp_page(-3, 10), 1);
        assert_eq!(clamp_page(11, 10), 10);
        assert_eq!(clamp_page(4, 0), 1);
    }

    #[test]
    fn test_window_near_start() {
        let p = Pagination::new(1, 10);
        assert_eq!(p.numbers(), vec![1, 2, 3, 4, 5]);
        assert!(!p.first_enabled);
        assert!(!p.prev_enabled);
        assert!(p.next_enabled);
        assert!(p.pages[0].current);
    }

    #[test]
    fn test_window_in_middle() {
        let p = Pagination::new(6, 10);
        assert_eq!(p.numbers(), vec![4, 5, 6, 7, 8]);
        assert!(p.first_enabled && p.last_enabled);
    }

    #[test]
    fn test_window_near_end() {
        let p = Pagination::new(10, 10);
        assert_eq!(p.numbers(), vec![6, 7, 8, 9, 10]);
        assert!(!p.next_enabled);
        assert!(!p.last_enabled);

        assert_eq!(Pagination::new(9, 10).numbers(), vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_few_pages() {
        assert_eq!(Pagination::new(2, 3).numbers(), vec![1, 2, 3]);
        let single = Pagination::new(1, 1);
        assert_eq!(single.numbers(), vec![1]);
        assert!(!single.prev_enabled && !single.next_enabled);
    }

    #[test]
    fn test_window_is_bounded_and_contains_current() {
        for total in 1..=12u32 {
            for current in 1..=total {
                let p = Pagination::new(current, total);
                let numbers = p.numbers();
                assert!(numbers.len() <= 5);
                assert!(numbers.contains(&current));
                assert!(numbers.iter().all(|n| (1..=total).contains(n)));
                assert_eq!(p.prev_enabled, current > 1);
                assert_eq!(p.next_enabled, current < total);
            }
        }
    }
}
