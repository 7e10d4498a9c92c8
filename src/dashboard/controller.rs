//! Server-paginated user list for one reporting date.
//!
//! A fetch is split in two so that no lock is held while the backend call
//! is in flight: [`DashboardController::begin_fetch`] hands out a ticket and
//! [`DashboardController::complete_fetch`] applies the response only if that
//! ticket is still the latest one issued.

use chrono::NaiveDate;
use tracing::{debug, error};

use super::pagination::{clamp_page, Pagination};
use crate::backend::BackendError;
use crate::logs::{LogsPage, UserSummary};

/// Message shown in place of the cards when a fetch fails.
pub const LOAD_ERROR_MESSAGE: &str = "Error loading the data";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// An issued fetch. Only the most recent ticket may update the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: u64,
    pub date: NaiveDate,
    pub page: u32,
}

/// Pager actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    First,
    Prev,
    Next,
    Last,
    Number(i64),
}

impl PageNav {
    /// Parse `first`, `prev`, `next`, `last` or a page number.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "first" => Some(PageNav::First),
            "prev" => Some(PageNav::Prev),
            "next" => Some(PageNav::Next),
            "last" => Some(PageNav::Last),
            other => other.parse().ok().map(PageNav::Number),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardController {
    selected_date: Option<NaiveDate>,
    current_page: u32,
    total_pages: u32,
    total_users: u64,
    users: Vec<UserSummary>,
    search: String,
    state: LoadState,
    latest_token: u64,
}

impl Default for DashboardController {
    fn default() -> Self {
        Self {
            selected_date: None,
            current_page: 1,
            total_pages: 1,
            total_users: 0,
            users: Vec::new(),
            search: String::new(),
            state: LoadState::Idle,
            latest_token: 0,
        }
    }
}

impl DashboardController {
    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_users(&self) -> u64 {
        self.total_users
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Users of the last applied page.
    pub fn users(&self) -> &[UserSummary] {
        &self.users
    }

    pub fn user(&self, index: usize) -> Option<&UserSummary> {
        self.users.get(index)
    }

    /// Start loading `page` of `date`.
    ///
    /// A new date always starts at page 1. Otherwise the page is clamped to
    /// the page count known from the last response.
    pub fn begin_fetch(&mut self, date: NaiveDate, page: i64) -> FetchTicket {
        let page = if self.selected_date == Some(date) {
            clamp_page(page, self.total_pages)
        } else {
            1
        };

        self.latest_token += 1;
        self.selected_date = Some(date);
        self.state = LoadState::Loading;

        debug!("Fetch #{} issued for {} page {}", self.latest_token, date, page);
        FetchTicket {
            token: self.latest_token,
            date,
            page,
        }
    }

    /// Issue a fetch for a pager action. `None` until a date is selected.
    pub fn goto(&mut self, nav: PageNav) -> Option<FetchTicket> {
        let date = self.selected_date?;
        let current = i64::from(self.current_page);
        let target = match nav {
            PageNav::First => 1,
            PageNav::Prev => current - 1,
            PageNav::Next => current + 1,
            PageNav::Last => i64::from(self.total_pages),
            PageNav::Number(n) => n,
        };
        Some(self.begin_fetch(date, target))
    }

    /// Apply a finished fetch. Returns false when a newer fetch has been
    /// issued since, in which case the result is dropped.
    pub fn complete_fetch(&mut self, token: u64, result: Result<LogsPage, BackendError>) -> bool {
        if token != self.latest_token {
            debug!(
                "Dropping stale fetch #{} (latest is #{})",
                token, self.latest_token
            );
            return false;
        }

        match result {
            Ok(page) => {
                self.total_pages = page.total_pages.max(1);
                self.current_page = clamp_page(i64::from(page.page), self.total_pages);
                self.total_users = page.total;
                self.users = page.users;
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                error!("Failed to load users: {}", e);
                self.users.clear();
                self.total_users = 0;
                self.state = LoadState::Failed(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
    }

    /// Cards on the current page whose username contains the search text,
    /// paired with their index into the page.
    pub fn visible_cards(&self) -> Vec<(usize, &UserSummary)> {
        let needle = self.search.trim().to_lowercase();
        self.users
            .iter()
            .enumerate()
            .filter(|(_, u)| needle.is_empty() || u.username.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.current_page, self.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{entry, user};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn page(page: u32, total_pages: u32, names: &[&str]) -> LogsPage {
        LogsPage {
            users: names
                .iter()
                .map(|n| user(n, vec![entry("example.com", 200, 1)]))
                .collect(),
            total: 40,
            total_pages,
            page,
        }
    }

    #[test]
    fn test_fetch_applies_page() {
        let mut dashboard = DashboardController::default();
        let ticket = dashboard.begin_fetch(date("2024-05-01"), 1);
        assert_eq!(ticket.page, 1);
        assert_eq!(dashboard.state(), &LoadState::Loading);

        assert!(dashboard.complete_fetch(ticket.token, Ok(page(1, 4, &["alice", "bob"]))));
        assert_eq!(dashboard.state(), &LoadState::Loaded);
        assert_eq!(dashboard.total_pages(), 4);
        assert_eq!(dashboard.total_users(), 40);
        assert_eq!(dashboard.user(1).map(|u| u.username.as_str()), Some("bob"));
        assert!(dashboard.user(2).is_none());
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let mut dashboard = DashboardController::default();
        let first = dashboard.begin_fetch(date("2024-05-01"), 1);
        let second = dashboard.begin_fetch(date("2024-05-02"), 1);

        assert!(dashboard.complete_fetch(second.token, Ok(page(1, 1, &["carol"]))));
        assert!(!dashboard.complete_fetch(first.token, Ok(page(1, 1, &["alice"]))));

        assert_eq!(dashboard.users()[0].username, "carol");
        assert_eq!(dashboard.selected_date(), Some(date("2024-05-02")));
    }

    #[test]
    fn test_pages_are_clamped() {
        let mut dashboard = DashboardController::default();
        let d = date("2024-05-01");
        let t = dashboard.begin_fetch(d, 1);
        dashboard.complete_fetch(t.token, Ok(page(1, 3, &["alice"])));

        assert_eq!(dashboard.begin_fetch(d, 0).page, 1);
        assert_eq!(dashboard.begin_fetch(d, 99).page, 3);
        assert_eq!(dashboard.goto(PageNav::Prev).map(|t| t.page), Some(1));
        assert_eq!(dashboard.goto(PageNav::Last).map(|t| t.page), Some(3));
    }

    #[test]
    fn test_new_date_starts_at_first_page() {
        let mut dashboard = DashboardController::default();
        let t = dashboard.begin_fetch(date("2024-05-01"), 1);
        dashboard.complete_fetch(t.token, Ok(page(1, 3, &["alice"])));

        assert_eq!(dashboard.begin_fetch(date("2024-05-02"), 3).page, 1);
    }

    #[test]
    fn test_goto_needs_a_date() {
        let mut dashboard = DashboardController::default();
        assert!(dashboard.goto(PageNav::Next).is_none());
    }

    #[test]
    fn test_failure_clears_cards() {
        let mut dashboard = DashboardController::default();
        let t = dashboard.begin_fetch(date("2024-05-01"), 1);
        dashboard.complete_fetch(t.token, Ok(page(1, 1, &["alice"])));

        let t = dashboard.goto(PageNav::Number(1)).unwrap();
        dashboard.complete_fetch(t.token, Err(BackendError::Status(500)));
        assert!(dashboard.users().is_empty());
        assert_eq!(
            dashboard.state(),
            &LoadState::Failed(LOAD_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_search_is_page_local() {
        let mut dashboard = DashboardController::default();
        let t = dashboard.begin_fetch(date("2024-05-01"), 1);
        dashboard.complete_fetch(t.token, Ok(page(1, 2, &["Alice", "bob", "alicia"])));

        dashboard.set_search("  ALI ");
        let visible: Vec<_> = dashboard.visible_cards().iter().map(|(i, _)| *i).collect();
        assert_eq!(visible, vec![0, 2]);

        dashboard.set_search("");
        assert_eq!(dashboard.visible_cards().len(), 3);
    }

    #[test]
    fn test_page_nav_parse() {
        assert_eq!(PageNav::parse("next"), Some(PageNav::Next));
        assert_eq!(PageNav::parse("7"), Some(PageNav::Number(7)));
        assert_eq!(PageNav::parse("-1"), Some(PageNav::Number(-1)));
        assert_eq!(PageNav::parse("later"), None);
    }
}
