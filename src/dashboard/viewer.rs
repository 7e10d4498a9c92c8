//! Per-user activity dialog.

use crate::dialog::{Dialog, DialogEvent};
use crate::logs::{
    group_logs, CategoryChip, CategoryFilter, GroupPolicy, LogGroup, LogQuery, StatusCategory,
    UserSummary,
};

/// Rows and chips of the open viewer for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerRows {
    pub index: usize,
    pub username: String,
    pub query: String,
    pub chips: Vec<CategoryChip>,
    pub rows: Vec<LogGroup>,
    /// Every row the chips let through, flagged with whether the URL query
    /// also matches. Pages hide the unmatched ones and filter as the user types.
    pub listed: Vec<(LogGroup, bool)>,
    /// The user has any log rows at all, before filtering.
    pub has_logs: bool,
    pub narrowed: bool,
}

/// Dialog state plus the user it shows. Users are always passed in from
/// the page cache; the viewer only remembers an index into it.
#[derive(Debug, Clone, Default)]
pub struct LogViewer {
    dialog: Dialog,
    current_user_index: Option<usize>,
    query: String,
    filter: CategoryFilter,
    policy: GroupPolicy,
}

impl LogViewer {
    pub fn with_policy(policy: GroupPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.dialog.is_open()
    }

    pub fn current_user_index(&self) -> Option<usize> {
        self.current_user_index
    }

    /// Open the viewer on `users[index]` with a fresh query and chip set.
    /// Unknown indices leave the viewer untouched.
    pub fn open(&mut self, index: usize, users: &[UserSummary]) -> bool {
        let Some(user) = users.get(index) else {
            return false;
        };
        self.current_user_index = Some(index);
        self.query.clear();
        self.filter = CategoryFilter::for_logs(&user.logs);
        self.dialog.open();
        true
    }

    pub fn close(&mut self) {
        self.dialog.close();
    }

    pub fn handle(&mut self, event: DialogEvent) -> bool {
        self.dialog.handle(event)
    }

    pub fn set_query(&mut self, text: &str) {
        self.query = text.to_string();
    }

    pub fn toggle(&mut self, category: StatusCategory) -> Option<bool> {
        self.filter.toggle(category)
    }

    /// Regroup and filter the current user's logs from scratch. `None` when
    /// closed or when the index no longer points into `users`.
    pub fn rows(&self, users: &[UserSummary]) -> Option<ViewerRows> {
        if !self.is_open() {
            return None;
        }
        let index = self.current_user_index?;
        let user = users.get(index)?;

        let query = LogQuery::new(&self.filter, &self.query);
        let listed: Vec<(LogGroup, bool)> = group_logs(&user.logs, self.policy)
            .into_iter()
            .filter(|g| self.filter.is_enabled(g.category()))
            .map(|g| {
                let matched = query.matches_text(&g);
                (g, matched)
            })
            .collect();
        let rows = listed
            .iter()
            .filter(|(_, matched)| *matched)
            .map(|(g, _)| g.clone())
            .collect();

        Some(ViewerRows {
            index,
            username: user.username.clone(),
            query: self.query.clone(),
            chips: self.filter.chips().to_vec(),
            rows,
            listed,
            has_logs: !user.logs.is_empty(),
            narrowed: query.is_narrowed(),
        })
    }
}
