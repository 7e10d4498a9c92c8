//! Category chips and text search over grouped rows.

use serde::Serialize;

use super::{category_counts, LogEntry, LogGroup, StatusCategory};

/// A toggleable status filter with the number of raw entries it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryChip {
    pub category: StatusCategory,
    pub count: usize,
    pub active: bool,
}

/// The set of chips shown above a user's log rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryFilter {
    chips: Vec<CategoryChip>,
}

impl CategoryFilter {
    /// One active chip per category present in `logs`.
    pub fn for_logs(logs: &[LogEntry]) -> Self {
        let chips = category_counts(logs)
            .into_iter()
            .map(|(category, count)| CategoryChip {
                category,
                count,
                active: true,
            })
            .collect();
        Self { chips }
    }

    pub fn chips(&self) -> &[CategoryChip] {
        &self.chips
    }

    /// Flip a chip. Returns the new state, or `None` if no chip exists for it.
    pub fn toggle(&mut self, category: StatusCategory) -> Option<bool> {
        let chip = self.chips.iter_mut().find(|c| c.category == category)?;
        chip.active = !chip.active;
        Some(chip.active)
    }

    /// Categories without a chip have no rows, so they count as enabled.
    pub fn is_enabled(&self, category: StatusCategory) -> bool {
        self.chips
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.active)
            .unwrap_or(true)
    }

    pub fn any_disabled(&self) -> bool {
        self.chips.iter().any(|c| !c.active)
    }
}

/// Visible rows for a category filter and a free-text URL query.
#[derive(Debug, Clone, Copy)]
pub struct LogQuery<'a> {
    pub filter: &'a CategoryFilter,
    pub text: &'a str,
}

impl<'a> LogQuery<'a> {
    pub fn new(filter: &'a CategoryFilter, text: &'a str) -> Self {
        Self { filter, text }
    }

    pub fn matches(&self, group: &LogGroup) -> bool {
        self.filter.is_enabled(group.category()) && self.matches_text(group)
    }

    /// URL text match alone, ignoring the category chips.
    pub fn matches_text(&self, group: &LogGroup) -> bool {
        let needle = self.text.trim().to_lowercase();
        needle.is_empty() || group.url.to_lowercase().contains(&needle)
    }

    pub fn visible(&self, groups: Vec<LogGroup>) -> Vec<LogGroup> {
        groups.into_iter().filter(|g| self.matches(g)).collect()
    }

    /// Whether the user has narrowed the view at all.
    pub fn is_narrowed(&self) -> bool {
        !self.text.trim().is_empty() || self.filter.any_disabled()
    }
}
