//! Page templates and the view models they render.

use askama::Template;
use std::collections::HashSet;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::acl::{acl_type_groups, AclForm, AclMode, AclOption, AclRule, AclTypeInfo};
use crate::dashboard::{DashboardController, LoadState, Pagination, ViewerRows};
use crate::format::{format_bytes, tailwind_color, truncate, INACTIVE_CHIP_COLOR};
use crate::logs::{CategoryChip, LogGroup};
use crate::theme::{DocumentTheme, ToggleControl};
use crate::toast::{Toast, ToastOptions};

/// Longest URL shown on a log row before it is cut.
const ROW_URL_CHARS: usize = 55;

/// Wrapper struct for templates to implement IntoResponse.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!("Failed to render template: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template: {}", err),
                )
                    .into_response()
            }
        }
    }
}

/// Parts of the layout shared by every page.
pub struct Chrome {
    pub title: String,
    pub html_class: &'static str,
    pub data_theme: &'static str,
    pub toggle: ToggleControl,
    pub return_to: &'static str,
    pub toast_options_json: String,
    pub toasts: Vec<Toast>,
    pub report_date_invalid: bool,
    pub report_date_message: String,
}

impl Chrome {
    pub fn new(title: &str, return_to: &'static str, theme: DocumentTheme, toggle: ToggleControl) -> Self {
        Self {
            title: title.to_string(),
            html_class: theme.html_class(),
            data_theme: theme.data_theme(),
            toggle,
            return_to,
            toast_options_json: ToastOptions::default().to_json(),
            toasts: Vec::new(),
            report_date_invalid: false,
            report_date_message: String::new(),
        }
    }
}

pub struct UserCardView {
    pub index: usize,
    pub username: String,
    /// Lowercased username matched against keystrokes in the search box.
    pub search_key: String,
    pub hidden: bool,
    pub ip: String,
    pub total_requests: u64,
    pub total_data: String,
}

pub struct ChipView {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub count: usize,
    pub active: bool,
}

impl From<&CategoryChip> for ChipView {
    fn from(chip: &CategoryChip) -> Self {
        let category = chip.category;
        Self {
            key: category.key(),
            label: category.label(),
            icon: category.icon(),
            color: if chip.active {
                tailwind_color(category.color_class())
            } else {
                INACTIVE_CHIP_COLOR
            },
            count: chip.count,
            active: chip.active,
        }
    }
}

pub struct LogRowView {
    pub url: String,
    pub search_key: String,
    pub hidden: bool,
    pub short_url: String,
    pub link: String,
    pub response: u16,
    pub badge_class: &'static str,
    pub request_count: u64,
    pub data: String,
    pub is_grouped: bool,
}

impl LogRowView {
    fn new(group: &LogGroup, matched: bool) -> Self {
        Self {
            url: group.url.clone(),
            search_key: group.url.to_lowercase(),
            hidden: !matched,
            short_url: truncate(&group.url, ROW_URL_CHARS),
            link: group.link(),
            response: group.response,
            badge_class: group.category().badge_class(),
            request_count: group.request_count,
            data: format_bytes(group.data_transmitted),
            is_grouped: group.is_grouped,
        }
    }
}

#[derive(Default)]
pub struct LogViewerView {
    pub index: usize,
    pub username: String,
    pub query: String,
    pub chips: Vec<ChipView>,
    pub rows: Vec<LogRowView>,
    pub has_logs: bool,
    pub no_matches: bool,
}

impl From<ViewerRows> for LogViewerView {
    fn from(view: ViewerRows) -> Self {
        Self {
            index: view.index,
            username: view.username,
            query: view.query,
            chips: view.chips.iter().map(ChipView::from).collect(),
            no_matches: view.has_logs && view.rows.is_empty(),
            rows: view
                .listed
                .iter()
                .map(|(group, matched)| LogRowView::new(group, *matched))
                .collect(),
            has_logs: view.has_logs,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: Chrome,
    pub selected_date: String,
    pub total_users: u64,
    pub loading: bool,
    pub failed: bool,
    pub error_message: String,
    pub no_data: bool,
    pub no_matches: bool,
    pub search: String,
    pub cards: Vec<UserCardView>,
    pub pager: Pagination,
    pub viewer_open: bool,
    pub viewer: LogViewerView,
}

impl DashboardTemplate {
    pub fn new(chrome: Chrome, dashboard: &DashboardController, viewer: Option<ViewerRows>) -> Self {
        let visible: HashSet<usize> = dashboard
            .visible_cards()
            .into_iter()
            .map(|(index, _)| index)
            .collect();
        let cards: Vec<UserCardView> = dashboard
            .users()
            .iter()
            .enumerate()
            .map(|(index, user)| UserCardView {
                index,
                username: user.username.clone(),
                search_key: user.username.to_lowercase(),
                hidden: !visible.contains(&index),
                ip: user.ip.clone(),
                total_requests: user.total_requests,
                total_data: format_bytes(user.total_data),
            })
            .collect();

        let (loading, failed, error_message) = match dashboard.state() {
            LoadState::Loading => (true, false, String::new()),
            LoadState::Failed(message) => (false, true, message.clone()),
            LoadState::Idle | LoadState::Loaded => (false, false, String::new()),
        };
        let loaded = *dashboard.state() == LoadState::Loaded;

        Self {
            chrome,
            selected_date: dashboard
                .selected_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            total_users: dashboard.total_users(),
            loading,
            failed,
            error_message,
            no_data: loaded && dashboard.users().is_empty(),
            no_matches: !dashboard.users().is_empty() && visible.is_empty(),
            search: dashboard.search().to_string(),
            cards,
            pager: dashboard.pagination(),
            viewer_open: viewer.is_some(),
            viewer: viewer.map(LogViewerView::from).unwrap_or_default(),
        }
    }
}

pub struct AclRowView {
    pub id: u64,
    pub name: String,
    pub acl_type: String,
    pub values: String,
    pub options: String,
    pub comment: String,
    pub icon: &'static str,
    pub color: &'static str,
}

impl From<&AclRule> for AclRowView {
    fn from(rule: &AclRule) -> Self {
        let info = crate::acl::acl_type_info(&rule.acl_type);
        Self {
            id: rule.id,
            name: rule.name.clone(),
            acl_type: rule.acl_type.clone(),
            values: rule.values.join(" "),
            options: rule.options.join(" "),
            comment: rule.comment.clone().unwrap_or_default(),
            icon: info.map(|i| i.icon).unwrap_or("question"),
            color: info.map(|i| i.color).unwrap_or("gray"),
        }
    }
}

pub struct OptionView {
    pub flag: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

pub struct TypeOptionView {
    pub tag: &'static str,
    pub selected: bool,
}

pub struct TypeGroupView {
    pub name: &'static str,
    pub types: Vec<TypeOptionView>,
}

pub struct TypeHelpView {
    pub description: &'static str,
    pub example: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub speed_icon: &'static str,
    pub slow: bool,
}

impl From<&AclTypeInfo> for TypeHelpView {
    fn from(info: &AclTypeInfo) -> Self {
        Self {
            description: info.description,
            example: info.example,
            icon: info.icon,
            color: info.color,
            speed_icon: info.speed_icon(),
            slow: info.slow,
        }
    }
}

pub struct ValueRowView {
    pub row_id: u32,
    pub value: String,
}

/// One add or edit dialog.
pub struct AclFormView {
    pub open: bool,
    pub mode: &'static str,
    pub title: &'static str,
    pub type_locked: bool,
    pub name: String,
    pub acl_type: String,
    pub comment: String,
    pub rows: Vec<ValueRowView>,
    pub can_remove_rows: bool,
    pub options: Vec<OptionView>,
    pub type_groups: Vec<TypeGroupView>,
    pub has_help: bool,
    pub help: TypeHelpView,
}

impl AclFormView {
    pub fn new(form: &AclForm, open: bool) -> Self {
        let help = form.type_info();
        Self {
            open,
            mode: form.mode.key(),
            title: match form.mode {
                AclMode::Add => "New ACL",
                AclMode::Edit => "Edit ACL",
            },
            type_locked: form.mode == AclMode::Edit,
            name: form.name.clone(),
            acl_type: form.acl_type.clone(),
            comment: form.comment.clone(),
            rows: form
                .rows()
                .iter()
                .map(|r| ValueRowView {
                    row_id: r.row_id,
                    value: r.value.clone(),
                })
                .collect(),
            can_remove_rows: form.rows().len() > 1,
            options: AclOption::ALL
                .into_iter()
                .map(|o| OptionView {
                    flag: o.flag(),
                    label: o.label(),
                    checked: form.has_option(o),
                })
                .collect(),
            type_groups: acl_type_groups()
                .into_iter()
                .map(|(name, types)| TypeGroupView {
                    name,
                    types: types
                        .into_iter()
                        .map(|t| TypeOptionView {
                            tag: t.tag,
                            selected: t.tag == form.acl_type,
                        })
                        .collect(),
                })
                .collect(),
            has_help: help.is_some(),
            help: TypeHelpView::from(help.unwrap_or(&crate::acl::ACL_TYPES[0])),
        }
    }
}

#[derive(Template)]
#[template(path = "acls.html")]
pub struct AclsTemplate {
    pub chrome: Chrome,
    pub rules: Vec<AclRowView>,
    /// The add and edit dialogs, in that order.
    pub dialogs: Vec<AclFormView>,
    pub confirm_open: bool,
    pub confirm_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::StatusCategory;
    use crate::theme::Theme;

    fn chrome() -> Chrome {
        Chrome::new(
            "Test",
            "/",
            DocumentTheme { theme: Theme::Dark },
            ToggleControl {
                icon: "fa-sun",
                tooltip: "Switch to light mode",
            },
        )
    }

    #[test]
    fn test_chip_colors() {
        let mut chip = CategoryChip {
            category: StatusCategory::ClientError,
            count: 3,
            active: true,
        };
        assert_eq!(ChipView::from(&chip).color, "#EF4444");
        chip.active = false;
        assert_eq!(ChipView::from(&chip).color, INACTIVE_CHIP_COLOR);
        assert_eq!(ChipView::from(&chip).key, "clientError");
    }

    #[test]
    fn test_log_row_view() {
        let row = LogRowView::new(
            &LogGroup {
                url: format!("{}:443", "A".repeat(80)),
                response: 503,
                request_count: 2,
                data_transmitted: 2048,
                is_grouped: true,
            },
            false,
        );
        assert!(row.hidden);
        assert!(row.search_key.starts_with("aaa"));
        assert_eq!(row.short_url.chars().count(), 55);
        assert!(row.short_url.ends_with('…'));
        assert!(row.link.starts_with("https://"));
        assert_eq!(row.badge_class, "bg-orange-400");
        assert_eq!(row.data, "2.00 KB");
    }

    #[test]
    fn test_dashboard_renders_empty_state() {
        let page = DashboardTemplate::new(chrome(), &DashboardController::default(), None);
        let html = page.render().unwrap();
        assert!(html.contains("dark theme-transition-disabled"));
        assert!(html.contains("toast-top-right"));
        assert!(!page.viewer_open);
    }

    #[test]
    fn test_search_hides_cards_instead_of_dropping_them() {
        use crate::backend::testing::{entry, user};
        use crate::logs::LogsPage;

        let mut dashboard = DashboardController::default();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let ticket = dashboard.begin_fetch(date, 1);
        dashboard.complete_fetch(
            ticket.token,
            Ok(LogsPage {
                users: vec![
                    user("Alice", vec![entry("example.com", 200, 1)]),
                    user("bob", vec![entry("example.com", 200, 1)]),
                ],
                total: 2,
                total_pages: 1,
                page: 1,
            }),
        );
        dashboard.set_search("ali");

        let page = DashboardTemplate::new(chrome(), &dashboard, None);
        let cards: Vec<_> = page
            .cards
            .iter()
            .map(|c| (c.search_key.as_str(), c.hidden))
            .collect();
        assert_eq!(cards, vec![("alice", false), ("bob", true)]);
        assert!(!page.no_matches);

        let html = page.render().unwrap();
        assert!(html.contains(r#"data-username="bob""#));
        assert!(html.contains("data-live-filter=\"cards\""));

        dashboard.set_search("zed");
        let page = DashboardTemplate::new(chrome(), &dashboard, None);
        assert!(page.no_matches);
        assert!(page.cards.iter().all(|c| c.hidden));
    }

    #[test]
    fn test_acl_form_view() {
        let mut form = AclForm::new_add();
        let view = AclFormView::new(&form, true);
        assert!(!view.has_help);
        assert!(!view.can_remove_rows);
        assert_eq!(view.title, "New ACL");

        form.set_type("dst");
        form.add_value_row();
        let view = AclFormView::new(&form, true);
        assert!(view.has_help);
        assert!(view.help.slow);
        assert!(view.can_remove_rows);
        assert!(view
            .type_groups
            .iter()
            .flat_map(|g| g.types.iter())
            .any(|t| t.tag == "dst" && t.selected));
    }
}
