//! HTTP request handlers.
//!
//! Page actions are plain form posts answered with a redirect back to the
//! page, which then renders from the session.

use super::views::{
    AclFormView, AclRowView, AclsTemplate, Chrome, DashboardTemplate, HtmlTemplate,
};
use super::AppState;
use crate::acl::{AclFormFields, AclMode, AclSubmission};
use crate::chart::{gradient_fill, palette, ChartInstance, PaletteKind, ScaleStyle, MAX_CHARTS};
use crate::dashboard::{DashboardController, FetchTicket, PageNav};
use crate::dialog::DialogEvent;
use crate::logs::{group_logs, CategoryFilter, GroupPolicy, StatusCategory};
use crate::reports::parse_report_date;
use crate::session::{self, ConfirmedAction, DialogName, Session, SharedSession};
use crate::theme::{Theme, ThemeManager};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

const CLIENT_HINT: &str = "sec-ch-prefers-color-scheme";

fn client_hint(headers: &HeaderMap) -> Option<Theme> {
    headers
        .get(CLIENT_HINT)
        .and_then(|v| v.to_str().ok())
        .and_then(Theme::from_client_hint)
}

/// Follow the browser's reported OS theme while it has no explicit choice.
fn observe_client_hint(session: &mut Session, headers: &HeaderMap) {
    if let Some(system) = client_hint(headers) {
        session.theme.observe_system_preference(system);
    }
}

/// Ask browsers to send the colour scheme hint on later requests.
fn accept_client_hint() -> [(HeaderName, HeaderValue); 2] {
    [
        (
            HeaderName::from_static("accept-ch"),
            HeaderValue::from_static("Sec-CH-Prefers-Color-Scheme"),
        ),
        (
            HeaderName::from_static("vary"),
            HeaderValue::from_static("Sec-CH-Prefers-Color-Scheme"),
        ),
    ]
}

fn chrome(session: &mut Session, title: &str, return_to: &'static str) -> Chrome {
    let mut chrome = Chrome::new(
        title,
        return_to,
        session.theme.document(),
        session.theme.toggle_control(),
    );
    chrome.toasts = session.toasts.drain();
    if let Some(e) = session.report_date_error.take() {
        chrome.report_date_invalid = true;
        chrome.report_date_message = e.to_string();
    }
    chrome
}

/// Only same-site paths are followed. Browsers read `\` as `/`, so
/// `/\host` would leave the site.
fn safe_return(path: &str) -> &str {
    if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') {
        path
    } else {
        "/"
    }
}

/// Run an issued fetch and apply its result. The session is unlocked while
/// the backend call is in flight.
async fn load_users(state: &AppState, session: &SharedSession, ticket: FetchTicket) {
    let result = state
        .backend
        .fetch_users_page(ticket.date, ticket.page)
        .await;

    let mut s = session::lock(session);
    if s.dashboard.complete_fetch(ticket.token, result) {
        // The cached page changed under the viewer's index.
        s.log_viewer.close();
    }
}

// ============================================================================
// Dashboard
// ============================================================================

pub async fn handle_dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    observe_client_hint(&mut session::lock(&session), &headers);

    let first_visit = session::lock(&session).dashboard.selected_date().is_none();
    if first_visit {
        let today = chrono::Local::now().date_naive();
        let ticket = session::lock(&session).dashboard.begin_fetch(today, 1);
        load_users(&state, &session, ticket).await;
    }

    let page = {
        let mut s = session::lock(&session);
        let chrome = chrome(&mut s, "Dashboard", "/");
        let viewer = s.log_viewer.rows(s.dashboard.users());
        DashboardTemplate::new(chrome, &s.dashboard, viewer)
    };

    (jar, accept_client_hint(), HtmlTemplate(page))
}

#[derive(Debug, Deserialize)]
pub struct DateForm {
    #[serde(default)]
    pub date: String,
}

pub async fn handle_select_date(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DateForm>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);

    match parse_report_date(&form.date) {
        Ok(date) => {
            let ticket = session::lock(&session).dashboard.begin_fetch(date, 1);
            load_users(&state, &session, ticket).await;
        }
        Err(e) => {
            session::lock(&session).toasts.warning(e.to_string());
        }
    }

    (jar, Redirect::to("/"))
}

#[derive(Debug, Deserialize)]
pub struct PageForm {
    pub nav: String,
    /// Username filter typed on the page since it was rendered.
    pub q: Option<String>,
}

pub async fn handle_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<PageForm>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);

    let ticket = {
        let mut s = session::lock(&session);
        if let Some(q) = &form.q {
            s.dashboard.set_search(q);
        }
        PageNav::parse(&form.nav).and_then(|nav| s.dashboard.goto(nav))
    };
    if let Some(ticket) = ticket {
        load_users(&state, &session, ticket).await;
    }

    (jar, Redirect::to("/"))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
}

pub async fn handle_search(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<SearchForm>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    session::lock(&session).dashboard.set_search(&query.q);
    (jar, Redirect::to("/"))
}

// ============================================================================
// Log viewer
// ============================================================================

pub async fn handle_open_logs(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    session::lock(&session).open_logs(index);
    (jar, Redirect::to("/"))
}

pub async fn handle_close_logs(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    let mut s = session::lock(&session);
    if s.log_viewer.current_user_index() == Some(index) {
        s.log_viewer.close();
    }
    drop(s);
    (jar, Redirect::to("/"))
}

pub async fn handle_logs_search(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(index): Path<usize>,
    Form(form): Form<SearchForm>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    let mut s = session::lock(&session);
    if s.log_viewer.current_user_index() == Some(index) {
        s.log_viewer.set_query(&form.q);
    }
    drop(s);
    (jar, Redirect::to("/"))
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterForm {
    /// URL search typed in the viewer since it was rendered.
    pub q: Option<String>,
}

pub async fn handle_logs_filter(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((index, category)): Path<(usize, String)>,
    Form(form): Form<FilterForm>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    let mut s = session::lock(&session);
    if s.log_viewer.current_user_index() == Some(index) {
        if let Some(q) = &form.q {
            s.log_viewer.set_query(q);
        }
        if let Some(category) = StatusCategory::from_key(&category) {
            s.log_viewer.toggle(category);
        }
    }
    drop(s);
    (jar, Redirect::to("/"))
}

// ============================================================================
// Dialogs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DialogCloseForm {
    #[serde(default = "default_close_event")]
    pub event: String,
}

fn default_close_event() -> String {
    "close".to_string()
}

pub async fn handle_dialog_close(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(name): Path<String>,
    Form(form): Form<DialogCloseForm>,
) -> Response {
    let Some(name) = DialogName::parse(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let event = DialogEvent::parse(&form.event).unwrap_or(DialogEvent::Close);

    let (jar, session) = state.sessions.resolve(jar);
    session::lock(&session).dialog_event(name, event);

    let back = match name {
        DialogName::Logs => "/",
        DialogName::AclAdd | DialogName::AclEdit | DialogName::Confirm => "/admin/acls",
    };
    (jar, Redirect::to(back)).into_response()
}

pub async fn handle_confirm_accept(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);

    let action = session::lock(&session).confirm.confirm();
    if let Some(ConfirmedAction::DeleteAcl(form)) = action {
        let result = state.backend.delete_acl(&form).await;
        let mut s = session::lock(&session);
        match result {
            Ok(()) => {
                info!("Deleted ACL {}", form.id);
                s.toasts.success("ACL deleted");
            }
            Err(e) => {
                error!("Failed to delete ACL {}: {}", form.id, e);
                s.toasts.error(format!("Could not delete the ACL: {}", e));
            }
        }
    }

    (jar, Redirect::to("/admin/acls"))
}

pub async fn handle_confirm_cancel(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    session::lock(&session).confirm.cancel();
    (jar, Redirect::to("/admin/acls"))
}

// ============================================================================
// ACL editor
// ============================================================================

pub async fn handle_acls(State(state): State<AppState>, jar: CookieJar, headers: HeaderMap) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    observe_client_hint(&mut session::lock(&session), &headers);

    let listing = state.backend.list_acls().await;

    let page = {
        let mut s = session::lock(&session);
        match listing {
            Ok(listing) => s.acls = listing,
            Err(e) => {
                error!("Failed to load ACLs: {}", e);
                s.toasts.error(format!("Could not load the ACLs: {}", e));
            }
        }

        let chrome = chrome(&mut s, "ACLs", "/admin/acls");
        let mut dialogs = vec![AclFormView::new(&s.add_form, s.acl_add.is_open())];
        if let Some(form) = &s.edit_form {
            dialogs.push(AclFormView::new(form, s.acl_edit.is_open()));
        }
        AclsTemplate {
            chrome,
            rules: s.acls.acls.iter().map(AclRowView::from).collect(),
            dialogs,
            confirm_open: s.confirm.is_open(),
            confirm_message: s.confirm.message().to_string(),
        }
    };

    (jar, accept_client_hint(), HtmlTemplate(page))
}

pub async fn handle_acl_new(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    session::lock(&session).open_acl_add();
    (jar, Redirect::to("/admin/acls"))
}

pub async fn handle_acl_edit(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    if !session::lock(&session).open_acl_edit(id) {
        warn!("Edit requested for unknown ACL {}", id);
    }
    (jar, Redirect::to("/admin/acls"))
}

pub async fn handle_acl_delete(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    session::lock(&session).request_acl_delete(id);
    (jar, Redirect::to("/admin/acls"))
}

#[derive(Debug, Default, Deserialize)]
pub struct FormAction {
    pub action: Option<String>,
    pub row: Option<u32>,
}

/// Every button of the add/edit dialogs posts the whole form here, so what
/// the user typed survives row changes and type lookups.
pub async fn handle_acl_form(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(mode): Path<String>,
    Query(action): Query<FormAction>,
    axum_extra::extract::Form(fields): axum_extra::extract::Form<AclFormFields>,
) -> Response {
    let Some(mode) = AclMode::parse(&mode) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let (jar, session) = state.sessions.resolve(jar);

    let submission: Option<AclSubmission> = {
        let mut guard = session::lock(&session);
        let s = &mut *guard;
        let form = match mode {
            AclMode::Add => Some(&mut s.add_form),
            AclMode::Edit => s.edit_form.as_mut(),
        };

        match form {
            None => None,
            Some(form) => {
                form.apply_fields(fields);
                match (action.action.as_deref(), action.row) {
                    (Some("add-row"), _) => {
                        form.add_value_row();
                        None
                    }
                    (Some("remove-row"), Some(row)) => {
                        form.remove_value_row(row);
                        None
                    }
                    (Some("refresh"), _) | (Some("remove-row"), None) => None,
                    _ => match form.to_submission() {
                        Ok(submission) => Some(submission),
                        Err(e) => {
                            s.toasts.warning(e.to_string());
                            None
                        }
                    },
                }
            }
        }
    };

    if let Some(submission) = submission {
        let result = state.backend.submit_acl(&submission).await;
        let mut s = session::lock(&session);
        match result {
            Ok(()) => {
                info!("Saved ACL '{}' ({})", submission.name, mode.key());
                s.toasts.success(format!("ACL '{}' saved", submission.name));
                match mode {
                    AclMode::Add => s.acl_add.close(),
                    AclMode::Edit => {
                        s.acl_edit.close();
                        s.edit_form = None;
                    }
                }
            }
            Err(e) => {
                error!("Failed to save ACL '{}': {}", submission.name, e);
                s.toasts.error(format!("Could not save the ACL: {}", e));
            }
        }
    }

    (jar, Redirect::to("/admin/acls")).into_response()
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub return_to: String,
}

pub async fn handle_report_go(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ReportForm>,
) -> impl IntoResponse {
    match parse_report_date(&form.date) {
        Ok(date) => (jar, Redirect::to(&state.backend.report_url(date))),
        Err(e) => {
            let (jar, session) = state.sessions.resolve(jar);
            session::lock(&session).report_date_error = Some(e);
            let back = if form.return_to.is_empty() { "/" } else { safe_return(&form.return_to) };
            (jar, Redirect::to(back))
        }
    }
}

// ============================================================================
// Theme
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReturnForm {
    #[serde(default)]
    pub return_to: String,
}

pub async fn handle_theme_toggle(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ReturnForm>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    let (jar, theme) = {
        let mut s = session::lock(&session);
        let theme = s.theme.toggle_theme();
        (s.theme.store_mut().write_to(jar), theme)
    };
    info!("Theme switched to {}", theme.as_str());
    (jar, Redirect::to(safe_return(&form.return_to)))
}

#[derive(Debug, Serialize)]
pub struct ThemeStatus {
    pub theme: Theme,
    pub dark: bool,
    pub explicit: bool,
    pub toggle: crate::theme::ToggleControl,
    pub colors: crate::theme::ThemeColors,
}

fn theme_status(theme: &ThemeManager) -> ThemeStatus {
    ThemeStatus {
        theme: theme.current_theme(),
        dark: theme.is_dark_mode(),
        explicit: theme.has_explicit_preference(),
        toggle: theme.toggle_control(),
        colors: theme.colors(),
    }
}

pub async fn handle_get_theme(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    let mut s = session::lock(&session);
    observe_client_hint(&mut s, &headers);
    let status = theme_status(&s.theme);
    drop(s);
    (jar, accept_client_hint(), Json(status))
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

pub async fn handle_put_theme(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ThemeRequest>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    let mut s = session::lock(&session);
    s.theme.set_theme(req.theme);
    let jar = s.theme.store_mut().write_to(jar);
    let status = theme_status(&s.theme);
    drop(s);
    (jar, Json(status))
}

/// Forget the browser's explicit choice and follow its OS scheme again.
pub async fn handle_delete_theme(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    let mut s = session::lock(&session);
    s.theme.clear_preference(client_hint(&headers).unwrap_or_default());
    let jar = s.theme.store_mut().write_to(jar);
    let status = theme_status(&s.theme);
    drop(s);
    (jar, Json(status))
}

#[derive(Debug, Default, Deserialize)]
pub struct PaletteQuery {
    pub palette: Option<String>,
}

pub async fn handle_chart_theme(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PaletteQuery>,
) -> impl IntoResponse {
    let (jar, session) = state.sessions.resolve(jar);
    let charts = session::lock(&session).charts.clone();

    let kind = PaletteKind::parse(query.palette.as_deref().unwrap_or_default());
    let body = {
        let registry = charts.read().unwrap_or_else(|e| e.into_inner());
        let colors = palette(kind, registry.defaults.theme);
        serde_json::json!({
            "defaults": registry.defaults,
            "instances": registry.instances,
            "palette": kind,
            "colors": colors,
            "fill": colors.first().map(|c| gradient_fill(c, 0.4)),
        })
    };

    (jar, Json(body))
}

#[derive(Debug, Deserialize)]
pub struct ChartRegistration {
    pub id: String,
    #[serde(default)]
    pub scales: Vec<String>,
    #[serde(default)]
    pub titled_scales: Vec<String>,
    #[serde(default = "default_true")]
    pub legend: bool,
    #[serde(default)]
    pub title: bool,
}

fn default_true() -> bool {
    true
}

/// Register a chart drawn in the browser so it gets restyled with the
/// browser's theme.
pub async fn handle_register_chart(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ChartRegistration>,
) -> Response {
    if req.id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Chart id is required").into_response();
    }

    let scales = req
        .scales
        .iter()
        .map(|name| {
            let mut scale = ScaleStyle::new(name);
            if req.titled_scales.contains(name) {
                scale.title_color = Some(String::new());
            }
            scale
        })
        .collect();
    let mut chart = ChartInstance::new(&req.id, scales);
    if !req.legend {
        chart.legend_color = None;
    }
    if req.title {
        chart.title_color = Some(String::new());
    }

    let (jar, session) = state.sessions.resolve(jar);
    let charts = session::lock(&session).charts.clone();
    let mut registry = charts.write().unwrap_or_else(|e| e.into_inner());
    if !registry.register(chart) {
        warn!("Rejected chart '{}': {} charts registered", req.id, MAX_CHARTS);
        return (StatusCode::UNPROCESSABLE_ENTITY, jar, "Too many charts").into_response();
    }
    let registered = registry.instances.iter().find(|c| c.id == req.id).cloned();
    drop(registry);

    (jar, Json(registered)).into_response()
}

// ============================================================================
// API: Users
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserCard {
    pub index: usize,
    pub username: String,
    pub ip: String,
    pub total_requests: u64,
    pub total_data: u64,
    pub total_data_display: String,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub date: Option<chrono::NaiveDate>,
    pub page: u32,
    pub total_pages: u32,
    pub total_users: u64,
    pub search: String,
    pub users: Vec<UserCard>,
}

impl From<&DashboardController> for UsersResponse {
    fn from(dashboard: &DashboardController) -> Self {
        Self {
            date: dashboard.selected_date(),
            page: dashboard.current_page(),
            total_pages: dashboard.total_pages(),
            total_users: dashboard.total_users(),
            search: dashboard.search().to_string(),
            users: dashboard
                .visible_cards()
                .into_iter()
                .map(|(index, u)| UserCard {
                    index,
                    username: u.username.clone(),
                    ip: u.ip.clone(),
                    total_requests: u.total_requests,
                    total_data: u.total_data,
                    total_data_display: crate::format::format_bytes(u.total_data),
                })
                .collect(),
        }
    }
}

/// The browser's cached page. Browsers without a session get an empty page
/// and no new session.
pub async fn handle_api_users(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let response = match state.sessions.find(&jar) {
        Some(session) => {
            let s = session::lock(&session);
            UsersResponse::from(&s.dashboard)
        }
        None => UsersResponse::from(&DashboardController::default()),
    };
    Json(response)
}

pub async fn handle_api_user_logs(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(index): Path<usize>,
) -> Response {
    let Some(session) = state.sessions.find(&jar) else {
        return (StatusCode::NOT_FOUND, "Unknown user").into_response();
    };
    let s = session::lock(&session);
    let Some(user) = s.dashboard.user(index) else {
        return (StatusCode::NOT_FOUND, "Unknown user").into_response();
    };

    let body = serde_json::json!({
        "username": user.username,
        "groups": group_logs(&user.logs, GroupPolicy::default()),
        "chips": CategoryFilter::for_logs(&user.logs).chips(),
    });
    drop(s);

    Json(body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return() {
        assert_eq!(safe_return("/admin/acls"), "/admin/acls");
        assert_eq!(safe_return("/"), "/");
        assert_eq!(safe_return("//evil.com"), "/");
        assert_eq!(safe_return("/\\evil.com"), "/");
        assert_eq!(safe_return("/admin\\..\\x"), "/");
        assert_eq!(safe_return("https://evil.com"), "/");
        assert_eq!(safe_return("admin/acls"), "/");
        assert_eq!(safe_return(""), "/");
    }

    #[test]
    fn test_client_hint() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_hint(&headers), None);
        headers.insert(CLIENT_HINT, HeaderValue::from_static("dark"));
        assert_eq!(client_hint(&headers), Some(Theme::Dark));
    }
}
