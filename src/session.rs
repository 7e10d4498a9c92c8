//! Per-browser application state.
//!
//! Every browser gets a random session id in a cookie. The session owns the
//! cached page of users, the theme and charts, and the state of every dialog
//! on the pages. Sessions idle for too long are swept.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use crate::acl::{AclForm, AclListing, AclRule, DeleteAclForm};
use crate::chart::{self, ChartRegistry};
use crate::dashboard::{DashboardController, LogViewer};
use crate::dialog::{ConfirmDialog, Dialog, DialogEvent};
use crate::reports::ReportDateError;
use crate::theme::{CookieStore, Theme, ThemeManager, THEME_STORAGE_KEY};
use crate::toast::ToastQueue;

pub const SESSION_COOKIE: &str = "squidview_session";

/// What a confirmed confirm-dialog goes on to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmedAction {
    DeleteAcl(DeleteAclForm),
}

/// Dialogs addressable by name from the pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogName {
    Logs,
    AclAdd,
    AclEdit,
    Confirm,
}

impl DialogName {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "logs" => Some(DialogName::Logs),
            "acl-add" => Some(DialogName::AclAdd),
            "acl-edit" => Some(DialogName::AclEdit),
            "confirm" => Some(DialogName::Confirm),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub dashboard: DashboardController,
    pub log_viewer: LogViewer,
    pub acls: AclListing,
    pub acl_add: Dialog,
    pub add_form: AclForm,
    pub acl_edit: Dialog,
    pub edit_form: Option<AclForm>,
    pub confirm: ConfirmDialog<ConfirmedAction>,
    pub toasts: ToastQueue,
    pub report_date_error: Option<ReportDateError>,
    pub theme: ThemeManager,
    pub charts: Arc<RwLock<ChartRegistry>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CookieStore::default())
    }
}

impl Session {
    /// A fresh session whose theme preference lives in `prefs`. Until the
    /// browser reports its OS scheme the theme falls back to light.
    pub fn new(prefs: CookieStore) -> Self {
        let theme = ThemeManager::new(prefs, Theme::Light);
        let charts = Arc::new(RwLock::new(ChartRegistry::new(theme.current_theme())));
        Self {
            dashboard: DashboardController::default(),
            log_viewer: LogViewer::default(),
            acls: AclListing::default(),
            acl_add: Dialog::default(),
            add_form: AclForm::new_add(),
            acl_edit: Dialog::default(),
            edit_form: None,
            confirm: ConfirmDialog::default(),
            toasts: ToastQueue::default(),
            report_date_error: None,
            theme,
            charts,
        }
    }

    /// Open the viewer on a user of the cached page.
    pub fn open_logs(&mut self, index: usize) -> bool {
        self.log_viewer.open(index, self.dashboard.users())
    }

    pub fn acl(&self, id: u64) -> Option<&AclRule> {
        self.acls.acls.iter().find(|r| r.id == id)
    }

    /// Blank add form, opened.
    pub fn open_acl_add(&mut self) {
        self.add_form = AclForm::new_add();
        self.acl_add.open();
    }

    /// Prefilled edit form for a known rule. Unknown ids are ignored.
    pub fn open_acl_edit(&mut self, id: u64) -> bool {
        let Some(rule) = self.acl(id) else {
            return false;
        };
        self.edit_form = Some(AclForm::for_rule(rule));
        self.acl_edit.open();
        true
    }

    /// Ask for confirmation before deleting a known rule.
    pub fn request_acl_delete(&mut self, id: u64) -> bool {
        let Some(rule) = self.acl(id) else {
            return false;
        };
        let message = format!("Delete the ACL '{}'? This cannot be undone.", rule.name);
        let form = DeleteAclForm {
            csrf_token: self.acls.csrf_token.clone(),
            id,
        };
        self.confirm
            .show(message, move || ConfirmedAction::DeleteAcl(form));
        true
    }

    /// Route a closing event to one dialog. Other dialogs are unaffected.
    pub fn dialog_event(&mut self, name: DialogName, event: DialogEvent) -> bool {
        match name {
            DialogName::Logs => self.log_viewer.handle(event),
            DialogName::AclAdd => self.acl_add.handle(event),
            DialogName::AclEdit => self.acl_edit.handle(event),
            DialogName::Confirm => self.confirm.handle(event),
        }
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Lock a session. A panicked handler does not take the session down with it.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|e| e.into_inner())
}

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// In-memory sessions keyed by cookie id.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Entry>>>,
}

impl SessionStore {
    /// Find the session named by the cookie, or start a new one and set
    /// the cookie on the returned jar.
    ///
    /// Must run inside the tokio runtime: a new session starts the task that
    /// keeps its charts in step with its theme.
    pub fn resolve(&self, jar: CookieJar) -> (CookieJar, SharedSession) {
        if let Some(session) = self.find(&jar) {
            return (jar, session);
        }

        let session = Session::new(CookieStore::from_jar(&jar, &[THEME_STORAGE_KEY]));
        chart::spawn_theme_listener(session.charts.clone(), session.theme.subscribe());
        let session = Arc::new(Mutex::new(session));

        let id = new_session_id();
        let active = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            sessions.insert(
                id.clone(),
                Entry {
                    session: session.clone(),
                    last_seen: Instant::now(),
                },
            );
            sessions.len()
        };
        tracing::debug!("Started session {} ({} active)", id, active);

        let cookie = Cookie::build((SESSION_COOKIE, id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        (jar.add(cookie), session)
    }

    /// The existing session named by the cookie. Never creates one.
    pub fn find(&self, jar: &CookieJar) -> Option<SharedSession> {
        let id = jar.get(SESSION_COOKIE)?;
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let entry = sessions.get_mut(id.value())?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// Drop sessions without a request for `max_idle`. Returns how many went.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < max_idle);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Sweep idle sessions every `every` until the runtime shuts down.
pub fn spawn_sweeper(
    store: SessionStore,
    every: Duration,
    max_idle: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);

        loop {
            interval.tick().await;
            let evicted = store.evict_idle(max_idle);
            if evicted > 0 {
                tracing::info!("Evicted {} idle sessions ({} active)", evicted, store.len());
            }
        }
    })
}

fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::AclRule;

    fn listing() -> AclListing {
        AclListing {
            acls: vec![AclRule {
                id: 3,
                name: "blocked".to_string(),
                acl_type: "dstdomain".to_string(),
                values: vec![".bad.com".to_string()],
                options: vec![],
                comment: None,
            }],
            csrf_token: "tok".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_reuses_cookie() {
        let store = SessionStore::default();
        let (jar, first) = store.resolve(CookieJar::new());
        let id = jar.get(SESSION_COOKIE).unwrap().value().to_string();
        assert_eq!(id.len(), 32);

        let returning = CookieJar::new().add(Cookie::new(SESSION_COOKIE, id));
        let (_, second) = store.resolve(returning);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);

        let stranger = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "forged"));
        let (_, third) = store.resolve(stranger);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_find_never_creates() {
        let store = SessionStore::default();
        assert!(store.find(&CookieJar::new()).is_none());
        let forged = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "forged"));
        assert!(store.find(&forged).is_none());
        assert_eq!(store.len(), 0);

        let (jar, session) = store.resolve(CookieJar::new());
        assert!(Arc::ptr_eq(&store.find(&jar).unwrap(), &session));
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = SessionStore::default();
        let (jar, first) = store.resolve(CookieJar::new());
        store.resolve(CookieJar::new());

        assert_eq!(store.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(store.len(), 2);

        assert_eq!(store.evict_idle(Duration::ZERO), 2);
        assert_eq!(store.len(), 0);

        // The old cookie now starts over.
        let (_, again) = store.resolve(jar);
        assert!(!Arc::ptr_eq(&first, &again));
    }

    #[tokio::test]
    async fn test_sweeper_evicts_in_background() {
        let store = SessionStore::default();
        store.resolve(CookieJar::new());

        let handle = spawn_sweeper(store.clone(), Duration::from_millis(10), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_theme_preference_seeds_new_session() {
        let store = SessionStore::default();
        let jar = CookieJar::new().add(Cookie::new(THEME_STORAGE_KEY, "dark"));
        let (_, session) = store.resolve(jar);

        let s = lock(&session);
        assert_eq!(s.theme.current_theme(), Theme::Dark);
        assert_eq!(s.charts.read().unwrap().defaults.theme, Theme::Dark);
    }

    #[test]
    fn test_delete_goes_through_confirm() {
        let mut session = Session {
            acls: listing(),
            ..Session::default()
        };
        assert!(!session.request_acl_delete(99));
        assert!(!session.confirm.is_open());

        assert!(session.request_acl_delete(3));
        assert!(session.confirm.message().contains("blocked"));
        assert_eq!(
            session.confirm.confirm(),
            Some(ConfirmedAction::DeleteAcl(DeleteAclForm {
                csrf_token: "tok".to_string(),
                id: 3,
            }))
        );
        assert_eq!(session.confirm.confirm(), None);
    }

    #[test]
    fn test_dialogs_are_independent() {
        let mut session = Session {
            acls: listing(),
            ..Session::default()
        };
        session.open_acl_add();
        assert!(session.open_acl_edit(3));
        assert!(session.acl_add.is_open());
        assert!(session.acl_edit.is_open());

        assert!(session.dialog_event(DialogName::AclEdit, DialogEvent::BackdropClick));
        assert!(session.acl_add.is_open());
        assert!(!session.acl_edit.is_open());
        assert!(!session.dialog_event(DialogName::Logs, DialogEvent::Escape));
    }

    #[test]
    fn test_open_logs_needs_loaded_user() {
        let mut session = Session::default();
        assert!(!session.open_logs(0));
    }
}
