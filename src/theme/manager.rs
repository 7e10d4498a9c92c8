//! Theme state of one browser.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::{CookieStore, KeyValueStore};

/// Storage key holding `"light"` or `"dark"`.
pub const THEME_STORAGE_KEY: &str = "squidview-theme";

/// Colour scheme of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Read the `Sec-CH-Prefers-Color-Scheme` client hint value, which may be
    /// quoted.
    pub fn from_client_hint(value: &str) -> Option<Self> {
        Self::parse(value.trim().trim_matches('"'))
    }
}

/// Notification sent on every applied theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeChanged {
    pub theme: Theme,
}

/// How the root element of a rendered page is marked.
///
/// Every page is a first paint for its document, so transitions start
/// disabled and `app.js` enables them once the page has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTheme {
    pub theme: Theme,
}

impl DocumentTheme {
    pub fn html_class(&self) -> &'static str {
        match self.theme {
            Theme::Dark => "dark theme-transition-disabled",
            Theme::Light => "theme-transition-disabled",
        }
    }

    pub fn data_theme(&self) -> &'static str {
        self.theme.as_str()
    }
}

/// Icon and tooltip of a theme toggle button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleControl {
    pub icon: &'static str,
    pub tooltip: &'static str,
}

/// Named colours for the active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub background: &'static str,
    pub background_alt: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    pub border: &'static str,
    pub primary: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
}

impl ThemeColors {
    pub fn for_theme(theme: Theme) -> Self {
        let dark = theme == Theme::Dark;
        Self {
            background: if dark { "#0f172a" } else { "#ffffff" },
            background_alt: if dark { "#1e293b" } else { "#f8fafc" },
            text: if dark { "#e2e8f0" } else { "#1e293b" },
            text_secondary: if dark { "#94a3b8" } else { "#64748b" },
            border: if dark { "#334155" } else { "#e2e8f0" },
            primary: if dark { "#3b82f6" } else { "#2563eb" },
            success: if dark { "#22c55e" } else { "#10b981" },
            warning: "#f59e0b",
            error: if dark { "#ef4444" } else { "#dc2626" },
        }
    }
}

/// Holds one browser's active theme, persists its explicit choice and
/// broadcasts changes.
#[derive(Debug)]
pub struct ThemeManager<S = CookieStore> {
    store: S,
    current: Theme,
    tx: broadcast::Sender<ThemeChanged>,
}

impl<S: KeyValueStore> ThemeManager<S> {
    /// Load the persisted theme, falling back to the OS preference.
    pub fn new(store: S, system: Theme) -> Self {
        let stored = store.get(THEME_STORAGE_KEY).and_then(|s| Theme::parse(&s));
        let (tx, _) = broadcast::channel(16);

        Self {
            store,
            current: stored.unwrap_or(system),
            tx,
        }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn current_theme(&self) -> Theme {
        self.current
    }

    pub fn is_dark_mode(&self) -> bool {
        self.current == Theme::Dark
    }

    /// Whether the user ever picked a theme explicitly.
    pub fn has_explicit_preference(&self) -> bool {
        self.store
            .get(THEME_STORAGE_KEY)
            .and_then(|s| Theme::parse(&s))
            .is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ThemeChanged> {
        self.tx.subscribe()
    }

    /// Persist and apply a theme.
    pub fn set_theme(&mut self, theme: Theme) {
        self.current = theme;
        if let Err(e) = self.store.set(THEME_STORAGE_KEY, theme.as_str()) {
            tracing::warn!("Failed to persist theme {}: {}", theme.as_str(), e);
        }
        self.apply();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.current.toggled();
        self.set_theme(next);
        next
    }

    /// Forget the explicit choice and follow `system` again.
    pub fn clear_preference(&mut self, system: Theme) {
        if let Err(e) = self.store.remove(THEME_STORAGE_KEY) {
            tracing::warn!("Failed to clear stored theme: {}", e);
        }
        if self.current != system {
            self.current = system;
            self.apply();
        }
    }

    /// Follow an OS preference change unless the user chose a theme.
    ///
    /// Returns true when the active theme changed.
    pub fn observe_system_preference(&mut self, system: Theme) -> bool {
        if self.has_explicit_preference() || system == self.current {
            return false;
        }
        tracing::debug!("Following system theme {}", system.as_str());
        self.current = system;
        self.apply();
        true
    }

    pub fn document(&self) -> DocumentTheme {
        DocumentTheme {
            theme: self.current,
        }
    }

    pub fn toggle_control(&self) -> ToggleControl {
        match self.current {
            Theme::Dark => ToggleControl {
                icon: "fa-sun",
                tooltip: "Switch to light mode",
            },
            Theme::Light => ToggleControl {
                icon: "fa-moon",
                tooltip: "Switch to dark mode",
            },
        }
    }

    pub fn colors(&self) -> ThemeColors {
        ThemeColors::for_theme(self.current)
    }

    fn apply(&self) {
        // No subscribers is fine.
        let _ = self.tx.send(ThemeChanged {
            theme: self.current,
        });
    }
}
