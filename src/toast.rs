//! Notification widget settings and one-shot flash messages.

use serde::Serialize;

/// Options handed to the toast widget on every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastOptions {
    pub close_button: bool,
    pub debug: bool,
    /// False puts new toasts below the existing ones.
    pub newest_on_top: bool,
    pub progress_bar: bool,
    pub position_class: &'static str,
    pub prevent_duplicates: bool,
    pub show_duration: u32,
    pub hide_duration: u32,
    pub time_out: u32,
    pub extended_time_out: u32,
    pub show_easing: &'static str,
    pub hide_easing: &'static str,
    pub show_method: &'static str,
    pub hide_method: &'static str,
    pub tap_to_dismiss: bool,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            close_button: true,
            debug: false,
            newest_on_top: false,
            progress_bar: true,
            position_class: "toast-top-right",
            prevent_duplicates: false,
            show_duration: 300,
            hide_duration: 1000,
            time_out: 5000,
            extended_time_out: 1000,
            show_easing: "swing",
            hide_easing: "linear",
            show_method: "fadeIn",
            hide_method: "fadeOut",
            tap_to_dismiss: true,
        }
    }
}

impl ToastOptions {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    /// Name of the widget method showing this level.
    pub fn method(self) -> &'static str {
        match self {
            ToastLevel::Success => "success",
            ToastLevel::Warning => "warning",
            ToastLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Messages waiting for the next rendered page.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    pending: Vec<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.pending.push(Toast {
            level,
            message: message.into(),
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    /// A problem the user can fix, such as a rejected form.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message);
    }

    /// Hand out every queued toast exactly once.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.pending)
    }
}
