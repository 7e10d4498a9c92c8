//! Open/closed state machines for the modal dialogs.

/// Visibility of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Closed,
    Open,
}

/// Input that may close an open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    /// The close button or an explicit cancel.
    Close,
    /// The Escape key.
    Escape,
    /// A click landing on the dimmed backdrop.
    BackdropClick,
    /// A click inside the dialog content.
    ContentClick,
}

impl DialogEvent {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "close" => Some(DialogEvent::Close),
            "escape" => Some(DialogEvent::Escape),
            "backdrop" => Some(DialogEvent::BackdropClick),
            "content" => Some(DialogEvent::ContentClick),
            _ => None,
        }
    }

    pub fn closes(self) -> bool {
        !matches!(self, DialogEvent::ContentClick)
    }
}

/// A single dialog. Dialogs never coordinate with each other.
#[derive(Debug, Clone, Default)]
pub struct Dialog {
    state: DialogState,
}

impl Dialog {
    pub fn is_open(&self) -> bool {
        self.state == DialogState::Open
    }

    pub fn open(&mut self) {
        self.state = DialogState::Open;
    }

    pub fn close(&mut self) {
        self.state = DialogState::Closed;
    }

    /// Returns true if the event closed the dialog.
    pub fn handle(&mut self, event: DialogEvent) -> bool {
        if self.is_open() && event.closes() {
            self.close();
            return true;
        }
        false
    }
}

type Callback<T> = Box<dyn FnOnce() -> T + Send>;

/// Yes/no dialog with a callback that runs at most once.
pub struct ConfirmDialog<T> {
    dialog: Dialog,
    message: String,
    callback: Option<Callback<T>>,
}

impl<T> Default for ConfirmDialog<T> {
    fn default() -> Self {
        Self {
            dialog: Dialog::default(),
            message: String::new(),
            callback: None,
        }
    }
}

impl<T> ConfirmDialog<T> {
    /// Show `message`, replacing any pending callback.
    pub fn show<F>(&mut self, message: impl Into<String>, callback: F)
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.message = message.into();
        self.callback = Some(Box::new(callback));
        self.dialog.open();
    }

    pub fn is_open(&self) -> bool {
        self.dialog.is_open()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run the pending callback, if any, and close.
    pub fn confirm(&mut self) -> Option<T> {
        self.dialog.close();
        self.callback.take().map(|cb| cb())
    }

    /// Close and discard the pending callback.
    pub fn cancel(&mut self) {
        self.dialog.close();
        self.callback = None;
    }

    /// Closing events behave like cancel.
    pub fn handle(&mut self, event: DialogEvent) -> bool {
        let closed = self.dialog.handle(event);
        if closed {
            self.callback = None;
        }
        closed
    }
}

impl<T> std::fmt::Debug for ConfirmDialog<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmDialog")
            .field("dialog", &self.dialog)
            .field("message", &self.message)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_dialog_transitions() {
        let mut dialog = Dialog::default();
        assert!(!dialog.is_open());
        assert!(!dialog.handle(DialogEvent::Escape));

        dialog.open();
        assert!(!dialog.handle(DialogEvent::ContentClick));
        assert!(dialog.is_open());

        assert!(dialog.handle(DialogEvent::BackdropClick));
        assert!(!dialog.is_open());

        dialog.open();
        assert!(dialog.handle(DialogEvent::Escape));
        dialog.open();
        assert!(dialog.handle(DialogEvent::Close));
    }

    #[test]
    fn test_confirm_runs_callback_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut confirm = ConfirmDialog::default();

        let counter = calls.clone();
        confirm.show("Delete?", move || counter.fetch_add(1, Ordering::SeqCst));
        assert!(confirm.is_open());
        assert_eq!(confirm.message(), "Delete?");

        assert_eq!(confirm.confirm(), Some(0));
        assert_eq!(confirm.confirm(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!confirm.is_open());
    }

    #[test]
    fn test_cancel_discards_callback() {
        let mut confirm: ConfirmDialog<&'static str> = ConfirmDialog::default();
        confirm.show("Delete?", || "deleted");
        confirm.cancel();
        assert_eq!(confirm.confirm(), None);

        confirm.show("Delete?", || "deleted");
        assert!(confirm.handle(DialogEvent::Escape));
        assert_eq!(confirm.confirm(), None);
    }

    #[test]
    fn test_event_parse() {
        assert_eq!(DialogEvent::parse("backdrop"), Some(DialogEvent::BackdropClick));
        assert_eq!(DialogEvent::parse("nope"), None);
    }
}
