// App model for in-process pages
//
// An app owns its state, turns messages into state changes in `update`, and
// describes the page in `view`. The `Context` passed to `update` is the app's
// window onto the page: it can queue messages (now or after a delay) and
// raise dialogs through the session's dialog channel.

use super::html::Html;
use crate::protocol::dialog::{Dialog, DialogChannel, DialogResponse};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A page application
///
/// # Example
///
/// ```ignore
/// use pagewright::server::{App, Context, Html, h};
///
/// #[derive(Default)]
/// struct Counter {
///     value: i32,
/// }
///
/// enum Message {
///     Increment,
/// }
///
/// impl App for Counter {
///     type Message = Message;
///
///     fn update(&mut self, message: Message, _ctx: &Context<Message>) {
///         match message {
///             Message::Increment => self.value += 1,
///         }
///     }
///
///     fn view(&self) -> Html<Message> {
///         h::div()
///             .push(self.value)
///             .push(h::button().push("+").on("click", |_| Message::Increment))
///             .into()
///     }
/// }
/// ```
pub trait App: Send + 'static {
    type Message: Send + 'static;

    /// Applies one message
    fn update(&mut self, message: Self::Message, ctx: &Context<Self::Message>);

    /// Describes the current page
    fn view(&self) -> Html<Self::Message>;
}

/// Handle given to `App::update`
pub struct Context<M> {
    sender: mpsc::UnboundedSender<M>,
    dialogs: DialogChannel,
    timers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<M: Send + 'static> Context<M> {
    pub(crate) fn new(sender: mpsc::UnboundedSender<M>, dialogs: DialogChannel) -> Self {
        Self {
            sender,
            dialogs,
            timers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a message; it is applied after the current update returns.
    pub fn send(&self, message: M) {
        if self.sender.send(message).is_err() {
            tracing::trace!("message dropped: page closed");
        }
    }

    /// Queues a message after `delay`.
    pub fn send_after(&self, delay: Duration, message: M) {
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(message).is_err() {
                tracing::trace!("delayed message dropped: page closed");
            }
        });
        let mut timers = self.timers.lock();
        timers.retain(|timer| !timer.is_finished());
        timers.push(handle);
    }

    /// Raises an alert
    pub fn alert(&self, message: impl Into<String>) {
        self.dialogs.raise(Dialog::alert(message));
    }

    /// Raises a confirm; true when accepted
    pub fn confirm(&self, message: impl Into<String>) -> bool {
        self.dialogs.raise(Dialog::confirm(message)).is_accepted()
    }

    /// Raises a prompt; the entered text when accepted
    pub fn prompt(&self, message: impl Into<String>, default_value: Option<&str>) -> Option<String> {
        let default_value = default_value.map(str::to_string);
        match self.dialogs.raise(Dialog::prompt(message, default_value.clone())) {
            DialogResponse::Accept(text) => Some(text.or(default_value).unwrap_or_default()),
            DialogResponse::Dismiss => None,
        }
    }

    pub(crate) fn cancel_timers(&self) {
        for timer in self.timers.lock().drain(..) {
            timer.abort();
        }
    }
}
