// Engine - queries, actions, retries and the chains that tie them together
//
// Layering, leaves first:
// - query: pure reads of the current document (selectors, text filters, nth)
// - actions: one-shot interactions with actionability checks
// - retry: bounded polling with recoverable/fatal error classification
// - chain: deferred command lists replayed from the root on every attempt
// - session: per-test root owning the document and dialog interceptors

pub mod action_options;
pub mod actions;
pub mod chain;
pub mod dialog;
pub mod query;
pub mod retry;
pub mod select_option;
pub mod session;

pub use action_options::{
    CheckOptions, CheckOptionsBuilder, ClickOptions, ClickOptionsBuilder, TypeOptions,
    TypeOptionsBuilder,
};
pub use chain::Chain;
pub use dialog::{
    Dialog, DialogChannel, DialogHandler, DialogKind, DialogResponse, DialogStub,
    InterceptedDialog,
};
pub use query::{ElementSet, TextMatcher};
pub use retry::{RetryPolicy, RetryRun, RunState, retry_until};
pub use select_option::SelectOption;
pub use session::Session;
