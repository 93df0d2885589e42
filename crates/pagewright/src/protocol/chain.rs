// Command chains - deferred query/action/assertion pipelines
//
// A chain is a singly linked list of commands built top-down by the builder
// methods. Nothing touches the page until the chain runs; running replays
// every stage from the root on each retry attempt, so no handle survives a
// suspension point. Actions are the exception to "replay everything": once an
// action has completed, later attempts resume right after it with the subject
// it returned. Nothing before a performed action is evaluated again, so an
// action that removes its own target cannot stall the stages after it.

use super::action_options::{CheckOptions, ClickOptions, TypeOptions};
use super::actions;
use super::query::{self, ElementSet, TextMatcher};
use super::retry::{RetryPolicy, RetryRun};
use super::select_option::SelectOption;
use super::session::Session;
use crate::assertions::Assertion;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// One stage of a chain
#[derive(Debug, Clone)]
pub(crate) enum Stage {
    Get(String),
    Find(String),
    FilterText(TextMatcher),
    Contains(String),
    Nth(isize),
    Click(ClickOptions),
    Type(String, TypeOptions),
    Clear,
    Select(SelectOption),
    SetChecked(bool, CheckOptions),
    Should(Assertion),
}

impl Stage {
    fn is_action(&self) -> bool {
        matches!(
            self,
            Stage::Click(_)
                | Stage::Type(..)
                | Stage::Clear
                | Stage::Select(_)
                | Stage::SetChecked(..)
        )
    }

    fn is_terminal(&self) -> bool {
        self.is_action() || matches!(self, Stage::Should(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Get(selector) => write!(f, "get({:?})", selector),
            Stage::Find(selector) => write!(f, "find({:?})", selector),
            Stage::FilterText(matcher) => write!(f, "filter_text({})", matcher),
            Stage::Contains(text) => write!(f, "contains({:?})", text),
            Stage::Nth(index) => write!(f, "eq({})", index),
            Stage::Click(options) if options.is_forced() => write!(f, "click(force)"),
            Stage::Click(_) => write!(f, "click()"),
            Stage::Type(text, _) => write!(f, "type({:?})", text),
            Stage::Clear => write!(f, "clear()"),
            Stage::Select(option) => write!(f, "select({})", option),
            Stage::SetChecked(true, _) => write!(f, "check()"),
            Stage::SetChecked(false, _) => write!(f, "uncheck()"),
            Stage::Should(assertion) => write!(f, "should({})", assertion),
        }
    }
}

/// A node of the chain; points at its predecessor
#[derive(Debug)]
struct Command {
    stage: Stage,
    previous: Option<Arc<Command>>,
}

impl Command {
    /// Stages from the root to this command
    fn stages(&self) -> Vec<&Stage> {
        let mut stages = Vec::new();
        let mut node = Some(self);
        while let Some(command) = node {
            stages.push(&command.stage);
            node = command.previous.as_deref();
        }
        stages.reverse();
        stages
    }
}

/// A deferred chain of commands
///
/// Build with [`Session::get`] and the methods below, then `.await` it (or
/// call [`run`](Chain::run)). The resulting future resolves to the final
/// subject.
///
/// # Example
///
/// ```ignore
/// session.get("button").contains("+").click().await?;
/// session
///     .get("div")
///     .contains("7")
///     .should(Assertion::have_text("- 7 + Reset"))
///     .await?;
/// session.get("#username").type_text("Ferris").await?;
/// session.get("select").select("D4").await?;
/// ```
#[must_use = "chains do nothing until awaited"]
pub struct Chain<'s> {
    session: &'s Session,
    tail: Arc<Command>,
    timeout: Option<Duration>,
    poll_interval: Option<Duration>,
}

impl<'s> Chain<'s> {
    pub(crate) fn new(session: &'s Session, stage: Stage) -> Self {
        Self {
            session,
            tail: Arc::new(Command {
                stage,
                previous: None,
            }),
            timeout: None,
            poll_interval: None,
        }
    }

    fn then(self, stage: Stage) -> Self {
        Self {
            tail: Arc::new(Command {
                stage,
                previous: Some(self.tail),
            }),
            ..self
        }
    }

    /// Re-queries the whole document, discarding the subject
    pub fn get(self, selector: &str) -> Self {
        self.then(Stage::Get(selector.to_string()))
    }

    /// Descendants of the subject matching `selector`
    pub fn find(self, selector: &str) -> Self {
        self.then(Stage::Find(selector.to_string()))
    }

    /// Keeps the elements whose text content satisfies `matcher`
    ///
    /// A plain string matches exactly.
    pub fn filter_text(self, matcher: impl Into<TextMatcher>) -> Self {
        self.then(Stage::FilterText(matcher.into()))
    }

    /// The first element whose text contains `text`
    pub fn contains(self, text: &str) -> Self {
        self.then(Stage::Contains(text.to_string()))
    }

    /// The element at `index`; negative indexes count from the end
    pub fn nth(self, index: isize) -> Self {
        self.then(Stage::Nth(index))
    }

    /// Alias of [`nth`](Chain::nth)
    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, index: isize) -> Self {
        self.nth(index)
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    pub fn last(self) -> Self {
        self.nth(-1)
    }

    /// Clicks the subject, which must be a single actionable element
    pub fn click(self) -> Self {
        self.click_with(ClickOptions::default())
    }

    pub fn click_with(self, options: ClickOptions) -> Self {
        self.then(Stage::Click(options))
    }

    /// Types `text` into the subject one character at a time
    pub fn type_text(self, text: &str) -> Self {
        self.type_with(text, TypeOptions::default())
    }

    pub fn type_with(self, text: &str, options: TypeOptions) -> Self {
        self.then(Stage::Type(text.to_string(), options))
    }

    /// Empties the subject's value
    pub fn clear(self) -> Self {
        self.then(Stage::Clear)
    }

    /// Selects an option of the subject `<select>` by value or label
    pub fn select(self, option: impl Into<SelectOption>) -> Self {
        self.then(Stage::Select(option.into()))
    }

    pub fn check(self) -> Self {
        self.then(Stage::SetChecked(true, CheckOptions::default()))
    }

    pub fn uncheck(self) -> Self {
        self.then(Stage::SetChecked(false, CheckOptions::default()))
    }

    /// Checks or unchecks the subject
    pub fn set_checked(self, checked: bool, options: CheckOptions) -> Self {
        self.then(Stage::SetChecked(checked, options))
    }

    /// Asserts on the subject
    pub fn should(self, assertion: Assertion) -> Self {
        self.then(Stage::Should(assertion))
    }

    /// Overrides the session's default timeout for this chain
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the session's polling interval for this chain
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    fn policy(&self) -> RetryPolicy {
        let mut policy = self.session.retry_policy();
        if let Some(timeout) = self.timeout {
            policy = policy.with_timeout(timeout);
        }
        if let Some(interval) = self.poll_interval {
            policy = policy.with_interval(interval);
        }
        policy
    }

    /// Runs the chain until its last stage holds or the budget is spent
    ///
    /// Errors are wrapped in [`Error::Chain`] carrying the rendered chain.
    pub async fn run(self) -> Result<ElementSet> {
        let rendered = self.to_string();
        let policy = self.policy();
        let implicit = Stage::Should(Assertion::Exist);
        let mut stages = self.tail.stages();
        if !self.tail.stage.is_terminal() {
            stages.push(&implicit);
        }

        let span = tracing::debug_span!("chain", chain = %rendered);
        let session = self.session;
        let resume = Mutex::new(None);
        let mut run = RetryRun::new(policy);

        let result = run
            .run(|| attempt(session, &stages, &resume))
            .instrument(span.clone())
            .await;

        let _enter = span.enter();
        match result {
            Ok(subject) => {
                tracing::debug!(state = %run.state(), attempts = run.attempts(), "chain finished");
                Ok(subject)
            }
            Err(source) => {
                tracing::debug!(state = %run.state(), attempts = run.attempts(), error = %source, "chain failed");
                Err(Error::Chain {
                    chain: rendered,
                    source: Box::new(source),
                })
            }
        }
    }
}

/// Position and result of the last action performed by a run
type Resume = Mutex<Option<(usize, ElementSet)>>;

/// One pass over the stages, from the root or from just after the last
/// performed action
async fn attempt(session: &Session, stages: &[&Stage], resume: &Resume) -> Result<ElementSet> {
    let document = session.document()?;
    let document = document.as_ref();
    let resumed = resume.lock().clone();
    let (start, mut subject) = match resumed {
        Some((position, acted)) => (position + 1, acted),
        None => (0, ElementSet::empty()),
    };
    if start > 0 {
        tracing::trace!(from = start, "resuming after performed action");
    }

    for (position, stage) in stages.iter().enumerate().skip(start) {
        subject = match stage {
            Stage::Get(selector) => query::query(document, selector, None).await?,
            Stage::Find(selector) => query::query(document, selector, Some(&subject)).await?,
            Stage::FilterText(matcher) => query::filter_by_text(document, &subject, matcher).await?,
            Stage::Contains(text) => query::contains(document, &subject, text).await?,
            Stage::Nth(index) => query::nth(&subject, *index)?,
            Stage::Should(assertion) => {
                assertion.evaluate(document, &subject).await?;
                subject
            }
            action => {
                let acted = perform(document, action, &subject).await?;
                *resume.lock() = Some((position, acted.clone()));
                acted
            }
        };
    }
    Ok(subject)
}

async fn perform(
    document: &dyn crate::server::Document,
    stage: &Stage,
    subject: &ElementSet,
) -> Result<ElementSet> {
    match stage {
        Stage::Click(options) => actions::click(document, subject, options).await,
        Stage::Type(text, options) => actions::type_text(document, subject, text, options).await,
        Stage::Clear => actions::clear(document, subject).await,
        Stage::Select(option) => actions::select(document, subject, option).await,
        Stage::SetChecked(checked, options) => {
            actions::set_checked(document, subject, *checked, options).await
        }
        other => Err(Error::InvalidArgument(format!("{} is not an action", other))),
    }
}

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.tail.stages().into_iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("chain", &self.to_string())
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl<'s> IntoFuture for Chain<'s> {
    type Output = Result<ElementSet>;
    type IntoFuture = Pin<Box<dyn Future<Output = Result<ElementSet>> + Send + 's>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}
