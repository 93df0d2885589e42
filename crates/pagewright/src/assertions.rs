// Assertions - predicates over a chain's subject
//
// `Assertion` is the data a `should` stage carries; the chain interpreter
// evaluates it on every attempt. `expect()` is the builder-style front end:
// it appends the assertion to a chain and runs it under the chain's retry
// budget.

use crate::error::{Error, Result};
use crate::protocol::chain::Chain;
use crate::protocol::query::ElementSet;
use crate::server::{Document, ElementSnapshot};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A predicate over the subject of a chain
///
/// Element-state predicates fail with `NotFound` on an empty subject, so a
/// chain keeps retrying until the element shows up. Every failure is
/// recoverable.
///
/// # Example
///
/// ```ignore
/// use pagewright::Assertion;
///
/// session.get("div").contains("7").should(Assertion::have_text("- 7 + Reset")).await?;
/// session.get("button").contains("+").should(Assertion::exist().not()).await?;
/// session.get("button").contains("Submit").should("be.disabled".parse()?).await?;
/// ```
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Subject is non-empty
    Exist,
    /// Subject has exactly `n` elements
    HaveLength(usize),
    /// Concatenated text of the subject equals the string
    HaveText(String),
    /// Concatenated text of the subject contains the string
    ContainText(String),
    /// Concatenated text of the subject matches the pattern
    MatchText(Regex),
    /// Value of the first element equals the string
    HaveValue(String),
    BeEnabled,
    BeDisabled,
    BeVisible,
    BeHidden,
    BeChecked,
    BeUnchecked,
    BeEditable,
    BeFocused,
    /// Passes when the inner assertion fails with `AssertionFailed`
    Not(Box<Assertion>),
}

impl Assertion {
    pub fn exist() -> Self {
        Assertion::Exist
    }

    pub fn have_length(n: usize) -> Self {
        Assertion::HaveLength(n)
    }

    pub fn have_text(text: impl Into<String>) -> Self {
        Assertion::HaveText(text.into())
    }

    pub fn contain_text(text: impl Into<String>) -> Self {
        Assertion::ContainText(text.into())
    }

    pub fn match_text(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Assertion::MatchText)
            .map_err(|e| Error::InvalidArgument(format!("Invalid regex: {}", e)))
    }

    pub fn have_value(value: impl Into<String>) -> Self {
        Assertion::HaveValue(value.into())
    }

    /// Negates the assertion; double negation cancels out.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self {
            Assertion::Not(inner) => *inner,
            other => Assertion::Not(Box::new(other)),
        }
    }

    /// Evaluates against the current state of `subject`
    ///
    /// Elements detached by a re-render since the subject was resolved count
    /// as absent.
    pub(crate) async fn evaluate(&self, document: &dyn Document, subject: &ElementSet) -> Result<()> {
        let mut snapshots = Vec::with_capacity(subject.len());
        for handle in subject {
            match document.snapshot(handle).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(Error::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.check(snapshots.len(), &snapshots)
    }

    fn check(&self, len: usize, snapshots: &[ElementSnapshot]) -> Result<()> {
        let failed = |detail: String| Err(Error::AssertionFailed(format!("expected to {}, {}", self, detail)));
        match self {
            Assertion::Exist => {
                if len > 0 {
                    Ok(())
                } else {
                    failed("but found no elements".into())
                }
            }
            Assertion::HaveLength(n) => {
                if len == *n {
                    Ok(())
                } else {
                    failed(format!("but found {}", len))
                }
            }
            Assertion::Not(inner) => match inner.check(len, snapshots) {
                Ok(()) => Err(Error::AssertionFailed(format!("expected {}, but it held", self))),
                Err(Error::AssertionFailed(_)) => Ok(()),
                Err(e) => Err(e),
            },
            _ if snapshots.is_empty() => Err(Error::NotFound(format!(
                "expected to {}, but the subject is empty",
                self
            ))),
            Assertion::HaveText(expected) => {
                let actual = joined_text(snapshots);
                if actual == *expected {
                    Ok(())
                } else {
                    failed(format!("but had {:?}", actual))
                }
            }
            Assertion::ContainText(expected) => {
                let actual = joined_text(snapshots);
                if actual.contains(expected.as_str()) {
                    Ok(())
                } else {
                    failed(format!("but had {:?}", actual))
                }
            }
            Assertion::MatchText(re) => {
                let actual = joined_text(snapshots);
                if re.is_match(&actual) {
                    Ok(())
                } else {
                    failed(format!("but had {:?}", actual))
                }
            }
            Assertion::HaveValue(expected) => match &snapshots[0].value {
                Some(actual) if actual == expected => Ok(()),
                Some(actual) => failed(format!("but had {:?}", actual)),
                None => failed(format!("but <{}> has no value", snapshots[0].tag_name)),
            },
            Assertion::BeEnabled => every(snapshots, |s| s.enabled, "disabled", failed),
            Assertion::BeDisabled => every(snapshots, |s| !s.enabled, "enabled", failed),
            Assertion::BeVisible => every(snapshots, |s| s.visible, "hidden", failed),
            Assertion::BeHidden => every(snapshots, |s| !s.visible, "visible", failed),
            Assertion::BeChecked => every(snapshots, |s| s.checked == Some(true), "not checked", failed),
            Assertion::BeUnchecked => every(snapshots, |s| s.checked == Some(false), "checked", failed),
            Assertion::BeEditable => every(snapshots, |s| s.editable && s.enabled, "not editable", failed),
            Assertion::BeFocused => every(snapshots, |s| s.focused, "not focused", failed),
        }
    }
}

fn joined_text(snapshots: &[ElementSnapshot]) -> String {
    snapshots.iter().map(|s| s.text_content.as_str()).collect()
}

fn every<F>(
    snapshots: &[ElementSnapshot],
    holds: impl Fn(&ElementSnapshot) -> bool,
    otherwise: &str,
    failed: F,
) -> Result<()>
where
    F: Fn(String) -> Result<()>,
{
    match snapshots.iter().find(|s| !holds(*s)) {
        None => Ok(()),
        Some(s) => failed(format!("but <{}> {:?} is {}", s.tag_name, s.text_content, otherwise)),
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Exist => write!(f, "exist"),
            Assertion::HaveLength(n) => write!(f, "have.length {}", n),
            Assertion::HaveText(text) => write!(f, "have.text {:?}", text),
            Assertion::ContainText(text) => write!(f, "contain.text {:?}", text),
            Assertion::MatchText(re) => write!(f, "match.text /{}/", re.as_str()),
            Assertion::HaveValue(value) => write!(f, "have.value {:?}", value),
            Assertion::BeEnabled => write!(f, "be.enabled"),
            Assertion::BeDisabled => write!(f, "be.disabled"),
            Assertion::BeVisible => write!(f, "be.visible"),
            Assertion::BeHidden => write!(f, "be.hidden"),
            Assertion::BeChecked => write!(f, "be.checked"),
            Assertion::BeUnchecked => write!(f, "be.unchecked"),
            Assertion::BeEditable => write!(f, "be.editable"),
            Assertion::BeFocused => write!(f, "be.focused"),
            Assertion::Not(inner) => write!(f, "not.{}", inner),
        }
    }
}

/// Parses argument-free chainers such as `"exist"`, `"not.exist"` or
/// `"be.disabled"`.
impl FromStr for Assertion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("not.") {
            return rest.parse::<Assertion>().map(Assertion::not);
        }
        match s {
            "exist" => Ok(Assertion::Exist),
            "be.enabled" => Ok(Assertion::BeEnabled),
            "be.disabled" => Ok(Assertion::BeDisabled),
            "be.visible" => Ok(Assertion::BeVisible),
            "be.hidden" => Ok(Assertion::BeHidden),
            "be.checked" => Ok(Assertion::BeChecked),
            "be.unchecked" => Ok(Assertion::BeUnchecked),
            "be.editable" => Ok(Assertion::BeEditable),
            "be.focused" => Ok(Assertion::BeFocused),
            other => Err(Error::InvalidArgument(format!(
                "unknown assertion '{}' (chainers with arguments use the Assertion constructors)",
                other
            ))),
        }
    }
}

/// Creates an expectation for a chain with auto-retry behavior.
///
/// The expectation runs under the chain's session defaults unless
/// `with_timeout` / `with_poll_interval` override them.
///
/// # Example
///
/// ```ignore
/// use pagewright::expect;
/// use std::time::Duration;
///
/// expect(session.get("button").contains("Submit")).to_be_disabled().await?;
/// expect(session.get("button").contains("Agree")).not().to_be_disabled().await?;
/// expect(session.get("div").filter_text("- 0 + Reset Remove"))
///     .with_timeout(Duration::from_secs(10))
///     .to_have_count(6)
///     .await?;
/// ```
pub fn expect(chain: Chain<'_>) -> Expectation<'_> {
    Expectation::new(chain)
}

/// Expectation wraps a chain and provides assertion methods with auto-retry.
pub struct Expectation<'s> {
    chain: Chain<'s>,
    timeout: Option<Duration>,
    poll_interval: Option<Duration>,
    negate: bool,
}

// to_* methods consume self, matching the expect(...).to_*() call pattern
#[allow(clippy::wrong_self_convention)]
impl<'s> Expectation<'s> {
    pub(crate) fn new(chain: Chain<'s>) -> Self {
        Self {
            chain,
            timeout: None,
            poll_interval: None,
            negate: false,
        }
    }

    /// Sets a custom timeout for this assertion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets a custom poll interval for this assertion.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Negates the assertion.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    async fn assert(self, assertion: Assertion) -> Result<()> {
        let assertion = if self.negate { assertion.not() } else { assertion };
        let mut chain = self.chain.should(assertion);
        if let Some(timeout) = self.timeout {
            chain = chain.with_timeout(timeout);
        }
        if let Some(interval) = self.poll_interval {
            chain = chain.with_poll_interval(interval);
        }
        chain.run().await.map(|_| ())
    }

    /// Asserts that the subject is non-empty.
    pub async fn to_exist(self) -> Result<()> {
        self.assert(Assertion::Exist).await
    }

    /// Asserts that the subject has exactly `count` elements.
    pub async fn to_have_count(self, count: usize) -> Result<()> {
        self.assert(Assertion::HaveLength(count)).await
    }

    /// Asserts that the subject's text equals `expected` exactly.
    pub async fn to_have_text(self, expected: &str) -> Result<()> {
        self.assert(Assertion::have_text(expected)).await
    }

    /// Asserts that the subject's text contains `expected`.
    pub async fn to_contain_text(self, expected: &str) -> Result<()> {
        self.assert(Assertion::contain_text(expected)).await
    }

    /// Asserts that the subject's text matches the regex pattern.
    pub async fn to_have_text_regex(self, pattern: &str) -> Result<()> {
        let assertion = Assertion::match_text(pattern)?;
        self.assert(assertion).await
    }

    /// Asserts that the first element's value equals `expected`.
    pub async fn to_have_value(self, expected: &str) -> Result<()> {
        self.assert(Assertion::have_value(expected)).await
    }

    pub async fn to_be_enabled(self) -> Result<()> {
        self.assert(Assertion::BeEnabled).await
    }

    pub async fn to_be_disabled(self) -> Result<()> {
        self.assert(Assertion::BeDisabled).await
    }

    pub async fn to_be_visible(self) -> Result<()> {
        self.assert(Assertion::BeVisible).await
    }

    pub async fn to_be_hidden(self) -> Result<()> {
        self.assert(Assertion::BeHidden).await
    }

    pub async fn to_be_checked(self) -> Result<()> {
        self.assert(Assertion::BeChecked).await
    }

    pub async fn to_be_unchecked(self) -> Result<()> {
        self.assert(Assertion::BeUnchecked).await
    }

    pub async fn to_be_editable(self) -> Result<()> {
        self.assert(Assertion::BeEditable).await
    }

    pub async fn to_be_focused(self) -> Result<()> {
        self.assert(Assertion::BeFocused).await
    }
}
