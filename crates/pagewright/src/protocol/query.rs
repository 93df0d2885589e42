// Element queries
//
// Pure reads of the current document: selector queries, text filters and
// positional picks. Nothing here retries or caches. The chain interpreter
// calls these again on every attempt so handles never outlive the DOM they
// came from.

use crate::error::{Error, Result};
use crate::server::{Document, ElementHandle};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Ordered result of a query at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSet {
    handles: Vec<ElementHandle>,
}

impl ElementSet {
    pub fn new(handles: Vec<ElementHandle>) -> Self {
        Self { handles }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handles(&self) -> &[ElementHandle] {
        &self.handles
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementHandle> {
        self.handles.iter()
    }

    pub fn first(&self) -> Option<ElementHandle> {
        self.handles.first().copied()
    }

    /// The only element of the set, for actions.
    ///
    /// An empty set is `NotFound`; more than one element is `NotActionable`
    /// (both recoverable, as the set may still narrow down).
    pub fn single(&self, action: &str) -> Result<ElementHandle> {
        match self.handles.as_slice() {
            [one] => Ok(*one),
            [] => Err(Error::NotFound(format!("{} needs an element, subject is empty", action))),
            many => Err(Error::NotActionable(format!(
                "{} needs a single element, subject has {}",
                action,
                many.len()
            ))),
        }
    }
}

impl From<Vec<ElementHandle>> for ElementSet {
    fn from(handles: Vec<ElementHandle>) -> Self {
        Self::new(handles)
    }
}

impl<'a> IntoIterator for &'a ElementSet {
    type Item = &'a ElementHandle;
    type IntoIter = std::slice::Iter<'a, ElementHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.iter()
    }
}

/// How `filter_text` compares an element's text content
///
/// # Example
///
/// ```ignore
/// use pagewright::TextMatcher;
///
/// let exact: TextMatcher = "- 0 + Reset Remove".into();
/// let partial = TextMatcher::contains("Reset");
/// let pattern = TextMatcher::pattern(r"^- -?\d+ \+")?;
/// let custom = TextMatcher::predicate(|text| text.len() > 3);
/// ```
#[derive(Clone)]
pub enum TextMatcher {
    /// Text content equals the literal exactly
    Exact(String),
    /// Text content contains the literal
    Contains(String),
    /// Text content matches the regular expression
    Pattern(Regex),
    /// Text content satisfies the predicate
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl TextMatcher {
    pub fn exact(text: impl Into<String>) -> Self {
        TextMatcher::Exact(text.into())
    }

    pub fn contains(text: impl Into<String>) -> Self {
        TextMatcher::Contains(text.into())
    }

    /// Compiles `pattern`; fails with `InvalidArgument` when it is not a
    /// valid regular expression.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(TextMatcher::Pattern)
            .map_err(|e| Error::InvalidArgument(format!("text pattern '{}': {}", pattern, e)))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        TextMatcher::Predicate(Arc::new(f))
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatcher::Exact(expected) => text == expected,
            TextMatcher::Contains(needle) => text.contains(needle.as_str()),
            TextMatcher::Pattern(re) => re.is_match(text),
            TextMatcher::Predicate(f) => f(text),
        }
    }
}

impl From<&str> for TextMatcher {
    fn from(text: &str) -> Self {
        TextMatcher::exact(text)
    }
}

impl From<String> for TextMatcher {
    fn from(text: String) -> Self {
        TextMatcher::Exact(text)
    }
}

impl From<Regex> for TextMatcher {
    fn from(re: Regex) -> Self {
        TextMatcher::Pattern(re)
    }
}

impl fmt::Display for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMatcher::Exact(text) => write!(f, "{:?}", text),
            TextMatcher::Contains(text) => write!(f, "*{:?}*", text),
            TextMatcher::Pattern(re) => write!(f, "/{}/", re.as_str()),
            TextMatcher::Predicate(_) => write!(f, "<predicate>"),
        }
    }
}

impl fmt::Debug for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextMatcher({})", self)
    }
}

/// Elements matching `selector`, in document order. With `within`, only
/// descendants of those elements.
pub async fn query(
    document: &dyn Document,
    selector: &str,
    within: Option<&ElementSet>,
) -> Result<ElementSet> {
    let handles = document
        .query_selector_all(selector, within.map(ElementSet::handles))
        .await?;
    tracing::trace!(selector, count = handles.len(), "query");
    Ok(ElementSet::new(handles))
}

/// Elements of `set` whose text content satisfies `matcher`
pub async fn filter_by_text(
    document: &dyn Document,
    set: &ElementSet,
    matcher: &TextMatcher,
) -> Result<ElementSet> {
    let mut kept = Vec::new();
    for handle in set {
        let snapshot = document.snapshot(handle).await?;
        if matcher.matches(&snapshot.text_content) {
            kept.push(*handle);
        }
    }
    Ok(ElementSet::new(kept))
}

/// The first element of `set` whose text contains `text`, or an empty set
pub async fn contains(document: &dyn Document, set: &ElementSet, text: &str) -> Result<ElementSet> {
    for handle in set {
        let snapshot = document.snapshot(handle).await?;
        if snapshot.text_content.contains(text) {
            return Ok(ElementSet::new(vec![*handle]));
        }
    }
    Ok(ElementSet::empty())
}

/// The element at `index`; negative indexes count from the end.
pub fn nth(set: &ElementSet, index: isize) -> Result<ElementSet> {
    let len = set.len() as isize;
    let position = if index < 0 { len + index } else { index };
    if position < 0 || position >= len {
        return Err(Error::NotFound(format!(
            "index {} is out of range for {} element(s)",
            index,
            set.len()
        )));
    }
    Ok(ElementSet::new(vec![set.handles[position as usize]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(n: usize) -> ElementSet {
        ElementSet::new((0..n).map(|i| ElementHandle::new(i, 0)).collect())
    }

    #[test]
    fn test_nth_positive_and_negative() {
        let s = set(4);
        assert_eq!(nth(&s, 2).unwrap().first(), Some(ElementHandle::new(2, 0)));
        assert_eq!(nth(&s, -1).unwrap().first(), Some(ElementHandle::new(3, 0)));
        assert_eq!(nth(&s, -4).unwrap().first(), Some(ElementHandle::new(0, 0)));
    }

    #[test]
    fn test_nth_out_of_range_is_not_found() {
        let s = set(2);
        assert!(matches!(nth(&s, 2), Err(Error::NotFound(_))));
        assert!(matches!(nth(&s, -3), Err(Error::NotFound(_))));
        assert!(matches!(nth(&ElementSet::empty(), 0), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_single() {
        assert!(set(1).single("click").is_ok());
        assert!(matches!(set(0).single("click"), Err(Error::NotFound(_))));
        let err = set(3).single("click").unwrap_err();
        assert!(matches!(err, Error::NotActionable(_)));
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn test_text_matchers() {
        assert!(TextMatcher::from("+").matches("+"));
        assert!(!TextMatcher::from("+").matches(" + "));
        assert!(TextMatcher::contains("Reset").matches("- 0 + Reset"));
        assert!(TextMatcher::pattern(r"^-?\d+$").unwrap().matches("-10"));
        assert!(TextMatcher::predicate(|t| t.starts_with('-')).matches("-"));
        assert!(matches!(
            TextMatcher::pattern("(unclosed"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_text_matcher_display() {
        assert_eq!(TextMatcher::from("a").to_string(), "\"a\"");
        assert_eq!(TextMatcher::contains("a").to_string(), "*\"a\"*");
        assert_eq!(TextMatcher::pattern("a+").unwrap().to_string(), "/a+/");
    }
}
