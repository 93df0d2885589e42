// Select option variants for dropdown selection
//
// Provides different ways to select options: by value, label, either, or index.

use std::fmt;

/// Select option variant
///
/// Represents different ways to select an option in a `<select>` element.
///
/// # Example
///
/// ```ignore
/// use pagewright::SelectOption;
///
/// // Select by value or visible label (what a plain string converts to)
/// let opt: SelectOption = "D4".into();
///
/// // Select by option value attribute only
/// let opt = SelectOption::Value("d4".to_string());
///
/// // Select by index (0-based)
/// let opt = SelectOption::Index(3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOption {
    /// Select by option value or label, value first
    Text(String),
    /// Select by option value attribute
    Value(String),
    /// Select by option label (visible text)
    Label(String),
    /// Select by option index (0-based)
    Index(usize),
}

impl SelectOption {
    /// Index of the first option matching this variant.
    ///
    /// `options` yields `(value, label)` pairs in document order. For `Text`,
    /// a value match anywhere wins over a label match.
    pub fn position<'a, I>(&self, options: I) -> Option<usize>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let options: Vec<(&str, &str)> = options.into_iter().collect();
        match self {
            SelectOption::Value(v) => options.iter().position(|(value, _)| *value == v.as_str()),
            SelectOption::Label(l) => options
                .iter()
                .position(|(_, label)| label.trim() == l.as_str()),
            SelectOption::Text(t) => options
                .iter()
                .position(|(value, _)| *value == t.as_str())
                .or_else(|| options.iter().position(|(_, label)| label.trim() == t.as_str())),
            SelectOption::Index(i) => (*i < options.len()).then_some(*i),
        }
    }
}

impl fmt::Display for SelectOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectOption::Text(t) => write!(f, "{:?}", t),
            SelectOption::Value(v) => write!(f, "value={:?}", v),
            SelectOption::Label(l) => write!(f, "label={:?}", l),
            SelectOption::Index(i) => write!(f, "index={}", i),
        }
    }
}

// Implement From<&str> for convenience - matches value or label
impl From<&str> for SelectOption {
    fn from(value: &str) -> Self {
        SelectOption::Text(value.to_string())
    }
}

// Implement From<String> for convenience - matches value or label
impl From<String> for SelectOption {
    fn from(value: String) -> Self {
        SelectOption::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANS: [(&str, &str); 3] = [("a1", "A1"), ("b2", "B2"), ("C3", "c3 plan")];

    #[test]
    fn test_select_option_value() {
        let opt = SelectOption::Value("b2".to_string());
        assert_eq!(opt.position(PLANS), Some(1));
        assert_eq!(SelectOption::Value("B2".to_string()).position(PLANS), None);
    }

    #[test]
    fn test_select_option_label() {
        let opt = SelectOption::Label("c3 plan".to_string());
        assert_eq!(opt.position(PLANS), Some(2));
    }

    #[test]
    fn test_select_option_text_prefers_value() {
        assert_eq!(SelectOption::from("B2").position(PLANS), Some(1));
        assert_eq!(SelectOption::from("C3").position(PLANS), Some(2));
        assert_eq!(SelectOption::from("Z9").position(PLANS), None);
    }

    #[test]
    fn test_select_option_index() {
        assert_eq!(SelectOption::Index(2).position(PLANS), Some(2));
        assert_eq!(SelectOption::Index(3).position(PLANS), None);
    }

    #[test]
    fn test_from_string() {
        let opt: SelectOption = String::from("my-value").into();
        assert_eq!(opt, SelectOption::Text("my-value".to_string()));
        assert_eq!(opt.to_string(), "\"my-value\"");
    }
}
