// Action options for chain actions
//
// Provides configuration for click, type and check actions.

use serde::Serialize;
use std::time::Duration;

/// Click options
///
/// # Example
///
/// ```ignore
/// use pagewright::ClickOptions;
///
/// // Click even when the element is hidden or disabled
/// let options = ClickOptions::builder().force(true).build();
///
/// // Actionability checks only, no click
/// let options = ClickOptions::builder().trial(true).build();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickOptions {
    /// Whether to bypass actionability checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    /// Perform actionability checks without clicking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial: Option<bool>,
}

impl ClickOptions {
    /// Create a new builder for ClickOptions
    pub fn builder() -> ClickOptionsBuilder {
        ClickOptionsBuilder::default()
    }

    pub(crate) fn is_forced(&self) -> bool {
        self.force.unwrap_or(false)
    }

    pub(crate) fn is_trial(&self) -> bool {
        self.trial.unwrap_or(false)
    }
}

/// Builder for ClickOptions
#[derive(Debug, Clone, Default)]
pub struct ClickOptionsBuilder {
    force: Option<bool>,
    trial: Option<bool>,
}

impl ClickOptionsBuilder {
    /// Bypass actionability checks
    pub fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    /// Check actionability without clicking
    pub fn trial(mut self, trial: bool) -> Self {
        self.trial = Some(trial);
        self
    }

    /// Build the ClickOptions
    pub fn build(self) -> ClickOptions {
        ClickOptions {
            force: self.force,
            trial: self.trial,
        }
    }
}

/// Type options
///
/// Configuration options for `type_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeOptions {
    /// Time to wait between keystrokes in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

impl TypeOptions {
    /// Create a new builder for TypeOptions
    pub fn builder() -> TypeOptionsBuilder {
        TypeOptionsBuilder::default()
    }

    pub(crate) fn keystroke_delay(&self) -> Option<Duration> {
        self.delay
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Builder for TypeOptions
#[derive(Debug, Clone, Default)]
pub struct TypeOptionsBuilder {
    delay: Option<u64>,
}

impl TypeOptionsBuilder {
    /// Set delay between keystrokes in milliseconds
    pub fn delay(mut self, delay: u64) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Build the TypeOptions
    pub fn build(self) -> TypeOptions {
        TypeOptions { delay: self.delay }
    }
}

/// Check options
///
/// Configuration options for `check` and `uncheck`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOptions {
    /// Whether to bypass actionability checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl CheckOptions {
    /// Create a new builder for CheckOptions
    pub fn builder() -> CheckOptionsBuilder {
        CheckOptionsBuilder::default()
    }

    pub(crate) fn is_forced(&self) -> bool {
        self.force.unwrap_or(false)
    }
}

/// Builder for CheckOptions
#[derive(Debug, Clone, Default)]
pub struct CheckOptionsBuilder {
    force: Option<bool>,
}

impl CheckOptionsBuilder {
    /// Bypass actionability checks
    pub fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    /// Build the CheckOptions
    pub fn build(self) -> CheckOptions {
        CheckOptions { force: self.force }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_options_serialization() {
        let options = ClickOptions::builder().force(true).build();
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json, serde_json::json!({ "force": true }));
        assert!(options.is_forced());
        assert!(!options.is_trial());
    }

    #[test]
    fn test_type_options_delay() {
        assert_eq!(TypeOptions::default().keystroke_delay(), None);
        assert_eq!(TypeOptions::builder().delay(0).build().keystroke_delay(), None);
        assert_eq!(
            TypeOptions::builder().delay(20).build().keystroke_delay(),
            Some(Duration::from_millis(20))
        );
    }

    #[test]
    fn test_check_options_default() {
        let options = CheckOptions::default();
        assert!(!options.is_forced());
        assert_eq!(serde_json::to_value(&options).unwrap(), serde_json::json!({}));
    }
}
