// Actions - one-shot interactions with a resolved subject
//
// Every action checks actionability against a fresh snapshot, then drives the
// document exactly once. Nothing here retries: a NotActionable or NotFound
// result goes back to the chain interpreter, which decides whether to replay.

use super::action_options::{CheckOptions, ClickOptions, TypeOptions};
use super::query::ElementSet;
use super::select_option::SelectOption;
use crate::error::{Error, Result};
use crate::server::{Document, ElementSnapshot};

fn describe(snapshot: &ElementSnapshot) -> String {
    let text: String = snapshot.text_content.chars().take(40).collect();
    if text.is_empty() {
        format!("<{}>", snapshot.tag_name)
    } else {
        format!("<{}> {:?}", snapshot.tag_name, text)
    }
}

/// Visible, enabled and not covered
fn ensure_actionable(snapshot: &ElementSnapshot) -> Result<()> {
    let reason = if !snapshot.visible {
        "is not visible"
    } else if !snapshot.enabled {
        "is disabled"
    } else if snapshot.covered {
        "is covered by another element"
    } else {
        return Ok(());
    };
    Err(Error::NotActionable(format!("{} {}", describe(snapshot), reason)))
}

fn ensure_editable(snapshot: &ElementSnapshot) -> Result<()> {
    if snapshot.editable {
        Ok(())
    } else {
        Err(Error::NotFocusable(format!(
            "{} cannot receive text input",
            describe(snapshot)
        )))
    }
}

/// Clicks the subject's only element
pub async fn click(
    document: &dyn Document,
    subject: &ElementSet,
    options: &ClickOptions,
) -> Result<ElementSet> {
    let element = subject.single("click")?;
    let snapshot = document.snapshot(&element).await?;
    if !options.is_forced() {
        ensure_actionable(&snapshot)?;
    }
    if options.is_trial() {
        return Ok(subject.clone());
    }
    let target = describe(&snapshot);
    tracing::debug!(element = %target, "click");
    document
        .click(&element)
        .await
        .map_err(|e| e.context(format!("clicking {}", target)))?;
    Ok(subject.clone())
}

/// Focuses the subject and appends `text` one character at a time
pub async fn type_text(
    document: &dyn Document,
    subject: &ElementSet,
    text: &str,
    options: &TypeOptions,
) -> Result<ElementSet> {
    let element = subject.single("type")?;
    let snapshot = document.snapshot(&element).await?;
    ensure_editable(&snapshot)?;
    ensure_actionable(&snapshot)?;

    let target = describe(&snapshot);
    tracing::debug!(element = %target, text, "type");
    document
        .focus(&element)
        .await
        .map_err(|e| e.context(format!("focusing {}", target)))?;
    let delay = options.keystroke_delay();
    for (typed, ch) in text.chars().enumerate() {
        document
            .insert_char(&element, ch)
            .await
            .map_err(|e| e.context(format!("typing into {} after {} character(s)", target, typed)))?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(subject.clone())
}

/// Empties the subject's value
pub async fn clear(document: &dyn Document, subject: &ElementSet) -> Result<ElementSet> {
    let element = subject.single("clear")?;
    let snapshot = document.snapshot(&element).await?;
    ensure_editable(&snapshot)?;
    ensure_actionable(&snapshot)?;

    let target = describe(&snapshot);
    tracing::debug!(element = %target, "clear");
    document.focus(&element).await?;
    document
        .clear_value(&element)
        .await
        .map_err(|e| e.context(format!("clearing {}", target)))?;
    Ok(subject.clone())
}

/// Selects an option of the subject `<select>`
pub async fn select(
    document: &dyn Document,
    subject: &ElementSet,
    option: &SelectOption,
) -> Result<ElementSet> {
    let element = subject.single("select")?;
    let snapshot = document.snapshot(&element).await?;
    if snapshot.tag_name != "select" {
        return Err(Error::InvalidArgument(format!(
            "select() requires a <select>, got {}",
            describe(&snapshot)
        )));
    }
    ensure_actionable(&snapshot)?;

    let value = document
        .select_option(&element, option)
        .await
        .map_err(|e| e.context(format!("selecting {} in {}", option, describe(&snapshot))))?;
    tracing::debug!(%option, value = %value, "select");
    Ok(subject.clone())
}

/// Clicks a checkbox or radio only when its state differs from `checked`
pub async fn set_checked(
    document: &dyn Document,
    subject: &ElementSet,
    checked: bool,
    options: &CheckOptions,
) -> Result<ElementSet> {
    let action = if checked { "check" } else { "uncheck" };
    let element = subject.single(action)?;
    let snapshot = document.snapshot(&element).await?;
    let Some(current) = snapshot.checked else {
        return Err(Error::InvalidArgument(format!(
            "{}() requires a checkbox or radio, got {}",
            action,
            describe(&snapshot)
        )));
    };
    if current == checked {
        return Ok(subject.clone());
    }
    if !options.is_forced() {
        ensure_actionable(&snapshot)?;
    }

    let target = describe(&snapshot);
    tracing::debug!(element = %target, action, "toggle");
    document
        .click(&element)
        .await
        .map_err(|e| e.context(format!("{}ing {}", action, target)))?;
    Ok(subject.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tag: &str) -> ElementSnapshot {
        ElementSnapshot {
            tag_name: tag.to_string(),
            text_content: String::new(),
            value: None,
            visible: true,
            enabled: true,
            editable: false,
            checked: None,
            covered: false,
            focused: false,
        }
    }

    #[test]
    fn test_actionability_reasons() {
        assert!(ensure_actionable(&snapshot("button")).is_ok());

        let hidden = ElementSnapshot {
            visible: false,
            ..snapshot("button")
        };
        let err = ensure_actionable(&hidden).unwrap_err();
        assert!(matches!(err, Error::NotActionable(_)));
        assert!(err.to_string().contains("not visible"));

        let disabled = ElementSnapshot {
            enabled: false,
            text_content: "Submit".into(),
            ..snapshot("button")
        };
        let err = ensure_actionable(&disabled).unwrap_err();
        assert!(err.to_string().contains("<button> \"Submit\" is disabled"), "{err}");

        let covered = ElementSnapshot {
            covered: true,
            ..snapshot("button")
        };
        assert!(ensure_actionable(&covered).unwrap_err().to_string().contains("covered"));
    }

    #[test]
    fn test_not_editable_is_fatal() {
        let err = ensure_editable(&snapshot("div")).unwrap_err();
        assert!(matches!(err, Error::NotFocusable(_)));
        assert!(!err.is_recoverable());
    }
}
