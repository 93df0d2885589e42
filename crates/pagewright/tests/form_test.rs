// Integration tests for the form page
//
// Tests cover:
// - Typing into bound inputs and clearing them
// - Selecting options by value/label
// - Disabled/enabled state of the submit button
// - Alert interception after a delayed submit

use pagewright::{
    Assertion, DialogKind, DialogStub, Error, SelectOption, Session, expect,
};
use std::time::Duration;

mod common;

async fn assert_has_text(session: &Session, text: &str) -> pagewright::Result<()> {
    session
        .get("body")
        .contains(text)
        .should(Assertion::exist())
        .await
        .map(|_| ())
}

// ============================================================================
// Form flow
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_form_works() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/form/index.html").await;

    assert_has_text(&session, r#"username: "","#).await?;

    session.get("#username").type_text("Ferris").await?;

    assert_has_text(&session, r#"username: "Ferris","#).await?;

    session.get("button").contains("Clear").click().await?;

    assert_has_text(&session, r#"username: "","#).await?;

    assert_has_text(&session, r#"plan: "C3""#).await?;

    session.get("select").select("D4").await?;

    assert_has_text(&session, r#"plan: "D4""#).await?;

    session
        .get("button")
        .contains("Submit")
        .should("be.disabled".parse()?)
        .await?;

    session.get("button").contains("Agree").click().await?;

    session
        .get("button")
        .contains("Submit")
        .should("be.enabled".parse()?)
        .await?;

    let stub = DialogStub::new();
    session.intercept(DialogKind::Alert, stub.handler());

    session.get("#username").type_text("Ferris").await?;
    session.get("#password").type_text("hunter2").await?;

    session.get("button").contains("Submit").click().await?;
    session.wait(Duration::from_millis(1200)).await;

    stub.assert_nth_called_with(
        0,
        r#"Submitted: Form {
    username: "Ferris",
    password: "hunter2",
    accept: true,
    plan: "D4",
    is_submitting: false,
}"#,
    )?;
    assert_eq!(stub.call_count(), 1);
    assert_eq!(session.intercepted().len(), 1);

    session.close().await;
    Ok(())
}

// ============================================================================
// Inputs
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_typed_value_mirrors_state() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/form/index.html").await;

    session
        .get("#password")
        .type_with("hunter2", pagewright::TypeOptions::builder().delay(10).build())
        .await?;
    expect(session.get("#password")).to_have_value("hunter2").await?;
    expect(session.get("#password")).to_be_focused().await?;
    expect(session.get("pre")).to_contain_text(r#"password: "hunter2","#).await?;

    session.get("#password").clear().await?;
    expect(session.get("#password")).to_have_value("").await?;
    expect(session.get("pre")).to_contain_text(r#"password: "","#).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_type_into_non_input_is_fatal() {
    common::init_tracing();
    let session = test_site::visit("/form/index.html").await;

    let start = tokio::time::Instant::now();
    let err = session.get("pre").type_text("x").await.unwrap_err();
    assert!(matches!(err.root_cause(), Error::NotFocusable(_)), "{err}");
    // fatal errors do not wait for the retry budget
    assert_eq!(start.elapsed(), Duration::ZERO);
}

// ============================================================================
// Select and checkbox
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_select_variants() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/form/index.html").await;

    expect(session.get("#plan")).to_have_value("C3").await?;
    session.get("#plan").select(SelectOption::Index(0)).await?;
    expect(session.get("#plan")).to_have_value("A1").await?;
    session
        .get("#plan")
        .select(SelectOption::Label("E5".into()))
        .await?;
    expect(session.get("pre")).to_contain_text(r#"plan: "E5""#).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_missing_option_is_fatal() {
    common::init_tracing();
    let session = test_site::visit("/form/index.html").await;

    let err = session.get("select").select("Z9").await.unwrap_err();
    match err.root_cause() {
        Error::OptionNotFound { option, select } => {
            assert_eq!(option, "\"Z9\"");
            assert_eq!(select, "select#plan");
        }
        other => panic!("expected OptionNotFound, got {other:?}"),
    }
    assert!(!err.is_timeout());
    assert!(
        err.to_string().contains(r#"selecting "Z9" in <select>"#),
        "{err}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_checkbox_toggles_agreement() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/form/index.html").await;

    expect(session.get("#accept")).to_be_unchecked().await?;
    session.get("#accept").check().await?;
    expect(session.get("#accept")).to_be_checked().await?;
    expect(session.get("button").contains("Agree")).to_be_disabled().await?;
    expect(session.get("button").contains("Submit")).to_be_enabled().await?;

    // already checked: no click, no state change
    session.get("#accept").check().await?;
    expect(session.get("#accept")).to_be_checked().await?;

    session.get("button").contains("Disagree").click().await?;
    expect(session.get("#accept")).to_be_unchecked().await?;
    expect(session.get("pre")).to_contain_text("accept: false").await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disabled_button_click_times_out() {
    common::init_tracing();
    let session = test_site::visit("/form/index.html").await;

    let err = session
        .get("button")
        .contains("Submit")
        .click()
        .with_timeout(Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(err.to_string().contains("is disabled"), "{err}");
    assert!(
        err.to_string()
            .contains(r#"in chain: get("button").contains("Submit").click()"#),
        "{err}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_submit_re_enables_after_notify() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/form/index.html").await;
    let stub = DialogStub::new();
    session.intercept(DialogKind::Alert, stub.handler());

    session.get("button").contains("Agree").click().await?;
    session.get("button").contains("Submit").click().await?;
    expect(session.get("button").filter_text("Submitting..."))
        .to_be_disabled()
        .await?;

    // retries across the delayed re-render
    let start = tokio::time::Instant::now();
    expect(session.get("button").filter_text("Submit"))
        .to_be_enabled()
        .await?;
    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert_eq!(stub.call_count(), 1);
    Ok(())
}
