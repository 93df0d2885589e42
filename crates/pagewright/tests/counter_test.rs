// Integration tests for the counter page
//
// Tests cover:
// - Repeated "+" and "-" clicks through contains()
// - Exact have.text assertions on the widget text
// - Negative values (no clamping)

use pagewright::{Assertion, expect};

mod common;

// ============================================================================
// Counter flow
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_counter_works() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/counter/index.html").await;

    for _ in 0..7 {
        session.get("button").contains("+").click().await?;
    }
    session
        .get("div")
        .contains("7")
        .should(Assertion::have_text("- 7 + Reset"))
        .await?;

    for _ in 0..14 {
        session.get("button").contains("-").click().await?;
    }
    session
        .get("div")
        .contains("-7")
        .should(Assertion::have_text("- -7 + Reset"))
        .await?;

    session.close().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_counter_reset() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/counter/index.html").await;

    for _ in 0..3 {
        session.get("button").first().click().await?;
    }
    expect(session.get("div")).to_have_text("- -3 + Reset").await?;

    session.get("button").contains("Reset").click().await?;
    expect(session.get("div")).to_have_text("- 0 + Reset").await?;
    expect(session.get("div")).not().to_contain_text("-3").await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_counter_ambiguous_click_is_not_actionable() {
    common::init_tracing();
    let session = test_site::visit("/counter/index.html").await;

    let err = session
        .get("button")
        .click()
        .with_timeout(std::time::Duration::from_millis(200))
        .await
        .expect_err("three buttons cannot be clicked at once");
    assert!(err.is_timeout(), "{err}");
    assert!(err.to_string().contains("subject has 3"), "{err}");

    // nothing was clicked
    expect(session.get("div")).to_have_text("- 0 + Reset").await.unwrap();
}
