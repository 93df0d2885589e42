// Integration tests for the retry engine and chain replay
//
// Tests cover:
// - Timeout boundary: never before the budget, enough attempts, never hangs
// - Per-chain and per-expectation overrides
// - Query idempotence on an unchanged document
// - Replay re-deriving the subject after re-renders
// - Resuming after an action that removed its own target
// - Zero polling intervals

use pagewright::{Assertion, Error, SessionOptions, TextMatcher, expect};
use std::time::Duration;
use tokio::time::Instant;

mod common;

// ============================================================================
// Timeout boundary
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_timeout_boundary_default_budget() {
    common::init_tracing();
    let session = test_site::visit("/counter/index.html").await;

    let start = Instant::now();
    let err = session
        .get("div")
        .should(Assertion::have_text("- 99 + Reset"))
        .await
        .unwrap_err();
    let waited = start.elapsed();

    let Error::Timeout {
        elapsed,
        attempts,
        last,
    } = err.root_cause()
    else {
        panic!("expected timeout, got {err:?}");
    };
    assert!(waited >= Duration::from_millis(4000));
    assert!(waited < Duration::from_millis(4100));
    assert!(*elapsed >= Duration::from_millis(4000));
    assert!(*attempts >= 4000 / 50, "only {attempts} attempts");
    assert!(last.to_string().contains(r#"but had "- 0 + Reset""#), "{last}");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_from_session_options() {
    common::init_tracing();
    let session = test_site::session_with(
        SessionOptions::new()
            .base_url(test_site::ORIGIN)
            .default_timeout_ms(1000)
            .poll_interval_ms(100),
    );
    session.visit("/counter/index.html").await.unwrap();

    let start = Instant::now();
    let err = session.get("table").await.unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_millis(1000));
    assert!(start.elapsed() < Duration::from_millis(1100));
    let Error::Timeout { attempts, .. } = err.root_cause() else {
        panic!("expected timeout");
    };
    assert!(*attempts >= 10);
}

#[tokio::test(start_paused = true)]
async fn test_expectation_overrides() {
    common::init_tracing();
    let session = test_site::visit("/counter/index.html").await;

    let start = Instant::now();
    let err = expect(session.get("button").contains("+"))
        .with_timeout(Duration::from_millis(300))
        .with_poll_interval(Duration::from_millis(100))
        .to_be_disabled()
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert!(start.elapsed() < Duration::from_millis(400));
    let Error::Timeout { attempts, .. } = err.root_cause() else {
        panic!("expected timeout");
    };
    assert_eq!(*attempts, 4);
}

#[tokio::test(start_paused = true)]
async fn test_passing_chain_does_not_wait() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/counter/index.html").await;

    let start = Instant::now();
    session.get("button").should(Assertion::have_length(3)).await?;
    assert_eq!(start.elapsed(), Duration::ZERO);
    Ok(())
}

// ============================================================================
// Idempotence and replay
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_query_is_idempotent_without_actions() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/counters/index.html").await;
    for _ in 0..3 {
        session.get("button").contains("Append").click().await?;
    }

    let first = session.get("button").filter_text("+").await?;
    let second = session.get("button").filter_text("+").await?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);

    let by_pattern = session
        .get("button")
        .filter_text(TextMatcher::pattern(r"^[+-]$")?)
        .await?;
    assert_eq!(by_pattern.len(), 6);

    let by_predicate = session
        .get("button")
        .filter_text(TextMatcher::predicate(|text| text.len() > 1))
        .await?;
    // Append plus three Reset and three Remove
    assert_eq!(by_predicate.len(), 7);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_index_is_retried_until_it_exists() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/counters/index.html").await;

    let err = session
        .get("button")
        .filter_text("+")
        .eq(0)
        .with_timeout(Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(err.to_string().contains("index 0 is out of range"), "{err}");

    session.get("button").contains("Append").click().await?;
    session.get("button").filter_text("+").eq(-1).click().await?;
    expect(session.get("div").filter_text("- 1 + Reset Remove"))
        .to_have_count(1)
        .await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_chain_result_is_subject_after_action() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/counter/index.html").await;

    let subject = session.get("button").contains("+").click().await?;
    assert_eq!(subject.len(), 1);

    // the handle survives the re-render the click caused
    let again = session.get("button").contains("+").await?;
    assert_eq!(subject, again);
    Ok(())
}

// ============================================================================
// Resuming after performed actions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_action_removing_its_target_does_not_stall_later_stages() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/launcher/index.html").await;

    let start = Instant::now();
    session
        .get("button")
        .filter_text("Go")
        .first()
        .click()
        .get("p")
        .should(Assertion::have_text("done"))
        .await?;
    let waited = start.elapsed();
    assert!(waited >= Duration::from_millis(200), "{waited:?}");
    assert!(waited < Duration::from_millis(400), "{waited:?}");

    expect(session.get("button")).not().to_exist().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_removed_subject_no_longer_exists() -> pagewright::Result<()> {
    common::init_tracing();
    let session = test_site::visit("/launcher/index.html").await;

    session
        .get("button")
        .contains("Go")
        .click()
        .should(Assertion::exist().not())
        .with_timeout(Duration::from_millis(500))
        .await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_zero_poll_interval_does_not_spin() {
    common::init_tracing();
    let session = test_site::visit("/counter/index.html").await;

    let start = Instant::now();
    let err = expect(session.get("table"))
        .with_timeout(Duration::from_millis(100))
        .with_poll_interval(Duration::ZERO)
        .to_exist()
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), Duration::from_millis(100));
    let Error::Timeout { attempts, .. } = err.root_cause() else {
        panic!("expected timeout");
    };
    assert_eq!(*attempts, 101);
}
