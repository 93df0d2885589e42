//! pagewright: a retrying DOM query, action and assertion engine
//!
//! Tests build deferred command chains (`get` → filters → actions → `should`)
//! against a [`Session`]. Awaiting a chain replays it from the root until its
//! last stage holds or the retry budget runs out, so assertions tolerate pages
//! that re-render asynchronously.
//!
//! Pages are served by a [`Host`](server::Host). The bundled [`Site`] runs
//! [`App`](server::App)s in-process, which is enough to drive real UI flows
//! without a browser.
//!
//! # Examples
//!
//! ## Counter
//!
//! ```ignore
//! use pagewright::{Assertion, Session, SessionOptions, Site};
//!
//! #[tokio::main]
//! async fn main() -> pagewright::Result<()> {
//!     let site = Site::new("http://127.0.0.1:9999")?.mount("/counter/index.html", Counter::default);
//!     let session = Session::new(site, SessionOptions::new().base_url("http://127.0.0.1:9999"))?;
//!     session.visit("/counter/index.html").await?;
//!
//!     for _ in 0..7 {
//!         session.get("button").contains("+").click().await?;
//!     }
//!     session
//!         .get("div")
//!         .contains("7")
//!         .should(Assertion::have_text("- 7 + Reset"))
//!         .await?;
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Dialogs
//!
//! ```ignore
//! use pagewright::{DialogKind, DialogStub};
//! use std::time::Duration;
//!
//! let stub = DialogStub::new();
//! session.intercept(DialogKind::Alert, stub.handler());
//! session.get("button").contains("Submit").click().await?;
//! session.wait(Duration::from_millis(1200)).await;
//! stub.assert_called_with("Submitted")?;
//! ```
//!
//! ## Assertions (expect API)
//!
//! ```ignore
//! use pagewright::expect;
//!
//! expect(session.get("button").contains("Submit")).to_be_disabled().await?;
//! expect(session.get("div").filter_text("- 0 + Reset Remove")).to_have_count(6).await?;
//! ```

pub mod server;

pub mod api;
mod assertions;
mod error;
pub mod protocol;

/// Default retry budget of a chain, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

/// Default delay between retry attempts, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// Re-export error types
pub use error::{Error, Result};

// Re-export assertions API
pub use assertions::{Assertion, Expectation, expect};

// Re-export the session and chain API
pub use protocol::{Chain, ElementSet, Session, TextMatcher};

// Re-export action options
pub use protocol::{CheckOptions, ClickOptions, SelectOption, TypeOptions};

// Re-export dialog interception
pub use protocol::{Dialog, DialogKind, DialogResponse, DialogStub, InterceptedDialog};

// Re-export retry engine
pub use protocol::{RetryPolicy, RunState, retry_until};

// Re-export the in-process host
pub use server::{App, Context, Html, Site, h};

// Re-export session options
pub use api::SessionOptions;
