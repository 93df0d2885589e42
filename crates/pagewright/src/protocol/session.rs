// Session - per-test page context
//
// A session owns the current document, the dialog channel every document it
// opens raises dialogs through, and the retry defaults chains inherit. It is
// the root every chain replays from.

use super::chain::{Chain, Stage};
use super::dialog::{DialogChannel, DialogHandler, DialogKind, InterceptedDialog};
use super::retry::RetryPolicy;
use crate::api::SessionOptions;
use crate::error::{Error, Result};
use crate::server::{Document, Host};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

enum PageState {
    Blank,
    Loaded(Arc<dyn Document>),
    Closed,
}

/// The per-test context chains run against
///
/// # Example
///
/// ```ignore
/// use pagewright::{Session, SessionOptions, Site};
///
/// let site = Site::new("http://127.0.0.1:9999")?.mount("/counter/index.html", Counter::default);
/// let session = Session::new(site, SessionOptions::new().base_url("http://127.0.0.1:9999"))?;
/// session.visit("/counter/index.html").await?;
/// session.get("button").contains("+").click().await?;
/// session.close().await;
/// ```
pub struct Session {
    host: Arc<dyn Host>,
    options: SessionOptions,
    base_url: Option<Url>,
    dialogs: DialogChannel,
    page: Mutex<PageState>,
}

impl Session {
    /// Creates a session on `host`; fails with `Config` for invalid options.
    pub fn new(host: impl Host + 'static, options: SessionOptions) -> Result<Self> {
        Self::with_host(Arc::new(host), options)
    }

    /// Creates a session sharing an existing host
    pub fn with_host(host: Arc<dyn Host>, options: SessionOptions) -> Result<Self> {
        options.validate()?;
        let base_url = match &options.base_url {
            Some(url) => Some(
                Url::parse(url).map_err(|e| Error::Config(format!("baseUrl '{}': {}", url, e)))?,
            ),
            None => None,
        };
        tracing::debug!(?options, "session created");
        Ok(Self {
            host,
            options,
            base_url,
            dialogs: DialogChannel::new(),
            page: Mutex::new(PageState::Blank),
        })
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.options)
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base
                    .join(url)
                    .map_err(|e| Error::InvalidArgument(format!("url '{}': {}", url, e))),
                None => Err(Error::InvalidArgument(format!(
                    "relative url '{}' needs a baseUrl",
                    url
                ))),
            },
            Err(e) => Err(Error::InvalidArgument(format!("url '{}': {}", url, e))),
        }
    }

    /// Loads `url` into a fresh document, replacing the current one
    ///
    /// Relative URLs resolve against the configured base URL. Fails with
    /// `NavigationError` when the host cannot serve the page; the session is
    /// left without a page in that case.
    pub async fn visit(&self, url: &str) -> Result<()> {
        let url = self.resolve(url)?;
        let previous = {
            let mut page = self.page.lock();
            match std::mem::replace(&mut *page, PageState::Blank) {
                PageState::Closed => {
                    *page = PageState::Closed;
                    return Err(Error::SessionClosed);
                }
                PageState::Loaded(document) => Some(document),
                PageState::Blank => None,
            }
        };
        if let Some(document) = previous {
            document.close().await;
        }

        tracing::debug!(%url, "visit");
        let document = self.host.open(&url, self.dialogs.clone()).await?;

        let closed = {
            let mut page = self.page.lock();
            let closed = matches!(*page, PageState::Closed);
            if !closed {
                *page = PageState::Loaded(Arc::clone(&document));
            }
            closed
        };
        if closed {
            document.close().await;
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    /// URL of the current document
    pub fn url(&self) -> Option<Url> {
        match &*self.page.lock() {
            PageState::Loaded(document) => Some(document.url().clone()),
            _ => None,
        }
    }

    pub(crate) fn document(&self) -> Result<Arc<dyn Document>> {
        match &*self.page.lock() {
            PageState::Loaded(document) => Ok(Arc::clone(document)),
            PageState::Blank => Err(Error::NoPage),
            PageState::Closed => Err(Error::SessionClosed),
        }
    }

    /// Starts a chain with all elements matching `selector`
    pub fn get(&self, selector: &str) -> Chain<'_> {
        Chain::new(self, Stage::Get(selector.to_string()))
    }

    /// Suspends the test for `duration`; page timers keep running
    pub async fn wait(&self, duration: Duration) {
        tracing::debug!(?duration, "wait");
        tokio::time::sleep(duration).await;
    }

    /// Answers dialogs of `kind` with `handler` until the session ends
    ///
    /// Installing a second handler for the same kind replaces the first.
    pub fn intercept(&self, kind: DialogKind, handler: DialogHandler) {
        self.dialogs.install(kind, handler);
    }

    /// Every intercepted dialog so far, in call order
    pub fn intercepted(&self) -> Vec<InterceptedDialog> {
        self.dialogs.records()
    }

    /// Tears the session down: interceptors are uninstalled and the current
    /// document is closed, cancelling its timers. Chains run afterwards fail
    /// with `SessionClosed`.
    pub async fn close(&self) {
        self.dialogs.uninstall_all();
        let previous = std::mem::replace(&mut *self.page.lock(), PageState::Closed);
        if let PageState::Loaded(document) = previous {
            document.close().await;
        }
        tracing::debug!("session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dialogs.uninstall_all();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("url", &self.url().map(String::from))
            .field("dialogs", &self.dialogs)
            .finish()
    }
}
