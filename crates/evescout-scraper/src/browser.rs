//! Pooled headless-browser session for script-rendered pages.
//!
//! Search result pages are rendered client-side; the static HTML carries no
//! event cards. When the browser path is enabled, fetches check a shared
//! Chromium session out under a mutex, navigate, and read the rendered DOM.
//! The session is launched lazily on first use and relaunched after a
//! failure, so a crashed browser never poisons later calls.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::future::BoxFuture;
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::error::ScraperError;

/// Grace period for closing a tab after a render attempt.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A tab that can be released back to the browser session.
trait Closable: Send + 'static {
    fn close_tab(self) -> BoxFuture<'static, ()>;
}

impl Closable for Page {
    fn close_tab(self) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let _ = self.close().await;
        })
    }
}

/// Owns a checked-out tab until it is released.
///
/// The happy path releases via [`TabGuard::close`]. If the owning future is
/// dropped mid-render instead (a cancelled search), `Drop` spawns the close
/// so the tab does not accumulate in the pooled session.
struct TabGuard<T: Closable> {
    tab: Option<T>,
}

impl<T: Closable> TabGuard<T> {
    fn new(tab: T) -> Self {
        Self { tab: Some(tab) }
    }

    async fn close(mut self) {
        if let Some(tab) = self.tab.take() {
            let _ = tokio::time::timeout(CLOSE_TIMEOUT, tab.close_tab()).await;
        }
    }
}

impl<T: Closable> Drop for TabGuard<T> {
    fn drop(&mut self) {
        if let Some(tab) = self.tab.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(tab.close_tab());
                }
                Err(_) => tracing::warn!("no runtime available to close abandoned browser tab"),
            }
        }
    }
}

pub struct BrowserPool {
    timeout: Duration,
    session: Mutex<Option<Browser>>,
}

impl BrowserPool {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            session: Mutex::new(None),
        }
    }

    /// Navigates to `url` in the pooled session and returns the rendered
    /// document HTML.
    ///
    /// The session is held for the duration of the call and released on
    /// every exit path; the tab is always closed, even when navigation
    /// fails, times out, or the caller drops this future mid-render.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] when the browser cannot be
    /// launched, navigation fails, or the render exceeds the timeout.
    pub async fn render(&self, url: &str) -> Result<String, ScraperError> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            *session = Some(launch().await?);
        }
        let Some(browser) = session.as_mut() else {
            return Err(ScraperError::Browser {
                reason: "session unavailable".to_string(),
            });
        };

        let page = match browser.new_page(url).await {
            Ok(page) => page,
            Err(e) => {
                // The browser process may be gone; relaunch on the next call.
                *session = None;
                return Err(ScraperError::Browser {
                    reason: format!("failed to open page for {url}: {e}"),
                });
            }
        };

        let tab = TabGuard::new(page.clone());
        let rendered = tokio::time::timeout(self.timeout, rendered_html(&page)).await;
        tab.close().await;

        match rendered {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(e)) => {
                *session = None;
                Err(e)
            }
            Err(_) => Err(ScraperError::Browser {
                reason: format!("render of {url} timed out after {:?}", self.timeout),
            }),
        }
    }
}

async fn rendered_html(page: &Page) -> Result<String, ScraperError> {
    page.wait_for_navigation()
        .await
        .map_err(|e| ScraperError::Browser {
            reason: format!("navigation failed: {e}"),
        })?;
    page.content().await.map_err(|e| ScraperError::Browser {
        reason: format!("failed to read rendered document: {e}"),
    })
}

async fn launch() -> Result<Browser, ScraperError> {
    let config = BrowserConfig::builder()
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .window_size(1920, 1080)
        .build()
        .map_err(|e| ScraperError::Browser {
            reason: format!("failed to build browser config: {e}"),
        })?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| ScraperError::Browser {
            reason: format!("failed to launch browser: {e}"),
        })?;

    // The CDP event stream must be drained for the session to make progress.
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            let _ = event;
        }
    });

    tracing::info!("headless browser session launched");
    Ok(browser)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    struct TestTab(Arc<AtomicU32>);

    impl Closable for TestTab {
        fn close_tab(self) -> BoxFuture<'static, ()> {
            Box::pin(async move {
                self.0.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn explicit_close_releases_the_tab_once() {
        let closes = Arc::new(AtomicU32::new(0));
        let guard = TabGuard::new(TestTab(Arc::clone(&closes)));
        guard.close().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_a_render_future_mid_flight_still_closes_the_tab() {
        let closes = Arc::new(AtomicU32::new(0));
        let tab = TestTab(Arc::clone(&closes));

        let mut render = Box::pin(async move {
            let guard = TabGuard::new(tab);
            // Stand-in for a navigation that outlives the caller's patience.
            tokio::time::sleep(Duration::from_secs(3600)).await;
            guard.close().await;
        });

        // Poll once so the guard exists, then drop the future mid-await.
        assert!(futures::poll!(render.as_mut()).is_pending());
        drop(render);

        // The close runs on a task spawned from the guard's Drop.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
