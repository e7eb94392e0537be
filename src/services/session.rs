// src/services/session.rs

//! Remote browsing sessions.
//!
//! The crawl drives the ranking site through [`RemoteSession`]: navigate,
//! wait for the results table, optionally widen pagination, read the page.
//! A session holds remote resources until [`RemoteSession::close`] is called,
//! and callers close every session they open on every exit path.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::RemoteConfig;
use crate::services::pages;
use crate::utils::http::{create_async_client, fetch_text};

/// One open browsing session against the ranking site.
#[async_trait]
pub trait RemoteSession: Send {
    /// Load a page, replacing the current one.
    async fn navigate(&mut self, url: &Url) -> Result<()>;

    /// Block until the current page's results table has rows, or time out.
    async fn wait_for_table(&mut self, timeout: Duration) -> Result<()>;

    /// Switch the page-size control named `control` to "all rows".
    ///
    /// Errors when the control can't be found within `timeout`.
    async fn widen_page_size(&mut self, control: &str, timeout: Duration) -> Result<()>;

    /// Source of the current page.
    async fn page_source(&mut self) -> Result<String>;

    /// Release the session. Further calls fail.
    async fn close(&mut self) -> Result<()>;
}

/// Opens sessions. One crawl phase uses one session.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RemoteSession>>;
}

/// Session factory over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    client: reqwest::Client,
    poll_interval: Duration,
}

impl HttpSessionFactory {
    pub fn new(remote: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(remote)?,
            poll_interval: remote.poll_interval(),
        })
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn RemoteSession>> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            poll_interval: self.poll_interval,
            page: None,
            closed: false,
        }))
    }
}

#[derive(Debug)]
struct LoadedPage {
    url: Url,
    source: String,
}

/// Session that fetches server-rendered pages.
///
/// The site renders the complete results table server-side, so widening
/// pagination only has to confirm the control exists. Waiting re-fetches the
/// page until the empty-table placeholder is gone.
#[derive(Debug)]
pub struct HttpSession {
    client: reqwest::Client,
    poll_interval: Duration,
    page: Option<LoadedPage>,
    closed: bool,
}

impl HttpSession {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(AppError::remote("session", "used after close"));
        }
        Ok(())
    }

    fn current(&self) -> Result<&LoadedPage> {
        self.ensure_open()?;
        self.page
            .as_ref()
            .ok_or_else(|| AppError::remote("session", "no page loaded"))
    }
}

#[async_trait]
impl RemoteSession for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        self.ensure_open()?;
        log::debug!("GET {url}");
        let source = fetch_text(&self.client, url.as_str()).await?;
        self.page = Some(LoadedPage {
            url: url.clone(),
            source,
        });
        Ok(())
    }

    async fn wait_for_table(&mut self, timeout: Duration) -> Result<()> {
        let url = self.current()?.url.clone();
        let deadline = Instant::now() + timeout;

        loop {
            if !pages::has_empty_table(&self.current()?.source)? {
                return Ok(());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(AppError::timeout(format!("results table on {url}"), timeout.as_secs()));
            }
            tokio::time::sleep(self.poll_interval.min(remaining)).await;

            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, fetch_text(&self.client, url.as_str())).await {
                Ok(source) => {
                    self.page = Some(LoadedPage {
                        url: url.clone(),
                        source: source?,
                    })
                }
                Err(_) => {
                    return Err(AppError::timeout(
                        format!("results table on {url}"),
                        timeout.as_secs(),
                    ));
                }
            }
        }
    }

    async fn widen_page_size(&mut self, control: &str, timeout: Duration) -> Result<()> {
        let page = self.current()?;
        if pages::has_page_size_control(&page.source, control)? {
            Ok(())
        } else {
            Err(AppError::remote(
                page.url.as_str(),
                format!(
                    "page size control '{control}' not found within {}s",
                    timeout.as_secs()
                ),
            ))
        }
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.current()?.source.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.page = None;
        self.closed = true;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> HttpSessionFactory {
        HttpSessionFactory::new(&RemoteConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_reading_before_navigation_fails() {
        let mut session = factory().open().await.unwrap();
        assert!(session.page_source().await.is_err());
        assert!(
            session
                .wait_for_table(Duration::from_millis(10))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_closed_session_rejects_navigation() {
        let mut session = factory().open().await.unwrap();
        session.close().await.unwrap();

        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = session.navigate(&url).await.unwrap_err();
        assert!(matches!(err, AppError::Remote { .. }));
    }
}
