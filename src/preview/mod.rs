//! Link preview extraction.
//!
//! `PreviewExtractor::extract` takes free text, finds the first link in it,
//! fetches that link once and turns the response into a [`PreviewData`]:
//!
//! 1. no link in the text: empty preview, no network I/O
//! 2. fetch fails or times out: empty preview
//! 3. `image/*` response: `{ link, image: link }`, body never read
//! 4. HTML: head title and meta tags, `og:image` resolved against the link,
//!    then a capped `<img src>` scan of the whole document if no image yet
//!
//! Extraction never fails. Each failure is logged and whatever was gathered
//! up to that point is returned.

pub mod content_type;
pub mod discovery;
pub mod entities;
pub mod fetcher;
pub mod head;
pub mod image;
pub mod reducer;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{timeout_at, Instant};

use crate::models::PreviewData;
use content_type::ContentRoute;
use fetcher::{FetchError, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Used by [`PreviewExtractor::extract_with_default_timeout`].
    pub default_timeout: Duration,
    /// Cap on `<img>` candidates considered by the body fallback.
    pub body_image_scan_limit: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            body_image_scan_limit: image::DEFAULT_BODY_IMAGE_SCAN_LIMIT,
        }
    }
}

/// Reasons an extraction stopped early. Never returned to callers.
#[derive(Error, Debug)]
enum PreviewError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("response body was empty")]
    EmptyBody,
}

#[derive(Clone)]
pub struct PreviewExtractor {
    fetcher: Arc<dyn Fetcher>,
    options: PreviewOptions,
}

impl PreviewExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, options: PreviewOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &PreviewOptions {
        &self.options
    }

    pub async fn extract_with_default_timeout(&self, text: &str) -> PreviewData {
        self.extract(text, self.options.default_timeout).await
    }

    /// Build a preview for the first link in `text`.
    ///
    /// The fetch (headers and body) is cut off at `timeout`, so this returns
    /// within `timeout` plus the time spent scanning the fetched HTML.
    pub async fn extract(&self, text: &str, timeout: Duration) -> PreviewData {
        let mut preview = PreviewData::default();

        let Some(url) = discovery::find_url(text) else {
            tracing::debug!("No link found in text");
            return preview;
        };

        if let Err(e) = self.fill(&url, timeout, &mut preview).await {
            match &e {
                PreviewError::EmptyBody => {
                    tracing::debug!(url = %url, "Link preview stopped: {e}");
                }
                PreviewError::Fetch(fetch_error) => {
                    tracing::warn!(url = %url, error = %fetch_error, "Failed to fetch URL for link preview");
                }
            }
        }

        preview
    }

    async fn fill(
        &self,
        url: &str,
        timeout: Duration,
        preview: &mut PreviewData,
    ) -> Result<(), PreviewError> {
        let deadline = Instant::now() + timeout;

        let response = timeout_at(deadline, self.fetcher.fetch(url, timeout))
            .await
            .map_err(|_| FetchError::Timeout)??;

        preview.link = Some(url.to_string());

        if content_type::route(&response) == ContentRoute::Image {
            tracing::debug!(url = %url, "Link points directly at an image");
            preview.image = Some(url.to_string());
            return Ok(());
        }

        let html = timeout_at(deadline, response.text())
            .await
            .map_err(|_| FetchError::Timeout)??;

        if html.trim().is_empty() {
            return Err(PreviewError::EmptyBody);
        }

        let head = head::scan_head(&html);
        let meta = reducer::reduce(&head.meta, head.title.as_deref());

        preview.title = meta.title;
        preview.description = meta.description;
        preview.image = meta
            .image_url
            .as_deref()
            .and_then(|candidate| image::resolve_image_url(url, candidate));

        if preview.image.is_none() {
            preview.image =
                image::scan_fallback_images(&html, url, self.options.body_image_scan_limit);
        }

        Ok(())
    }
}

/// One-off extraction with a fresh reqwest-backed fetcher.
pub async fn extract_preview(text: &str, timeout: Duration) -> PreviewData {
    match ReqwestFetcher::new(DEFAULT_USER_AGENT, false) {
        Ok(fetcher) => {
            PreviewExtractor::new(Arc::new(fetcher), PreviewOptions::default())
                .extract(text, timeout)
                .await
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client for link preview");
            PreviewData::default()
        }
    }
}
