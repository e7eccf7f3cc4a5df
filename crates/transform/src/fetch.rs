//! Remote image download.

use std::time::Duration;

use drapely_core::image::{DecodedImage, ImageSource};
use drapely_core::retry::RetryPolicy;

/// Upper bound on a single image download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a download failed. Transport and decode failures are reported
/// through the same [`FetchError`]; the variant is kept for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    /// Network, DNS, TLS, or timeout failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The image host answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The body was not a decodable image.
    #[error("undecodable image: {0}")]
    Decode(#[from] image::ImageError),
}

/// A failed image download, always carrying the offending URL.
#[derive(Debug, thiserror::Error)]
#[error("Failed to download image from {url}: {failure}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub failure: FetchFailure,
}

/// Downloads images over HTTP and decodes them to RGB.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ImageFetcher {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: FETCH_TIMEOUT,
            retry: RetryPolicy::NO_RETRY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Download `url` and decode it, tagging the bitmap with `source`.
    pub async fn fetch(&self, url: &str, source: ImageSource) -> Result<DecodedImage, FetchError> {
        let image = self
            .retry
            .run("image_fetch", || self.fetch_once(url, source.clone()))
            .await
            .inspect_err(|e| tracing::error!(url, error = %e.failure, "Image download failed"))?;

        let (width, height) = image.dimensions();
        tracing::info!(url, width, height, "Downloaded image");
        Ok(image)
    }

    async fn fetch_once(&self, url: &str, source: ImageSource) -> Result<DecodedImage, FetchError> {
        let fail = |failure: FetchFailure| FetchError {
            url: url.to_string(),
            failure,
        };

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| fail(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FetchFailure::Status(status.as_u16())));
        }

        let bytes = response.bytes().await.map_err(|e| fail(e.into()))?;
        DecodedImage::decode(&bytes, source).map_err(|e| fail(e.into()))
    }
}

impl Default for ImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use drapely_test_support::fixtures::png_bytes;
    use httpmock::prelude::*;

    use super::*;

    #[tokio::test]
    async fn fetch_decodes_png() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/person.png");
            then.status(200)
                .header("content-type", "image/png")
                .body(png_bytes(4, 3, [200, 10, 10]));
        });

        let url = server.url("/person.png");
        let image = ImageFetcher::new()
            .fetch(&url, ImageSource::Subject)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.source(), &ImageSource::Subject);
        assert_eq!(image.pixels().get_pixel(0, 0).0, [200, 10, 10]);
    }

    #[tokio::test]
    async fn non_success_status_carries_url() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/missing.png");
            then.status(404);
        });

        let url = server.url("/missing.png");
        let err = ImageFetcher::new()
            .fetch(&url, ImageSource::Garment("g1".into()))
            .await
            .unwrap_err();

        assert_eq!(err.url, url);
        assert_matches!(err.failure, FetchFailure::Status(404));
        assert!(err.to_string().contains(&url));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_fetch_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/page.html");
            then.status(200).body("<html>not an image</html>");
        });

        let url = server.url("/page.html");
        let err = ImageFetcher::new()
            .fetch(&url, ImageSource::Subject)
            .await
            .unwrap_err();

        assert_eq!(err.url, url);
        assert_matches!(err.failure, FetchFailure::Decode(_));
    }

    #[tokio::test]
    async fn slow_host_times_out() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/slow.png");
            then.status(200)
                .delay(Duration::from_secs(2))
                .body(png_bytes(1, 1, [0, 0, 0]));
        });

        let url = server.url("/slow.png");
        let err = ImageFetcher::new()
            .with_timeout(Duration::from_millis(100))
            .fetch(&url, ImageSource::Subject)
            .await
            .unwrap_err();

        assert_matches!(err.failure, FetchFailure::Request(ref e) if e.is_timeout());
    }

    #[tokio::test]
    async fn invalid_url_is_a_fetch_error() {
        let err = ImageFetcher::new()
            .fetch("not a url", ImageSource::Subject)
            .await
            .unwrap_err();
        assert_eq!(err.url, "not a url");
        assert_matches!(err.failure, FetchFailure::Request(_));
    }
}
