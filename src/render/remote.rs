//! Fallback strategies backed by remote QR image services

use super::{ArtifactSource, RenderStrategy, RenderedImage};
use crate::error::{Error, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use std::sync::Arc;
use std::time::Duration;

/// Fetches raw image bytes for a URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// GET `url` and return the response body.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`ImageFetcher`] over HTTPS using `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("qrcard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let load_error = |e: reqwest::Error| Error::ImageLoad {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(load_error)?;

        if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or_default();
            if !content_type.starts_with("image/") {
                return Err(Error::ImageLoad {
                    url: url.to_string(),
                    reason: format!("unexpected content type '{content_type}'"),
                });
            }
        }

        let body = response.bytes().await.map_err(load_error)?;
        Ok(body.to_vec())
    }
}

/// Fill an endpoint template with the target size and percent-encoded payload.
///
/// `{size}` becomes the edge length in pixels and `{data}` the payload with
/// every byte outside `A-Z a-z 0-9 - _ . ~` percent-encoded.
pub fn build_request_url(template: &str, size: u32, payload: &str) -> String {
    template
        .replace("{size}", &size.to_string())
        .replace("{data}", &urlencoding::encode(payload))
}

/// Strategy that loads the QR code from a remote image endpoint
pub struct RemoteImageStrategy {
    template: String,
    size: u32,
    fetcher: Arc<dyn ImageFetcher>,
    name: &'static str,
}

impl RemoteImageStrategy {
    /// Strategy for one endpoint template
    pub fn new(template: String, size: u32, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let name = if template.contains("api.qrserver.com") {
            "qrserver"
        } else if template.contains("chart.googleapis.com") {
            "google-chart"
        } else {
            "remote"
        };

        Self {
            template,
            size,
            fetcher,
            name,
        }
    }

    /// Request URL this strategy would load for `payload`
    pub fn request_url(&self, payload: &str) -> String {
        build_request_url(&self.template, self.size, payload)
    }
}

#[async_trait]
impl RenderStrategy for RemoteImageStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn render(&self, payload: &str) -> Result<RenderedImage> {
        let url = self.request_url(payload);
        tracing::debug!(strategy = self.name, %url, "Requesting QR image");

        let bytes = self.fetcher.fetch(&url).await?;
        let mut image = image::load_from_memory(&bytes).map_err(|e| Error::ImageLoad {
            url: url.clone(),
            reason: format!("response is not a decodable image: {e}"),
        })?;

        if image.width() != self.size || image.height() != self.size {
            image = image.resize_exact(self.size, self.size, FilterType::Nearest);
        }

        Ok(RenderedImage {
            image,
            source: ArtifactSource::Remote { url },
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeFetcher;
    use super::*;
    use crate::config::{DEFAULT_PRIMARY_ENDPOINT, DEFAULT_SECONDARY_ENDPOINT};

    #[test]
    fn payload_is_percent_encoded() {
        let url = build_request_url(
            "https://qr.test/?size={size}x{size}&data={data}",
            300,
            "https://example.com/a b?x=1&y=ç",
        );
        assert_eq!(
            url,
            "https://qr.test/?size=300x300&data=https%3A%2F%2Fexample.com%2Fa%20b%3Fx%3D1%26y%3D%C3%A7"
        );
    }

    #[test]
    fn vcard_newlines_are_encoded() {
        let url = build_request_url(DEFAULT_SECONDARY_ENDPOINT, 300, "BEGIN:VCARD\nEND:VCARD");
        assert!(url.contains("data=BEGIN%3AVCARD%0AEND%3AVCARD"));
        assert!(url.contains("size=300x300"));
        assert!(url.contains("format=png"));
        assert!(url.contains("margin=10"));
    }

    #[tokio::test]
    async fn fetched_image_is_scaled_to_target() {
        let fetcher = FakeFetcher::failing(&[]);
        let strategy =
            RemoteImageStrategy::new(DEFAULT_PRIMARY_ENDPOINT.to_string(), 300, fetcher.clone());
        assert_eq!(strategy.name(), "google-chart");

        let rendered = strategy.render("hi").await.unwrap();
        assert_eq!((rendered.image.width(), rendered.image.height()), (300, 300));
        assert_eq!(
            rendered.source,
            ArtifactSource::Remote {
                url: strategy.request_url("hi")
            }
        );
        assert_eq!(fetcher.requests(), vec![strategy.request_url("hi")]);
    }

    #[tokio::test]
    async fn fetch_failure_is_an_image_load_error() {
        let fetcher = FakeFetcher::failing(&["qrserver"]);
        let strategy = RemoteImageStrategy::new(DEFAULT_SECONDARY_ENDPOINT.to_string(), 300, fetcher);
        assert!(matches!(
            strategy.render("hi").await,
            Err(Error::ImageLoad { .. })
        ));
    }

    struct GarbageFetcher;

    #[async_trait]
    impl ImageFetcher for GarbageFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(b"<html>rate limited</html>".to_vec())
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_an_image_load_error() {
        let strategy = RemoteImageStrategy::new(
            "https://qr.test/{data}".to_string(),
            300,
            Arc::new(GarbageFetcher),
        );
        assert_eq!(strategy.name(), "remote");
        assert!(matches!(
            strategy.render("hi").await,
            Err(Error::ImageLoad { .. })
        ));
    }

    #[tokio::test]
    async fn refused_connection_keeps_the_endpoint_url() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("http://127.0.0.1:{port}/qr?data=hi");

        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        match fetcher.fetch(&url).await {
            Err(Error::ImageLoad { url: failed, .. }) => assert_eq!(failed, url),
            other => panic!("expected ImageLoad, got {other:?}"),
        }
    }
}
