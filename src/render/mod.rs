//! QR rendering
//!
//! A [`Renderer`] owns the single display surface and an ordered list of
//! [`RenderStrategy`] implementations. Each render clears the surface, then
//! tries the strategies in order until one produces an image. Failures are
//! logged and never reach the caller; if every strategy fails the surface is
//! left empty.
//!
//! Renders may overlap (the first local render waits for the encoder to be
//! acquired). Every call takes a new generation number and only the newest
//! generation is allowed to publish its artifact.

pub mod encoder;
pub mod remote;

pub use encoder::{BuiltinEncoderProvider, EncoderProvider, LocalEncoderStrategy, QrEncoder, Rasterizer};
pub use remote::{HttpFetcher, ImageFetcher, RemoteImageStrategy, build_request_url};

use crate::config::RenderOptions;
use crate::error::Result;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Where an artifact's pixels came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArtifactSource {
    /// In-process QR encoder
    Encoder,
    /// Remote image service
    Remote {
        /// Full request URL, including the percent-encoded payload
        url: String,
    },
}

/// Image produced by a single strategy
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// Pixels
    pub image: DynamicImage,
    /// Origin of the pixels
    pub source: ArtifactSource,
}

/// The QR code currently shown on the surface
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Text encoded in the image
    pub payload: String,
    /// Pixels
    pub image: DynamicImage,
    /// Origin of the pixels
    pub source: ArtifactSource,
    /// Accessible description of the image
    pub alt_text: String,
    /// Name of the strategy that drew it
    pub strategy: &'static str,
}

impl Artifact {
    /// Encode the image as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// `data:image/png;base64,...` form of the image.
    pub fn to_data_url(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    /// Pixel dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// One way of turning a payload into an image
#[async_trait]
pub trait RenderStrategy: Send + Sync {
    /// Short identifier used in logs and artifacts
    fn name(&self) -> &'static str;

    /// Produce an image for `payload`, or fail so the next strategy is tried.
    async fn render(&self, payload: &str) -> Result<RenderedImage>;
}

/// Result of a [`Renderer::render`] call
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    /// A strategy succeeded and its artifact is now on the surface
    Drawn(Arc<Artifact>),
    /// The payload was empty and the surface was cleared
    Cleared,
    /// Every strategy failed; the surface is empty
    Unavailable,
    /// A newer render started before this one finished; nothing was published
    Superseded,
}

impl RenderOutcome {
    /// The drawn artifact, if any
    pub fn artifact(&self) -> Option<&Arc<Artifact>> {
        match self {
            RenderOutcome::Drawn(artifact) => Some(artifact),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Surface {
    generation: u64,
    artifact: Option<Arc<Artifact>>,
}

/// Display surface plus the ordered fallback chain that fills it
pub struct Renderer {
    strategies: Vec<Arc<dyn RenderStrategy>>,
    surface: Mutex<Surface>,
}

impl Renderer {
    /// Create a renderer that tries `strategies` in the given order.
    pub fn new(strategies: Vec<Arc<dyn RenderStrategy>>) -> Self {
        Self {
            strategies,
            surface: Mutex::new(Surface::default()),
        }
    }

    /// Standard chain: local encoder, then each configured endpoint when
    /// remote fallback is enabled.
    pub fn from_options(options: &RenderOptions, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let provider = Arc::new(BuiltinEncoderProvider::new(options));
        let mut strategies: Vec<Arc<dyn RenderStrategy>> =
            vec![Arc::new(LocalEncoderStrategy::new(provider))];

        if options.remote_fallback {
            for template in &options.endpoints {
                strategies.push(Arc::new(RemoteImageStrategy::new(
                    template.clone(),
                    options.size,
                    Arc::clone(&fetcher),
                )));
            }
        }

        Self::new(strategies)
    }

    /// Names of the configured strategies, in order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Artifact currently on the surface
    pub fn current(&self) -> Option<Arc<Artifact>> {
        self.surface().artifact.clone()
    }

    /// Remove whatever is on the surface and cancel in-flight renders.
    pub fn clear(&self) {
        let mut surface = self.surface();
        surface.generation += 1;
        surface.artifact = None;
    }

    /// Clear the surface, then draw `payload` with the first strategy that succeeds.
    pub async fn render(&self, payload: &str, alt_text: &str) -> RenderOutcome {
        let generation = {
            let mut surface = self.surface();
            surface.generation += 1;
            surface.artifact = None;
            surface.generation
        };

        if payload.is_empty() {
            tracing::debug!("Empty payload, surface cleared");
            return RenderOutcome::Cleared;
        }

        for strategy in &self.strategies {
            if self.is_stale(generation) {
                return RenderOutcome::Superseded;
            }

            match strategy.render(payload).await {
                Ok(rendered) => {
                    let mut surface = self.surface();
                    if surface.generation != generation {
                        tracing::debug!(
                            strategy = strategy.name(),
                            "Discarding render for outdated payload"
                        );
                        return RenderOutcome::Superseded;
                    }

                    let artifact = Arc::new(Artifact {
                        payload: payload.to_string(),
                        image: rendered.image,
                        source: rendered.source,
                        alt_text: alt_text.to_string(),
                        strategy: strategy.name(),
                    });
                    surface.artifact = Some(Arc::clone(&artifact));
                    tracing::info!(
                        strategy = strategy.name(),
                        bytes = payload.len(),
                        "QR code rendered"
                    );
                    return RenderOutcome::Drawn(artifact);
                }
                Err(err) if err.is_recoverable_render_failure() => {
                    tracing::warn!(strategy = strategy.name(), "Render failed, falling back: {err}");
                }
                Err(err) => {
                    tracing::error!(strategy = strategy.name(), "Unexpected render error: {err}");
                }
            }
        }

        if self.is_stale(generation) {
            return RenderOutcome::Superseded;
        }
        tracing::warn!("All QR render strategies failed; surface left empty");
        RenderOutcome::Unavailable
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.surface().generation != generation
    }

    fn surface(&self) -> std::sync::MutexGuard<'_, Surface> {
        self.surface.lock().expect("surface mutex poisoned")
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::Error;
    use image::{GrayImage, Luma};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Strategy double that either fails or returns a flat image shaded by payload length.
    pub struct FakeStrategy {
        pub name: &'static str,
        pub fail: AtomicBool,
        pub calls: AtomicUsize,
    }

    impl FakeStrategy {
        pub fn ok(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing(name: &'static str) -> Arc<Self> {
            let strategy = Self::ok(name);
            strategy.set_failing(true);
            strategy
        }

        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RenderStrategy for FakeStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn render(&self, payload: &str) -> Result<RenderedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::ImageLoad {
                    url: format!("fake://{}", self.name),
                    reason: "unreachable".into(),
                });
            }
            let shade = (payload.len() % 256) as u8;
            Ok(RenderedImage {
                image: DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([shade]))),
                source: ArtifactSource::Encoder,
            })
        }
    }
}
