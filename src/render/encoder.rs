//! In-process QR encoder and its lazily acquired capability

use super::{ArtifactSource, RenderStrategy, RenderedImage};
use crate::config::RenderOptions;
use crate::error::{Error, Result};
use async_trait::async_trait;
use image::imageops;
use image::{DynamicImage, GrayImage, Luma};
use qrcode::QrCode;
use std::sync::Arc;
use tokio::sync::OnceCell;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Anything that can draw a QR code for a text payload
pub trait Rasterizer: Send + Sync {
    /// Draw `text` as a QR code.
    fn encode(&self, text: &str) -> Result<DynamicImage>;
}

/// QR code encoder producing square black-on-white rasters
#[derive(Debug, Clone)]
pub struct QrEncoder {
    ecc_level: qrcode::EcLevel,
    size: u32,
    quiet_zone: bool,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings (Medium ECC, 300px)
    pub fn new() -> Self {
        Self::from_options(&RenderOptions::default())
    }

    /// Create an encoder matching the render options
    pub fn from_options(options: &RenderOptions) -> Self {
        Self {
            ecc_level: options.error_correction.to_qrcode(),
            size: options.size.max(1),
            quiet_zone: options.quiet_zone,
        }
    }

    /// Edge length of produced images
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Encode data into a `size`×`size` QR code image
    pub fn encode_bytes(&self, data: &[u8]) -> Result<DynamicImage> {
        let code = QrCode::with_error_correction_level(data, self.ecc_level)?;

        // Largest whole module size that fits, so modules stay crisp.
        let drawn = code
            .render::<Luma<u8>>()
            .dark_color(BLACK)
            .light_color(WHITE)
            .quiet_zone(self.quiet_zone)
            .max_dimensions(self.size, self.size)
            .build();

        self.fit(drawn).map(DynamicImage::ImageLuma8)
    }

    /// Centre `drawn` on a white `size`×`size` canvas.
    ///
    /// A code needing more than one pixel per module beyond `size` cannot be
    /// shrunk without losing modules, so it is refused instead.
    fn fit(&self, drawn: GrayImage) -> Result<GrayImage> {
        if drawn.width() > self.size || drawn.height() > self.size {
            return Err(Error::QrEncode(format!(
                "code needs {}x{} px, more than the {}px target",
                drawn.width(),
                drawn.height(),
                self.size
            )));
        }
        if drawn.width() == self.size && drawn.height() == self.size {
            return Ok(drawn);
        }

        let mut canvas = GrayImage::from_pixel(self.size, self.size, WHITE);
        let x = (self.size - drawn.width()) / 2;
        let y = (self.size - drawn.height()) / 2;
        imageops::overlay(&mut canvas, &drawn, i64::from(x), i64::from(y));
        Ok(canvas)
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for QrEncoder {
    fn encode(&self, text: &str) -> Result<DynamicImage> {
        self.encode_bytes(text.as_bytes())
    }
}

/// Source of the encoding capability, acquired on first use
#[async_trait]
pub trait EncoderProvider: Send + Sync {
    /// Produce a ready-to-use rasterizer.
    async fn acquire(&self) -> Result<Arc<dyn Rasterizer>>;
}

/// Provides the bundled [`QrEncoder`] after a warm-up encode on the blocking pool
pub struct BuiltinEncoderProvider {
    encoder: QrEncoder,
}

impl BuiltinEncoderProvider {
    /// Provider for an encoder configured from `options`
    pub fn new(options: &RenderOptions) -> Self {
        Self {
            encoder: QrEncoder::from_options(options),
        }
    }
}

#[async_trait]
impl EncoderProvider for BuiltinEncoderProvider {
    async fn acquire(&self) -> Result<Arc<dyn Rasterizer>> {
        let encoder = self.encoder.clone();
        let encoder = tokio::task::spawn_blocking(move || {
            encoder.encode("qrcard").map(|_| encoder)
        })
        .await
        .map_err(|e| Error::EncodingUnavailable(format!("warm-up task failed: {e}")))??;

        tracing::debug!(size = encoder.size(), "QR encoder ready");
        Ok(Arc::new(encoder))
    }
}

/// Primary strategy: draw locally once the encoder has been acquired.
///
/// The capability is acquired on the first render and cached; a failed
/// acquisition is reported as [`Error::EncodingUnavailable`] and retried on
/// the next render.
pub struct LocalEncoderStrategy {
    provider: Arc<dyn EncoderProvider>,
    capability: OnceCell<Arc<dyn Rasterizer>>,
}

impl LocalEncoderStrategy {
    /// Strategy acquiring its encoder from `provider`
    pub fn new(provider: Arc<dyn EncoderProvider>) -> Self {
        Self {
            provider,
            capability: OnceCell::new(),
        }
    }

    /// Whether the encoder has been acquired yet
    pub fn is_ready(&self) -> bool {
        self.capability.initialized()
    }

    async fn rasterizer(&self) -> Result<&Arc<dyn Rasterizer>> {
        self.capability
            .get_or_try_init(|| async {
                tracing::debug!("Acquiring QR encoder");
                self.provider.acquire().await.map_err(|e| match e {
                    Error::EncodingUnavailable(_) => e,
                    other => Error::EncodingUnavailable(other.to_string()),
                })
            })
            .await
    }
}

#[async_trait]
impl RenderStrategy for LocalEncoderStrategy {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn render(&self, payload: &str) -> Result<RenderedImage> {
        let rasterizer = self.rasterizer().await?;
        let image = rasterizer.encode(payload)?;
        Ok(RenderedImage {
            image,
            source: ArtifactSource::Encoder,
        })
    }
}
