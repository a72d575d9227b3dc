//! QRCARD - QR code generator for website links and contact cards
//!
//! This library turns form input (a link, or the fields of a contact card)
//! into a QR code image, and offers the download and copy actions a UI needs.
//!
//! # Features
//!
//! - **Payload formatting**: link normalisation and vCard 3.0 text
//! - **Rendering with fallback**: in-process encoder first, remote image services after
//! - **Explicit state machine**: `(Session, Event) -> (Session, Command)`
//! - **Localised labels**: Turkish and English tables with locale resolution
//!
//! # Example
//!
//! ```no_run
//! use qrcard::{Event, QrGenerator, QrcardConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = QrcardConfig::load(None)?;
//!     let mut generator = QrGenerator::from_config(&config)?;
//!
//!     generator.dispatch(Event::EditUrl("example.com".into())).await;
//!     let saved = generator.download(std::path::Path::new("."))?;
//!
//!     println!("Saved {}", saved.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod app;
pub mod config;
pub mod error;
pub mod locale;
pub mod logging;
pub mod output;
pub mod payload;
pub mod render;
pub mod session;

// Re-exports for convenience
pub use error::{Error, Result};

pub use app::QrGenerator;
pub use config::{LocaleOptions, LoggingOptions, OutputOptions, QrcardConfig, RenderOptions};
pub use locale::{Label, Locale, resolve_locale};
pub use payload::{ContactField, ContactInput, Mode, format_contact, format_url};
pub use render::{Artifact, RenderOutcome, RenderStrategy, Renderer};
pub use session::{Command, Event, Phase, Session};
