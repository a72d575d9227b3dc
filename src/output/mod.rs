//! Download, clipboard and summary output for rendered QR codes

pub mod clipboard;

pub use clipboard::{Clipboard, Ownership, SystemClipboard};

use crate::error::{Error, Result};
use crate::payload::Mode;
use crate::render::{Artifact, ArtifactSource};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// File name a download of `mode` is saved under
pub fn download_file_name(mode: Mode) -> String {
    format!("qr-code-{}.png", mode.as_str())
}

/// Write the artifact as `qr-code-<mode>.png` inside `dir`.
pub fn save_png(artifact: &Artifact, mode: Mode, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create directory {}: {e}", dir.display()),
        ))
    })?;

    let path = dir.join(download_file_name(mode));
    std::fs::write(&path, artifact.to_png()?).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write {}: {e}", path.display()),
        ))
    })?;

    tracing::info!(path = %path.display(), "QR code saved");
    Ok(path)
}

/// Combined structured and human-readable description of a generation run
#[derive(Debug, Clone)]
pub struct RenderedSummary {
    /// Structured JSON representation suitable for scripts
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

/// Inputs to [`summarize`]
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    /// Active mode
    pub mode: Mode,
    /// Encoded text
    pub payload: &'a str,
    /// What was drawn, if anything
    pub artifact: Option<&'a Artifact>,
    /// Where the PNG was saved, if it was
    pub saved_to: Option<&'a Path>,
    /// Whether the payload reached the clipboard
    pub copied: bool,
}

/// Describe a generation run for output.
pub fn summarize(input: SummaryInput<'_>) -> RenderedSummary {
    let source = input.artifact.map(|a| &a.source);
    let json = json!({
        "mode": input.mode.as_str(),
        "payload": input.payload,
        "rendered": input.artifact.is_some(),
        "strategy": input.artifact.map(|a| a.strategy),
        "source": source,
        "dimensions": input.artifact.map(|a| {
            let (w, h) = a.dimensions();
            json!({ "width": w, "height": h })
        }),
        "saved_to": input.saved_to.map(|p| p.display().to_string()),
        "copied": input.copied,
    });

    let mut human = vec![format!("Mode: {}", input.mode)];
    human.push("Payload:".to_string());
    human.extend(input.payload.lines().map(|line| format!("  {line}")));

    match input.artifact {
        Some(artifact) => {
            let (w, h) = artifact.dimensions();
            human.push(format!("Rendered: {w}x{h} via {}", artifact.strategy));
            if let ArtifactSource::Remote { url } = &artifact.source {
                human.push(format!("  Source: {url}"));
            }
        }
        None => human.push("Rendered: no (all render strategies failed)".to_string()),
    }

    if let Some(path) = input.saved_to {
        human.push(format!("Saved: {}", path.display()));
    }
    if input.copied {
        human.push("Copied payload to clipboard".to_string());
    }

    RenderedSummary { json, human }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    fn artifact() -> Artifact {
        Artifact {
            payload: "https://example.com".into(),
            image: DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 300, Luma([255]))),
            source: ArtifactSource::Remote {
                url: "https://qr.test/?data=x".into(),
            },
            alt_text: "QR Code".into(),
            strategy: "qrserver",
        }
    }

    #[test]
    fn file_name_follows_mode() {
        assert_eq!(download_file_name(Mode::Url), "qr-code-url.png");
        assert_eq!(download_file_name(Mode::Contact), "qr-code-contact.png");
    }

    #[test]
    fn saves_png_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("codes");
        let path = save_png(&artifact(), Mode::Contact, &nested).unwrap();

        assert_eq!(path, nested.join("qr-code-contact.png"));
        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (300, 300));
    }

    #[test]
    fn summary_reports_remote_source() {
        let artifact = artifact();
        let summary = summarize(SummaryInput {
            mode: Mode::Url,
            payload: &artifact.payload,
            artifact: Some(&artifact),
            saved_to: None,
            copied: true,
        });

        assert_eq!(summary.json["strategy"], "qrserver");
        assert_eq!(summary.json["source"]["kind"], "remote");
        assert_eq!(summary.json["dimensions"]["width"], 300);
        assert_eq!(summary.json["copied"], true);
        assert!(summary.human.iter().any(|l| l.contains("via qrserver")));
        assert!(summary.human.iter().any(|l| l.contains("clipboard")));
    }

    #[test]
    fn summary_without_artifact() {
        let summary = summarize(SummaryInput {
            mode: Mode::Contact,
            payload: "BEGIN:VCARD\nEND:VCARD",
            artifact: None,
            saved_to: None,
            copied: false,
        });
        assert_eq!(summary.json["rendered"], false);
        assert!(summary.json["strategy"].is_null());
        assert!(summary.human.contains(&"  BEGIN:VCARD".to_string()));
    }
}
