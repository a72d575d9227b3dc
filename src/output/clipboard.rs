//! System clipboard access

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Text clipboard sink
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`.
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// How written contents stay available once `write_text` returns.
///
/// On X11 and Wayland the writing process serves the selection itself, so
/// the contents vanish with the last `arboard::Clipboard` handle unless a
/// clipboard manager copies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The platform stores the contents (Windows, macOS)
    Platform,
    /// The handle is held until the [`SystemClipboard`] is dropped
    KeepAlive,
    /// `write_text` blocks, serving the contents until another application
    /// takes the selection or the window elapses
    ServeFor(Duration),
}

impl Ownership {
    /// Ownership used on the current platform.
    ///
    /// `serve_for` is only honoured where the process must serve the
    /// selection itself; short-lived processes pass a window, long-lived
    /// hosts pass `None`.
    pub fn for_platform(serve_for: Option<Duration>) -> Self {
        if !cfg!(target_os = "linux") {
            return Self::Platform;
        }
        match serve_for {
            Some(window) => Self::ServeFor(window.max(Duration::from_secs(1))),
            None => Self::KeepAlive,
        }
    }
}

/// Desktop clipboard via `arboard`, driven from the blocking pool
pub struct SystemClipboard {
    ownership: Ownership,
    owner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    /// Clipboard for long-lived hosts: contents stay available while `self` lives.
    pub fn new() -> Self {
        Self::with_ownership(Ownership::for_platform(None))
    }

    /// Clipboard for a process about to exit: each write serves the
    /// contents for up to `window` before returning.
    pub fn serving_for(window: Duration) -> Self {
        Self::with_ownership(Ownership::for_platform(Some(window)))
    }

    fn with_ownership(ownership: Ownership) -> Self {
        Self {
            ownership,
            owner: Mutex::new(None),
        }
    }

    /// Ownership applied to each write
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard")
            .field("ownership", &self.ownership)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        let ownership = self.ownership;
        let held = self
            .owner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let clipboard = tokio::task::spawn_blocking(move || {
            let mut clipboard = match held {
                Some(clipboard) => clipboard,
                None => arboard::Clipboard::new()
                    .map_err(|e| Error::Clipboard(format!("Cannot access clipboard: {e}")))?,
            };
            set_text(&mut clipboard, text, ownership)
                .map_err(|e| Error::Clipboard(format!("Failed to write clipboard: {e}")))?;
            Ok::<_, Error>(clipboard)
        })
        .await
        .map_err(|e| Error::Clipboard(format!("Clipboard task failed: {e}")))??;

        match ownership {
            Ownership::KeepAlive => {
                *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(clipboard);
            }
            Ownership::ServeFor(window) => {
                tracing::debug!(?window, "Clipboard contents served until replaced or timed out");
            }
            Ownership::Platform => {}
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn set_text(
    clipboard: &mut arboard::Clipboard,
    text: String,
    ownership: Ownership,
) -> std::result::Result<(), arboard::Error> {
    use arboard::SetExtLinux;

    match ownership {
        Ownership::ServeFor(window) => clipboard
            .set()
            .wait_until(std::time::Instant::now() + window)
            .text(text),
        Ownership::KeepAlive | Ownership::Platform => clipboard.set_text(text),
    }
}

#[cfg(not(target_os = "linux"))]
fn set_text(
    clipboard: &mut arboard::Clipboard,
    text: String,
    _ownership: Ownership,
) -> std::result::Result<(), arboard::Error> {
    clipboard.set_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_keeps_the_selection_owner() {
        assert_eq!(Ownership::for_platform(None), Ownership::KeepAlive);
        assert_eq!(
            SystemClipboard::serving_for(Duration::from_secs(30)).ownership(),
            Ownership::ServeFor(Duration::from_secs(30))
        );
        assert_eq!(SystemClipboard::new().ownership(), Ownership::KeepAlive);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn serve_window_is_at_least_one_second() {
        assert_eq!(
            Ownership::for_platform(Some(Duration::ZERO)),
            Ownership::ServeFor(Duration::from_secs(1))
        );
    }

    #[cfg(not(target_os = "linux"))]
    #[test]
    fn platform_clipboards_store_contents() {
        assert_eq!(
            Ownership::for_platform(Some(Duration::from_secs(30))),
            Ownership::Platform
        );
        assert_eq!(SystemClipboard::new().ownership(), Ownership::Platform);
    }
}
