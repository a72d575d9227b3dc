//! Orchestrator wiring session events to the renderer, clipboard and downloads

use crate::config::QrcardConfig;
use crate::error::{Error, Result};
use crate::locale::{Label, Locale};
use crate::output::{self, Clipboard, SystemClipboard};
use crate::render::{HttpFetcher, RenderOutcome, Renderer};
use crate::session::{Command, Event, Session};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long the "copied" indicator stays on after a successful copy
pub const COPIED_INDICATOR_DURATION: Duration = Duration::from_secs(2);

/// Carry out a session [`Command`] against the renderer.
///
/// Returns `None` when the command did not involve drawing.
pub async fn execute(renderer: &Renderer, command: Command, locale: Locale) -> Option<RenderOutcome> {
    match command {
        Command::Render(payload) => {
            Some(renderer.render(&payload, locale.text(Label::QrAltText)).await)
        }
        Command::Clear => {
            renderer.clear();
            None
        }
        Command::None => None,
    }
}

/// Transient flag with a restartable reset timer
#[derive(Default)]
struct CopiedIndicator {
    flag: Arc<AtomicBool>,
    reset: Option<JoinHandle<()>>,
}

impl CopiedIndicator {
    fn trigger(&mut self, after: Duration) {
        if let Some(pending) = self.reset.take() {
            pending.abort();
        }

        self.flag.store(true, Ordering::SeqCst);
        let flag = Arc::clone(&self.flag);
        self.reset = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            flag.store(false, Ordering::SeqCst);
            tracing::trace!("Copied indicator reset");
        }));
    }

    fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Drop for CopiedIndicator {
    fn drop(&mut self) {
        if let Some(pending) = self.reset.take() {
            pending.abort();
        }
    }
}

/// QR generator front end: owns the session and drives the renderer
pub struct QrGenerator {
    session: Session,
    renderer: Arc<Renderer>,
    clipboard: Arc<dyn Clipboard>,
    copied: CopiedIndicator,
}

impl QrGenerator {
    /// Generator with explicit collaborators
    pub fn new(locale: Locale, renderer: Arc<Renderer>, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            session: Session::new(locale),
            renderer,
            clipboard,
            copied: CopiedIndicator::default(),
        }
    }

    /// Generator using the HTTP fallback chain and the system clipboard
    pub fn from_config(config: &QrcardConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.render.timeout())?);
        let renderer = Arc::new(Renderer::from_options(&config.render, fetcher));
        tracing::debug!(strategies = ?renderer.strategy_names(), "Renderer configured");

        Ok(Self::new(
            config.locale.resolve(),
            renderer,
            Arc::new(SystemClipboard::new()),
        ))
    }

    /// Replace the clipboard sink, e.g. with one that serves copied text
    /// before a short-lived process exits.
    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Current session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Shared handle to the renderer
    pub fn renderer(&self) -> Arc<Renderer> {
        Arc::clone(&self.renderer)
    }

    /// Translated label in the current UI language
    pub fn label(&self, label: Label) -> &'static str {
        self.session.locale().text(label)
    }

    /// Apply `event` to the session and return the command it produced
    /// without executing it.
    pub fn update(&mut self, event: Event) -> Command {
        let session = std::mem::take(&mut self.session);
        let (next, command) = session.apply(event);
        self.session = next;
        command
    }

    /// Apply `event` and carry out its command.
    pub async fn dispatch(&mut self, event: Event) -> Option<RenderOutcome> {
        tracing::trace!(?event, "Dispatching event");
        let command = self.update(event);
        execute(&self.renderer, command, self.session.locale()).await
    }

    /// Save the current QR code as `qr-code-<mode>.png` in `dir`.
    pub fn download(&self, dir: &Path) -> Result<PathBuf> {
        if !self.session.has_payload() {
            return Err(Error::EmptyPayload);
        }

        let artifact = self
            .renderer
            .current()
            .filter(|artifact| artifact.payload == self.session.payload())
            .ok_or(Error::NoArtifact)?;

        output::save_png(&artifact, self.session.mode(), dir)
    }

    /// Copy the payload text to the clipboard and raise the "copied" indicator.
    ///
    /// On failure the indicator is left untouched.
    pub async fn copy_data(&mut self) -> Result<()> {
        if !self.session.has_payload() {
            return Err(Error::EmptyPayload);
        }

        match self.clipboard.write_text(self.session.payload()).await {
            Ok(()) => {
                self.copied.trigger(COPIED_INDICATOR_DURATION);
                tracing::debug!(bytes = self.session.payload().len(), "Payload copied");
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Copy to clipboard failed: {err}");
                Err(err)
            }
        }
    }

    /// Whether the "copied" indicator is currently shown
    pub fn is_copied(&self) -> bool {
        self.copied.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::FakeStrategy;
    use crate::render::RenderStrategy;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClipboard {
        writes: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Clipboard for RecordingClipboard {
        async fn write_text(&self, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::Clipboard("permission denied".into()));
            }
            self.writes.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn generator(clipboard: Arc<RecordingClipboard>) -> QrGenerator {
        let strategy: Arc<dyn RenderStrategy> = FakeStrategy::ok("fake");
        QrGenerator::new(Locale::EnUs, Arc::new(Renderer::new(vec![strategy])), clipboard)
    }

    #[tokio::test]
    async fn edits_render_and_clear_artifacts() {
        let mut app = generator(Arc::default());

        let outcome = app.dispatch(Event::EditUrl("example.com".into())).await;
        let artifact = outcome.as_ref().and_then(|o| o.artifact()).unwrap();
        assert_eq!(artifact.payload, "https://example.com");
        assert_eq!(artifact.alt_text, "QR Code");

        app.dispatch(Event::ClearAll).await;
        assert!(app.renderer().current().is_none());
    }

    #[tokio::test]
    async fn locale_toggle_keeps_artifact() {
        let mut app = generator(Arc::default());
        app.dispatch(Event::EditUrl("example.com".into())).await;
        assert!(app.dispatch(Event::ToggleLocale).await.is_none());
        assert_eq!(app.label(Label::Download), "İndir");
        assert!(app.renderer().current().is_some());
    }

    #[tokio::test]
    async fn download_requires_payload() {
        let app = generator(Arc::default());
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(app.download(dir.path()), Err(Error::EmptyPayload)));
    }

    #[tokio::test]
    async fn download_uses_mode_in_file_name() {
        let mut app = generator(Arc::default());
        app.dispatch(Event::EditUrl("example.com".into())).await;
        let dir = tempfile::tempdir().unwrap();

        let path = app.download(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("qr-code-url.png"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn copy_failure_leaves_indicator_off() {
        let clipboard = Arc::new(RecordingClipboard {
            fail: true,
            ..Default::default()
        });
        let mut app = generator(clipboard);
        app.dispatch(Event::EditUrl("example.com".into())).await;

        assert!(matches!(app.copy_data().await, Err(Error::Clipboard(_))));
        assert!(!app.is_copied());
        assert_eq!(app.session().payload(), "https://example.com");
    }

    #[tokio::test]
    async fn copy_without_payload_is_rejected() {
        let clipboard = Arc::new(RecordingClipboard::default());
        let mut app = generator(clipboard.clone());
        assert!(matches!(app.copy_data().await, Err(Error::EmptyPayload)));
        assert!(clipboard.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn replaced_clipboard_receives_copies() {
        let original = Arc::new(RecordingClipboard::default());
        let replacement = Arc::new(RecordingClipboard::default());
        let mut app = generator(original.clone()).with_clipboard(replacement.clone());
        app.dispatch(Event::EditUrl("example.com".into())).await;

        app.copy_data().await.unwrap();
        assert!(original.writes.lock().unwrap().is_empty());
        assert_eq!(*replacement.writes.lock().unwrap(), vec!["https://example.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn copied_indicator_reverts_after_two_seconds() {
        let clipboard = Arc::new(RecordingClipboard::default());
        let mut app = generator(clipboard.clone());
        app.dispatch(Event::EditUrl("example.com".into())).await;

        app.copy_data().await.unwrap();
        assert!(app.is_copied());
        assert_eq!(*clipboard.writes.lock().unwrap(), vec!["https://example.com"]);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(app.is_copied());

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(!app.is_copied());
    }

    #[tokio::test(start_paused = true)]
    async fn second_copy_restarts_the_timer() {
        let mut app = generator(Arc::default());
        app.dispatch(Event::EditUrl("example.com".into())).await;

        app.copy_data().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        app.copy_data().await.unwrap();

        // 2000ms after the first copy: the first timer must not fire.
        tokio::time::sleep(Duration::from_millis(1001)).await;
        tokio::task::yield_now().await;
        assert!(app.is_copied());

        // 2000ms after the second copy.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        tokio::task::yield_now().await;
        assert!(!app.is_copied());
    }
}
