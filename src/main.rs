//! QRCARD command-line entrypoint

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use qrcard::output::{self, Ownership, SummaryInput, SystemClipboard};
use qrcard::{
    ContactField, Event, Label, Mode, QrGenerator, QrcardConfig, logging, resolve_locale,
};
use qrcode::QrCode;
use qrcode::render::unicode;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "qrcard",
    version,
    about = "Generate QR codes for website links and contact cards"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to qrcard.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// UI language tag (e.g. en-US, tr-TR); closest supported match is used
    #[arg(long, value_name = "TAG")]
    locale: Option<String>,

    /// Directory to save qr-code-<mode>.png into (overrides config)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Skip saving the PNG
    #[arg(long)]
    no_save: bool,

    /// Copy the encoded text to the clipboard
    #[arg(long)]
    copy: bool,

    /// Print the QR code to the terminal as well
    #[arg(long)]
    terminal: bool,

    /// Never contact remote image services
    #[arg(long)]
    offline: bool,

    /// Output results as formatted JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Target,
}

#[derive(Subcommand, Debug)]
enum Target {
    /// Encode a website link (https:// is added when missing)
    Url {
        /// Link to encode
        text: String,
    },
    /// Encode a vCard contact card
    Contact(ContactArgs),
}

#[derive(Args, Debug, Default)]
struct ContactArgs {
    /// Given name
    #[arg(long)]
    first_name: Option<String>,
    /// Family name
    #[arg(long)]
    last_name: Option<String>,
    /// Telephone number
    #[arg(long)]
    phone: Option<String>,
    /// Email address
    #[arg(long)]
    email: Option<String>,
    /// Company or organisation
    #[arg(long)]
    organization: Option<String>,
    /// Website
    #[arg(long)]
    website: Option<String>,
}

impl ContactArgs {
    fn into_events(self) -> Vec<Event> {
        [
            (ContactField::FirstName, self.first_name),
            (ContactField::LastName, self.last_name),
            (ContactField::Phone, self.phone),
            (ContactField::Email, self.email),
            (ContactField::Organization, self.organization),
            (ContactField::WebsiteUrl, self.website),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| Event::EditContact(field, v)))
        .collect()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = QrcardConfig::load(cli.config.as_deref())?;
    if cli.offline {
        config.render.remote_fallback = false;
    }
    if let Some(dir) = cli.out.clone() {
        config.output.directory = dir;
    }
    if let Some(tag) = cli.locale.clone() {
        config.locale.preferred = Some(tag);
    }

    logging::init(&config.logging)?;

    let clipboard = SystemClipboard::serving_for(config.output.clipboard_hold());
    let clipboard_ownership = clipboard.ownership();
    let mut generator = QrGenerator::from_config(&config)?.with_clipboard(Arc::new(clipboard));
    if let Some(tag) = &cli.locale {
        tracing::debug!(requested = %tag, resolved = %resolve_locale(tag), "Locale selected");
    }

    let (mode, events) = match cli.command {
        Target::Url { text } => (Mode::Url, vec![Event::EditUrl(text)]),
        Target::Contact(args) => (Mode::Contact, args.into_events()),
    };

    generator.dispatch(Event::SwitchMode(mode)).await;
    for event in events {
        generator.dispatch(event).await;
    }

    if !generator.session().has_payload() {
        anyhow::bail!("{}", generator.label(Label::EmptyState));
    }

    let artifact = generator.renderer().current();
    if artifact.is_none() {
        tracing::error!("No render strategy could produce a QR code");
    }

    let saved_to = match (&artifact, cli.no_save) {
        (Some(_), false) => Some(
            generator
                .download(&config.output.directory)
                .context("Failed to save QR code")?,
        ),
        _ => None,
    };

    let copied = if cli.copy {
        if let Ownership::ServeFor(window) = clipboard_ownership {
            eprintln!(
                "Serving clipboard for up to {}s; paste now or copy something else to continue",
                window.as_secs()
            );
        }
        match generator.copy_data().await {
            Ok(()) => true,
            Err(err) => {
                eprintln!("{}: {err}", generator.label(Label::CopyData));
                false
            }
        }
    } else {
        false
    };

    let payload = generator.session().payload().to_string();
    let summary = output::summarize(SummaryInput {
        mode,
        payload: &payload,
        artifact: artifact.as_deref(),
        saved_to: saved_to.as_deref(),
        copied,
    });

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary.json)?);
    } else {
        println!("{}", generator.label(Label::AppTitle));
        for line in &summary.human {
            println!("{line}");
        }
    }

    if cli.terminal {
        print_terminal_preview(&payload)?;
    }

    if artifact.is_none() {
        anyhow::bail!("QR code could not be rendered");
    }
    Ok(())
}

fn print_terminal_preview(payload: &str) -> anyhow::Result<()> {
    let code = QrCode::new(payload.as_bytes()).context("Payload too large for a QR code")?;
    let block = code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build();
    println!("{block}");
    Ok(())
}
