//! UI label translations and locale resolution

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Supported UI languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Turkish (Türkiye), the default
    #[default]
    #[serde(rename = "tr-TR")]
    TrTr,
    /// English (United States)
    #[serde(rename = "en-US")]
    EnUs,
}

/// Every supported locale, in toggle order.
pub const SUPPORTED: [Locale; 2] = [Locale::TrTr, Locale::EnUs];

impl Locale {
    /// BCP 47 tag of this locale
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::TrTr => "tr-TR",
            Locale::EnUs => "en-US",
        }
    }

    /// Look up an exact tag match.
    pub fn from_tag(tag: &str) -> Option<Self> {
        SUPPORTED.into_iter().find(|locale| locale.tag() == tag)
    }

    /// The next supported locale, wrapping around.
    pub fn toggle(self) -> Self {
        let index = SUPPORTED.iter().position(|l| *l == self).unwrap_or(0);
        SUPPORTED[(index + 1) % SUPPORTED.len()]
    }

    /// Translated text for a label.
    pub fn text(&self, label: Label) -> &'static str {
        translate(*self, label)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Map a requested language tag onto a supported locale.
///
/// Exact matches win, then the first locale sharing the primary language
/// subtag (`en-GB` resolves to `en-US`), then [`Locale::default`]. Both `-`
/// and `_` are accepted as subtag separators.
pub fn resolve_locale(requested: &str) -> Locale {
    let normalized = requested.trim().replace('_', "-");
    if let Some(exact) = Locale::from_tag(&normalized) {
        return exact;
    }

    let language = normalized.split('-').next().unwrap_or_default();
    if !language.is_empty() {
        let prefix = format!("{}-", language.to_ascii_lowercase());
        if let Some(matched) = SUPPORTED
            .into_iter()
            .find(|locale| locale.tag().starts_with(&prefix))
        {
            return matched;
        }
    }

    Locale::default()
}

/// Locale named by a POSIX locale value such as `en_US.UTF-8` or `tr_TR@euro`.
///
/// Returns `None` for empty values and the `C` / `POSIX` locales, which name
/// no language.
pub fn locale_from_posix(value: &str) -> Option<Locale> {
    let tag = value.split(['.', '@']).next().unwrap_or_default().trim();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(resolve_locale(tag))
}

/// Detect the user's locale from the POSIX environment (`LC_ALL`,
/// `LC_MESSAGES`, `LANG`).
pub fn detect_locale() -> Locale {
    for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        let Ok(value) = env::var(var) else {
            continue;
        };
        if let Some(locale) = locale_from_posix(&value) {
            tracing::debug!(variable = var, value = %value, locale = %locale, "Detected locale");
            return locale;
        }
    }
    Locale::default()
}

/// Translatable UI strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// Window / page title
    AppTitle,
    /// Short description under the title
    AppSubtitle,
    /// Tab for link QR codes
    UrlTab,
    /// Tab for contact QR codes
    ContactTab,
    /// Link input label
    UrlLabel,
    /// Link input placeholder
    UrlPlaceholder,
    /// First name label
    FirstName,
    /// Last name label
    LastName,
    /// Phone label
    Phone,
    /// Email label
    Email,
    /// Organisation label
    Organization,
    /// Website label
    Website,
    /// Download action
    Download,
    /// Copy action
    CopyData,
    /// Shown after a successful copy
    Copied,
    /// Clear action
    ClearAll,
    /// Alternative text for the QR image
    QrAltText,
    /// Placeholder shown when nothing is rendered
    EmptyState,
    /// Language switch action
    LanguageToggle,
}

impl Label {
    /// Every label, used to check table completeness.
    pub const ALL: [Label; 19] = [
        Label::AppTitle,
        Label::AppSubtitle,
        Label::UrlTab,
        Label::ContactTab,
        Label::UrlLabel,
        Label::UrlPlaceholder,
        Label::FirstName,
        Label::LastName,
        Label::Phone,
        Label::Email,
        Label::Organization,
        Label::Website,
        Label::Download,
        Label::CopyData,
        Label::Copied,
        Label::ClearAll,
        Label::QrAltText,
        Label::EmptyState,
        Label::LanguageToggle,
    ];

    /// Table key for this label
    pub fn key(&self) -> &'static str {
        match self {
            Label::AppTitle => "appTitle",
            Label::AppSubtitle => "appSubtitle",
            Label::UrlTab => "urlTab",
            Label::ContactTab => "contactTab",
            Label::UrlLabel => "urlLabel",
            Label::UrlPlaceholder => "urlPlaceholder",
            Label::FirstName => "firstName",
            Label::LastName => "lastName",
            Label::Phone => "phone",
            Label::Email => "email",
            Label::Organization => "organization",
            Label::Website => "website",
            Label::Download => "download",
            Label::CopyData => "copyData",
            Label::Copied => "copied",
            Label::ClearAll => "clearAll",
            Label::QrAltText => "qrAltText",
            Label::EmptyState => "emptyState",
            Label::LanguageToggle => "languageToggle",
        }
    }

    /// Reverse of [`Label::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.key() == key)
    }
}

/// Look up a label by its string key.
pub fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    Label::from_key(key).map(|label| translate(locale, label))
}

/// Translated text for `label` in `locale`.
pub fn translate(locale: Locale, label: Label) -> &'static str {
    match locale {
        Locale::TrTr => match label {
            Label::AppTitle => "QR Kod Oluşturucu",
            Label::AppSubtitle => "Web sitesi veya kişi kartı için QR kod oluşturun",
            Label::UrlTab => "Web Sitesi",
            Label::ContactTab => "Kişi Kartı",
            Label::UrlLabel => "Web Sitesi Adresi",
            Label::UrlPlaceholder => "ornek.com",
            Label::FirstName => "Ad",
            Label::LastName => "Soyad",
            Label::Phone => "Telefon",
            Label::Email => "E-posta",
            Label::Organization => "Şirket",
            Label::Website => "Web Sitesi",
            Label::Download => "İndir",
            Label::CopyData => "Veriyi Kopyala",
            Label::Copied => "Kopyalandı!",
            Label::ClearAll => "Tümünü Temizle",
            Label::QrAltText => "QR Kod",
            Label::EmptyState => "QR kod oluşturmak için bilgileri girin",
            Label::LanguageToggle => "English",
        },
        Locale::EnUs => match label {
            Label::AppTitle => "QR Code Generator",
            Label::AppSubtitle => "Create QR codes for websites or contact cards",
            Label::UrlTab => "Website",
            Label::ContactTab => "Contact Card",
            Label::UrlLabel => "Website Address",
            Label::UrlPlaceholder => "example.com",
            Label::FirstName => "First Name",
            Label::LastName => "Last Name",
            Label::Phone => "Phone",
            Label::Email => "Email",
            Label::Organization => "Company",
            Label::Website => "Website",
            Label::Download => "Download",
            Label::CopyData => "Copy Data",
            Label::Copied => "Copied!",
            Label::ClearAll => "Clear All",
            Label::QrAltText => "QR Code",
            Label::EmptyState => "Enter details to generate a QR code",
            Label::LanguageToggle => "Türkçe",
        },
    }
}
