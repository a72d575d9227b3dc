//! Payload formatting for URL and contact-card QR codes
//!
//! Both formatters are pure: they never fail, and an input with nothing
//! relevant in it produces an empty payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

/// Which kind of QR code the user is building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Website link
    #[default]
    Url,
    /// vCard contact card
    Contact,
}

impl Mode {
    /// Lowercase identifier used in file names and structured output
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Url => "url",
            Mode::Contact => "contact",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "url" | "link" => Ok(Mode::Url),
            "contact" | "vcard" => Ok(Mode::Contact),
            other => Err(format!("Unknown mode '{other}', expected 'url' or 'contact'")),
        }
    }
}

/// Contact details entered by the user. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Telephone number
    pub phone: String,
    /// Email address
    pub email: String,
    /// Company or organisation
    pub organization: String,
    /// Personal or company website
    pub website_url: String,
}

/// Addressable field of [`ContactInput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    /// [`ContactInput::first_name`]
    FirstName,
    /// [`ContactInput::last_name`]
    LastName,
    /// [`ContactInput::phone`]
    Phone,
    /// [`ContactInput::email`]
    Email,
    /// [`ContactInput::organization`]
    Organization,
    /// [`ContactInput::website_url`]
    WebsiteUrl,
}

impl ContactInput {
    /// Replace a single field, leaving the others untouched.
    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        *self.field_mut(field) = value.into();
    }

    /// Read a single field.
    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::FirstName => &self.first_name,
            ContactField::LastName => &self.last_name,
            ContactField::Phone => &self.phone,
            ContactField::Email => &self.email,
            ContactField::Organization => &self.organization,
            ContactField::WebsiteUrl => &self.website_url,
        }
    }

    fn field_mut(&mut self, field: ContactField) -> &mut String {
        match field {
            ContactField::FirstName => &mut self.first_name,
            ContactField::LastName => &mut self.last_name,
            ContactField::Phone => &mut self.phone,
            ContactField::Email => &mut self.email,
            ContactField::Organization => &mut self.organization,
            ContactField::WebsiteUrl => &mut self.website_url,
        }
    }

    /// True when none of the fields that make a card worth encoding are set.
    ///
    /// Organisation and website alone do not identify anyone.
    pub fn is_blank(&self) -> bool {
        self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.phone.is_empty()
            && self.email.is_empty()
    }

    /// True when every field, including organisation and website, is empty.
    pub fn is_empty(&self) -> bool {
        self.is_blank() && self.organization.is_empty() && self.website_url.is_empty()
    }
}

/// Normalise a user-entered link.
///
/// Whitespace is trimmed and `https://` is prepended unless the link already
/// names `http://` or `https://`. Nothing else is validated.
pub fn format_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if trimmed.starts_with(HTTP_PREFIX) || trimmed.starts_with(HTTPS_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{HTTPS_PREFIX}{trimmed}")
    }
}

/// Build a vCard 3.0 text block from the contact fields.
///
/// Empty fields still produce their line. Values are written verbatim;
/// commas, semicolons and newlines are not escaped.
pub fn format_contact(contact: &ContactInput) -> String {
    if contact.is_blank() {
        return String::new();
    }

    let lines = [
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{} {}", contact.first_name, contact.last_name),
        format!("N:{};{};;;", contact.last_name, contact.first_name),
        format!("ORG:{}", contact.organization),
        format!("TEL:{}", contact.phone),
        format!("EMAIL:{}", contact.email),
        format!("URL:{}", contact.website_url),
        "END:VCARD".to_string(),
    ];

    lines.join("\n")
}

/// Compute the payload for the active mode.
pub fn format_payload(mode: Mode, url: &str, contact: &ContactInput) -> String {
    match mode {
        Mode::Url => format_url(url),
        Mode::Contact => format_contact(contact),
    }
}
