//! Session state and its transition function
//!
//! [`Session::apply`] is pure: it takes an [`Event`] and returns the next
//! state plus the [`Command`] the orchestrator must carry out against the
//! renderer. No I/O happens here.

use crate::locale::Locale;
use crate::payload::{self, ContactField, ContactInput, Mode};
use serde::Serialize;

/// Coarse editing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Nothing has been entered in any mode
    Idle,
    /// At least one field holds text
    Editing,
}

/// User input driving the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The link text changed
    EditUrl(String),
    /// One contact field changed
    EditContact(ContactField, String),
    /// The active tab changed
    SwitchMode(Mode),
    /// Reset every input
    ClearAll,
    /// Cycle to the next UI language
    ToggleLocale,
    /// Jump straight to a UI language
    SetLocale(Locale),
}

/// Work the orchestrator must do after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Draw this payload, replacing the current artifact
    Render(String),
    /// Remove the current artifact
    Clear,
    /// Nothing to do
    None,
}

/// Everything the user has entered, plus the derived payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    mode: Mode,
    locale: Locale,
    url: String,
    contact: ContactInput,
    payload: String,
}

impl Session {
    /// Empty session in `locale`
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    /// Active mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// UI language
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Raw link text as typed
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Contact fields as typed
    pub fn contact(&self) -> &ContactInput {
        &self.contact
    }

    /// Text that is (or would be) encoded for the active mode
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Whether there is anything to encode
    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Idle until something is typed in either mode
    pub fn phase(&self) -> Phase {
        if self.url.is_empty() && self.contact.is_empty() {
            Phase::Idle
        } else {
            Phase::Editing
        }
    }

    /// Apply `event`, returning the next state and the render work it implies.
    pub fn apply(mut self, event: Event) -> (Self, Command) {
        match event {
            Event::EditUrl(text) => {
                self.url = text;
                self.recompute()
            }
            Event::EditContact(field, value) => {
                self.contact.set(field, value);
                self.recompute()
            }
            Event::SwitchMode(mode) => {
                self.mode = mode;
                self.recompute()
            }
            Event::ClearAll => {
                self.url.clear();
                self.contact = ContactInput::default();
                self.payload.clear();
                (self, Command::Clear)
            }
            Event::ToggleLocale => {
                self.locale = self.locale.toggle();
                (self, Command::None)
            }
            Event::SetLocale(locale) => {
                self.locale = locale;
                (self, Command::None)
            }
        }
    }

    fn recompute(mut self) -> (Self, Command) {
        let next = payload::format_payload(self.mode, &self.url, &self.contact);
        if next == self.payload {
            return (self, Command::None);
        }

        self.payload = next;
        let command = if self.payload.is_empty() {
            Command::Clear
        } else {
            Command::Render(self.payload.clone())
        };
        (self, command)
    }
}
