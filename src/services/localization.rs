//! Localized user-facing strings.
//!
//! Finnish is the source language; English translations live next to it in
//! one table so a missing translation is easy to spot.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Supported UI languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "fi-FI")]
    Finnish,
    #[serde(rename = "en-US")]
    English,
}

impl Language {
    /// Locale code as stored under the `language` key.
    pub fn code(self) -> &'static str {
        match self {
            Self::Finnish => "fi-FI",
            Self::English => "en-US",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "fi-FI" | "fi" => Some(Self::Finnish),
            "en-US" | "en" => Some(Self::English),
            _ => None,
        }
    }

    /// The language the toggle switches to.
    pub fn other(self) -> Self {
        match self {
            Self::Finnish => Self::English,
            Self::English => Self::Finnish,
        }
    }
}

/// (key, Finnish, English)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("login.login", "Kirjaudu sisään", "Log in"),
    ("login.logout", "Kirjaudu ulos", "Log out"),
    ("login.failed", "Kirjautuminen epäonnistui.", "Login failed."),
    ("button.login", "Kirjaudu", "Log in"),
    ("button.create-account", "Luo tili", "Create account"),
    ("button.close", "Sulje", "Close"),
    ("list.title", "Kysymykset", "Questions"),
    (
        "list.missing-course",
        "Kurssin tunnistetietoa ei löytynyt. Tarkista URL-osoitteen oikeinkirjoitus.",
        "The course could not be identified. Check the spelling of the URL.",
    ),
    (
        "list.not-participant.title",
        "Et osallistu tälle kurssille.",
        "You are not a participant of this course.",
    ),
    (
        "list.not-participant.message",
        "Et voi kysyä kysymyksiä tällä kurssilla, etkä tarkastella muiden kysymiä kysymyksiä.",
        "You cannot ask questions on this course or view questions asked by others.",
    ),
    ("list.not-logged-in.title", "Et ole kirjautunut.", "You are not logged in."),
    (
        "list.not-logged-in.message",
        "Et voi lisätä tai nähdä kurssilla esitettyjä henkilökohtaisia kysymyksiä.",
        "You cannot add or view personal questions asked on this course.",
    ),
    ("list.load-failed", "Kysymysten lataaminen epäonnistui.", "Loading the questions failed."),
    ("attachments.none", "Ei liitetiedostoa.", "No attachment."),
    ("attachments.attach", "Liitä", "Attach"),
    ("attachments.attach-files", "Liitä tiedostoja", "Attach files"),
    ("attachments.too-large", "Tiedosto on liian suuri.", "The file is too large."),
    (
        "attachments.not-all-sent",
        "Kaikkien liitteiden lähettäminen ei onnistunut.",
        "Not all attachments could be sent.",
    ),
    (
        "attachments.upload-failed",
        "Tiedoston lähettäminen epäonnistui.",
        "Sending the file failed.",
    ),
    (
        "attachments.not-all-removed",
        "Kaikkien valittujen liitetiedostojen poistaminen ei onnistunut.",
        "Not all selected attachments could be removed.",
    ),
    ("role.me", "Minä", "Me"),
    ("role.student", "Opiskelija", "Student"),
    ("role.teacher", "Opettaja", "Teacher"),
    ("role.admin", "Admin", "Admin"),
    ("comment.remove-failed", "Kommentin poistaminen ei onnistunut.", "Removing the comment failed."),
    ("comment.edit-failed", "Kommentin muokkaaminen epäonnistui.", "Editing the comment failed."),
    ("form.title", "Otsikko", "Title"),
    ("form.required", "Pakollinen tieto.", "Required."),
    ("form.too-long", "Teksti on liian pitkä.", "The text is too long."),
    ("form.invalid-email", "Virheellinen sähköpostiosoite.", "Invalid email address."),
    (
        "form.password-too-short",
        "Salasanan on oltava vähintään 8 merkkiä.",
        "The password must be at least 8 characters.",
    ),
    ("ticket.new", "Uusi kysymys", "New question"),
    ("ticket.send-failed", "Kysymyksen lähettäminen epäonnistui.", "Sending the question failed."),
    ("faq.new", "Uusi UKK", "New FAQ"),
    ("faq.edit", "Muokkaa UKK:ta", "Edit FAQ"),
    (
        "faq.send-failed",
        "Usein kysytyn kysymyksen lähettäminen epäonnistui.",
        "Sending the frequently asked question failed.",
    ),
    (
        "faq.show-failed",
        "Usein kysytyn kysymyksen näyttäminen epäonnistui.",
        "Showing the frequently asked question failed.",
    ),
    (
        "faq.archive-failed",
        "Usein kysytyn kysymyksen poistaminen ei onnistunut.",
        "Removing the frequently asked question failed.",
    ),
    ("error.title", "Virhe", "Error"),
    (
        "error.no-permission",
        "Sinulla ei ole riittäviä käyttäjäoikeuksia.",
        "You do not have sufficient permissions.",
    ),
    (
        "error.not-logged-in",
        "Istuntosi on vanhentunut. Kirjaudu uudelleen.",
        "Your session has expired. Please log in again.",
    ),
    (
        "error.network",
        "Palvelimeen ei saatu yhteyttä.",
        "Could not connect to the server.",
    ),
    ("error.server", "Palvelimella tapahtui virhe.", "A server error occurred."),
    (
        "join.info-failed",
        "Antamallasi URL-osoitteella ei löytynyt kutsun tietoja. Kutsu on voinut vanhentua.",
        "No invitation was found at this address. The invitation may have expired.",
    ),
    ("join.failed", "Kurssille liittyminen ei onnistunut.", "Joining the course failed."),
    ("join.title", "Liity kurssille", "Join course"),
    ("join.wrong-user.title", "Väärä käyttäjä", "Wrong user"),
    (
        "join.wrong-user.message",
        "Liittyäksesi kurssille, kirjaudu sisään käyttäjänä, jolle kutsu on lähetetty.",
        "To join the course, log in as the user the invitation was sent to.",
    ),
    ("state.sent", "Lähetetty", "Sent"),
    ("state.read", "Luettu", "Read"),
    ("state.info-requested", "Lisätietoa pyydetty", "More info requested"),
    ("state.commented", "Kommentoitu", "Commented"),
    ("state.proposed-solution", "Ratkaisuehdotus", "Proposed solution"),
    ("state.resolved", "Ratkaistu", "Resolved"),
    ("state.archived", "Arkistoitu", "Archived"),
];

/// Looks up user-facing strings in the active language.
#[derive(Debug, Default)]
pub struct Localizer {
    language: RwLock<Language>,
}

impl Localizer {
    pub fn new(language: Language) -> Self {
        Self {
            language: RwLock::new(language),
        }
    }

    pub fn language(&self) -> Language {
        *self.language.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_language(&self, language: Language) {
        *self.language.write().unwrap_or_else(|e| e.into_inner()) = language;
    }

    /// The message for `key`. Unknown keys come back verbatim.
    pub fn get(&self, key: &str) -> String {
        let language = self.language();
        match MESSAGES.iter().find(|(id, _, _)| *id == key) {
            Some((_, fi, en)) => match language {
                Language::Finnish => fi.to_string(),
                Language::English => en.to_string(),
            },
            None => {
                log::warn!("[i18n] missing message '{}'", key);
                key.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_follows_language() {
        let strings = Localizer::default();
        assert_eq!(strings.get("login.logout"), "Kirjaudu ulos");
        strings.set_language(Language::English);
        assert_eq!(strings.get("login.logout"), "Log out");
    }

    #[test]
    fn test_unknown_key_returned_verbatim() {
        assert_eq!(Localizer::default().get("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_keys_are_unique() {
        let mut seen = HashSet::new();
        for (key, fi, en) in MESSAGES {
            assert!(seen.insert(*key), "duplicate key {}", key);
            assert!(!fi.is_empty() && !en.is_empty());
        }
    }

    #[test]
    fn test_every_ticket_state_has_a_label() {
        use crate::models::TicketState;
        let strings = Localizer::new(Language::English);
        for state in 1u8..=7 {
            let state = TicketState::try_from(state).unwrap();
            assert_ne!(strings.get(state.label_key()), state.label_key());
        }
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("en-US"), Some(Language::English));
        assert_eq!(Language::from_code("sv-SE"), None);
        assert_eq!(Language::Finnish.other().code(), "en-US");
    }
}
