//! REST paths of the ticket backend, relative to the API base URL.
//!
//! Path parameters are percent-encoded so ids that come from a route or a
//! link can never escape their segment.

use std::fmt::Display;

fn seg(value: impl Display) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

// --- courses ---

pub fn courses() -> String {
    "/kurssit".to_string()
}

pub fn my_courses() -> String {
    "/minun/kurssit".to_string()
}

pub fn course(course: impl Display) -> String {
    format!("/kurssi/{}", seg(course))
}

pub fn participants(course: impl Display) -> String {
    format!("/kurssi/{}/osallistujat", seg(course))
}

pub fn invitations(course: impl Display) -> String {
    format!("/kurssi/{}/osallistujat/kutsu", seg(course))
}

pub fn invitation(course: impl Display, token: impl Display) -> String {
    format!("/kurssi/{}/osallistujat/kutsu/{}", seg(course), seg(token))
}

pub fn field_template(course: impl Display) -> String {
    format!("/kurssi/{}/tikettipohja/kentat", seg(course))
}

pub fn faqs(course: impl Display) -> String {
    format!("/kurssi/{}/ukk", seg(course))
}

pub fn faq_export(course: impl Display) -> String {
    format!("/kurssi/{}/ukk/vienti", seg(course))
}

pub fn new_ticket(course: impl Display) -> String {
    format!("/kurssi/{}/tiketti", seg(course))
}

pub fn all_tickets(course: impl Display) -> String {
    format!("/kurssi/{}/tiketti/kaikki", seg(course))
}

// --- tickets ---

pub fn ticket(ticket: impl Display) -> String {
    format!("/tiketti/{}", seg(ticket))
}

pub fn ticket_fields(ticket: impl Display) -> String {
    format!("/tiketti/{}/kentat", seg(ticket))
}

pub fn ticket_comments(ticket: impl Display) -> String {
    format!("/tiketti/{}/kommentit", seg(ticket))
}

pub fn new_comment(ticket: impl Display) -> String {
    format!("/tiketti/{}/uusikommentti", seg(ticket))
}

pub fn comment(course: impl Display, ticket: impl Display, comment: impl Display) -> String {
    format!(
        "/kurssi/{}/tiketti/{}/kommentti/{}",
        seg(course),
        seg(ticket),
        seg(comment)
    )
}

pub fn attachments(ticket: impl Display, comment: impl Display) -> String {
    format!(
        "/tiketti/{}/kommentti/{}/liite",
        seg(ticket),
        seg(comment)
    )
}

pub fn attachment(ticket: impl Display, comment: impl Display, file: impl Display) -> String {
    format!(
        "/tiketti/{}/kommentti/{}/liite/{}",
        seg(ticket),
        seg(comment),
        seg(file)
    )
}

pub fn edit_faq(ticket: impl Display) -> String {
    format!("/tiketti/{}/muokkaaukk", seg(ticket))
}

pub fn archive_faq(ticket: impl Display) -> String {
    format!("/tiketti/{}/arkistoiukk", seg(ticket))
}

// --- session ---

pub fn me() -> String {
    "/minun".to_string()
}

pub fn login() -> String {
    "/login".to_string()
}

pub fn logout() -> String {
    "/logout".to_string()
}
