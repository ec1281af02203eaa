/// Printable tickets
///
/// [`render_ticket`] lays out one A4 page with the event and attendee
/// details and the ticket code shown at the venue entrance.

pub mod pdf;

use chrono::{DateTime, Utc};

use pdf::{Font, PageBuilder};

/// Everything printed on a ticket
#[derive(Debug, Clone)]
pub struct TicketDocument {
    pub event_title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub venue: String,
    pub city: String,
    pub attendee_name: String,
    pub attendee_email: String,
    pub ticket_code: String,
}

/// Renders the ticket as a PDF document
pub fn render_ticket(ticket: &TicketDocument) -> Vec<u8> {
    let mut page = PageBuilder::new();

    page.rect(48.0, 430.0, 499.0, 364.0, 2.0)
        .text(72.0, 750.0, 12.0, Font::Bold, "GROWTHYARI EVENT TICKET")
        .hline(72.0, 523.0, 738.0)
        .text(72.0, 705.0, 22.0, Font::Bold, &ticket.event_title)
        .text(
            72.0,
            675.0,
            12.0,
            Font::Regular,
            &format!(
                "{} - {} UTC",
                ticket.starts_at.format("%a, %d %b %Y %H:%M"),
                ticket.ends_at.format("%H:%M")
            ),
        )
        .text(
            72.0,
            657.0,
            12.0,
            Font::Regular,
            &format!("{}, {}", ticket.venue, ticket.city),
        )
        .hline(72.0, 523.0, 630.0)
        .text(72.0, 600.0, 10.0, Font::Bold, "ATTENDEE")
        .text(72.0, 582.0, 14.0, Font::Regular, &ticket.attendee_name)
        .text(72.0, 564.0, 11.0, Font::Regular, &ticket.attendee_email)
        .text(72.0, 520.0, 10.0, Font::Bold, "TICKET CODE")
        .text(72.0, 490.0, 26.0, Font::Bold, &ticket.ticket_code)
        .text(
            72.0,
            450.0,
            9.0,
            Font::Regular,
            "Present this code at the entrance. Tickets are non-transferable.",
        );

    page.finish()
}
