/// Email templates
///
/// Every template returns both an HTML and a plain-text body. Values that
/// come from users (names, event titles) are HTML-escaped.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats an amount in the smallest currency unit
///
/// ```
/// use growthyari_shared::email::templates::format_amount;
///
/// assert_eq!(format_amount(123_450, "INR"), "₹1,234.50 INR");
/// assert_eq!(format_amount(500, "USD"), "$5.00 USD");
/// ```
pub fn format_amount(minor_units: i64, currency: &str) -> String {
    let symbol = match currency {
        "INR" => "₹",
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        _ => "",
    };
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();

    format!(
        "{}{}{}.{:02} {}",
        sign,
        symbol,
        group_thousands(abs / 100),
        abs % 100,
        currency
    )
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_when(starts_at: DateTime<Utc>) -> String {
    starts_at.format("%a, %d %b %Y at %H:%M UTC").to_string()
}

fn layout(title: &str, body_html: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body style=\"font-family:Helvetica,Arial,sans-serif;color:#1a1a1a\">\
         <h2>{}</h2>{}<p style=\"color:#777;font-size:12px\">GrowthYari</p></body></html>",
        title, body_html
    )
}

pub fn welcome(name: &str, base_url: &str) -> RenderedEmail {
    let events_url = format!("{}/events", base_url);
    RenderedEmail {
        subject: "Welcome to GrowthYari".to_string(),
        html: layout(
            "Welcome to GrowthYari",
            &format!(
                "<p>Hi {},</p><p>Your account is ready. \
                 <a href=\"{}\">Browse upcoming events</a> and start networking.</p>",
                escape_html(name),
                escape_html(&events_url)
            ),
        ),
        text: format!(
            "Hi {},\n\nYour account is ready. Browse upcoming events: {}\n",
            name, events_url
        ),
    }
}

/// Details shared by the registration and receipt templates
#[derive(Debug, Clone)]
pub struct EventDetails<'a> {
    pub title: &'a str,
    pub starts_at: DateTime<Utc>,
    pub venue: &'a str,
    pub city: &'a str,
}

pub fn registration_confirmed(
    name: &str,
    event: &EventDetails<'_>,
    ticket_code: &str,
) -> RenderedEmail {
    let when = format_when(event.starts_at);
    RenderedEmail {
        subject: format!("You're registered: {}", event.title),
        html: layout(
            "Registration confirmed",
            &format!(
                "<p>Hi {},</p><p>You're registered for <strong>{}</strong>.</p>\
                 <p>{}<br>{}, {}</p><p>Ticket code: <strong>{}</strong></p>",
                escape_html(name),
                escape_html(event.title),
                escape_html(&when),
                escape_html(event.venue),
                escape_html(event.city),
                escape_html(ticket_code)
            ),
        ),
        text: format!(
            "Hi {},\n\nYou're registered for {}.\n{}\n{}, {}\n\nTicket code: {}\n",
            name, event.title, when, event.venue, event.city, ticket_code
        ),
    }
}

pub fn payment_receipt(
    name: &str,
    event: &EventDetails<'_>,
    amount_paise: i64,
    currency: &str,
    payment_id: &str,
    ticket_code: &str,
) -> RenderedEmail {
    let amount = format_amount(amount_paise, currency);
    RenderedEmail {
        subject: format!("Payment receipt: {}", event.title),
        html: layout(
            "Payment received",
            &format!(
                "<p>Hi {},</p><p>We received <strong>{}</strong> for <strong>{}</strong>.</p>\
                 <p>Payment ID: {}<br>Ticket code: <strong>{}</strong></p>",
                escape_html(name),
                escape_html(&amount),
                escape_html(event.title),
                escape_html(payment_id),
                escape_html(ticket_code)
            ),
        ),
        text: format!(
            "Hi {},\n\nWe received {} for {}.\nPayment ID: {}\nTicket code: {}\n",
            name, amount, event.title, payment_id, ticket_code
        ),
    }
}

pub fn password_reset(name: &str, reset_link: &str) -> RenderedEmail {
    RenderedEmail {
        subject: "Reset your GrowthYari password".to_string(),
        html: layout(
            "Reset your password",
            &format!(
                "<p>Hi {},</p><p><a href=\"{}\">Choose a new password</a>. \
                 The link is valid for 1 hour and can be used once.</p>\
                 <p>If you did not ask for this, ignore this email.</p>",
                escape_html(name),
                escape_html(reset_link)
            ),
        ),
        text: format!(
            "Hi {},\n\nChoose a new password: {}\nThe link is valid for 1 hour and can be used once.\n\
             If you did not ask for this, ignore this email.\n",
            name, reset_link
        ),
    }
}
