/// Transactional email
///
/// Templates are pure functions producing a [`RenderedEmail`]; a [`Mailer`]
/// delivers it. Delivery is best-effort: [`deliver`] logs failures instead of
/// returning them, so a mail outage never fails the request that triggered it.

pub mod mailer;
pub mod templates;

pub use mailer::{deliver, HttpMailer, LogMailer, MailError, Mailer};
pub use templates::RenderedEmail;
