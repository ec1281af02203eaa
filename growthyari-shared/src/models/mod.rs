/// Database models
///
/// Each model exposes its row type plus async query functions taking a
/// `&PgPool`. Queries are built at runtime with `sqlx::query_as` so the crate
/// compiles without a live database.

pub mod event;
pub mod password_reset;
pub mod registration;
pub mod ticket;
pub mod user;

pub use event::{Event, EventFilter, EventInput};
pub use password_reset::PasswordResetToken;
pub use registration::{
    EventAttendee, PaymentStatus, Registration, RegistrationAction, RegistrationError,
    RegistrationStatus, UserRegistration,
};
pub use ticket::{Ticket, TicketError};
pub use user::{AuthProvider, CreateUser, PublicProfile, UpdateProfile, User};
