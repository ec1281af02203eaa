/// Helpers for the external real-time networking layer
///
/// Signaling and media relay run elsewhere. This crate only mints the
/// credentials clients present to them: TURN REST credentials here, and
/// short-lived socket tokens via [`crate::auth::jwt`].

pub mod turn;

pub use turn::{TurnConfig, TurnCredentials};

/// Members seen within this many minutes count as online
pub const PRESENCE_WINDOW_MINUTES: i64 = 10;
