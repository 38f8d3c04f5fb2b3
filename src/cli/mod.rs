//! CLI subcommand implementations for the slotwatch binary.

pub mod check_cmd;
pub mod doctor;
pub mod login_cmd;
pub mod watch_cmd;

/// Login landing page used when `LOGIN_URL` is unset.
pub const DEFAULT_LOGIN_URL: &str = "https://prenotami.esteri.it/Services";
