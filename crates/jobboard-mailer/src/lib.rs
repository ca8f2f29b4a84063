//! SendGrid email gateway.
//!
//! This crate provides:
//! - `SendGridClient` for the v3 `mail/send` endpoint
//! - Request validation with default bodies (html falls back to text and back)
//! - Contact-form email composition with escaped user input

pub mod client;
pub mod config;
pub mod error;
pub mod message;

pub use client::SendGridClient;
pub use config::MailerConfig;
pub use error::{MailerError, MailerResult};
pub use message::{contact_form_message, EmailMessage, MISSING_FIELDS_MESSAGE};
