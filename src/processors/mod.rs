//! Concrete processors shipped with the crate.

pub mod email;

pub use email::{EmailMessage, EmailProcessor, SEND_EMAIL};
