//! Core domain + application logic for tgstatus.
//!
//! This crate is intentionally framework-agnostic. The messenger (Telegram today)
//! lives behind the `MessagingPort` trait implemented in adapter crates; status
//! content comes from caller-supplied `ContentProvider`s.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod status;

pub use errors::{Error, Result};
