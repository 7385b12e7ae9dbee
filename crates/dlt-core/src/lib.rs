//! Core domain + application logic for the dual-language translation bot.
//!
//! This crate is framework-agnostic. Telegram and the translation backend live
//! behind ports (traits) implemented in adapter crates.

pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod language;
pub mod logging;
pub mod messaging;
pub mod orchestrator;
pub mod pipeline;
pub mod ports;
pub mod security;
pub mod stats;

pub use errors::{Error, Result};
