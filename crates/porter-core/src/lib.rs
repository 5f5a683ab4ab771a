//! Core dispatch-and-authorization pipeline for the bot.
//!
//! This crate is intentionally framework-agnostic. The messaging gateway and
//! the persistence store live behind ports (traits) implemented in adapter
//! crates; everything here is testable with in-process doubles.

pub mod auth;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod event;
pub mod handlers;
pub mod i18n;
pub mod logging;
pub mod ports;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use errors::{Error, Result};
