//! # idp-core
//!
//! Core utilities, configuration, and error handling for the identity provider.
//!
//! This crate provides foundational types used across all other workspace
//! crates:
//!
//! - [`config`] - protocol and server configuration with defaults
//! - [`clock`] - injectable time source for expiry decisions
//! - [`error`] - core error type
//! - [`event`] - audit events emitted through `tracing`

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod event;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use event::{AuthEvent, EventOutcome, EventType};
