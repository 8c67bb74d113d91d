//! # idp-model
//!
//! Domain entities for the identity provider protocol core.
//!
//! Long-lived entities ([`Tenant`], [`Client`], [`User`], [`SigningKey`],
//! [`Scope`]) are owned by external stores. The ephemeral protocol records
//! in [`state`] all carry an expiry and implement [`EphemeralRecord`].

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod client;
pub mod scope;
pub mod signing_key;
pub mod state;
pub mod tenant;
pub mod user;

pub use client::{Client, ClientType, ClientUpdate};
pub use scope::{ClientScopeRel, Scope};
pub use signing_key::{KeyStatus, KeyUse, SigningKey};
pub use state::{
    AuthorizationState, ClientAuthHistory, EphemeralRecord, PreAuthenticationState, RefreshData,
    ResponseMode,
};
pub use tenant::{RateLimit, Tenant};
pub use user::{Address, NameOrder, User};
