//! User domain model.
//!
//! Users are end-user identities within a tenant. Registration and
//! credential handling live outside the protocol core; only the profile
//! fields needed for claim construction are modelled here.

use serde::{Deserialize, Serialize};

/// Order in which given and family names are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameOrder {
    /// Given name first.
    #[default]
    Western,
    /// Family name first.
    Eastern,
}

/// Postal address, shaped like the OIDC `address` claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    /// City or locality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    /// State or region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Postal code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Country.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// An end user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User identifier, used as `sub`.
    pub user_id: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Whether the user may sign in.
    pub enabled: bool,
    /// Given name.
    pub first_name: Option<String>,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Name rendering preference.
    pub name_order: NameOrder,
    /// Email address.
    pub email: Option<String>,
    /// Whether the email has been verified.
    pub email_verified: bool,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Whether the phone number has been verified.
    pub phone_number_verified: bool,
    /// Postal address.
    pub address: Option<Address>,
    /// Preferred locale, e.g. `en-US`.
    pub locale: Option<String>,
}

impl User {
    /// Creates an enabled user with an empty profile.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            enabled: true,
            first_name: None,
            middle_name: None,
            last_name: None,
            name_order: NameOrder::Western,
            email: None,
            email_verified: false,
            phone_number: None,
            phone_number_verified: false,
            address: None,
            locale: None,
        }
    }

    /// Sets given and family names.
    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// Sets the name order.
    #[must_use]
    pub const fn with_name_order(mut self, order: NameOrder) -> Self {
        self.name_order = order;
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Renders the display name according to [`NameOrder`].
    ///
    /// Missing parts are skipped; returns `None` when no part is present.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let parts = match self.name_order {
            NameOrder::Western => [&self.first_name, &self.middle_name, &self.last_name],
            NameOrder::Eastern => [&self.last_name, &self.first_name, &self.middle_name],
        };
        let name = parts
            .into_iter()
            .flatten()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}
