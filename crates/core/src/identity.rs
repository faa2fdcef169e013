//! Signed-in identity and its bearer credential.

use serde::{Deserialize, Serialize};

use crate::{DomainError, Role, UserId};

/// Postal address attached to a profile. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
            && self.country.is_none()
    }
}

/// The authenticated user's profile, exactly as the backend returned it.
///
/// Backend responses carry the identifier as `_id`; the persisted form uses `id`.
/// Unknown fields (timestamps etc.) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Opaque bearer token proving an [`Identity`] to the backend.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self, DomainError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DomainError::validation("credential token is empty"));
        }
        Ok(Self(token))
    }

    /// Raw token, for the `Authorization` header and the persisted slot only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_accepts_backend_shape() {
        let identity: Identity = serde_json::from_value(json!({
            "_id": "64f1c0ffee",
            "name": "Ada",
            "email": "ada@example.org",
            "phone": "555-0100",
            "role": "logistics",
            "organization": "Harbor Relief",
            "address": { "city": "Leeds", "zipCode": "LS1" },
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(identity.id.as_str(), "64f1c0ffee");
        assert_eq!(identity.role, Role::Logistics);
        assert_eq!(identity.organization.as_deref(), Some("Harbor Relief"));
        let address = identity.address.unwrap();
        assert_eq!(address.zip_code.as_deref(), Some("LS1"));
        assert!(address.street.is_none());
    }

    #[test]
    fn identity_with_unknown_role_is_rejected() {
        let parsed = serde_json::from_value::<Identity>(json!({
            "id": "1", "name": "x", "email": "x@y", "role": "superuser"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn persisted_form_round_trips() {
        let identity = Identity {
            id: UserId::new("u-1").unwrap(),
            name: "Grace".to_string(),
            email: "grace@example.org".to_string(),
            phone: String::new(),
            role: Role::Donor,
            address: None,
            organization: None,
        };
        let raw = serde_json::to_string(&identity).unwrap();
        assert!(raw.contains("\"id\":\"u-1\""));
        assert_eq!(serde_json::from_str::<Identity>(&raw).unwrap(), identity);
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-token").unwrap();
        assert!(!format!("{credential:?}").contains("secret-token"));
        assert!(Credential::new("  ").is_err());
    }
}
