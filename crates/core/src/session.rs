//! Session aggregate: an [`Identity`] paired with its [`Credential`], or nothing.

use crate::{Credential, Identity, Role};

/// Who is currently signed in.
///
/// Identity and credential only ever travel together; there is no way to
/// represent one without the other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        identity: Identity,
        credential: Credential,
    },
}

impl Session {
    pub fn authenticated(identity: Identity, credential: Credential) -> Self {
        Self::Authenticated {
            identity,
            credential,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { identity, .. } => Some(identity),
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { credential, .. } => Some(credential),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }
}
