//! Navigation: re-runs the access guard against the live session each time.

use std::sync::Arc;

use donorhub_auth::{AccessDecision, HOME_PAGE, LANDING_PAGE, Route, explain, resolve};
use donorhub_core::{Identity, Role};

use crate::session::SessionStore;

/// Landing page for administrators after login or registration.
pub const ADMIN_LANDING_PAGE: &str = "/admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(&'static Route),
    Redirect(&'static str),
}

#[derive(Debug, Clone)]
pub struct Navigator {
    session: Arc<SessionStore>,
}

impl Navigator {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        let Some(route) = resolve(path) else {
            tracing::debug!(path, "unknown route");
            return Navigation::Redirect(HOME_PAGE);
        };

        let session = self.session.current();
        let explanation = explain(&session, &route.guard);
        match explanation.decision {
            AccessDecision::Allow => Navigation::Render(route),
            AccessDecision::DenyRedirect(target) => {
                tracing::debug!(
                    path = route.path,
                    redirect = target,
                    reason = %explanation.reason,
                    "navigation denied"
                );
                Navigation::Redirect(target)
            }
        }
    }
}

/// Where a freshly authenticated user lands.
pub fn landing_for(identity: &Identity) -> &'static str {
    match identity.role {
        Role::Admin => ADMIN_LANDING_PAGE,
        _ => LANDING_PAGE,
    }
}
