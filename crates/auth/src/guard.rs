use std::borrow::Cow;

use donorhub_core::{Role, Session};

use crate::routes;

/// Where anonymous visitors are sent.
pub const LOGIN_PAGE: &str = "/login";

/// Where authenticated visitors without the required role are sent.
pub const LANDING_PAGE: &str = "/dashboard";

/// Where unknown paths are sent.
pub const HOME_PAGE: &str = "/";

/// Declarative access requirement attached to a navigable view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteGuardSpec {
    /// No authentication required.
    Public,
    /// Requires a session. An empty role list admits any authenticated identity.
    Authenticated { allowed_roles: Cow<'static, [Role]> },
}

impl RouteGuardSpec {
    pub const fn public() -> Self {
        Self::Public
    }

    pub const fn authenticated() -> Self {
        Self::Authenticated {
            allowed_roles: Cow::Borrowed(&[]),
        }
    }

    pub const fn only(roles: &'static [Role]) -> Self {
        Self::Authenticated {
            allowed_roles: Cow::Borrowed(roles),
        }
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::Authenticated {
            allowed_roles: Cow::Owned(roles.into_iter().collect()),
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, RouteGuardSpec::Public)
    }

    /// Roles admitted by this guard; empty for public and any-authenticated.
    pub fn allowed_roles(&self) -> &[Role] {
        match self {
            RouteGuardSpec::Public => &[],
            RouteGuardSpec::Authenticated { allowed_roles } => allowed_roles.as_ref(),
        }
    }
}

/// Outcome of a navigation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    DenyRedirect(&'static str),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    Unauthenticated,
    RoleNotAllowed,
    UnknownRoute,
}

/// A decision together with the reason it was reached (for debug logging).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardExplanation {
    pub decision: AccessDecision,
    pub denial: Option<DenialKind>,
    pub reason: String,
}

/// Decide whether a view guarded by `guard` may render for `session`.
///
/// - No IO
/// - No panics
/// - Never cached: callers evaluate this on every navigation
pub fn decide(session: &Session, guard: &RouteGuardSpec) -> AccessDecision {
    explain(session, guard).decision
}

/// Same as [`decide`], with the reason spelled out.
pub fn explain(session: &Session, guard: &RouteGuardSpec) -> GuardExplanation {
    let allowed_roles = match guard {
        RouteGuardSpec::Public => {
            return GuardExplanation {
                decision: AccessDecision::Allow,
                denial: None,
                reason: "route is public".to_string(),
            };
        }
        RouteGuardSpec::Authenticated { allowed_roles } => allowed_roles,
    };

    let Some(identity) = session.identity() else {
        return GuardExplanation {
            decision: AccessDecision::DenyRedirect(LOGIN_PAGE),
            denial: Some(DenialKind::Unauthenticated),
            reason: "route requires a session and none is active".to_string(),
        };
    };

    if !allowed_roles.is_empty() && !allowed_roles.contains(&identity.role) {
        return GuardExplanation {
            decision: AccessDecision::DenyRedirect(LANDING_PAGE),
            denial: Some(DenialKind::RoleNotAllowed),
            reason: format!(
                "role '{}' not in allowed roles {:?}",
                identity.role,
                allowed_roles.iter().map(Role::as_str).collect::<Vec<_>>()
            ),
        };
    }

    GuardExplanation {
        decision: AccessDecision::Allow,
        denial: None,
        reason: if allowed_roles.is_empty() {
            "any authenticated identity may view this route".to_string()
        } else {
            format!("role '{}' is allowed", identity.role)
        },
    }
}

/// Resolve `path` in the route table and decide. Unknown paths go home.
pub fn decide_path(session: &Session, path: &str) -> AccessDecision {
    explain_path(session, path).decision
}

pub fn explain_path(session: &Session, path: &str) -> GuardExplanation {
    match routes::resolve(path) {
        Some(route) => explain(session, &route.guard),
        None => GuardExplanation {
            decision: AccessDecision::DenyRedirect(HOME_PAGE),
            denial: Some(DenialKind::UnknownRoute),
            reason: format!("no route matches '{path}'"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use donorhub_core::{Credential, Identity, UserId};
    use proptest::prelude::*;

    fn session_for(role: Role) -> Session {
        Session::authenticated(
            Identity {
                id: UserId::new("u-1").unwrap(),
                name: "Test".to_string(),
                email: "test@example.org".to_string(),
                phone: String::new(),
                role,
                address: None,
                organization: None,
            },
            Credential::new("tok").unwrap(),
        )
    }

    #[test]
    fn donor_is_redirected_from_admin_only_route() {
        let guard = RouteGuardSpec::only(&[Role::Admin]);
        assert_eq!(
            decide(&session_for(Role::Donor), &guard),
            AccessDecision::DenyRedirect(LANDING_PAGE)
        );
        let explained = explain(&session_for(Role::Donor), &guard);
        assert_eq!(explained.denial, Some(DenialKind::RoleNotAllowed));
        assert!(explained.reason.contains("donor"));
    }

    #[test]
    fn anonymous_is_sent_to_login_from_dashboard() {
        assert_eq!(
            decide_path(&Session::Anonymous, "/dashboard"),
            AccessDecision::DenyRedirect(LOGIN_PAGE)
        );
        assert_eq!(
            decide(&Session::Anonymous, &RouteGuardSpec::only(&[Role::Admin])),
            AccessDecision::DenyRedirect(LOGIN_PAGE)
        );
    }

    #[test]
    fn public_routes_allow_everyone() {
        for path in ["/", "/login", "/donations"] {
            assert_eq!(decide_path(&Session::Anonymous, path), AccessDecision::Allow);
            for role in Role::ALL {
                assert_eq!(decide_path(&session_for(role), path), AccessDecision::Allow);
            }
        }
    }

    #[test]
    fn empty_role_list_admits_every_role() {
        for role in Role::ALL {
            assert!(decide(&session_for(role), &RouteGuardSpec::authenticated()).is_allowed());
        }
    }

    #[test]
    fn owned_role_lists_behave_like_static_ones() {
        let guard = RouteGuardSpec::roles([Role::Donor, Role::Recipient]);
        assert!(decide(&session_for(Role::Recipient), &guard).is_allowed());
        assert!(!decide(&session_for(Role::Logistics), &guard).is_allowed());
    }

    #[test]
    fn unknown_paths_redirect_home() {
        assert_eq!(
            decide_path(&session_for(Role::Admin), "/nowhere"),
            AccessDecision::DenyRedirect(HOME_PAGE)
        );
    }

    #[test]
    fn unknown_paths_are_explained() {
        let explained = explain_path(&Session::Anonymous, "/admin/unknown");
        assert_eq!(explained.decision, AccessDecision::DenyRedirect(HOME_PAGE));
        assert_eq!(explained.denial, Some(DenialKind::UnknownRoute));
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn arb_session() -> impl Strategy<Value = Session> {
        prop::option::of(arb_role()).prop_map(|role| match role {
            Some(role) => session_for(role),
            None => Session::Anonymous,
        })
    }

    fn arb_guard() -> impl Strategy<Value = RouteGuardSpec> {
        prop_oneof![
            Just(RouteGuardSpec::Public),
            prop::collection::vec(arb_role(), 0..4).prop_map(|roles| RouteGuardSpec::roles(roles)),
        ]
    }

    proptest! {
        /// Property: every (session, guard) pair yields exactly the outcome the
        /// four-step algorithm prescribes.
        #[test]
        fn decision_follows_the_algorithm(session in arb_session(), guard in arb_guard()) {
            let expected = if guard.is_public() {
                AccessDecision::Allow
            } else {
                match session.role() {
                    None => AccessDecision::DenyRedirect(LOGIN_PAGE),
                    Some(role) if !guard.allowed_roles().is_empty()
                        && !guard.allowed_roles().contains(&role) =>
                    {
                        AccessDecision::DenyRedirect(LANDING_PAGE)
                    }
                    Some(_) => AccessDecision::Allow,
                }
            };
            prop_assert_eq!(decide(&session, &guard), expected);
        }

        /// Property: deciding twice on the same inputs gives the same answer.
        #[test]
        fn decision_is_deterministic(session in arb_session(), guard in arb_guard()) {
            prop_assert_eq!(decide(&session, &guard), decide(&session, &guard));
        }
    }
}
