//! `donorhub-auth`
//!
//! **Responsibility:** navigation-time authorization policy. No HTTP, no
//! storage; every function here is a total function of its inputs.
//!
//! The decisions made here are UX only. The backend re-checks the bearer token
//! and the role on every privileged request; nothing in this crate is a
//! security boundary.

pub mod guard;
pub mod routes;
pub mod view;

pub use donorhub_core::{Role, Session};
pub use guard::{
    AccessDecision, DenialKind, GuardExplanation, RouteGuardSpec, decide, decide_path, explain,
    explain_path, HOME_PAGE, LANDING_PAGE, LOGIN_PAGE,
};
pub use routes::{Page, Route, ROUTES, resolve};
pub use view::{Action, DashboardCounts, NavItem, Stat, ViewConfig, nav_items, role_label, select_view};
