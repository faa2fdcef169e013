//! Route table: every navigable path and the guard attached to it.

use donorhub_core::Role;

use crate::guard::RouteGuardSpec;

/// Views the client can mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Login,
    Register,
    Donations,
    Requests,
    Drives,
    Dashboard,
    Profile,
    CreateDonation,
    CreateRequest,
    AdminDashboard,
    ManageUsers,
    Reports,
    SystemOverview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub page: Page,
    pub guard: RouteGuardSpec,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];

pub static ROUTES: &[Route] = &[
    Route { path: "/", page: Page::Home, guard: RouteGuardSpec::public() },
    Route { path: "/login", page: Page::Login, guard: RouteGuardSpec::public() },
    Route { path: "/register", page: Page::Register, guard: RouteGuardSpec::public() },
    Route { path: "/donations", page: Page::Donations, guard: RouteGuardSpec::public() },
    Route { path: "/requests", page: Page::Requests, guard: RouteGuardSpec::public() },
    Route { path: "/drives", page: Page::Drives, guard: RouteGuardSpec::public() },
    Route { path: "/dashboard", page: Page::Dashboard, guard: RouteGuardSpec::authenticated() },
    Route { path: "/profile", page: Page::Profile, guard: RouteGuardSpec::authenticated() },
    Route {
        path: "/create-donation",
        page: Page::CreateDonation,
        guard: RouteGuardSpec::only(&[Role::Donor]),
    },
    Route {
        path: "/create-request",
        page: Page::CreateRequest,
        guard: RouteGuardSpec::only(&[Role::Recipient]),
    },
    Route { path: "/admin", page: Page::AdminDashboard, guard: RouteGuardSpec::only(ADMIN_ONLY) },
    Route { path: "/admin/users", page: Page::ManageUsers, guard: RouteGuardSpec::only(ADMIN_ONLY) },
    Route { path: "/admin/reports", page: Page::Reports, guard: RouteGuardSpec::only(ADMIN_ONLY) },
    Route { path: "/admin/system", page: Page::SystemOverview, guard: RouteGuardSpec::only(ADMIN_ONLY) },
];

/// Find the route for a navigation target.
///
/// Query strings, fragments and a trailing slash are ignored.
pub fn resolve(target: &str) -> Option<&'static Route> {
    let path = target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    ROUTES.iter().find(|route| route.path == path)
}
