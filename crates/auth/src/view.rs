//! Role-conditioned view selection.
//!
//! The one place that maps a role to what dashboards and navigation show.
//! Adding a role means touching this module only.

use serde::Serialize;

use donorhub_core::Role;

/// Counts fetched by the caller before asking for a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub donations: u64,
    pub requests: u64,
    pub drives: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Action {
    pub label: &'static str,
    pub link: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub label: &'static str,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

/// Everything a dashboard-style view needs to render for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewConfig {
    pub title: &'static str,
    pub description: &'static str,
    pub primary_action: Option<Action>,
    pub stats: Vec<Stat>,
    pub quick_links: Vec<NavItem>,
    pub nav_items: Vec<NavItem>,
}

const PUBLIC_NAV: [NavItem; 4] = [
    NavItem { label: "Home", path: "/" },
    NavItem { label: "Donations", path: "/donations" },
    NavItem { label: "Requests", path: "/requests" },
    NavItem { label: "Drives", path: "/drives" },
];

const QUICK_LINKS: [NavItem; 3] = [
    NavItem { label: "Browse Donations", path: "/donations" },
    NavItem { label: "View Requests", path: "/requests" },
    NavItem { label: "Join Drives", path: "/drives" },
];

fn stat(label: &'static str, value: u64) -> Stat {
    Stat { label, value }
}

/// Pick the dashboard configuration for `role`.
///
/// `None` (anonymous or unrecognized) yields a safe, empty default.
pub fn select_view(role: Option<Role>, counts: &DashboardCounts) -> ViewConfig {
    let nav_items = nav_items(role);

    let Some(role) = role else {
        return ViewConfig {
            title: "Dashboard",
            description: "Welcome to your dashboard",
            primary_action: None,
            stats: Vec::new(),
            quick_links: QUICK_LINKS.to_vec(),
            nav_items,
        };
    };

    let (title, description, primary_action, stats) = match role {
        Role::Donor => (
            "Donor Dashboard",
            "Manage your donations and help those in need",
            Action { label: "Create Donation", link: "/create-donation" },
            vec![
                stat("My Donations", counts.donations),
                stat("Active Drives", counts.drives),
                stat("Items Donated", counts.donations),
            ],
        ),
        Role::Recipient => (
            "Recipient Dashboard",
            "Track your requests and find help",
            Action { label: "Create Request", link: "/create-request" },
            vec![
                stat("My Requests", counts.requests),
                stat("Available Drives", counts.drives),
                stat("Items Received", 0),
            ],
        ),
        // Delivery tracking has no backend endpoint yet; the counts stay zero.
        Role::Logistics => (
            "Logistics Dashboard",
            "Coordinate deliveries and manage inventory",
            // No view is mounted at this link; navigation falls back to `/`.
            Action { label: "View Assignments", link: "/logistics" },
            vec![
                stat("Active Deliveries", 0),
                stat("Completed Deliveries", 0),
                stat("Pending Items", 0),
            ],
        ),
        Role::Admin => (
            "Admin Dashboard",
            "Oversee platform operations and manage drives",
            // Drive creation is not routed yet either.
            Action { label: "Create Drive", link: "/admin/create-drive" },
            vec![
                stat("Total Donations", counts.donations),
                stat("Total Requests", counts.requests),
                stat("Active Drives", counts.drives),
            ],
        ),
    };

    ViewConfig {
        title,
        description,
        primary_action: Some(primary_action),
        stats,
        quick_links: QUICK_LINKS.to_vec(),
        nav_items,
    }
}

/// Navigation entries for the signed-in role (or for a visitor).
pub fn nav_items(role: Option<Role>) -> Vec<NavItem> {
    let mut items = PUBLIC_NAV.to_vec();
    let Some(role) = role else {
        return items;
    };

    items.extend([
        NavItem { label: "Dashboard", path: "/dashboard" },
        NavItem { label: "Profile", path: "/profile" },
        NavItem { label: "Settings", path: "/profile" },
    ]);

    match role {
        Role::Donor => items.push(NavItem { label: "Create Donation", path: "/create-donation" }),
        Role::Recipient => items.push(NavItem { label: "Create Request", path: "/create-request" }),
        Role::Admin => items.push(NavItem { label: "Admin", path: "/admin" }),
        Role::Logistics => {}
    }

    items
}

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::Donor => "Donor",
        Role::Recipient => "Recipient",
        Role::Logistics => "Logistics Coordinator",
        Role::Admin => "Administrator",
    }
}
