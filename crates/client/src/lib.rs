//! `donorhub-client`
//!
//! **Responsibility:** the client half of DonorHub's authentication and
//! role-based access story.
//!
//! This crate provides:
//! - a persisted, observable session store
//! - the auth gateway (login, register, profile update, logout)
//! - navigation that consults the access guard on every move
//! - thin clients for the admin and dashboard endpoints
//!
//! The backend stays the authority for every privileged operation.

pub mod admin;
pub mod config;
pub mod dashboard;
pub mod gateway;
pub mod http;
pub mod navigator;
pub mod session;
pub mod state;
pub mod storage;

pub use admin::{AdminApi, AdminStats, ManagedUser, Report, UserPage, UserQuery};
pub use config::ClientConfig;
pub use dashboard::{Activity, ActivityKind, DashboardApi, DashboardData};
pub use gateway::{AuthError, AuthGateway, ProfileUpdate, RegisterForm};
pub use http::{Backend, BackendError};
pub use navigator::{Navigation, Navigator, landing_for};
pub use session::{SessionError, SessionStore};
pub use state::AppState;
pub use storage::{MemoryStorage, PersistedSlots, SessionStorage, SqliteStorage};
