//! `donorhub-core`: domain primitives shared by every DonorHub client crate.
//!
//! This crate contains **pure data** (no IO, no HTTP, no storage).

pub mod error;
pub mod id;
pub mod identity;
pub mod role;
pub mod session;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use identity::{Address, Credential, Identity};
pub use role::Role;
pub use session::Session;
