//! Marketing-site and admin-panel API for the Northgate studio collective.
//!
//! One service handles both hostnames: the public site reads filtered
//! views, the `panel.` subdomain serves the authenticated CRUD surface
//! behind cookie sessions with per-studio authorization.

pub mod assets;
pub mod auth;
pub mod error;
pub mod games;
pub mod models;
pub mod notifications;
pub mod router;
pub mod session;
pub mod site_config;
pub mod store;
pub mod studios;
pub mod users;
pub mod validation;

pub use router::{handle_request, AppState};
