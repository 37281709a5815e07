//! Web interface for the admin console
//!
//! Server-rendered HTML pages under `/admin`. Every page sits behind a
//! session cookie; destructive actions go through a confirmation page
//! before they run.

mod admin;
mod agencies;
mod alerts;
mod auth;
mod layout;
mod revenue;
mod safety;
mod server;
mod settings;
mod users;

pub use admin::AdminState;
pub use server::start_server;
