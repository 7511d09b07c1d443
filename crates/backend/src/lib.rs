//! Gatehouse: user management and session authentication over HTTP.
//!
//! The binary in `main.rs` only parses the command line and wires the pieces
//! exported here together; everything that handles a request lives in this
//! library so it can be driven from integration tests.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;

pub use state::AppState;
