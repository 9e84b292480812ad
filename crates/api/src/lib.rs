pub mod accounts;
pub mod attachments;
pub mod auth;
pub mod background;
pub mod blob;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod session;
pub mod state;
pub mod workflow;
