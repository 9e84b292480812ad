//! Request handlers. Each is a thin adapter from HTTP to a service call.

pub mod account;
pub mod achievement;
pub mod attachment;
pub mod auth;
