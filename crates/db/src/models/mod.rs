//! Row models and DTOs.

pub mod achievement;
pub mod attachment;
pub mod refresh_token;
pub mod user;
