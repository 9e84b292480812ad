//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Timestamps are always supplied by the
//! caller so the injected clock stays authoritative.

pub mod achievement_repo;
pub mod attachment_repo;
pub mod refresh_token_repo;
pub mod user_repo;

pub use achievement_repo::AchievementRepo;
pub use attachment_repo::AttachmentRepo;
pub use refresh_token_repo::RefreshTokenRepo;
pub use user_repo::UserRepo;
