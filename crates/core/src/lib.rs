//! Domain primitives shared by the persistence and API layers.
//!
//! Nothing in this crate performs I/O. Time is always supplied by a
//! [`clock::Clock`] so expiry and workflow stamps are deterministic in tests.

pub mod achievement;
pub mod attachment;
pub mod clock;
pub mod error;
pub mod hashing;
pub mod refresh;
pub mod roles;
pub mod types;
