//! Wire types for the fh platform.
//!
//! This crate holds the serde shapes exchanged with the platform's `box/srv`
//! endpoints. Types here are pure data: validation of *meaning* (for example
//! that a handshake body yields usable routing properties) happens in `fh-sdk`,
//! these types only pin down the field names and optionality seen on the wire.

pub mod auth;
pub mod handshake;
pub mod init;

pub use auth::*;
pub use handshake::*;
pub use init::*;

/// Path of the initialization handshake endpoint.
pub const INIT_PATH: &str = "/box/srv/1.1/app/init";

/// Path of the admin auth-policy endpoint.
pub const AUTH_PATH: &str = "/box/srv/1.1/admin/authpolicy/auth";
