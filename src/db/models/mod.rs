//! Database models and request/response types.

pub mod user;

pub use user::*;
