//! Data models for the homework board.
//!
//! Field names on the wire follow the documents the admin panel has always written.

mod homework;
mod revision;
mod user;

pub use homework::*;
pub use revision::*;
pub use user::*;
