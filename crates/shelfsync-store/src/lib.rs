//! Durable session state for ShelfSync — identity store, browser profile
//! directories, and per-identity operation locks.

pub mod locks;
pub mod profiles;
pub mod session;

pub use locks::IdentityLocks;
pub use profiles::ProfileRoot;
pub use session::{ExternalIdentity, SessionStore};
