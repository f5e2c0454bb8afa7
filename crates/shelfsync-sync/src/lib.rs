//! Third-party synchronization engine — interactive login (session
//! acquisition) and authenticated progress writes (session replay).

pub mod login;
pub mod progress;

pub use login::SessionManager;
pub use progress::{ProgressSyncer, SyncOutcome, SyncPolicy, SyncRequest};
