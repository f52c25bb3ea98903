//! Client state: entity caches, notifications, loading state, session tokens.

mod error;
pub mod notify;
pub mod session;
mod slot;
mod state;

pub use error::StoreError;
pub use notify::{FieldErrors, Level, Notification};
pub use session::{FileSession, MemorySession, SessionStore, Tokens};
pub use slot::Slot;
pub use state::{RequestGuard, Store};
