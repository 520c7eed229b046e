//! TOTP crate: sub-modules.

pub mod types;
pub mod base32;
pub mod core;
pub mod uri;
pub mod ranker;
pub mod storage;
pub mod import;
pub mod export;
pub mod qr;
pub mod service;

// Re-export top-level items for convenience.
pub use types::*;
pub use storage::AccountList;
pub use service::{
    AccountStore, AuthenticatorService, AuthenticatorState, Clock, DomainProvider, FixedClock,
    MemoryStore, StaticDomain, SystemClock,
};
