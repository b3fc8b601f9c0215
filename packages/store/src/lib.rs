//! # Local persistence for the layer-generation client
//!
//! Everything the client remembers between runs goes through the [`KvStore`]
//! trait: a small async key-value interface whose values are JSON documents.
//! Higher-level stores are built on top of it.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`kv`] | The [`KvStore`] trait and [`StoreError`] |
//! | [`memory`] | [`MemoryStore`], used by tests and as a throwaway store |
//! | [`file_store`] | [`FileStore`], one JSON file per key under a data directory |
//! | [`models`] | [`UserInfo`], the cached profile |
//! | [`session`] | [`SessionStore`], token + profile kept under `token` and `userInfo` |
//! | [`verification`] | [`VerificationCache`], short-lived verification codes per phone |

pub mod file_store;
pub mod kv;
pub mod models;
pub mod session;
pub mod verification;

mod memory;
pub use memory::MemoryStore;

pub use file_store::FileStore;
pub use kv::{KvStore, StoreError};
pub use models::UserInfo;
pub use session::{Session, SessionStore, TOKEN_KEY, USER_INFO_KEY};
pub use verification::{Clock, SystemClock, VerificationCache, CODE_TTL_MS};
