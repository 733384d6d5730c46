//! Identity and operation-history stores.
//!
//! Both stores are traits so the HTTP layer never depends on a storage
//! engine. The in-memory implementations use `DashMap` and are what the
//! server binary runs with; the history store can persist itself to a JSON
//! file across restarts.

pub mod operations;
pub mod users;

pub use operations::{MemoryOperationStore, NewOperation, OperationRecord, OperationStore, StoreError};
pub use users::{LookupError, MemoryUserDirectory, User, UserDirectory, UserId};
