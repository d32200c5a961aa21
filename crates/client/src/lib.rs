//! Client data layer for the Ledgerly API.
//!
//! [`Session`] owns the credential pair; [`Client`] is the single chokepoint
//! every request flows through, refreshing the session once per rejected
//! request before giving up and logging out. The [`resources`] modules build
//! on it to fetch and map accounts, categories, transactions and reports.

pub mod classify;
pub mod client;
pub mod error;
pub mod navigator;
pub mod pagination;
pub mod resources;
pub mod session;
pub mod storage;
pub mod views;

pub use classify::{Attempt, Disposition, classify};
pub use client::{ApiRequest, Client};
pub use error::{ApiError, ClientError, Result, StorageError};
pub use navigator::{LogNavigator, Navigator, RecordingNavigator};
pub use pagination::{Page, PageRequest};
pub use session::{Credentials, Session, SessionBuilder, SessionStore};
pub use storage::{CredentialStorage, FileStorage, MemoryStorage};
