//! Persistence for the door-access controller.
//!
//! The controller persists exactly one value: the current door password.
//! It lives in a namespaced key/value table so further settings can be
//! added without a new schema.
//!
//! # Architecture
//!
//! - [`Database`] - SQLite connection pool with embedded migrations
//! - [`SettingsRepository`] - namespaced key/value access
//! - [`CredentialStore`] - load/save of the password, with the factory
//!   default when nothing has been stored yet
//!
//! # Examples
//!
//! ```no_run
//! use doorlock_core::Credential;
//! use doorlock_storage::{CredentialStore, Database, DatabaseConfig, SqliteCredentialStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("doorlock.db")).await?;
//! let store = SqliteCredentialStore::new(db.pool().clone());
//!
//! let current = store.load().await?;
//! store.save(&Credential::new("0099")?).await?;
//! # let _ = current;
//! # Ok(())
//! # }
//! ```
//!
//! # Security Considerations
//!
//! The password is stored in clear text; protecting it at rest is left to
//! the platform. Values never appear in log output.

#![allow(async_fn_in_trait)]

pub mod connection;
pub mod credential;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use credential::{CredentialStore, MemoryCredentialStore, SqliteCredentialStore};
pub use error::{StorageError, StorageResult};
pub use models::Setting;
pub use repositories::{SettingsRepository, SqliteSettingsRepository};
