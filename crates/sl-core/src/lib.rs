//! sl-core - Core library for sledger
//!
//! This crate provides the declared change model, the persisted ledger entry
//! model, migration source loading, environment expansion and configuration
//! shared by the storage drivers, the reconciliation engine and the CLI.

pub mod backend;
pub mod change;
pub mod config;
pub mod error;
pub mod ledger;
pub mod migration;
pub mod migration_id;
pub mod source;
pub mod step;
pub mod vars;

pub use backend::Backend;
pub use change::{Change, Statements};
pub use config::{database_url_from_env, Config, DEFAULT_DATABASE_URL, DEFAULT_LEDGER_ROOT};
pub use error::{CoreError, CoreResult};
pub use ledger::LedgerEntry;
pub use migration::Migration;
pub use migration_id::MigrationId;
pub use source::{load_migration, MigrationSource};
pub use step::{abbreviate, Step};
pub use vars::expand_variables;
