//! Database access for pgc-an
//!
//! Schema creation lives in `pgc_common::db`; this module adds typed
//! accessors over the `settings` table.

pub mod settings;

pub use pgc_common::db::init_database;
