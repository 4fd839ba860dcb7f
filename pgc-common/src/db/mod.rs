//! Database initialization shared by PGC services

pub mod init;

pub use init::{create_settings_table, init_database};
