#![allow(clippy::module_name_repetitions)]
pub mod config;
pub mod document;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod record;
pub mod server;
pub mod snapshot;
pub mod source;
pub mod state;

pub use record::ModelDeprecationRecord;
