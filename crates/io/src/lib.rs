// File I/O: locating dated exports and reading them into raw tables

pub mod csv;
pub mod error;
pub mod locate;
pub mod xlsx;

pub use error::IoError;
pub use locate::{locate_latest, resolve_source, select_latest, Resolution, ResolvedSource};
