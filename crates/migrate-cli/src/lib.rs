//! Library components of the `record-migrate` command-line host.

pub mod files;
pub mod logging;
