//! Support code for the command line tool
//!
//! Logging setup, progress reporting and NumPy export.

pub mod logger;
pub mod npy;
pub mod progress;
