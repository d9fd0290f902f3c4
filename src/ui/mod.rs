//! # User Interface
//!
//! Colored terminal output, download progress and clickable paths.

pub mod log;

pub use log::{debug, error, header, info, path_link, progress_line, success, warn, Log};
