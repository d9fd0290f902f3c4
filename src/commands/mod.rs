//! # Command Implementations
//!
//! Each submodule handles one CLI command.

pub mod download;
pub mod info;

pub use download::{download_all_models, DownloadOptions, DownloadReport};
