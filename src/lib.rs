//! # crawlkit-models
//!
//! Lazy download, device placement and memoized loading of the models used by
//! crawlkit's content-extraction pipeline (sentence embeddings, topic
//! classification, sentence tokenization).

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod fetch;
pub mod models;
pub mod runtime;
pub mod ui;

pub use commands::{download_all_models, DownloadOptions};
pub use config::Settings;
pub use fetch::{Asset, AssetFetcher, FetchOutcome};
pub use models::{ModelCache, ModelKey};
pub use runtime::{calculate_batch_size, Device, DeviceSelector, SimulatedHardware};
