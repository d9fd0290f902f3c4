//! Core domain types

pub mod embedding;
pub mod home;

pub use embedding::Embedding;
pub use home::{is_present, Home};
