//! # Model Management
//!
//! Named model catalog, handles and the memoizing cache that loads them.

pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod embedding;
pub mod punkt;
pub mod reuters;
pub mod slot;

pub use cache::ModelCache;
pub use catalog::{required_assets, ModelKey, RequiredAsset};
pub use classifier::{MultilabelClassifier, TextClassifier, TopicClassifier, TopicScore};
pub use embedding::EmbeddingModel;
pub use punkt::PunktData;
pub use reuters::{PackageMeta, ReutersPackage};
