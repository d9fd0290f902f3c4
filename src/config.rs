//! Application configuration and constants

use std::ffi::OsString;
use std::path::PathBuf;

// === Home Layout ===
pub const APP_DIR: &str = ".crawlkit";
pub const CACHE_DIR: &str = "cache";
pub const MODELS_DIR: &str = "models";

// === Environment ===
pub const HOME_ENV: &str = "CRAWLKIT_HOME";
pub const BRANCH_ENV: &str = "CRAWLKIT_MODEL_REPO_BRANCH";
pub const CLASSIFIER_REPO_ENV: &str = "CRAWLKIT_CLASSIFIER_REPO";
pub const CLASSIFIER_REVISION_ENV: &str = "CRAWLKIT_CLASSIFIER_REVISION";
pub const NYT_TOPIC_REPO_ENV: &str = "CRAWLKIT_NYT_TOPIC_REPO";
pub const NYT_TOPIC_REVISION_ENV: &str = "CRAWLKIT_NYT_TOPIC_REVISION";

// === MiniLM (ONNX binary) ===
pub const MINILM_DIR: &str = "onnx";
pub const MINILM_URL: &str = "https://unclecode-files.s3.us-west-2.amazonaws.com/model.onnx";
pub const MINILM_TOKENIZER_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

// === BGE small (hub) ===
pub const BGE_DIR: &str = "bge-small-en-v1.5";
pub const BGE_REPO: &str = "BAAI/bge-small-en-v1.5";

// === BERT base (hub) ===
pub const BERT_DIR: &str = "bert-base-uncased";
pub const BERT_REPO: &str = "google-bert/bert-base-uncased";

// === Multilabel topic classifier (hub) ===
pub const CLASSIFIER_DIR: &str = "tweet-topic-21-multi";
pub const CLASSIFIER_REPO: &str = "cardiffnlp/tweet-topic-21-multi";
pub const CLASSIFIER_THRESHOLD: f32 = 0.5;
pub const CLASSIFIER_MAX_LENGTH: usize = 64;
/// Path of the ONNX export inside a classifier repository
pub const CLASSIFIER_ONNX: &str = "onnx/model.onnx";

// === NYT news topic classifier (hub) ===
pub const NYT_TOPIC_DIR: &str = "roberta-base_topic_classification_nyt_news";
pub const NYT_TOPIC_REPO: &str = "dstefa/roberta-base_topic_classification_nyt_news";
pub const NYT_TOPIC_MAX_LENGTH: usize = 512;

// === Reuters package (source repository) ===
pub const REUTERS_DIR: &str = "reuters";
pub const REUTERS_REPO_URL: &str = "https://github.com/unclecode/crawl4ai.git";
pub const REUTERS_REPO_SUBDIR: &str = "models/reuters";
pub const DEFAULT_BRANCH: &str = "main";

// === Punkt (NLTK data) ===
pub const PUNKT_DIR: &str = "punkt";
pub const PUNKT_URL: &str =
	"https://raw.githubusercontent.com/nltk/nltk_data/gh-pages/packages/tokenizers/punkt.zip";

// === Hub ===
pub const HUB_ENDPOINT: &str = "https://huggingface.co";
pub const HUB_REVISION: &str = "main";

// === File Names ===
pub const ONNX_MODEL: &str = "model.onnx";
pub const TOKENIZER: &str = "tokenizer.json";
pub const MODEL_CONFIG: &str = "config.json";
pub const PACKAGE_META: &str = "meta.json";

// === Runtime ===
pub const INTRA_THREADS: usize = 4;

/// Download URL for a file inside a hub repository at the pinned revision
pub fn hub_url(repo: &str, file: &str) -> String {
	hub_url_at(repo, HUB_REVISION, file)
}

/// Download URL for a file inside a hub repository at `revision`
pub fn hub_url_at(repo: &str, revision: &str, file: &str) -> String {
	format!("{}/{}/resolve/{}/{}", HUB_ENDPOINT, repo, revision, file)
}

/// Hub repository and revision a model is downloaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSource {
	pub repo: String,
	pub revision: String,
}

impl HubSource {
	pub fn new(repo: impl Into<String>, revision: impl Into<String>) -> Self {
		Self {
			repo: repo.into(),
			revision: revision.into(),
		}
	}

	/// `repo` at the pinned revision
	pub fn pinned(repo: &str) -> Self {
		Self::new(repo, HUB_REVISION)
	}

	pub fn url(&self, file: &str) -> String {
		hub_url_at(&self.repo, &self.revision, file)
	}

	fn from_env(repo_env: &str, revision_env: &str, default_repo: &str) -> Self {
		let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
		let source = Self::new(
			read(repo_env).unwrap_or_else(|| default_repo.to_string()),
			read(revision_env).unwrap_or_else(|| HUB_REVISION.to_string()),
		);
		if source.repo != default_repo || source.revision != HUB_REVISION {
			crate::ui::debug(&format!("Using {}@{}", source.repo, source.revision));
		}
		source
	}
}

/// Runtime settings resolved from the environment
#[derive(Debug, Clone)]
pub struct Settings {
	/// Root of the home layout (`~/.crawlkit` unless overridden)
	pub home: PathBuf,
	/// Branch cloned for repository-hosted assets
	pub repo_branch: String,
	/// Where the multilabel topic classifier's ONNX export lives
	pub classifier: HubSource,
	/// Where the NYT news topic classifier's ONNX export lives
	pub nyt_topic: HubSource,
}

impl Settings {
	/// Reads `CRAWLKIT_HOME`, `CRAWLKIT_MODEL_REPO_BRANCH` and the classifier
	/// source overrides, falling back to defaults
	pub fn from_env() -> Self {
		let home = match std::env::var_os(HOME_ENV) {
			Some(custom) if !custom.is_empty() => {
				let path = PathBuf::from(custom);
				crate::ui::debug(&format!("Using {}: {}", HOME_ENV, path.display()));
				path
			}
			_ => user_home(std::env::var_os("HOME"), std::env::var_os("USERPROFILE")).join(APP_DIR),
		};

		let repo_branch = std::env::var(BRANCH_ENV)
			.ok()
			.filter(|b| !b.trim().is_empty())
			.unwrap_or_else(|| DEFAULT_BRANCH.to_string());

		Self {
			home,
			repo_branch,
			classifier: HubSource::from_env(CLASSIFIER_REPO_ENV, CLASSIFIER_REVISION_ENV, CLASSIFIER_REPO),
			nyt_topic: HubSource::from_env(NYT_TOPIC_REPO_ENV, NYT_TOPIC_REVISION_ENV, NYT_TOPIC_REPO),
		}
	}

	/// Settings rooted at an explicit directory
	pub fn with_home(home: impl Into<PathBuf>) -> Self {
		Self {
			home: home.into(),
			repo_branch: DEFAULT_BRANCH.to_string(),
			classifier: HubSource::pinned(CLASSIFIER_REPO),
			nyt_topic: HubSource::pinned(NYT_TOPIC_REPO),
		}
	}
}

/// User home from `HOME`, then `USERPROFILE`; the working directory when neither is set
fn user_home(home: Option<OsString>, profile: Option<OsString>) -> PathBuf {
	match home.filter(|h| !h.is_empty()).or(profile.filter(|p| !p.is_empty())) {
		Some(dir) => PathBuf::from(dir),
		None => {
			crate::ui::warn(&format!(
				"Neither HOME nor USERPROFILE is set, using the working directory; set {} to choose a location",
				HOME_ENV
			));
			PathBuf::from(".")
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hub_url_pins_revision() {
		assert_eq!(
			hub_url(BGE_REPO, TOKENIZER),
			"https://huggingface.co/BAAI/bge-small-en-v1.5/resolve/main/tokenizer.json"
		);
	}

	#[test]
	fn with_home_uses_default_branch() {
		let settings = Settings::with_home("/tmp/x");
		assert_eq!(settings.home, PathBuf::from("/tmp/x"));
		assert_eq!(settings.repo_branch, DEFAULT_BRANCH);
		assert_eq!(settings.classifier, HubSource::new(CLASSIFIER_REPO, "main"));
		assert_eq!(settings.nyt_topic.repo, NYT_TOPIC_REPO);
	}

	#[test]
	fn hub_source_uses_its_revision() {
		let source = HubSource::new("someone/tweet-topic-onnx", "refs/pr/3");
		assert_eq!(
			source.url(CLASSIFIER_ONNX),
			"https://huggingface.co/someone/tweet-topic-onnx/resolve/refs/pr/3/onnx/model.onnx"
		);
	}

	#[test]
	fn user_home_prefers_home_then_profile() {
		assert_eq!(
			user_home(Some("/home/a".into()), Some("C:/Users/a".into())),
			PathBuf::from("/home/a")
		);
		assert_eq!(user_home(None, Some("C:/Users/a".into())), PathBuf::from("C:/Users/a"));
		assert_eq!(user_home(Some("".into()), Some("C:/Users/a".into())), PathBuf::from("C:/Users/a"));
	}

	#[test]
	fn user_home_falls_back_to_working_directory() {
		assert_eq!(user_home(None, None), PathBuf::from("."));
	}
}
