// Bulk downloader: ordering, idempotence and clean reinstall

mod common;

use std::path::Path;

use common::{cache_with, FakeCloner, FakeTransport};
use crawlkit_models::config::{hub_url, CLASSIFIER_REPO, MINILM_URL, PUNKT_URL};
use crawlkit_models::{download_all_models, DownloadOptions, ModelKey, SimulatedHardware};

const ASSETS_ONLY: DownloadOptions = DownloadOptions {
	remove_existing: false,
	assets_only: true,
};

fn expected_cpu_paths(home: &Path) -> Vec<std::path::PathBuf> {
	let models = home.join("models");
	vec![
		models.join("onnx").join("model.onnx"),
		models.join("onnx").join("tokenizer.json"),
		models.join("reuters").join("meta.json"),
		models.join("punkt").join("english.pickle"),
	]
}

#[test]
fn populates_every_asset_on_cpu() {
	let tmp = tempfile::tempdir().unwrap();
	let transport = FakeTransport::new();
	let cloner = FakeCloner::new();
	let cache = cache_with(tmp.path(), SimulatedHardware::CpuOnly, &transport, &cloner);

	let report = download_all_models(&cache, ASSETS_ONLY).unwrap();

	for path in expected_cpu_paths(tmp.path()) {
		assert!(path.is_file(), "missing {}", path.display());
	}
	let keys: Vec<ModelKey> = report.steps.iter().map(|(key, _)| *key).collect();
	assert_eq!(keys, vec![ModelKey::MiniLm, ModelKey::Reuters, ModelKey::Punkt]);
	assert_eq!(report.fetched(), 4);
	assert_eq!(transport.count(), 3);
	assert_eq!(cloner.count(), 1);
}

#[test]
fn rerun_performs_no_network_activity() {
	let tmp = tempfile::tempdir().unwrap();
	let transport = FakeTransport::new();
	let cloner = FakeCloner::new();
	let cache = cache_with(tmp.path(), SimulatedHardware::CpuOnly, &transport, &cloner);

	download_all_models(&cache, ASSETS_ONLY).unwrap();
	let requests = transport.count();

	let report = download_all_models(&cache, ASSETS_ONLY).unwrap();
	assert_eq!(report.fetched(), 0);
	assert_eq!(report.bytes(), 0);
	assert_eq!(transport.count(), requests);
	assert_eq!(cloner.count(), 1);
}

#[test]
fn remove_existing_recreates_everything() {
	let tmp = tempfile::tempdir().unwrap();
	let transport = FakeTransport::new();
	let cloner = FakeCloner::new();
	let cache = cache_with(tmp.path(), SimulatedHardware::CpuOnly, &transport, &cloner);

	download_all_models(&cache, ASSETS_ONLY).unwrap();
	cache.load_nltk_punkt().unwrap();

	let report = download_all_models(
		&cache,
		DownloadOptions {
			remove_existing: true,
			assets_only: true,
		},
	)
	.unwrap();

	for path in expected_cpu_paths(tmp.path()) {
		assert!(path.is_file(), "missing {}", path.display());
	}
	assert_eq!(report.fetched(), 4);
	assert_eq!(transport.count(), 6);
	assert_eq!(cloner.count(), 2);
	assert!(!cache.is_loaded(ModelKey::Punkt));
}

#[test]
fn accelerator_fetches_classifier_instead_of_reuters() {
	let tmp = tempfile::tempdir().unwrap();
	let transport = FakeTransport::new();
	let cloner = FakeCloner::new();
	let cache = cache_with(tmp.path(), SimulatedHardware::cuda_gib(16), &transport, &cloner);

	download_all_models(&cache, ASSETS_ONLY).unwrap();

	let classifier = tmp.path().join("models").join("tweet-topic-21-multi");
	for file in ["model.onnx", "tokenizer.json", "config.json"] {
		assert!(classifier.join(file).is_file(), "missing {}", file);
	}
	assert!(!tmp.path().join("models").join("reuters").exists());
	assert_eq!(cloner.count(), 0);
	assert_eq!(transport.count(), 6);
}

#[test]
fn first_failure_stops_later_steps() {
	let tmp = tempfile::tempdir().unwrap();
	let transport = FakeTransport::new();
	transport.fail(MINILM_URL);
	let cloner = FakeCloner::new();
	let cache = cache_with(tmp.path(), SimulatedHardware::CpuOnly, &transport, &cloner);

	let err = download_all_models(&cache, DownloadOptions::default()).err().unwrap();

	assert!(format!("{:#}", err).contains("all-MiniLM-L6-v2"));
	assert_eq!(transport.requests(), vec![MINILM_URL.to_string()]);
	assert!(!transport.requests().iter().any(|url| url == PUNKT_URL));
	assert_eq!(cloner.count(), 0);
}

#[test]
fn unreachable_classifier_export_falls_back_to_reuters() {
	let tmp = tempfile::tempdir().unwrap();
	let transport = FakeTransport::new();
	transport.fail(&hub_url(CLASSIFIER_REPO, "onnx/model.onnx"));
	let cloner = FakeCloner::new();
	let cache = cache_with(tmp.path(), SimulatedHardware::cuda_gib(16), &transport, &cloner);

	let report = download_all_models(&cache, ASSETS_ONLY).unwrap();

	let keys: Vec<ModelKey> = report.steps.iter().map(|(key, _)| *key).collect();
	assert_eq!(keys, vec![ModelKey::MiniLm, ModelKey::Reuters, ModelKey::Punkt]);
	assert!(tmp.path().join("models").join("reuters").join("meta.json").is_file());
	assert!(tmp.path().join("models").join("punkt").join("english.pickle").is_file());
	assert_eq!(cloner.count(), 1);
}
