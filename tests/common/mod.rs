// Shared fakes for integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crawlkit_models::fetch::{RepoCloner, Transport};
use crawlkit_models::{AssetFetcher, DeviceSelector, ModelCache, Settings, SimulatedHardware};

pub const REUTERS_META: &str = r#"{
	"lang": "en",
	"name": "reuters",
	"version": "0.1.0",
	"pipeline": ["textcat_multilabel"],
	"labels": {"textcat_multilabel": ["acq", "earn", "trade"]}
}"#;

/// In-memory transport that records every request
#[derive(Clone, Default)]
pub struct FakeTransport {
	bodies: Arc<Mutex<HashMap<String, Vec<u8>>>>,
	failing: Arc<Mutex<HashSet<String>>>,
	requests: Arc<Mutex<Vec<String>>>,
	watched_home: Arc<Mutex<Option<PathBuf>>>,
	observations: Arc<Mutex<Vec<bool>>>,
}

impl FakeTransport {
	pub fn new() -> Self {
		let transport = Self::default();
		transport.serve(crawlkit_models::config::PUNKT_URL, punkt_zip());
		transport
	}

	pub fn serve(&self, url: &str, body: Vec<u8>) {
		self.bodies.lock().unwrap().insert(url.to_string(), body);
	}

	pub fn fail(&self, url: &str) {
		self.failing.lock().unwrap().insert(url.to_string());
	}

	/// Records whether `home/cache` and `home/models` exist at each request
	pub fn watch_home(&self, home: &Path) {
		*self.watched_home.lock().unwrap() = Some(home.to_path_buf());
	}

	pub fn observations(&self) -> Vec<bool> {
		self.observations.lock().unwrap().clone()
	}

	pub fn requests(&self) -> Vec<String> {
		self.requests.lock().unwrap().clone()
	}

	pub fn count(&self) -> usize {
		self.requests.lock().unwrap().len()
	}
}

impl Transport for FakeTransport {
	fn download(
		&self,
		url: &str,
		sink: &mut dyn Write,
		progress: &mut dyn FnMut(u64, Option<u64>),
	) -> Result<u64> {
		self.requests.lock().unwrap().push(url.to_string());

		if let Some(home) = self.watched_home.lock().unwrap().as_ref() {
			let ready = home.join("cache").is_dir() && home.join("models").is_dir();
			self.observations.lock().unwrap().push(ready);
		}

		if self.failing.lock().unwrap().contains(url) {
			sink.write_all(b"partial")?;
			bail!("connection reset: {}", url);
		}

		let body = self
			.bodies
			.lock()
			.unwrap()
			.get(url)
			.cloned()
			.unwrap_or_else(|| format!("body of {}", url).into_bytes());

		let total = body.len() as u64;
		sink.write_all(&body)?;
		progress(total, Some(total));
		Ok(total)
	}
}

/// Cloner that lays out a repository containing `models/reuters`
#[derive(Clone, Default)]
pub struct FakeCloner {
	clones: Arc<AtomicUsize>,
	failing: Arc<AtomicBool>,
	without_subdir: Arc<AtomicBool>,
}

impl FakeCloner {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn omit_subdir(&self) {
		self.without_subdir.store(true, Ordering::SeqCst);
	}

	pub fn count(&self) -> usize {
		self.clones.load(Ordering::SeqCst)
	}
}

impl RepoCloner for FakeCloner {
	fn clone_branch(&self, _url: &str, branch: &str, dest: &Path) -> Result<()> {
		self.clones.fetch_add(1, Ordering::SeqCst);
		if self.failing.load(Ordering::SeqCst) {
			bail!("fatal: Remote branch {} not found", branch);
		}

		fs::create_dir_all(dest.join(".git"))?;
		fs::write(dest.join("README.md"), "repo")?;
		if !self.without_subdir.load(Ordering::SeqCst) {
			let model = dest.join("models").join("reuters");
			fs::create_dir_all(model.join("textcat_multilabel"))?;
			fs::write(model.join("meta.json"), REUTERS_META)?;
			fs::write(model.join("textcat_multilabel").join("model"), "weights")?;
		}
		Ok(())
	}
}

/// Zip laid out like NLTK's punkt package
pub fn punkt_zip() -> Vec<u8> {
	let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
	let options = zip::write::SimpleFileOptions::default();
	for name in ["punkt/english.pickle", "punkt/PY3/english.pickle", "punkt/german.pickle"] {
		writer.start_file(name, options).unwrap();
		writer.write_all(b"pickle").unwrap();
	}
	writer.finish().unwrap().into_inner()
}

pub fn fetcher(home: &Path, transport: &FakeTransport, cloner: &FakeCloner) -> AssetFetcher {
	AssetFetcher::new(transport.clone(), cloner.clone(), home.join("cache")).quiet()
}

pub fn cache_with(
	home: &Path,
	hardware: SimulatedHardware,
	transport: &FakeTransport,
	cloner: &FakeCloner,
) -> ModelCache {
	cache_with_settings(Settings::with_home(home), hardware, transport, cloner)
}

pub fn cache_with_settings(
	settings: Settings,
	hardware: SimulatedHardware,
	transport: &FakeTransport,
	cloner: &FakeCloner,
) -> ModelCache {
	let fetcher = fetcher(&settings.home, transport, cloner);
	ModelCache::new(settings, Arc::new(DeviceSelector::simulated(hardware)), fetcher)
}
