//! Zip extraction for archive-style assets

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Extracts `archive` into `dest` and returns the number of files written.
///
/// When every entry lives under one top-level folder (`punkt/...`), that
/// folder is stripped so its contents land directly in `dest`.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<u64> {
	let file = File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
	let mut zip = zip::ZipArchive::new(BufReader::new(file))
		.with_context(|| format!("Not a zip archive: {}", archive.display()))?;

	let root = common_root(zip.file_names());
	fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;

	let mut files = 0;
	for i in 0..zip.len() {
		let mut entry = zip.by_index(i).context("Corrupt zip entry")?;
		let Some(name) = entry.enclosed_name() else {
			crate::ui::debug(&format!("Skipping unsafe entry: {}", entry.name()));
			continue;
		};

		let relative = match root.as_ref().and_then(|r| name.strip_prefix(r).ok()) {
			Some(stripped) => stripped.to_path_buf(),
			None => name.clone(),
		};
		if relative.as_os_str().is_empty() {
			continue;
		}

		let out = dest.join(&relative);
		if entry.is_dir() {
			fs::create_dir_all(&out)?;
			continue;
		}

		if let Some(parent) = out.parent() {
			fs::create_dir_all(parent)?;
		}
		let mut target = File::create(&out).with_context(|| format!("Failed to create {}", out.display()))?;
		io::copy(&mut entry, &mut target).with_context(|| format!("Failed to extract {}", relative.display()))?;
		files += 1;
	}

	Ok(files)
}

fn common_root<'a>(names: impl Iterator<Item = &'a str>) -> Option<PathBuf> {
	let mut root: Option<&str> = None;
	for name in names {
		let (first, _) = name.split_once('/')?;
		match root {
			None => root = Some(first),
			Some(r) if r == first => {}
			Some(_) => return None,
		}
	}
	root.map(PathBuf::from)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use zip::write::SimpleFileOptions;

	fn write_zip(path: &Path, entries: &[(&str, &str)]) {
		let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
		for (name, body) in entries {
			writer.start_file(*name, SimpleFileOptions::default()).unwrap();
			writer.write_all(body.as_bytes()).unwrap();
		}
		writer.finish().unwrap();
	}

	#[test]
	fn strips_single_top_level_folder() {
		let tmp = tempfile::tempdir().unwrap();
		let archive = tmp.path().join("punkt.zip");
		write_zip(
			&archive,
			&[("punkt/english.pickle", "en"), ("punkt/PY3/german.pickle", "de")],
		);

		let dest = tmp.path().join("out");
		assert_eq!(extract_zip(&archive, &dest).unwrap(), 2);
		assert_eq!(fs::read_to_string(dest.join("english.pickle")).unwrap(), "en");
		assert!(dest.join("PY3").join("german.pickle").is_file());
	}

	#[test]
	fn keeps_layout_with_mixed_roots() {
		let tmp = tempfile::tempdir().unwrap();
		let archive = tmp.path().join("mixed.zip");
		write_zip(&archive, &[("a/one.txt", "1"), ("two.txt", "2")]);

		let dest = tmp.path().join("out");
		extract_zip(&archive, &dest).unwrap();
		assert!(dest.join("a").join("one.txt").is_file());
		assert!(dest.join("two.txt").is_file());
	}

	#[test]
	fn rejects_non_zip() {
		let tmp = tempfile::tempdir().unwrap();
		let archive = tmp.path().join("bogus.zip");
		fs::write(&archive, "not a zip").unwrap();
		assert!(extract_zip(&archive, &tmp.path().join("out")).is_err());
	}
}
