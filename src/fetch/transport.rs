//! Byte transport for remote assets

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::time::Duration;

const CHUNK_SIZE: usize = 64 * 1024;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Streams a remote resource into a sink
pub trait Transport: Send + Sync {
	/// Writes the body of `url` into `sink` and returns the number of bytes written.
	///
	/// `progress` receives `(downloaded, total)` after each chunk; `total` is
	/// `None` when the server sends no content length.
	fn download(
		&self,
		url: &str,
		sink: &mut dyn Write,
		progress: &mut dyn FnMut(u64, Option<u64>),
	) -> Result<u64>;
}

/// Blocking HTTP(S) transport
pub struct HttpTransport {
	client: reqwest::blocking::Client,
}

impl HttpTransport {
	pub fn new() -> Result<Self> {
		// Model binaries can take minutes; only the connect phase is bounded.
		let client = reqwest::blocking::Client::builder()
			.connect_timeout(CONNECT_TIMEOUT)
			.timeout(None)
			.user_agent(concat!("crawlkit-models/", env!("CARGO_PKG_VERSION")))
			.build()
			.context("Failed to build HTTP client")?;
		Ok(Self { client })
	}
}

impl Transport for HttpTransport {
	fn download(
		&self,
		url: &str,
		sink: &mut dyn Write,
		progress: &mut dyn FnMut(u64, Option<u64>),
	) -> Result<u64> {
		let mut response = self
			.client
			.get(url)
			.send()
			.with_context(|| format!("Request failed: {}", url))?
			.error_for_status()
			.with_context(|| format!("Bad response: {}", url))?;

		let total = response.content_length();
		let mut buffer = vec![0u8; CHUNK_SIZE];
		let mut downloaded: u64 = 0;

		progress(0, total);
		loop {
			let n = response
				.read(&mut buffer)
				.with_context(|| format!("Read failed: {}", url))?;
			if n == 0 {
				break;
			}
			sink.write_all(&buffer[..n]).context("Write failed")?;
			downloaded += n as u64;
			progress(downloaded, total);
		}

		if total.is_none() {
			progress(downloaded, Some(downloaded));
		}

		Ok(downloaded)
	}
}
