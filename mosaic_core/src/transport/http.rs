//! Fetching resources from an HTTP endpoint.
//!
//! [`HttpTransport`] joins each resource key onto a base URL and issues a `GET` request.
//! Connection, timeout and body errors are retried with exponential backoff, any
//! non-success status fails the fetch.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mosaic_core::{HttpTransport, ResourceKey, Transport};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let transport = HttpTransport::from_str("http://localhost:8765")?;
//!     let content = transport.fetch(&ResourceKey::from("/color/ff0000")).await?;
//!     println!("Read {} bytes", content.len());
//!     Ok(())
//! }
//! ```

use super::Transport;
use crate::{Blob, ResourceKey};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tokio::time::sleep;

const MAX_RETRIES: u32 = 3;

#[derive(Debug)]
pub struct HttpTransport {
	client: Client,
	name: String,
	base: Url,
}

impl HttpTransport {
	pub fn from_url(base: Url) -> Result<HttpTransport> {
		match base.scheme() {
			"http" | "https" => (),
			other => bail!("unsupported URL scheme '{other}' in '{base}', expected 'http' or 'https'"),
		}

		let client = Client::builder()
			.tcp_keepalive(Duration::from_secs(600))
			.timeout(Duration::from_secs(30))
			.build()?;

		Ok(HttpTransport {
			client,
			name: base.to_string(),
			base,
		})
	}

	#[allow(clippy::should_implement_trait)]
	pub fn from_str(url: &str) -> Result<HttpTransport> {
		let base = Url::parse(url).with_context(|| format!("parsing server URL '{url}'"))?;
		HttpTransport::from_url(base)
	}

	/// Absolute URL of the resource `key`.
	pub fn url_for(&self, key: &ResourceKey) -> Result<Url> {
		self
			.base
			.join(key.as_str())
			.with_context(|| format!("joining '{key}' onto '{}'", self.base))
	}
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
	err.is_connect() || err.is_timeout() || err.is_body()
}

#[async_trait]
impl Transport for HttpTransport {
	async fn fetch(&self, key: &ResourceKey) -> Result<Blob> {
		let url = self.url_for(key)?;

		for attempt in 0..=MAX_RETRIES {
			if attempt > 0 {
				let backoff = Duration::from_millis(250 << (attempt - 1));
				log::warn!("retry attempt {attempt}/{MAX_RETRIES} fetching '{url}', waiting {backoff:?}");
				sleep(backoff).await;
			}

			let response = match self.client.get(url.clone()).send().await {
				Ok(r) => r,
				Err(e) if is_retryable_error(&e) && attempt < MAX_RETRIES => {
					log::warn!("retryable error: {e}");
					continue;
				}
				Err(e) => return Err(e).with_context(|| format!("requesting '{url}'")),
			};

			if !response.status().is_success() {
				bail!("HTTP request for '{url}' failed with status {}", response.status());
			}

			let bytes = match response.bytes().await {
				Ok(b) => b,
				Err(e) if is_retryable_error(&e) && attempt < MAX_RETRIES => {
					log::warn!("retryable error reading response body: {e}");
					continue;
				}
				Err(e) => return Err(e).with_context(|| format!("reading body of '{url}'")),
			};

			log::trace!("fetched {} bytes from '{url}'", bytes.len());
			return Ok(Blob::from(&*bytes));
		}

		bail!("request for '{url}' failed after {MAX_RETRIES} retries")
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_other_schemes() {
		let err = HttpTransport::from_str("ftp://example.org/").unwrap_err();
		assert!(err.to_string().contains("unsupported URL scheme 'ftp'"));
		assert!(HttpTransport::from_str("not a url").is_err());
	}

	#[test]
	fn keys_are_joined_onto_base() -> Result<()> {
		let transport = HttpTransport::from_str("http://localhost:8765/app/")?;
		assert_eq!(
			transport.url_for(&ResourceKey::from("/color/00ff00"))?.as_str(),
			"http://localhost:8765/color/00ff00"
		);
		assert_eq!(
			transport.url_for(&ResourceKey::from("color/00ff00"))?.as_str(),
			"http://localhost:8765/app/color/00ff00"
		);
		assert_eq!(transport.get_name(), "http://localhost:8765/app/");
		Ok(())
	}

	#[tokio::test]
	async fn unreachable_server_fails() {
		let transport = HttpTransport::from_str("http://127.0.0.1:9/").unwrap();
		let result = transport.fetch(&ResourceKey::from("/color/000000")).await;
		assert!(result.is_err());
	}
}
