use std::{fs, io::Write, time::Duration};

use color_eyre::{Result, eyre};
use reqwest::{
	Client,
	header::{ACCEPT, CONTENT_TYPE, USER_AGENT},
};
use tempfile::NamedTempFile;

use crate::retry::{self, RetryPolicy};

/// Downloads a document with a pre-flight size probe and bounded retries.
/// The body streams into a uniquely named temp file that is removed on every
/// exit path, including failures.
pub async fn fetch(cfg: &magpie_config::Download, url: &str) -> Result<Vec<u8>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

	preflight(&client, cfg, url).await?;

	let policy = RetryPolicy::new(
		cfg.max_attempts,
		Duration::from_millis(cfg.backoff_base_ms),
		Duration::from_millis(cfg.backoff_max_ms),
	);

	retry::with_retries(&policy, "document download", || download_once(&client, cfg, url)).await
}

/// HEAD probe. An oversized Content-Length rejects the URL outright; an
/// unexpected content type only warns, since some hosts mislabel PDFs. Probe
/// transport failures fall through to the real download.
async fn preflight(client: &Client, cfg: &magpie_config::Download, url: &str) -> Result<()> {
	let response = match client.head(url).header(USER_AGENT, crate::USER_AGENT_VALUE).send().await {
		Ok(response) => response,
		Err(err) => {
			tracing::warn!(error = %err, url, "Pre-flight probe failed. Continuing with download.");

			return Ok(());
		},
	};

	if let Some(content_type) = response
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		&& !content_type.to_lowercase().starts_with("application/pdf")
	{
		tracing::warn!(url, content_type, "URL does not report a PDF content type.");
	}

	if let Some(length) = response.content_length()
		&& length > cfg.max_bytes
	{
		return Err(eyre::eyre!(
			"Document at {url} reports {length} bytes, over the {} byte cap.",
			cfg.max_bytes
		));
	}

	Ok(())
}

async fn download_once(
	client: &Client,
	cfg: &magpie_config::Download,
	url: &str,
) -> Result<Vec<u8>> {
	let mut response = client
		.get(url)
		.header(USER_AGENT, crate::USER_AGENT_VALUE)
		.header(ACCEPT, "application/pdf")
		.send()
		.await?
		.error_for_status()?;
	let mut file = NamedTempFile::new()?;
	let mut written: u64 = 0;

	while let Some(chunk) = response.chunk().await? {
		written += chunk.len() as u64;

		if written > cfg.max_bytes {
			return Err(eyre::eyre!(
				"Document at {url} exceeded the {} byte cap while streaming.",
				cfg.max_bytes
			));
		}

		file.write_all(&chunk)?;
	}

	file.flush()?;

	let bytes = fs::read(file.path())?;

	Ok(bytes)
}
