use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use crate::retry::{self, RetryPolicy};

const STRUCTURED_ATTEMPTS: u32 = 3;

/// One chat completion round trip returning the raw assistant text.
pub async fn complete(
	cfg: &magpie_config::LlmProviderConfig,
	system: Option<&str>,
	prompt: &str,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut messages = Vec::with_capacity(2);

	if let Some(system) = system {
		messages.push(serde_json::json!({ "role": "system", "content": system }));
	}

	messages.push(serde_json::json!({ "role": "user", "content": prompt }));

	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_chat_content(&json)
}

/// Schema-steered completion parsed as JSON. Markdown code fences around the
/// payload are tolerated; malformed payloads are retried.
pub async fn structured(
	cfg: &magpie_config::LlmProviderConfig,
	system: Option<&str>,
	prompt: &str,
	schema: &Value,
) -> Result<Value> {
	let schema_text = serde_json::to_string(schema)?;
	let steering = format!(
		"{}\n\nRespond with only a JSON value matching this schema, no prose:\n{schema_text}",
		system.unwrap_or_default()
	);
	let policy = RetryPolicy::new(
		STRUCTURED_ATTEMPTS,
		Duration::from_millis(500),
		Duration::from_millis(5_000),
	);

	retry::with_retries(&policy, "llm.structured", || async {
		let content = complete(cfg, Some(&steering), prompt).await?;
		let payload: Value = serde_json::from_str(strip_code_fence(&content))
			.map_err(|_| eyre::eyre!("Structured response is not valid JSON."))?;

		Ok(payload)
	})
	.await
}

fn parse_chat_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(|c| c.to_string())
		.ok_or_else(|| eyre::eyre!("Completion response is missing message content."))
}

fn strip_code_fence(text: &str) -> &str {
	let trimmed = text.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let rest = rest.strip_prefix("json").unwrap_or(rest);
	let rest = rest.strip_suffix("```").unwrap_or(rest);

	rest.trim()
}
