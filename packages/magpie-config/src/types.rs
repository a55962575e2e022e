use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub search: Search,
	pub funnel: Funnel,
	pub processing: Processing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub api_base: String,
	pub user_agent: Option<String>,
	/// Overall cap on unique candidates returned by one search pass.
	pub max_results: u32,
	/// Hard ceiling on results requested from a single query.
	pub page_size_cap: u32,
	/// Pause between consecutive queries against the upstream API.
	pub query_delay_ms: u64,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Funnel {
	pub metadata_threshold: f32,
	pub page_threshold: f32,
	/// Sanity-check floor for extracted notes. Deliberately low; recalibrate
	/// against the deployed embedding model before raising it.
	pub validation_threshold: f32,
	/// Documents at or below this page count are extracted in one pass.
	pub small_doc_pages: u32,
	pub embed_batch_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Processing {
	pub max_documents: u32,
	pub worker_pool: u32,
	pub document_budget_secs: u64,
	/// LLM metadata pass reads at most this many leading pages.
	pub metadata_pages: u32,
	pub download: Download,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Download {
	pub timeout_ms: u64,
	pub max_bytes: u64,
	pub max_attempts: u32,
	pub backoff_base_ms: u64,
	pub backoff_max_ms: u64,
}
