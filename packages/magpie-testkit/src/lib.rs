//! Deterministic provider doubles and config fixtures for pipeline tests.

use std::{
	collections::{HashMap, VecDeque},
	sync::Mutex,
	time::Duration,
};

use color_eyre::eyre;
use serde_json::Value;
use uuid::Uuid;

use magpie_config::Config;
use magpie_pipeline::{
	BoxFuture, EmbeddingProvider, FetchProvider, LlmProvider, Notifier, ParseProvider,
	SearchProvider,
};
use magpie_providers::{parse::ParsedDocument, search::SearchHit};

/// Embedding double with exact-text lookup and a configurable default.
pub struct FixtureEmbedding {
	default: Vec<f32>,
	vectors: HashMap<String, Vec<f32>>,
}
impl FixtureEmbedding {
	pub fn new(default: Vec<f32>) -> Self {
		Self { default, vectors: HashMap::new() }
	}

	pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
		self.vectors.insert(text.into(), vector);

		self
	}
}
impl EmbeddingProvider for FixtureEmbedding {
	fn embed<'a>(
		&'a self,
		_: &'a magpie_config::EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Ok(texts
				.iter()
				.map(|text| self.vectors.get(text).unwrap_or(&self.default).clone())
				.collect())
		})
	}
}

/// Embedding double whose every call fails.
pub struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_: &'a magpie_config::EmbeddingProviderConfig,
		_: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async { Err(eyre::eyre!("Embedding backend offline.")) })
	}
}

/// LLM double that replays scripted structured responses in order, with an
/// optional per-call delay for budget tests.
pub struct ScriptedLlm {
	responses: Mutex<VecDeque<Value>>,
	delay: Option<Duration>,
}
impl ScriptedLlm {
	pub fn new(responses: Vec<Value>) -> Self {
		Self { responses: Mutex::new(responses.into()), delay: None }
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}
}
impl LlmProvider for ScriptedLlm {
	fn structured<'a>(
		&'a self,
		_: &'a magpie_config::LlmProviderConfig,
		_: Option<&'a str>,
		_: &'a str,
		_: &'a Value,
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			self.responses
				.lock()
				.map_err(|_| eyre::eyre!("Script lock poisoned."))?
				.pop_front()
				.ok_or_else(|| eyre::eyre!("Script exhausted."))
		})
	}
}

/// Search double returning the same hit list for every query.
pub struct StubSearch {
	pub hits: Vec<SearchHit>,
}
impl SearchProvider for StubSearch {
	fn query<'a>(
		&'a self,
		_: &'a magpie_config::Search,
		_: &'a str,
		_: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<SearchHit>>> {
		Box::pin(async move { Ok(self.hits.clone()) })
	}
}

/// Fetch double that hands the URL itself back as the document bytes, which
/// pairs with [`StubParse`] keying documents by URL.
pub struct StubFetch;
impl FetchProvider for StubFetch {
	fn fetch<'a>(
		&'a self,
		_: &'a magpie_config::Download,
		url: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>> {
		Box::pin(async move { Ok(url.as_bytes().to_vec()) })
	}
}

/// Parse double keyed by the UTF-8 content of the fetched bytes.
pub struct StubParse {
	pub documents: HashMap<String, ParsedDocument>,
}
impl StubParse {
	pub fn new() -> Self {
		Self { documents: HashMap::new() }
	}

	pub fn with(mut self, url: impl Into<String>, document: ParsedDocument) -> Self {
		self.documents.insert(url.into(), document);

		self
	}
}
impl Default for StubParse {
	fn default() -> Self {
		Self::new()
	}
}
impl ParseProvider for StubParse {
	fn parse<'a>(&'a self, bytes: &'a [u8]) -> BoxFuture<'a, color_eyre::Result<ParsedDocument>> {
		Box::pin(async move {
			let key = String::from_utf8_lossy(bytes).to_string();

			self.documents
				.get(&key)
				.cloned()
				.ok_or_else(|| eyre::eyre!("No fixture document for {key}."))
		})
	}
}

/// Notifier double that records every status event.
#[derive(Default)]
pub struct RecordingNotifier {
	events: Mutex<Vec<(String, String)>>,
}
impl RecordingNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<(String, String)> {
		self.events.lock().map(|events| events.clone()).unwrap_or_default()
	}
}
impl Notifier for RecordingNotifier {
	fn session_status<'a>(
		&'a self,
		_: Uuid,
		stage: &'a str,
		message: &'a str,
	) -> BoxFuture<'a, ()> {
		Box::pin(async move {
			if let Ok(mut events) = self.events.lock() {
				events.push((stage.to_string(), message.to_string()));
			}
		})
	}
}

/// A page-marked test document with the given page texts.
pub fn document(pages: Vec<&str>) -> ParsedDocument {
	ParsedDocument {
		page_count: pages.len() as u32,
		pages: pages.into_iter().map(str::to_string).collect(),
		info: Default::default(),
	}
}

pub fn search_hit(id: &str, title: &str, abstract_text: &str) -> SearchHit {
	SearchHit {
		id: id.to_string(),
		url: format!("https://arxiv.org/pdf/{id}"),
		title: title.to_string(),
		abstract_text: abstract_text.to_string(),
		authors: vec!["Garcia, M.".to_string()],
		published: "2024-01-01T00:00:00Z".to_string(),
	}
}

/// Full pipeline config with production defaults, zero pacing delays, and a
/// two-dimensional embedding space.
pub fn config_fixture() -> Config {
	use magpie_config::*;

	Config {
		service: Service { log_level: "info".to_string() },
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test-embedding".to_string(),
				api_base: "http://localhost:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embed".to_string(),
				dimensions: 2,
				timeout_ms: 1_000,
				default_headers: Default::default(),
			},
			llm: LlmProviderConfig {
				provider_id: "test-llm".to_string(),
				api_base: "http://localhost:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-chat".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Default::default(),
			},
		},
		search: Search {
			api_base: "http://export.arxiv.org/api/query".to_string(),
			user_agent: None,
			max_results: 60,
			page_size_cap: 30,
			query_delay_ms: 0,
			timeout_ms: 1_000,
		},
		funnel: Funnel {
			metadata_threshold: 0.65,
			page_threshold: 0.2,
			validation_threshold: 0.05,
			small_doc_pages: 8,
			embed_batch_size: 5,
		},
		processing: Processing {
			max_documents: 30,
			worker_pool: 1,
			document_budget_secs: 300,
			metadata_pages: 3,
			download: Download {
				timeout_ms: 1_000,
				max_bytes: 50 * 1024 * 1024,
				max_attempts: 3,
				backoff_base_ms: 1,
				backoff_max_ms: 2,
			},
		},
	}
}
