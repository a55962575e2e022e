//! Research-session pipeline: query planning, candidate search, relevance
//! funnel, and note extraction over downloaded documents.

pub mod document;
pub mod extract;
pub mod filter;
pub mod planner;
pub mod schedule;
pub mod search;
mod session;
pub mod validate;

use std::{future::Future, pin::Pin, sync::Arc};

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use magpie_config::Config;
use magpie_domain::status::SessionStatus;
use magpie_providers::{parse::ParsedDocument, search::SearchHit};
use magpie_store::{Store, models::SessionRecord};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a magpie_config::EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn structured<'a>(
		&'a self,
		cfg: &'a magpie_config::LlmProviderConfig,
		system: Option<&'a str>,
		prompt: &'a str,
		schema: &'a Value,
	) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

pub trait SearchProvider
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		cfg: &'a magpie_config::Search,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<SearchHit>>>;
}

pub trait FetchProvider
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		cfg: &'a magpie_config::Download,
		url: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>>;
}

pub trait ParseProvider
where
	Self: Send + Sync,
{
	fn parse<'a>(&'a self, bytes: &'a [u8]) -> BoxFuture<'a, color_eyre::Result<ParsedDocument>>;
}

/// Outbound progress messages. Delivery is best effort and must never fail
/// the pipeline.
pub trait Notifier
where
	Self: Send + Sync,
{
	fn session_status<'a>(
		&'a self,
		session_id: Uuid,
		stage: &'a str,
		message: &'a str,
	) -> BoxFuture<'a, ()>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub llm: Arc<dyn LlmProvider>,
	pub search: Arc<dyn SearchProvider>,
	pub fetch: Arc<dyn FetchProvider>,
	pub parse: Arc<dyn ParseProvider>,
	pub notifier: Arc<dyn Notifier>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		llm: Arc<dyn LlmProvider>,
		search: Arc<dyn SearchProvider>,
		fetch: Arc<dyn FetchProvider>,
		parse: Arc<dyn ParseProvider>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		Self { embedding, llm, search, fetch, parse, notifier }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let defaults = Arc::new(DefaultProviders);

		Self {
			embedding: defaults.clone(),
			llm: defaults.clone(),
			search: defaults.clone(),
			fetch: defaults.clone(),
			parse: defaults,
			notifier: Arc::new(LogNotifier),
		}
	}
}

/// HTTP-backed providers used outside of tests.
pub struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a magpie_config::EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(magpie_providers::embedding::embed(cfg, texts))
	}
}
impl LlmProvider for DefaultProviders {
	fn structured<'a>(
		&'a self,
		cfg: &'a magpie_config::LlmProviderConfig,
		system: Option<&'a str>,
		prompt: &'a str,
		schema: &'a Value,
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(magpie_providers::llm::structured(cfg, system, prompt, schema))
	}
}
impl SearchProvider for DefaultProviders {
	fn query<'a>(
		&'a self,
		cfg: &'a magpie_config::Search,
		query: &'a str,
		max_results: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<SearchHit>>> {
		Box::pin(magpie_providers::search::query(cfg, query, max_results))
	}
}
impl FetchProvider for DefaultProviders {
	fn fetch<'a>(
		&'a self,
		cfg: &'a magpie_config::Download,
		url: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<u8>>> {
		Box::pin(magpie_providers::fetch::fetch(cfg, url))
	}
}
impl ParseProvider for DefaultProviders {
	fn parse<'a>(&'a self, bytes: &'a [u8]) -> BoxFuture<'a, color_eyre::Result<ParsedDocument>> {
		Box::pin(async move {
			let bytes = bytes.to_vec();

			// Text extraction is CPU bound; keep it off the async runtime.
			tokio::task::spawn_blocking(move || magpie_providers::parse::parse(&bytes))
				.await
				.map_err(|err| color_eyre::eyre::eyre!("Parser task failed: {err}."))?
		})
	}
}

/// Default [`Notifier`] that reports progress through the log stream.
pub struct LogNotifier;
impl Notifier for LogNotifier {
	fn session_status<'a>(
		&'a self,
		session_id: Uuid,
		stage: &'a str,
		message: &'a str,
	) -> BoxFuture<'a, ()> {
		Box::pin(async move {
			tracing::info!(session = %session_id, stage, "{message}");
		})
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchRequest {
	/// Resubmitting with an existing id updates that session in place.
	pub session_id: Option<Uuid>,
	#[serde(default)]
	pub topics: Vec<String>,
	#[serde(default)]
	pub queries: Vec<String>,
	#[serde(default)]
	pub direct_urls: Vec<String>,
	/// Overrides the configured document cap for this session only.
	pub max_documents: Option<u32>,
}

#[derive(Clone)]
pub struct Pipeline {
	pub(crate) cfg: Config,
	pub(crate) store: Arc<dyn Store>,
	pub(crate) providers: Providers,
}
impl Pipeline {
	pub fn new(cfg: Config, store: Arc<dyn Store>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}

	pub fn store(&self) -> &Arc<dyn Store> {
		&self.store
	}

	/// Registers the session and drives it to a terminal status.
	pub async fn run(&self, request: ResearchRequest) -> color_eyre::Result<Uuid> {
		let session_id = self.register(&request).await?;

		if let Err(err) = self.run_session(session_id, request.max_documents).await {
			tracing::error!(session = %session_id, error = %err, "Session failed.");

			// Regression conflicts mean the session already settled.
			let _ = self.store.set_session_status(session_id, SessionStatus::Error).await;

			self.providers
				.notifier
				.session_status(session_id, "error", &format!("Research failed: {err}"))
				.await;
		}

		Ok(session_id)
	}

	/// Registers the session and processes it on a background task.
	pub fn submit(self: &Arc<Self>, request: ResearchRequest) -> Uuid {
		let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);
		let pipeline = self.clone();
		let request = ResearchRequest { session_id: Some(session_id), ..request };

		tokio::spawn(async move {
			if let Err(err) = pipeline.run(request).await {
				tracing::error!(session = %session_id, error = %err, "Failed to start session.");
			}
		});

		session_id
	}

	async fn register(&self, request: &ResearchRequest) -> color_eyre::Result<Uuid> {
		let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);
		let now = OffsetDateTime::now_utc();

		self.store
			.upsert_session(SessionRecord {
				session_id,
				status: SessionStatus::Initiated,
				topics: request.topics.clone(),
				queries: request.queries.clone(),
				direct_urls: request.direct_urls.clone(),
				created_at: now,
				updated_at: now,
			})
			.await?;

		Ok(session_id)
	}
}
