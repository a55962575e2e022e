//! Per-document processing: download, parse, metadata, and the two-path
//! extraction strategy with a wall-clock budget.

use std::{
	ops::RangeInclusive,
	time::{Duration, Instant},
};

use serde_json::Value;

use magpie_config::Config;
use magpie_domain::{chunk, reference, similarity, status::DocumentStatus};
use magpie_providers::{embedding, parse::ParsedDocument, search};

use crate::{
	LlmProvider, Providers,
	extract::{self, ExtractedNote, ExtractionContext},
	validate,
};

#[derive(Debug, Clone)]
pub struct Outcome {
	pub status: DocumentStatus,
	pub title: String,
	pub authors: Vec<String>,
	pub year: String,
	pub summary: String,
	pub reference: String,
	pub page_count: u32,
	pub error_message: Option<String>,
	pub notes: Vec<ExtractedNote>,
}

#[derive(Debug, Clone, Default)]
struct DocumentMetadata {
	title: String,
	authors: Vec<String>,
	year: String,
	summary: String,
	reference: String,
}

struct Budget {
	started: Instant,
	limit: Duration,
}
impl Budget {
	fn new(limit_secs: u64) -> Self {
		Self { started: Instant::now(), limit: Duration::from_secs(limit_secs) }
	}

	fn exhausted(&self) -> bool {
		self.started.elapsed() >= self.limit
	}

	fn message(&self) -> String {
		format!("Processing budget of {} seconds exhausted.", self.limit.as_secs())
	}
}

/// Processes one document end to end. Download and parse failures surface as
/// errors for the caller to record; everything after that settles into an
/// [`Outcome`] carrying whatever metadata was recovered.
pub async fn process(
	cfg: &Config,
	providers: &Providers,
	url: &str,
	ctx: &ExtractionContext,
) -> color_eyre::Result<Outcome> {
	let url = search::normalize_url(url);
	let bytes = providers.fetch.fetch(&cfg.processing.download, &url).await?;
	let parsed = providers.parse.parse(&bytes).await?;
	let budget = Budget::new(cfg.processing.document_budget_secs);
	let metadata = document_metadata(providers.llm.as_ref(), cfg, &parsed).await;

	tracing::debug!(url, pages = parsed.page_count, title = metadata.title, "Document parsed.");

	let mut outcome = if parsed.page_count <= cfg.funnel.small_doc_pages {
		simple_path(cfg, providers, &parsed, ctx, &budget, metadata).await
	} else {
		advanced_path(cfg, providers, &parsed, ctx, &budget, metadata).await
	};

	validate::validate_notes(
		providers.embedding.as_ref(),
		cfg,
		&mut outcome.notes,
		&ctx.questions,
		&ctx.explanation,
	)
	.await;

	Ok(outcome)
}

/// Small documents go to extraction in one pass.
async fn simple_path(
	cfg: &Config,
	providers: &Providers,
	parsed: &ParsedDocument,
	ctx: &ExtractionContext,
	budget: &Budget,
	metadata: DocumentMetadata,
) -> Outcome {
	if budget.exhausted() {
		return settle(DocumentStatus::Error, metadata, parsed, Some(budget.message()), Vec::new());
	}

	let text = page_marked_text(parsed, 1..=parsed.page_count);
	let notes = extract::extract(
		providers.llm.as_ref(),
		&cfg.providers.llm,
		&text,
		ctx,
		parsed.page_count,
	)
	.await;

	settle(DocumentStatus::Success, metadata, parsed, None, notes)
}

/// Large documents are narrowed to relevant pages by embedding similarity,
/// then extracted chunk by chunk.
async fn advanced_path(
	cfg: &Config,
	providers: &Providers,
	parsed: &ParsedDocument,
	ctx: &ExtractionContext,
	budget: &Budget,
	metadata: DocumentMetadata,
) -> Outcome {
	let relevant_pages = match relevant_pages(cfg, providers, parsed, ctx, budget).await {
		Ok(pages) => pages,
		Err(message) => {
			return settle(DocumentStatus::Error, metadata, parsed, Some(message), Vec::new());
		},
	};

	if relevant_pages.is_empty() {
		return settle(DocumentStatus::NoRelevantInfo, metadata, parsed, None, Vec::new());
	}

	let chunks = chunk::chunk_pages(&relevant_pages);
	let mut notes = Vec::new();

	tracing::debug!(
		relevant = relevant_pages.len(),
		chunks = chunks.len(),
		"Relevant pages located."
	);

	for chunk in chunks {
		if budget.exhausted() {
			let status = if notes.is_empty() {
				DocumentStatus::Error
			} else {
				DocumentStatus::PartialSuccess
			};

			return settle(status, metadata, parsed, Some(budget.message()), notes);
		}

		let text = page_marked_text(parsed, chunk.start..=chunk.end);

		notes.extend(
			extract::extract(
				providers.llm.as_ref(),
				&cfg.providers.llm,
				&text,
				ctx,
				parsed.page_count,
			)
			.await,
		);
	}

	settle(DocumentStatus::Success, metadata, parsed, None, notes)
}

/// Scores every non-empty page against the research intent, in batches.
/// A failed embedding batch scores as zero vectors, which keeps those pages
/// out: an unscored page is not worth an extraction call.
async fn relevant_pages(
	cfg: &Config,
	providers: &Providers,
	parsed: &ParsedDocument,
	ctx: &ExtractionContext,
	budget: &Budget,
) -> Result<Vec<u32>, String> {
	let pages: Vec<(u32, String)> = (1..=parsed.page_count)
		.map(|page| (page, parsed.page_text(page).to_string()))
		.filter(|(_, text)| !text.trim().is_empty())
		.collect();
	let batch_size = (cfg.funnel.embed_batch_size as usize).max(1);
	let mut relevant = Vec::new();

	for batch in pages.chunks(batch_size) {
		if budget.exhausted() {
			return Err(budget.message());
		}

		let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
		let vectors = match providers.embedding.embed(&cfg.providers.embedding, &texts).await {
			Ok(vectors) => vectors,
			Err(err) => {
				tracing::warn!(error = %err, "Page scoring failed, skipping batch.");

				vec![embedding::zero_vector(cfg.providers.embedding.dimensions); batch.len()]
			},
		};

		for ((page, _), vector) in batch.iter().zip(vectors) {
			if similarity::cosine(&vector, &ctx.intent_embedding) > cfg.funnel.page_threshold {
				relevant.push(*page);
			}
		}
	}

	Ok(relevant)
}

fn page_marked_text(parsed: &ParsedDocument, pages: RangeInclusive<u32>) -> String {
	let mut text = String::new();

	for page in pages {
		text.push_str(&format!("[PAGE {page}]\n{}\n[END PAGE {page}]\n", parsed.page_text(page)));
	}

	text
}

fn settle(
	status: DocumentStatus,
	metadata: DocumentMetadata,
	parsed: &ParsedDocument,
	error_message: Option<String>,
	notes: Vec<ExtractedNote>,
) -> Outcome {
	Outcome {
		status,
		title: metadata.title,
		authors: metadata.authors,
		year: metadata.year,
		summary: metadata.summary,
		reference: metadata.reference,
		page_count: parsed.page_count,
		error_message,
		notes,
	}
}

/// Reads title, authors, year, and a short summary from the leading pages.
/// Falls back to the parser's info dictionary when the model pass fails.
async fn document_metadata(
	llm: &dyn LlmProvider,
	cfg: &Config,
	parsed: &ParsedDocument,
) -> DocumentMetadata {
	let pages = cfg.processing.metadata_pages.min(parsed.page_count);
	let text = page_marked_text(parsed, 1..=pages.max(1));
	let system = "You are an academic metadata extraction assistant. From the first pages of an \
	              academic paper, extract: title, authors (as an array), year, and a brief 2-3 \
	              sentence summary of the paper's main focus. Use null for any field you cannot \
	              determine.";
	let schema = serde_json::json!({
		"type": "object",
		"properties": {
			"title": { "type": "string" },
			"authors": { "type": "array", "items": { "type": "string" } },
			"year": { "type": ["string", "number", "null"] },
			"summary": { "type": "string" }
		}
	});

	match llm.structured(&cfg.providers.llm, Some(system), &text, &schema).await {
		Ok(value) => {
			let title = match value.get("title").and_then(Value::as_str) {
				Some(title) if !title.trim().is_empty() => title.to_string(),
				_ => info_title(parsed),
			};
			let authors: Vec<String> = value
				.get("authors")
				.and_then(Value::as_array)
				.map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
				.unwrap_or_default();
			let year = match value.get("year") {
				Some(Value::String(year)) if !year.trim().is_empty() => year.clone(),
				Some(Value::Number(year)) => year.to_string(),
				_ => "Unknown".to_string(),
			};
			let summary =
				value.get("summary").and_then(Value::as_str).unwrap_or_default().to_string();

			DocumentMetadata {
				reference: reference::format_reference(&authors, &year, &title),
				title,
				authors,
				year,
				summary,
			}
		},
		Err(err) => {
			tracing::warn!(error = %err, "Metadata pass failed, using parser info.");

			fallback_metadata(parsed)
		},
	}
}

fn info_title(parsed: &ParsedDocument) -> String {
	parsed
		.info
		.get("Title")
		.filter(|title| !title.trim().is_empty())
		.cloned()
		.unwrap_or_else(|| "Unknown Document".to_string())
}

fn fallback_metadata(parsed: &ParsedDocument) -> DocumentMetadata {
	let title = info_title(parsed);
	let authors: Vec<String> = parsed
		.info
		.get("Author")
		.map(|raw| raw.split(", ").map(str::to_string).collect())
		.unwrap_or_default();
	let year = parsed
		.info
		.get("CreationDate")
		.and_then(|date| reference::extract_year(date))
		.unwrap_or_else(|| "Unknown".to_string());

	DocumentMetadata {
		reference: reference::format_reference(&authors, &year, &title),
		title,
		authors,
		year,
		summary: String::new(),
	}
}
