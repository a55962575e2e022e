//! LLM note extraction from page-marked document text.

use std::collections::BTreeMap;

use serde_json::Value;

use magpie_domain::note::{self, NoteCategory};

use crate::LlmProvider;

/// Shared per-session context carried into every document worker.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
	/// Topics plus supplemental planner terms, shown to the model as context.
	pub search_terms: Vec<String>,
	/// The questions extraction must answer.
	pub queries: Vec<String>,
	/// Expanded question set used for final note validation.
	pub questions: Vec<String>,
	pub explanation: String,
	/// Embedding of the expanded questions, used for page relevance.
	pub intent_embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ExtractedNote {
	pub content: String,
	pub page_number: u32,
	pub category: NoteCategory,
	pub matched_query: String,
	pub justification: String,
	pub inline_citations: Vec<String>,
	pub reference_map: BTreeMap<String, String>,
	pub relevance_score: Option<f32>,
	pub accepted: bool,
}

/// Extracts notes from one stretch of page-marked text. Returns nothing when
/// extraction fails; a broken model response never aborts the document.
pub async fn extract(
	llm: &dyn LlmProvider,
	cfg: &magpie_config::LlmProviderConfig,
	text: &str,
	ctx: &ExtractionContext,
	page_count: u32,
) -> Vec<ExtractedNote> {
	if text.trim().is_empty() || ctx.queries.is_empty() {
		return Vec::new();
	}

	let system = system_prompt(&ctx.search_terms, &ctx.queries);
	let prompt = format!(
		"Below is text from an academic paper. Extract only information the user is explicitly \
		 looking for, nothing else. Extracting zero items is fine; every item must match what \
		 the user asked for.\n\n{text}",
	);
	let schema = extraction_schema();

	match llm.structured(cfg, Some(&system), &prompt, &schema).await {
		Ok(value) => normalize_items(value)
			.into_iter()
			.filter_map(|item| note_from_item(&item, page_count))
			.collect(),
		Err(err) => {
			tracing::warn!(error = %err, "Note extraction failed for this text.");

			Vec::new()
		},
	}
}

fn system_prompt(search_terms: &[String], queries: &[String]) -> String {
	let questions = queries.iter().map(|q| format!("- {q}")).collect::<Vec<_>>().join("\n");

	format!(
		"You are a research assistant analyzing academic papers. Extract information that \
		 DIRECTLY relates to the user's questions below; skip anything only remotely relevant.\n\n\
		 Relevant search terms for context: {}\n\nUser questions:\n{questions}\n\n\
		 Instructions:\n\
		 1. Extract the exact text that answers a question, with enough surrounding text to keep \
		 context, and keep any citations found in it.\n\
		 2. Be thorough: extract as much directly relevant text as the pages provide.\n\
		 3. For each extraction, name the exact question it relates to (matches_topic).\n\
		 4. The text contains multiple pages marked with [PAGE N]; always report the correct \
		 page number.\n\
		 5. Justify for each extraction why it answers the user's question; drop it if you \
		 cannot.\n\
		 6. Include citation references found in the text, like [1] or [Smith et al., 2020], \
		 and full reference details when the document provides them.",
		search_terms.join(", "),
	)
}

fn extraction_schema() -> Value {
	serde_json::json!({
		"type": "array",
		"items": {
			"type": "object",
			"properties": {
				"content": { "type": "string" },
				"page_number": { "type": "integer" },
				"matches_topic": { "type": "string" },
				"justification": { "type": "string" },
				"inline_citations": { "type": "array", "items": { "type": "string" } },
				"reference_list": {
					"type": "object",
					"additionalProperties": { "type": "string" }
				}
			},
			"required": ["content", "page_number", "matches_topic", "justification"]
		}
	})
}

/// Accepts the payload shapes models actually return: a bare array, an
/// object with an `items` array, or an object whose first array value holds
/// the items.
pub fn normalize_items(value: Value) -> Vec<Value> {
	match value {
		Value::Array(items) => items,
		Value::Object(mut map) => {
			if let Some(Value::Array(items)) = map.remove("items") {
				return items;
			}

			map.into_iter()
				.find_map(|(_, v)| match v {
					Value::Array(items) => Some(items),
					_ => None,
				})
				.unwrap_or_default()
		},
		_ => Vec::new(),
	}
}

fn note_from_item(item: &Value, page_count: u32) -> Option<ExtractedNote> {
	let content = item.get("content").and_then(Value::as_str).unwrap_or_default().to_string();

	if content.trim().is_empty() {
		return None;
	}

	let matched_query =
		item.get("matches_topic").and_then(Value::as_str).unwrap_or_default().to_string();
	let justification = match item.get("justification").and_then(Value::as_str) {
		Some(text) if !text.trim().is_empty() => text.to_string(),
		_ => format!(
			"This information relates to the search query '{}' and provides relevant details \
			 about {}.",
			if matched_query.is_empty() { "unknown" } else { &matched_query },
			if matched_query.is_empty() { "the topic" } else { &matched_query },
		),
	};
	let page_number = item
		.get("page_number")
		.and_then(Value::as_u64)
		.map(|page| page as u32)
		.unwrap_or(1)
		.clamp(1, page_count.max(1));
	let inline_citations = item
		.get("inline_citations")
		.and_then(Value::as_array)
		.map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
		.unwrap_or_default();
	let reference_map = item
		.get("reference_list")
		.and_then(Value::as_object)
		.map(|map| {
			map.iter()
				.filter_map(|(key, v)| v.as_str().map(|s| (key.clone(), s.to_string())))
				.collect()
		})
		.unwrap_or_default();

	Some(ExtractedNote {
		category: note::categorize(&content, &matched_query),
		content,
		page_number,
		matched_query,
		justification,
		inline_citations,
		reference_map,
		relevance_score: None,
		accepted: true,
	})
}
