use std::{sync::Arc, time::Duration};

use magpie_domain::status::DocumentStatus;
use magpie_pipeline::{LogNotifier, Providers, document, extract::ExtractionContext};
use magpie_testkit::{FixtureEmbedding, ScriptedLlm, StubFetch, config_fixture};

use super::{extraction_response, metadata_response, parse_fixture};

const URL: &str = "https://arxiv.org/pdf/2401.00001";

fn context() -> ExtractionContext {
	ExtractionContext {
		search_terms: vec!["medieval warfare".to_string()],
		queries: vec!["evolution of siege tactics".to_string()],
		questions: vec!["How did siege tactics evolve?".to_string()],
		explanation: "Evolution of siege warfare".to_string(),
		intent_embedding: vec![1.0, 0.0],
	}
}

fn large_document_providers(llm: ScriptedLlm) -> Providers {
	let pages = vec![
		"Frontmatter.",
		"Traction trebuchet origins.",
		"Counterweight mechanics.",
		"Unrelated heraldry.",
		"Unrelated genealogy.",
		"Unrelated coinage.",
		"Siege doctrine shifts.",
		"Unrelated appendix.",
		"Unrelated index.",
	];
	let embedding = FixtureEmbedding::new(vec![0.0, 1.0])
		.with("Traction trebuchet origins.", vec![1.0, 0.0])
		.with("Counterweight mechanics.", vec![1.0, 0.0])
		.with("Siege doctrine shifts.", vec![1.0, 0.0]);

	Providers::new(
		Arc::new(embedding),
		Arc::new(llm),
		Arc::new(super::CountingSearch::new(Vec::new())),
		Arc::new(StubFetch),
		Arc::new(parse_fixture(&[(URL, pages)])),
		Arc::new(LogNotifier),
	)
}

#[tokio::test]
async fn overrunning_the_budget_keeps_notes_already_extracted() {
	let mut cfg = config_fixture();

	cfg.processing.document_budget_secs = 1;

	// Metadata plus the first chunk consume the whole budget, so the second
	// chunk never runs.
	let llm = ScriptedLlm::new(vec![
		metadata_response("Long Siege Treatise"),
		extraction_response(&[("Traction trebuchets came first.", 2)]),
	])
	.with_delay(Duration::from_millis(600));
	let providers = large_document_providers(llm);
	let outcome = document::process(&cfg, &providers, URL, &context()).await.unwrap();

	assert_eq!(outcome.status, DocumentStatus::PartialSuccess);
	assert_eq!(outcome.notes.len(), 1);
	assert!(outcome.error_message.as_deref().unwrap_or_default().contains("exhausted"));
}

#[tokio::test]
async fn budget_overrun_without_notes_is_an_error() {
	let mut cfg = config_fixture();

	cfg.processing.document_budget_secs = 0;

	let llm = ScriptedLlm::new(vec![metadata_response("Long Siege Treatise")]);
	let providers = large_document_providers(llm);
	let outcome = document::process(&cfg, &providers, URL, &context()).await.unwrap();

	assert_eq!(outcome.status, DocumentStatus::Error);
	assert!(outcome.notes.is_empty());
	assert!(outcome.error_message.as_deref().unwrap_or_default().contains("exhausted"));
}
