use std::sync::Arc;

use magpie_domain::status::DocumentStatus;
use magpie_pipeline::{LogNotifier, Providers, document, extract::ExtractionContext};
use magpie_testkit::{FixtureEmbedding, ScriptedLlm, StubFetch, StubParse, config_fixture};

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

fn providers(embedding: FixtureEmbedding, llm: ScriptedLlm, parse: StubParse) -> Providers {
	Providers::new(
		Arc::new(embedding),
		Arc::new(llm),
		Arc::new(super::CountingSearch::new(Vec::new())),
		Arc::new(StubFetch),
		Arc::new(parse),
		Arc::new(LogNotifier),
	)
}

#[tokio::test]
async fn small_documents_are_extracted_in_one_pass() {
	let cfg = config_fixture();
	let pages: Vec<&str> = (0..8).map(|_| "Siege engine text.").collect();
	let providers = providers(
		FixtureEmbedding::new(vec![1.0, 0.0]),
		// One metadata call, one extraction call: no page scoring happens.
		ScriptedLlm::new(vec![
			metadata_response("Short Siege Survey"),
			extraction_response(&[("Rams gave way to trebuchets.", 1)]),
		]),
		parse_fixture(&[(URL, pages)]),
	);
	let outcome = document::process(&cfg, &providers, URL, &context()).await.unwrap();

	assert_eq!(outcome.status, DocumentStatus::Success);
	assert_eq!(outcome.page_count, 8);
	assert_eq!(outcome.notes.len(), 1);
	assert_eq!(outcome.notes[0].page_number, 1);
}

#[tokio::test]
async fn large_documents_narrow_to_relevant_pages_and_chunk() {
	let cfg = config_fixture();
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
	// Only the registered pages align with the intent; the rest score zero.
	let embedding = FixtureEmbedding::new(vec![0.0, 1.0])
		.with("Traction trebuchet origins.", vec![1.0, 0.0])
		.with("Counterweight mechanics.", vec![1.0, 0.0])
		.with("Siege doctrine shifts.", vec![1.0, 0.0]);
	let providers = providers(
		embedding,
		// Pages 2 and 3 merge into one chunk; page 7 stands alone.
		ScriptedLlm::new(vec![
			metadata_response("Long Siege Treatise"),
			extraction_response(&[
				("Traction trebuchets came first.", 2),
				("Counterweights multiplied range.", 3),
			]),
			extraction_response(&[("Doctrine shifted toward attrition.", 7)]),
		]),
		parse_fixture(&[(URL, pages)]),
	);
	let outcome = document::process(&cfg, &providers, URL, &context()).await.unwrap();

	assert_eq!(outcome.status, DocumentStatus::Success);
	assert_eq!(
		outcome.notes.iter().map(|note| note.page_number).collect::<Vec<_>>(),
		vec![2, 3, 7]
	);
}

#[tokio::test]
async fn large_documents_without_relevant_pages_settle_as_no_relevant_info() {
	let cfg = config_fixture();
	let pages: Vec<&str> = (0..9).map(|_| "Unrelated text.").collect();
	let providers = providers(
		FixtureEmbedding::new(vec![0.0, 1.0]),
		ScriptedLlm::new(vec![metadata_response("Irrelevant Treatise")]),
		parse_fixture(&[(URL, pages)]),
	);
	let outcome = document::process(&cfg, &providers, URL, &context()).await.unwrap();

	assert_eq!(outcome.status, DocumentStatus::NoRelevantInfo);
	assert!(outcome.notes.is_empty());
	// Metadata survives even when nothing relevant was found.
	assert_eq!(outcome.title, "Irrelevant Treatise");
}

#[tokio::test]
async fn download_failures_surface_as_errors() {
	let cfg = config_fixture();
	let providers = providers(
		FixtureEmbedding::new(vec![1.0, 0.0]),
		ScriptedLlm::new(Vec::new()),
		// No fixture registered for the URL, so parsing fails.
		StubParse::new(),
	);

	assert!(document::process(&cfg, &providers, URL, &context()).await.is_err());
}
