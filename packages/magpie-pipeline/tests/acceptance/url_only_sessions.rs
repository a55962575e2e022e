use std::sync::Arc;

use uuid::Uuid;

use magpie_domain::status::{DocumentStatus, SessionStatus};
use magpie_store::Store;
use magpie_testkit::{FailingEmbedding, ScriptedLlm, config_fixture};

use super::{
	CountingSearch, extraction_response, fixture, metadata_response, parse_fixture, plan_response,
	questions_response, request,
};

const ABS_URL: &str = "https://arxiv.org/abs/2401.99999";
const PDF_URL: &str = "https://arxiv.org/pdf/2401.99999";

#[tokio::test]
async fn direct_urls_without_topics_skip_search_and_filtering() {
	let session_id = Uuid::new_v4();
	let search = Arc::new(CountingSearch::new(Vec::new()));
	let llm = ScriptedLlm::new(vec![
		plan_response(),
		questions_response(),
		metadata_response("User Supplied Paper"),
		extraction_response(&[("Trebuchets displaced rams.", 1)]),
	]);
	let fix = fixture(
		config_fixture(),
		// A dead embedding backend must not matter on the fast path.
		Arc::new(FailingEmbedding),
		Arc::new(llm),
		search.clone(),
		Arc::new(parse_fixture(&[(PDF_URL, vec!["Trebuchets displaced rams."])])),
	);

	fix.pipeline
		.run(request(session_id, &[], &["evolution of siege tactics"], &[ABS_URL]))
		.await
		.unwrap();

	assert_eq!(search.call_count(), 0);

	let session = fix.store.fetch_session(session_id).await.unwrap().unwrap();

	assert_eq!(session.status, SessionStatus::Completed);

	let papers = fix.store.session_papers(session_id).await.unwrap();

	assert_eq!(papers.len(), 1);
	// The record keeps the URL as submitted; only the download is rewritten
	// to the direct PDF form.
	assert_eq!(papers[0].url, ABS_URL);
	assert_eq!(papers[0].status, DocumentStatus::Success);

	let notes = fix.store.paper_notes(papers[0].paper_id).await.unwrap();

	assert_eq!(notes.len(), 1);
	// Validation degraded, so the note is accepted without a score.
	assert!(notes[0].accepted);
	assert_eq!(notes[0].relevance_score, None);
}

#[tokio::test]
async fn every_document_completion_is_reported() {
	let session_id = Uuid::new_v4();
	let first = "https://arxiv.org/pdf/2401.11111";
	let second = "https://arxiv.org/pdf/2401.22222";
	// Worker pool width 1 keeps the documents strictly ordered, so the
	// scripted responses line up per document.
	let llm = ScriptedLlm::new(vec![
		plan_response(),
		questions_response(),
		metadata_response("First Paper"),
		extraction_response(&[("Trebuchets displaced rams.", 1)]),
		metadata_response("Second Paper"),
		extraction_response(&[]),
	]);
	let fix = fixture(
		config_fixture(),
		Arc::new(FailingEmbedding),
		Arc::new(llm),
		Arc::new(CountingSearch::new(Vec::new())),
		Arc::new(parse_fixture(&[
			(first, vec!["Trebuchets displaced rams."]),
			(second, vec!["Quarry logistics."]),
		])),
	);

	fix.pipeline
		.run(request(session_id, &[], &["evolution of siege tactics"], &[first, second]))
		.await
		.unwrap();

	let processing: Vec<String> = fix
		.notifier
		.events()
		.into_iter()
		.filter(|(stage, _)| stage == "processing")
		.map(|(_, message)| message)
		.collect();

	assert_eq!(processing, vec![
		"Processing 2 documents.".to_string(),
		format!("Processed document {first} with 1 notes."),
		format!("Processed document {second} with 0 notes."),
	]);
}

#[tokio::test]
async fn resubmitting_a_finished_session_does_not_duplicate_work() {
	let session_id = Uuid::new_v4();
	let search = Arc::new(CountingSearch::new(Vec::new()));
	let llm = ScriptedLlm::new(vec![
		plan_response(),
		questions_response(),
		metadata_response("User Supplied Paper"),
		extraction_response(&[("Trebuchets displaced rams.", 1)]),
	]);
	let fix = fixture(
		config_fixture(),
		Arc::new(FailingEmbedding),
		Arc::new(llm),
		search,
		Arc::new(parse_fixture(&[(PDF_URL, vec!["Trebuchets displaced rams."])])),
	);
	let req = request(session_id, &[], &["evolution of siege tactics"], &[ABS_URL]);

	fix.pipeline.run(req.clone()).await.unwrap();
	fix.pipeline.run(req).await.unwrap();

	let session = fix.store.fetch_session(session_id).await.unwrap().unwrap();

	// The terminal status holds; the resubmission neither regresses the
	// session nor spawns a sibling record.
	assert_eq!(session.status, SessionStatus::Completed);
	assert_eq!(fix.store.session_papers(session_id).await.unwrap().len(), 1);

	let events = fix.notifier.events();

	assert!(events.iter().any(|(stage, _)| stage == "error"));
}
