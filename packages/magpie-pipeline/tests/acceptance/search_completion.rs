use std::sync::Arc;

use uuid::Uuid;

use magpie_domain::status::SessionStatus;
use magpie_store::Store;
use magpie_testkit::{FixtureEmbedding, ScriptedLlm, config_fixture};

use super::{CountingSearch, fixture, plan_response, questions_response, request};

#[tokio::test]
async fn empty_search_results_complete_the_session() {
	let session_id = Uuid::new_v4();
	let search = Arc::new(CountingSearch::new(Vec::new()));
	let fix = fixture(
		config_fixture(),
		Arc::new(FixtureEmbedding::new(vec![1.0, 0.0])),
		Arc::new(ScriptedLlm::new(vec![plan_response(), questions_response()])),
		search.clone(),
		Arc::new(magpie_testkit::StubParse::new()),
	);
	let returned = fix
		.pipeline
		.run(request(session_id, &["medieval warfare"], &["evolution of siege tactics"], &[]))
		.await
		.unwrap();

	assert_eq!(returned, session_id);

	let session = fix.store.fetch_session(session_id).await.unwrap().unwrap();

	// A fruitless search jumps straight from searching to completed.
	assert_eq!(session.status, SessionStatus::Completed);
	assert!(fix.store.session_papers(session_id).await.unwrap().is_empty());
	assert!(search.call_count() > 0);

	let events = fix.notifier.events();

	assert!(events.iter().any(|(stage, _)| stage == "searching"));
	assert_eq!(
		events.last().cloned(),
		Some(("completed".to_string(), "No candidate documents found.".to_string()))
	);
}
