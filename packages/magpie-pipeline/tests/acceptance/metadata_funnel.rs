use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;

use magpie_domain::status::{DocumentStatus, SessionStatus};
use magpie_pipeline::filter::{Candidate, metadata_filter};
use magpie_store::Store;
use magpie_testkit::{FixtureEmbedding, ScriptedLlm, config_fixture, search_hit};

use super::{
	CountingSearch, extraction_response, fixture, metadata_response, parse_fixture, plan_response,
	questions_response, request,
};

#[tokio::test]
async fn only_candidates_above_the_metadata_threshold_are_processed() {
	let session_id = Uuid::new_v4();
	let hits = vec![
		search_hit("2401.00001", "Siege Tactics", "Crusade siege warfare."),
		search_hit("2401.00002", "Castle Economics", "Trade around fortresses."),
		search_hit("2401.00003", "Weather Models", "Atmospheric simulation."),
	];
	// The intent text the filter embeds is topics + questions + planner
	// terms + explanation; only that exact composition maps to the [1, 0]
	// axis, so the 0.8 / 0.5 / 0.1 candidate scores (straddling the 0.65
	// threshold) depend on it being built correctly.
	let embedding = FixtureEmbedding::new(vec![0.0, 1.0])
		.with(
			"medieval warfare evolution of siege tactics siege evolution siege Evolution of \
			 medieval siege tactics and engines",
			vec![1.0, 0.0],
		)
		.with("Siege Tactics. Crusade siege warfare.", vec![0.8, 0.6])
		.with("Castle Economics. Trade around fortresses.", vec![0.5, 0.866])
		.with("Weather Models. Atmospheric simulation.", vec![0.1, 0.995]);
	let llm = ScriptedLlm::new(vec![
		plan_response(),
		questions_response(),
		metadata_response("Siege Tactics in the Crusades"),
		extraction_response(&[("Counterweight trebuchets displaced traction engines.", 2)]),
	]);
	let parse = parse_fixture(&[(
		"https://arxiv.org/pdf/2401.00001",
		vec!["Introduction to sieges.", "Counterweight trebuchets displaced traction engines."],
	)]);
	let fix = fixture(
		config_fixture(),
		Arc::new(embedding),
		Arc::new(llm),
		Arc::new(CountingSearch::new(hits)),
		Arc::new(parse),
	);

	fix.pipeline
		.run(request(session_id, &["medieval warfare"], &["evolution of siege tactics"], &[]))
		.await
		.unwrap();

	let session = fix.store.fetch_session(session_id).await.unwrap().unwrap();

	assert_eq!(session.status, SessionStatus::Completed);

	let papers = fix.store.session_papers(session_id).await.unwrap();

	assert_eq!(papers.len(), 1);

	let paper = &papers[0];

	assert_eq!(paper.url, "https://arxiv.org/pdf/2401.00001");
	assert_eq!(paper.status, DocumentStatus::Success);
	assert_eq!(paper.title, "Siege Tactics in the Crusades");
	assert_eq!(paper.reference, "Garcia, M. (2021). Siege Tactics in the Crusades.");
	assert_eq!(paper.page_count, 2);

	let notes = fix.store.paper_notes(paper.paper_id).await.unwrap();

	assert_eq!(notes.len(), 1);
	assert!(notes[0].accepted);
	assert_eq!(notes[0].relevance_score, Some(1.0));
	assert_eq!(notes[0].page_number, 2);

	let events = fix.notifier.events();

	assert_eq!(
		events.last().cloned(),
		Some((
			"completed".to_string(),
			"Research completed. Found 1 notes from 1 papers.".to_string()
		))
	);
}

#[tokio::test]
async fn raising_the_threshold_never_admits_new_candidates() {
	let mut loose_cfg = config_fixture();
	let mut strict_cfg = config_fixture();

	loose_cfg.funnel.metadata_threshold = 0.3;
	strict_cfg.funnel.metadata_threshold = 0.7;

	let embedding = FixtureEmbedding::new(vec![0.0, 1.0])
		.with("Siege Tactics. Crusade siege warfare.", vec![0.8, 0.6])
		.with("Castle Economics. Trade around fortresses.", vec![0.5, 0.866])
		.with("Weather Models. Atmospheric simulation.", vec![0.1, 0.995]);
	let candidates = || {
		vec![
			Candidate {
				url: "https://arxiv.org/pdf/2401.00001".to_string(),
				hit: Some(search_hit("2401.00001", "Siege Tactics", "Crusade siege warfare.")),
			},
			Candidate {
				url: "https://arxiv.org/pdf/2401.00002".to_string(),
				hit: Some(search_hit("2401.00002", "Castle Economics", "Trade around fortresses.")),
			},
			Candidate {
				url: "https://arxiv.org/pdf/2401.00003".to_string(),
				hit: Some(search_hit("2401.00003", "Weather Models", "Atmospheric simulation.")),
			},
		]
	};
	let intent = [1.0, 0.0];
	let loose = metadata_filter(&embedding, &loose_cfg, candidates(), &intent).await;
	let strict = metadata_filter(&embedding, &strict_cfg, candidates(), &intent).await;
	let loose_urls: HashSet<&str> = loose.iter().map(|candidate| candidate.url.as_str()).collect();

	// The strict set is a subset of the loose one, never a different slice.
	assert!(strict.iter().all(|candidate| loose_urls.contains(candidate.url.as_str())));
	assert_eq!(loose.len(), 2);
	assert_eq!(strict.len(), 1);
	assert_eq!(strict[0].url, "https://arxiv.org/pdf/2401.00001");
}
