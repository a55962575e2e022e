use std::collections::BTreeMap;

use magpie_domain::note::NoteCategory;
use magpie_pipeline::{
	extract::ExtractedNote,
	filter::{Candidate, metadata_filter},
	validate::validate_notes,
};
use magpie_testkit::{FailingEmbedding, FixtureEmbedding, config_fixture, search_hit};

fn note(content: &str) -> ExtractedNote {
	ExtractedNote {
		content: content.to_string(),
		page_number: 1,
		category: NoteCategory::Quote,
		matched_query: "evolution of siege tactics".to_string(),
		justification: "Describes the tactic.".to_string(),
		inline_citations: Vec::new(),
		reference_map: BTreeMap::new(),
		relevance_score: None,
		accepted: true,
	}
}

#[tokio::test]
async fn dead_embedding_backend_passes_every_candidate_through() {
	let cfg = config_fixture();
	let candidates = vec![
		Candidate {
			url: "https://arxiv.org/pdf/2401.00001".to_string(),
			hit: Some(search_hit("2401.00001", "Siege Tactics", "Crusade warfare.")),
		},
		Candidate {
			url: "https://arxiv.org/pdf/2401.00002".to_string(),
			hit: Some(search_hit("2401.00002", "Weather Models", "Atmospheric simulation.")),
		},
		Candidate { url: "https://example.com/paper.pdf".to_string(), hit: None },
	];
	let accepted = metadata_filter(&FailingEmbedding, &cfg, candidates, &[1.0, 0.0]).await;

	assert_eq!(accepted.len(), 3);
	assert!(accepted.iter().all(|candidate| candidate.score.is_none()));
}

#[tokio::test]
async fn dead_embedding_backend_keeps_notes_accepted_without_scores() {
	let cfg = config_fixture();
	let mut notes = vec![note("Trebuchets displaced traction engines."), note("Other text.")];

	validate_notes(
		&FailingEmbedding,
		&cfg,
		&mut notes,
		&["How did siege tactics evolve?".to_string()],
		"Evolution of siege warfare",
	)
	.await;

	assert!(notes.iter().all(|n| n.accepted && n.relevance_score.is_none()));
}

#[tokio::test]
async fn validation_rejects_but_keeps_off_intent_notes() {
	let cfg = config_fixture();
	let embedding = FixtureEmbedding::new(vec![1.0, 0.0])
		.with("Completely unrelated digression.", vec![0.0, 1.0]);
	let mut notes = vec![note("On-topic tactics text."), note("Completely unrelated digression.")];

	validate_notes(
		&embedding,
		&cfg,
		&mut notes,
		&["How did siege tactics evolve?".to_string()],
		"Evolution of siege warfare",
	)
	.await;

	assert!(notes[0].accepted);
	assert_eq!(notes[0].relevance_score, Some(1.0));
	// Rejected notes stay in the list, scored, for audit.
	assert!(!notes[1].accepted);
	assert_eq!(notes[1].relevance_score, Some(0.0));
}
